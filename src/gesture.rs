use crate::types::Point;

pub const NUM_LANDMARKS: usize = 21;

pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;

const FINGERTIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Authoring intent read from a single hand pose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gesture {
    /// Index finger up: extend the stroke.
    Draw,
    /// Index and middle up: erase around the fingertip.
    Erase,
    /// All four fingers folded: commit the stroke.
    Fist,
    /// Anything else, including a missing or malformed hand.
    None,
}

impl Gesture {
    pub fn label(&self) -> &'static str {
        match self {
            Gesture::Draw => "draw",
            Gesture::Erase => "erase",
            Gesture::Fist => "fist",
            Gesture::None => "none",
        }
    }
}

/// The finger measurements the classification rules look at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FingerSummary {
    /// Non-thumb fingers whose tip sits below the joint two landmarks back.
    pub folded: usize,
    pub index_up: bool,
    pub middle_up: bool,
}

impl FingerSummary {
    pub fn read(landmarks: &[Point]) -> Option<Self> {
        if landmarks.len() != NUM_LANDMARKS {
            return None;
        }

        let folded = FINGERTIPS
            .iter()
            .filter(|&&tip| landmarks[tip].y > landmarks[tip - 2].y)
            .count();

        Some(Self {
            folded,
            index_up: landmarks[INDEX_TIP].y < landmarks[INDEX_PIP].y,
            middle_up: landmarks[MIDDLE_TIP].y < landmarks[MIDDLE_PIP].y,
        })
    }
}

/// Classification rules in priority order. The first match wins.
pub const RULES: [(Gesture, fn(&FingerSummary) -> bool); 3] = [
    (Gesture::Fist, all_folded),
    (Gesture::Erase, two_fingers_up),
    (Gesture::Draw, index_up),
];

fn all_folded(fingers: &FingerSummary) -> bool {
    fingers.folded == FINGERTIPS.len()
}

fn two_fingers_up(fingers: &FingerSummary) -> bool {
    fingers.index_up && fingers.middle_up
}

fn index_up(fingers: &FingerSummary) -> bool {
    fingers.index_up
}

pub fn classify(landmarks: Option<&[Point]>) -> Gesture {
    let Some(fingers) = landmarks.and_then(FingerSummary::read) else {
        return Gesture::None;
    };

    RULES
        .iter()
        .find(|(_, matches)| matches(&fingers))
        .map(|(gesture, _)| *gesture)
        .unwrap_or(Gesture::None)
}

// Offsets of each landmark in hand-span units, relative to the index knuckle.
// Fingers are listed as (knuckle, pip, dip, tip).
const WRIST: (f32, f32) = (0.9, 2.5);
const THUMB: [(f32, f32); 4] = [(-0.5, 2.0), (-1.0, 1.5), (-1.4, 1.0), (-1.7, 0.6)];
const FINGER_COLUMNS: [f32; 4] = [0.0, 0.6, 1.2, 1.8];
const EXTENDED: [f32; 4] = [0.0, -1.0, -2.0, -3.0];
const FOLDED: [f32; 4] = [0.0, -1.0, -0.5, -0.2];
const SYNTHETIC_SPAN: f32 = 0.04;

/// Builds a canonical normalized hand whose pose classifies as `gesture`,
/// with the index fingertip placed at `tip`.
pub fn synthetic_landmarks(gesture: Gesture, tip: Point) -> Vec<Point> {
    // index, middle, ring, pinky
    let extended = match gesture {
        Gesture::Draw => [true, false, false, false],
        Gesture::Erase => [true, true, false, false],
        Gesture::Fist => [false, false, false, false],
        Gesture::None => [false, false, false, true],
    };

    let mut offsets = Vec::with_capacity(NUM_LANDMARKS);
    offsets.push(WRIST);
    offsets.extend_from_slice(&THUMB);
    for (column, up) in FINGER_COLUMNS.iter().zip(extended) {
        let rows = if up { EXTENDED } else { FOLDED };
        offsets.extend(rows.iter().map(|&row| (*column, row)));
    }

    let anchor = offsets[INDEX_TIP];
    offsets
        .into_iter()
        .map(|(x, y)| {
            Point::new(
                tip.x + (x - anchor.0) * SYNTHETIC_SPAN,
                tip.y + (y - anchor.1) * SYNTHETIC_SPAN,
            )
        })
        .collect()
}
