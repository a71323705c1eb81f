use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn size(&self) -> CanvasSize {
        CanvasSize::new(self.width, self.height)
    }
}

/// A position on the drawing canvas, in pixels with the origin at the top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Maps a normalized landmark position onto canvas pixels.
    pub fn project(&self, normalized: Point) -> Point {
        Point::new(
            normalized.x * self.width as f32,
            normalized.y * self.height as f32,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
    Unknown,
}

impl Handedness {
    pub fn label(&self) -> &'static str {
        match self {
            Handedness::Left => "Left",
            Handedness::Right => "Right",
            Handedness::Unknown => "Unknown",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "Left" => Handedness::Left,
            "Right" => Handedness::Right,
            _ => Handedness::Unknown,
        }
    }

    pub fn hand(&self) -> Option<Hand> {
        match self {
            Handedness::Left => Some(Hand::Left),
            Handedness::Right => Some(Hand::Right),
            Handedness::Unknown => None,
        }
    }
}

/// One of the two hand slots. The discriminant is the slot index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hand {
    Left = 0,
    Right = 1,
}

impl Hand {
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One detected hand in one frame, as delivered by the landmark detector.
#[derive(Clone, Debug)]
pub struct HandObservation {
    /// Normalized to `[0, 1]` on both axes.
    pub landmarks: Vec<Point>,
    pub handedness: Handedness,
}

/// Everything the capture side knows about one video frame.
#[derive(Clone, Debug, Default)]
pub struct Observation {
    pub video: Option<Arc<Frame>>,
    pub hands: Vec<HandObservation>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ParticleShape {
    #[default]
    Circle,
    Square,
    Diamond,
    Heart,
}

impl ParticleShape {
    pub fn label(&self) -> &'static str {
        match self {
            ParticleShape::Circle => "circle",
            ParticleShape::Square => "square",
            ParticleShape::Diamond => "diamond",
            ParticleShape::Heart => "heart",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "circle" => Some(ParticleShape::Circle),
            "square" => Some(ParticleShape::Square),
            "diamond" => Some(ParticleShape::Diamond),
            "heart" => Some(ParticleShape::Heart),
            _ => None,
        }
    }
}

/// A committed polyline. Only ever shrunk by erasing once it is in the ledger.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub points: Vec<Point>,
    pub color: [u8; 4],
    pub size: f32,
}

impl Stroke {
    /// Strokes with fewer than two points stay in the ledger but draw nothing.
    pub fn is_drawable(&self) -> bool {
        self.points.len() >= 2
    }
}
