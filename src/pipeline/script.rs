//! Line-oriented session scripts.
//!
//! ```text
//! # comment
//! size 640 480
//! brush color #ff3366
//! brush size 8
//! brush shape heart
//! frame Right pose=draw at=0.25,0.40
//! frame Left pose=erase at=0.5,0.5; Right 0.1,0.9 0.12,0.85 ... (21 points)
//! frame
//! pointer 320 240
//! pointer off
//! clear
//! ```

use crate::{
    config::{parse_color, parse_shape, parse_size},
    error::{ScriptError, ScriptErrorKind},
    gesture::{Gesture, NUM_LANDMARKS, synthetic_landmarks},
    types::{CanvasSize, HandObservation, Handedness, Observation, ParticleShape, Point},
};

#[derive(Clone, Debug, PartialEq)]
pub enum BrushChange {
    Color([u8; 4]),
    Size(f32),
    Shape(ParticleShape),
}

/// One input to the drawing session, in arrival order.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    Frame(Observation),
    PointerMove(Point),
    PointerLeave,
    Brush(BrushChange),
    Resize(CanvasSize),
    Clear,
}

pub fn parse_script(source: &str) -> Result<Vec<SessionEvent>, ScriptError> {
    let mut events = Vec::new();
    for (idx, line) in source.lines().enumerate() {
        let parsed = parse_line(line).map_err(|kind| ScriptError {
            line: idx + 1,
            kind,
        })?;
        events.extend(parsed);
    }
    Ok(events)
}

fn parse_line(line: &str) -> Result<Option<SessionEvent>, ScriptErrorKind> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map(|(command, rest)| (command, rest.trim()))
        .unwrap_or((line, ""));

    let event = match command {
        "frame" => SessionEvent::Frame(Observation {
            video: None,
            hands: parse_hands(rest)?,
        }),
        "pointer" => match rest {
            "off" => SessionEvent::PointerLeave,
            _ => {
                let [x, y] = two_args(rest, "pointer position")?;
                SessionEvent::PointerMove(Point::new(parse_number(x)?, parse_number(y)?))
            }
        },
        "brush" => SessionEvent::Brush(parse_brush(rest)?),
        "size" => {
            let [w, h] = two_args(rest, "canvas width and height")?;
            SessionEvent::Resize(CanvasSize::new(parse_dimension(w)?, parse_dimension(h)?))
        }
        "clear" => {
            if !rest.is_empty() {
                return Err(ScriptErrorKind::UnexpectedArgument(rest.to_string()));
            }
            SessionEvent::Clear
        }
        other => return Err(ScriptErrorKind::UnknownCommand(other.to_string())),
    };
    Ok(Some(event))
}

fn parse_hands(rest: &str) -> Result<Vec<HandObservation>, ScriptErrorKind> {
    rest.split(';')
        .map(str::trim)
        .filter(|hand| !hand.is_empty())
        .map(parse_hand)
        .collect()
}

fn parse_hand(text: &str) -> Result<HandObservation, ScriptErrorKind> {
    let mut tokens = text.split_whitespace();
    let label = tokens.next().ok_or(ScriptErrorKind::MissingArgument("hand"))?;
    let handedness = match Handedness::from_label(label) {
        Handedness::Unknown => return Err(ScriptErrorKind::UnknownHand(label.to_string())),
        known => known,
    };

    let tokens: Vec<&str> = tokens.collect();
    let landmarks = if tokens.iter().any(|t| t.starts_with("pose=")) {
        parse_pose(&tokens)?
    } else {
        let points = tokens
            .iter()
            .map(|t| parse_point(t))
            .collect::<Result<Vec<_>, _>>()?;
        if points.len() != NUM_LANDMARKS {
            return Err(ScriptErrorKind::LandmarkCount(points.len()));
        }
        points
    };

    Ok(HandObservation {
        landmarks,
        handedness,
    })
}

fn parse_pose(tokens: &[&str]) -> Result<Vec<Point>, ScriptErrorKind> {
    let mut gesture = None;
    let mut at = None;
    for token in tokens {
        if let Some(pose) = token.strip_prefix("pose=") {
            gesture = Some(match pose {
                "draw" => Gesture::Draw,
                "erase" => Gesture::Erase,
                "fist" => Gesture::Fist,
                "idle" => Gesture::None,
                other => return Err(ScriptErrorKind::UnknownPose(other.to_string())),
            });
        } else if let Some(point) = token.strip_prefix("at=") {
            at = Some(parse_point(point)?);
        } else {
            return Err(ScriptErrorKind::UnexpectedArgument(token.to_string()));
        }
    }

    let gesture = gesture.ok_or(ScriptErrorKind::MissingArgument("pose"))?;
    let at = at.ok_or(ScriptErrorKind::MissingArgument("at=x,y"))?;
    Ok(synthetic_landmarks(gesture, at))
}

fn parse_brush(rest: &str) -> Result<BrushChange, ScriptErrorKind> {
    let (setting, value) = rest
        .split_once(char::is_whitespace)
        .map(|(setting, value)| (setting, value.trim()))
        .ok_or(ScriptErrorKind::MissingArgument("brush setting and value"))?;

    let change = match setting {
        "color" => BrushChange::Color(parse_color(value)?),
        "size" => BrushChange::Size(parse_size(value)?),
        "shape" => BrushChange::Shape(parse_shape(value)?),
        other => return Err(ScriptErrorKind::UnexpectedArgument(other.to_string())),
    };
    Ok(change)
}

fn two_args<'a>(rest: &'a str, what: &'static str) -> Result<[&'a str; 2], ScriptErrorKind> {
    let mut args = rest.split_whitespace();
    let (Some(a), Some(b)) = (args.next(), args.next()) else {
        return Err(ScriptErrorKind::MissingArgument(what));
    };
    if let Some(extra) = args.next() {
        return Err(ScriptErrorKind::UnexpectedArgument(extra.to_string()));
    }
    Ok([a, b])
}

fn parse_point(token: &str) -> Result<Point, ScriptErrorKind> {
    let (x, y) = token
        .split_once(',')
        .ok_or_else(|| ScriptErrorKind::InvalidPoint(token.to_string()))?;
    let x = x.trim().parse::<f32>();
    let y = y.trim().parse::<f32>();
    match (x, y) {
        (Ok(x), Ok(y)) if x.is_finite() && y.is_finite() => Ok(Point::new(x, y)),
        _ => Err(ScriptErrorKind::InvalidPoint(token.to_string())),
    }
}

fn parse_number(token: &str) -> Result<f32, ScriptErrorKind> {
    token
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ScriptErrorKind::InvalidNumber(token.to_string()))
}

fn parse_dimension(token: &str) -> Result<u32, ScriptErrorKind> {
    token
        .parse::<u32>()
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ScriptErrorKind::InvalidNumber(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::BrushError,
        gesture::{INDEX_TIP, classify},
    };

    #[test]
    fn skips_blank_lines_and_comments() {
        let events = parse_script("\n# nothing here\n   \nclear\n").unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SessionEvent::Clear));
    }

    #[test]
    fn empty_frame_has_no_hands() {
        let events = parse_script("frame").unwrap();
        let SessionEvent::Frame(observation) = &events[0] else {
            panic!("expected frame, got {:?}", events[0]);
        };
        assert!(observation.hands.is_empty());
        assert!(observation.video.is_none());
    }

    #[test]
    fn pose_shorthand_builds_a_classifiable_hand() {
        let events = parse_script("frame Right pose=erase at=0.25,0.5; Left at=0.1,0.1 pose=fist").unwrap();
        let SessionEvent::Frame(observation) = &events[0] else {
            panic!("expected frame");
        };
        assert_eq!(observation.hands.len(), 2);

        let right = &observation.hands[0];
        assert_eq!(right.handedness, Handedness::Right);
        assert_eq!(right.landmarks[INDEX_TIP], Point::new(0.25, 0.5));
        assert_eq!(classify(Some(right.landmarks.as_slice())), Gesture::Erase);

        let left = &observation.hands[1];
        assert_eq!(left.handedness, Handedness::Left);
        assert_eq!(classify(Some(left.landmarks.as_slice())), Gesture::Fist);
    }

    #[test]
    fn explicit_landmarks_need_all_21() {
        let points = vec!["0.5,0.5"; NUM_LANDMARKS].join(" ");
        let events = parse_script(&format!("frame Left {points}")).unwrap();
        let SessionEvent::Frame(observation) = &events[0] else {
            panic!("expected frame");
        };
        assert_eq!(observation.hands[0].landmarks.len(), NUM_LANDMARKS);

        let err = parse_script("frame Left 0.5,0.5 0.4,0.4").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(matches!(err.kind, ScriptErrorKind::LandmarkCount(2)));
    }

    #[test]
    fn pointer_and_brush_commands() {
        let events = parse_script(
            "pointer 12 34.5\npointer off\nbrush color #ff0000\nbrush size 8\nbrush shape diamond\nsize 320 240",
        )
        .unwrap();
        assert!(matches!(events[0], SessionEvent::PointerMove(p) if p == Point::new(12.0, 34.5)));
        assert!(matches!(events[1], SessionEvent::PointerLeave));
        assert_eq!(
            match &events[2] {
                SessionEvent::Brush(change) => change.clone(),
                other => panic!("unexpected {other:?}"),
            },
            BrushChange::Color([255, 0, 0, 255])
        );
        assert!(matches!(events[3], SessionEvent::Brush(BrushChange::Size(s)) if s == 8.0));
        assert!(matches!(
            events[4],
            SessionEvent::Brush(BrushChange::Shape(ParticleShape::Diamond))
        ));
        assert!(matches!(events[5], SessionEvent::Resize(size) if size == CanvasSize::new(320, 240)));
    }

    #[test]
    fn errors_report_their_line() {
        let err = parse_script("clear\nclear\nwave hello").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(matches!(err.kind, ScriptErrorKind::UnknownCommand(ref c) if c == "wave"));

        let err = parse_script("frame Middle pose=draw at=0,0").unwrap_err();
        assert!(matches!(err.kind, ScriptErrorKind::UnknownHand(_)));

        let err = parse_script("frame Left pose=wave at=0,0").unwrap_err();
        assert!(matches!(err.kind, ScriptErrorKind::UnknownPose(_)));

        let err = parse_script("brush color nope").unwrap_err();
        assert!(matches!(err.kind, ScriptErrorKind::Brush(BrushError::Color { .. })));

        let err = parse_script("brush size huge").unwrap_err();
        assert!(matches!(err.kind, ScriptErrorKind::Brush(BrushError::Size(_))));

        let err = parse_script("brush shape star").unwrap_err();
        assert!(matches!(err.kind, ScriptErrorKind::Brush(BrushError::Shape(_))));

        let err = parse_script("pointer 1").unwrap_err();
        assert!(matches!(err.kind, ScriptErrorKind::MissingArgument(_)));

        let err = parse_script("size 0 10").unwrap_err();
        assert!(matches!(err.kind, ScriptErrorKind::InvalidNumber(_)));
    }
}
