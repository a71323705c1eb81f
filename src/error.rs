use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrushError {
    #[error("invalid brush color {value:?}")]
    Color {
        value: String,
        #[source]
        source: csscolorparser::ParseColorError,
    },
    #[error("invalid brush size {0:?}")]
    Size(String),
    #[error("unknown particle shape {0:?} (expected circle, square, diamond or heart)")]
    Shape(String),
}

#[derive(Debug, Error)]
#[error("line {line}: {kind}")]
pub struct ScriptError {
    pub line: usize,
    pub kind: ScriptErrorKind,
}

#[derive(Debug, Error)]
pub enum ScriptErrorKind {
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("unexpected argument {0:?}")]
    UnexpectedArgument(String),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("invalid point {0:?} (expected x,y)")]
    InvalidPoint(String),
    #[error("expected 21 landmarks, got {0}")]
    LandmarkCount(usize),
    #[error("unknown hand {0:?} (expected Left or Right)")]
    UnknownHand(String),
    #[error("unknown pose {0:?} (expected draw, erase, fist or idle)")]
    UnknownPose(String),
    #[error(transparent)]
    Brush(#[from] BrushError),
}
