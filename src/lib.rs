//! Air-drawing core: hand landmarks in, composited canvas frames out.
//!
//! [`session::DrawingSession`] is the synchronous heart of the crate. Each call
//! to `process_frame` classifies the observed hands, updates the stroke ledger,
//! applies any pointer erase, steps the particles and returns a
//! [`session::RenderList`]. The [`pipeline`] module wires a session into
//! threads fed by session scripts and drains it into PNG frames.

pub mod config;
pub mod erase;
pub mod error;
pub mod gesture;
pub mod ledger;
pub mod particles;
pub mod pipeline;
pub mod session;
pub mod types;

pub use config::{BrushConfig, SessionConfig};
pub use error::{BrushError, ScriptError, ScriptErrorKind};
pub use gesture::{Gesture, classify};
pub use ledger::{LedgerOutcome, StrokeLedger};
pub use session::{DrawingSession, RenderList};
pub use types::{CanvasSize, Frame, Hand, HandObservation, Handedness, Observation, Point, Stroke};
