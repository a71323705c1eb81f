pub mod background;
pub mod compositor;
pub mod raster;
pub mod script;
pub mod source;

// Re-exports for convenience
pub use background::BackgroundFrames;
pub use compositor::{CompositedFrame, CompositorHandle, EventLoop, start_frame_compositor};
pub use raster::rasterize;
pub use script::{BrushChange, SessionEvent, parse_script};
pub use source::{SourceStream, start_script_source};
