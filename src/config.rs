use crate::{
    erase::EraseSource,
    error::BrushError,
    particles::BurstParams,
    types::{CanvasSize, ParticleShape},
};

pub const DEFAULT_CANVAS: CanvasSize = CanvasSize::new(640, 480);
pub const FINGER_ERASE_RADIUS: f32 = 25.0;
pub const POINTER_ERASE_RADIUS: f32 = 40.0;

pub const DEFAULT_BRUSH_COLOR: &str = "#00f0ff";
pub const DEFAULT_BRUSH_SIZE: f32 = 5.0;
pub const MIN_BRUSH_SIZE: f32 = 1.0;
pub const MAX_BRUSH_SIZE: f32 = 64.0;

/// Tuning for a drawing session. Defaults match the interactive app.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Used until the first video frame reports its own size.
    pub canvas: CanvasSize,
    pub finger_erase_radius: f32,
    pub pointer_erase_radius: f32,
    pub burst: BurstParams,
    /// Consecutive `None` frames tolerated before an open stroke is committed.
    pub release_grace_frames: u32,
    /// Seeds the particle generator; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl SessionConfig {
    pub fn erase_radius(&self, source: EraseSource) -> f32 {
        match source {
            EraseSource::Finger => self.finger_erase_radius,
            EraseSource::Pointer => self.pointer_erase_radius,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            canvas: DEFAULT_CANVAS,
            finger_erase_radius: FINGER_ERASE_RADIUS,
            pointer_erase_radius: POINTER_ERASE_RADIUS,
            burst: BurstParams::default(),
            release_grace_frames: 0,
            seed: None,
        }
    }
}

/// The brush controls. The drawing core only reads these.
#[derive(Clone, Debug, PartialEq)]
pub struct BrushConfig {
    color: [u8; 4],
    size: f32,
    shape: ParticleShape,
}

impl BrushConfig {
    pub fn new(color: [u8; 4], size: f32, shape: ParticleShape) -> Self {
        Self {
            color,
            size: clamp_size(size),
            shape,
        }
    }

    pub fn color(&self) -> [u8; 4] {
        self.color
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn shape(&self) -> ParticleShape {
        self.shape
    }

    /// Accepts any CSS color: `#00f0ff`, `rgb(255 0 0)`, `hotpink`, ...
    pub fn set_color(&mut self, value: &str) -> Result<(), BrushError> {
        self.color = parse_color(value)?;
        Ok(())
    }

    pub fn set_color_rgba(&mut self, color: [u8; 4]) {
        self.color = color;
    }

    /// Out-of-range sizes are clamped; non-finite ones are ignored.
    pub fn set_size(&mut self, size: f32) {
        if size.is_finite() {
            self.size = clamp_size(size);
        }
    }

    pub fn set_shape(&mut self, shape: ParticleShape) {
        self.shape = shape;
    }
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            color: [0x00, 0xf0, 0xff, 0xff],
            size: DEFAULT_BRUSH_SIZE,
            shape: ParticleShape::Circle,
        }
    }
}

pub fn parse_color(value: &str) -> Result<[u8; 4], BrushError> {
    csscolorparser::parse(value)
        .map(|color| color.to_rgba8())
        .map_err(|source| BrushError::Color {
            value: value.to_string(),
            source,
        })
}

/// A finite brush size. Range clamping is left to [`BrushConfig::set_size`].
pub fn parse_size(value: &str) -> Result<f32, BrushError> {
    value
        .parse::<f32>()
        .ok()
        .filter(|size| size.is_finite())
        .ok_or_else(|| BrushError::Size(value.to_string()))
}

pub fn parse_shape(value: &str) -> Result<ParticleShape, BrushError> {
    ParticleShape::from_label(value).ok_or_else(|| BrushError::Shape(value.to_string()))
}

fn clamp_size(size: f32) -> f32 {
    size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE)
}
