use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;

use crate::types::Frame;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Stand-in for live video: one still image, or a directory of frames that
/// loops.
#[derive(Clone, Debug)]
pub struct BackgroundFrames {
    frames: Vec<Arc<Frame>>,
}

impl BackgroundFrames {
    pub fn load(path: &Path) -> Result<Self> {
        let paths = if path.is_dir() {
            frame_paths(path)?
        } else {
            vec![path.to_path_buf()]
        };

        if paths.is_empty() {
            return Err(anyhow!("no png or jpeg frames in {}", path.display()));
        }

        let frames = paths
            .par_iter()
            .map(|path| load_frame(path).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "loaded {} background frame(s) from {}",
            frames.len(),
            path.display()
        );
        Ok(Self { frames })
    }

    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into_iter().map(Arc::new).collect(),
        }
    }

    /// The frame shown at `index`, wrapping around at the end.
    pub fn frame(&self, index: usize) -> Option<Arc<Frame>> {
        if self.frames.is_empty() {
            return None;
        }
        self.frames.get(index % self.frames.len()).cloned()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn frame_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read directory {}", dir.display()))?
    {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn load_frame(path: &Path) -> Result<Frame> {
    let image = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(Frame {
        rgba: image.into_raw(),
        width,
        height,
    })
}
