use std::fs;
use std::path::{Path, PathBuf};

use crate::capture::domain::frame_source::FrameSource;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Replays the images of a directory, in file-name order, as RGB frames.
///
/// Stands in for a camera when running the client without capture
/// hardware. With `looping` set the sequence restarts instead of ending.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
    looping: bool,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path, looping: bool) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        if paths.is_empty() {
            return Err(format!("no images found in {}", dir.display()).into());
        }
        paths.sort();
        log::info!("Replaying {} images from {}", paths.len(), dir.display());
        Ok(Self {
            paths,
            next: 0,
            looping,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error + Send + Sync>> {
        if self.next == self.paths.len() {
            if !self.looping {
                return Ok(None);
            }
            self.next = 0;
        }
        let path = &self.paths[self.next];
        self.next += 1;

        let img = image::open(path)?.to_rgb8();
        let width = u16::try_from(img.width())?;
        let height = u16::try_from(img.height())?;
        Ok(Some(Frame::try_new(img.into_raw(), height, width, 3)?))
    }
}
