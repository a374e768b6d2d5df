use std::path::{Path, PathBuf};

use crate::error::PaperResult;

/// Something that can be written into the scratch directory as a PNG.
pub trait Figure {
    fn write_png(&self, path: &Path) -> PaperResult<()>;
}

/// An already encoded PNG, e.g. the output of a charting library.
#[derive(Debug, Clone)]
pub struct PngBytes(pub Vec<u8>);

impl Figure for PngBytes {
    fn write_png(&self, path: &Path) -> PaperResult<()> {
        std::fs::write(path, &self.0)?;
        Ok(())
    }
}

/// An image file on disk, copied into the scratch directory.
#[derive(Debug, Clone)]
pub struct ImageFile(pub PathBuf);

impl Figure for ImageFile {
    fn write_png(&self, path: &Path) -> PaperResult<()> {
        std::fs::copy(&self.0, path)?;
        Ok(())
    }
}

impl<F: Figure + ?Sized> Figure for &F {
    fn write_png(&self, path: &Path) -> PaperResult<()> {
        (**self).write_png(path)
    }
}
