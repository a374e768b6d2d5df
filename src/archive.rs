//! Zip archives of scratch directories, the format draft and submitted
//! reports travel in.

use std::io::{Cursor, Write};
use std::path::Path;

use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::PaperResult;

/// Zips every file under `dir`, with entry names relative to `dir`.
pub fn zip_dir(dir: &Path) -> PaperResult<Vec<u8>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((name, entry.into_path()));
    }

    let mut archive = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut archive));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for (name, path) in &files {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(&std::fs::read(path)?)?;
        }
        zip.finish()?;
    }

    tracing::debug!(dir = %dir.display(), files = files.len(), bytes = archive.len(), "directory zipped");
    Ok(archive)
}

/// Extracts an archive produced by `zip_dir` into `dir`, creating it.
pub fn unzip_into(bytes: &[u8], dir: &Path) -> PaperResult<()> {
    std::fs::create_dir_all(dir)?;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    archive.extract(dir)?;
    Ok(())
}
