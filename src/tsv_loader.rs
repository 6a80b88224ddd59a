use crate::error::PipelineError;
use crate::types::ImageData;
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::path::Path;

/// Read a tags file (`<file name>\t<label>` per line, no header).
///
/// Each image path is `folder` joined with the file name so the image can be
/// found regardless of the working directory the tags file was written from.
pub fn read_from_tsv(file: &Path, folder: &Path) -> Result<Vec<ImageData>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_path(file)
        .with_context(|| format!("Failed to open tags file: {}", file.display()))?;

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.with_context(|| format!("Failed to read {}", file.display()))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let name = record.get(0).unwrap_or("");
        if name.is_empty() {
            return Err(PipelineError::EmptyImageName {
                file: file.to_path_buf(),
                line,
            }
            .into());
        }

        let label = record
            .get(1)
            .filter(|l| !l.is_empty())
            .map(str::to_string);

        rows.push(ImageData {
            image_path: folder.join(name),
            label,
        });
    }

    log::debug!("Read {} rows from {}", rows.len(), file.display());

    Ok(rows)
}
