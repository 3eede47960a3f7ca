//! Gallery construction from a directory of labeled stills.
//!
//! One image file per person: the file stem becomes the label, the first
//! (most confident) detected face supplies the encoding. Per-file failures
//! never abort the scan; every processed file yields a [`FileReport`].

use crate::engine::FaceEngine;
use crate::types::Gallery;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const GALLERY_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("cannot read gallery directory {}: {source}", path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What a fresh load does to entries from earlier loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GalleryReload {
    /// Keep existing entries; loading the same directory twice doubles the
    /// gallery. The historical behavior, kept as the default.
    #[default]
    Append,
    /// Clear the gallery before scanning.
    Replace,
}

/// Per-file scan result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Face found and appended to the gallery under `label`.
    Loaded { label: String },
    /// Image decoded fine but contained no detectable face.
    NoFace,
    /// Image could not be decoded, or detection/encoding failed on it.
    Failed { reason: String },
}

/// Scan `dir` for gallery images and load them into `gallery`.
///
/// Only entries with a `.jpg`/`.jpeg`/`.png` extension (case-insensitive)
/// are considered; everything else is ignored. Files are processed in
/// sorted path order so repeated scans of the same directory report
/// identically. The only propagated error is an unreadable directory.
pub fn load_directory(
    engine: &mut dyn FaceEngine,
    dir: &Path,
    gallery: &mut Gallery,
    reload: GalleryReload,
) -> Result<Vec<FileReport>, GalleryError> {
    let entries = std::fs::read_dir(dir).map_err(|source| GalleryError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    if reload == GalleryReload::Replace {
        gallery.clear();
    }

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| has_gallery_extension(path))
        .collect();
    files.sort();

    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        let outcome = load_file(engine, &path, gallery);
        match &outcome {
            FileOutcome::Loaded { label } => {
                tracing::info!(path = %path.display(), label = %label, "loaded gallery face")
            }
            FileOutcome::NoFace => {
                tracing::warn!(path = %path.display(), "no face found, skipping")
            }
            FileOutcome::Failed { reason } => {
                tracing::error!(path = %path.display(), reason = %reason, "failed to load gallery file")
            }
        }
        reports.push(FileReport { path, outcome });
    }

    tracing::info!(
        loaded = reports
            .iter()
            .filter(|r| matches!(r.outcome, FileOutcome::Loaded { .. }))
            .count(),
        scanned = reports.len(),
        gallery_size = gallery.len(),
        "gallery scan complete"
    );

    Ok(reports)
}

fn load_file(engine: &mut dyn FaceEngine, path: &Path, gallery: &mut Gallery) -> FileOutcome {
    let image = match image::open(path) {
        Ok(img) => img.to_rgb8(),
        Err(err) => {
            return FileOutcome::Failed {
                reason: err.to_string(),
            }
        }
    };

    let faces = match engine.detect(&image) {
        Ok(faces) => faces,
        Err(err) => {
            return FileOutcome::Failed {
                reason: err.to_string(),
            }
        }
    };

    let Some(first) = faces.first() else {
        return FileOutcome::NoFace;
    };

    match engine.encode(&image, first) {
        Ok(encoding) => {
            let label = file_label(path);
            gallery.push(label.clone(), encoding);
            FileOutcome::Loaded { label }
        }
        Err(err) => FileOutcome::Failed {
            reason: err.to_string(),
        },
    }
}

/// Filename without its extension.
fn file_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn has_gallery_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| GALLERY_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
