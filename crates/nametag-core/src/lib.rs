//! nametag-core — Face detection, encoding, and gallery matching.
//!
//! Uses SCRFD for face detection and ArcFace for face encodings, both
//! running via ONNX Runtime for CPU inference. The [`FaceEngine`] trait is
//! the seam between the model-backed implementation and the gallery/pipeline
//! logic built on top of it.

pub mod alignment;
pub mod annotate;
pub mod detector;
pub mod engine;
pub mod font;
pub mod gallery;
pub mod pipeline;
pub mod recognizer;
pub mod types;

pub use engine::{EngineError, FaceEngine, OnnxFaceEngine};
pub use gallery::{FileOutcome, FileReport, GalleryError, GalleryReload};
pub use pipeline::{PipelineOptions, TaggedFace, UNKNOWN_LABEL};
pub use types::{BoundingBox, Encoding, Gallery, MatchOutcome};

use std::path::PathBuf;

/// Default directory for the ONNX model files
/// (`$XDG_DATA_HOME/nametag/models`, falling back to `~/.local/share`).
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("nametag/models")
}
