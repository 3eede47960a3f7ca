//! Per-tick recognition: downsample, detect, encode, compare, tag.

use crate::engine::{EngineError, FaceEngine};
use crate::types::{BoundingBox, Gallery};
use image::RgbImage;

/// Label used for faces that did not match any gallery entry.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Linear downsampling factor applied to frames before detection.
pub const DEFAULT_DOWNSAMPLE: f32 = 0.25;

/// Default Euclidean-distance threshold for the gallery match predicate.
pub const DEFAULT_DISTANCE_THRESHOLD: f32 = 1.10;

/// Tuning knobs for one tick of recognition.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub downsample: f32,
    pub distance_threshold: f32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            downsample: DEFAULT_DOWNSAMPLE,
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
        }
    }
}

/// One recognized (or unrecognized) face, in full-resolution coordinates.
#[derive(Debug, Clone)]
pub struct TaggedFace {
    pub bbox: BoundingBox,
    pub label: String,
    /// Best gallery distance, when the gallery had at least one entry.
    pub distance: Option<f32>,
}

/// Run one tick's recognition over a full-resolution RGB frame.
///
/// The frame is downsampled by `opts.downsample` for detection; every
/// resulting box is scaled back by the inverse factor, so callers always see
/// full-resolution coordinates. Faces are returned in detector output order.
///
/// A detection failure aborts the tick (there is nothing to tag); an
/// encoding failure on one face only skips that face, the rest still tag.
pub fn recognize(
    engine: &mut dyn FaceEngine,
    gallery: &Gallery,
    frame: &RgbImage,
    opts: &PipelineOptions,
) -> Result<Vec<TaggedFace>, EngineError> {
    let small = downsample(frame, opts.downsample);
    let faces = engine.detect(&small)?;
    let upscale = 1.0 / opts.downsample;

    let mut tagged = Vec::with_capacity(faces.len());
    for face in &faces {
        let encoding = match engine.encode(&small, face) {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(error = %err, "face encoding failed, skipping face");
                continue;
            }
        };

        let outcome = gallery.best_match(&encoding, opts.distance_threshold);
        tagged.push(TaggedFace {
            bbox: face.scaled(upscale),
            label: outcome
                .label
                .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            distance: outcome.best_distance,
        });
    }

    Ok(tagged)
}

fn downsample(frame: &RgbImage, factor: f32) -> RgbImage {
    if factor >= 1.0 {
        return frame.clone();
    }
    let w = ((frame.width() as f32 * factor).round() as u32).max(1);
    let h = ((frame.height() as f32 * factor).round() as u32).max(1);
    image::imageops::resize(frame, w, h, image::imageops::FilterType::Triangle)
}
