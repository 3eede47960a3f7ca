//! ArcFace face encoder via ONNX Runtime.
//!
//! Produces 512-dimensional L2-normalized encodings from RGB face crops,
//! using the w600k_r50 ArcFace model. Faces with landmarks are aligned to
//! the canonical position first; faces without landmarks fall back to a
//! plain crop-and-resize of their bounding box.

use crate::alignment::{self, ALIGNED_SIZE};
use crate::types::{BoundingBox, Encoding};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

/// File name of the ArcFace model inside the model directory.
pub const RECOGNIZER_MODEL_FILE: &str = "w600k_r50.onnx";

const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5; // symmetric normalization, unlike SCRFD
const ENCODING_DIM: usize = 512;

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("model file not found: {0} — download w600k_r50.onnx from insightface and place it in the model directory")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// ArcFace-based face encoder.
pub struct FaceRecognizer {
    session: Session,
}

impl FaceRecognizer {
    /// Load the ArcFace ONNX model from the given path.
    pub fn load(model_path: &Path) -> Result<Self, RecognizerError> {
        if !model_path.exists() {
            return Err(RecognizerError::ModelNotFound(
                model_path.display().to_string(),
            ));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        tracing::info!(path = %model_path.display(), "loaded ArcFace model");

        Ok(Self { session })
    }

    /// Extract the encoding for one detected face in an RGB frame.
    pub fn encode(
        &mut self,
        frame: &RgbImage,
        face: &BoundingBox,
    ) -> Result<Encoding, RecognizerError> {
        let crop = match &face.landmarks {
            Some(landmarks) => alignment::align_face(frame, landmarks),
            None => crop_and_resize(frame, face),
        };

        let input = preprocess(&crop);
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| RecognizerError::InferenceFailed(format!("encoding extraction: {e}")))?;

        if raw.len() != ENCODING_DIM {
            return Err(RecognizerError::InferenceFailed(format!(
                "expected {ENCODING_DIM}-dim encoding, got {}",
                raw.len()
            )));
        }

        Ok(Encoding {
            values: l2_normalize(raw),
        })
    }
}

/// Bounding-box fallback when the detector supplied no landmarks.
fn crop_and_resize(frame: &RgbImage, face: &BoundingBox) -> RgbImage {
    let x = (face.x.max(0.0) as u32).min(frame.width().saturating_sub(1));
    let y = (face.y.max(0.0) as u32).min(frame.height().saturating_sub(1));
    let right = ((face.x + face.width).max(0.0) as u32).min(frame.width());
    let bottom = ((face.y + face.height).max(0.0) as u32).min(frame.height());
    let w = right.saturating_sub(x).max(1);
    let h = bottom.saturating_sub(y).max(1);

    let crop = image::imageops::crop_imm(frame, x, y, w, h).to_image();
    image::imageops::resize(
        &crop,
        ALIGNED_SIZE,
        ALIGNED_SIZE,
        image::imageops::FilterType::Triangle,
    )
}

/// 112×112 RGB crop → NCHW float tensor in [-1, 1].
fn preprocess(crop: &RgbImage) -> Array4<f32> {
    let size = ALIGNED_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, px) in crop.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (px[c] as f32 - NORM_MEAN) / NORM_STD;
        }
    }
    tensor
}

fn l2_normalize(raw: &[f32]) -> Vec<f32> {
    let norm: f32 = raw.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        raw.iter().map(|v| v / norm).collect()
    } else {
        raw.to_vec()
    }
}
