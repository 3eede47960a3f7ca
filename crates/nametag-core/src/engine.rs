//! The detection + encoding seam.
//!
//! [`FaceEngine`] is what the gallery loader and the per-tick pipeline are
//! written against; [`OnnxFaceEngine`] is the SCRFD + ArcFace implementation.
//! Tests substitute stub engines so pipeline semantics run without model
//! files.

use crate::detector::{DetectorError, FaceDetector, DETECTOR_MODEL_FILE};
use crate::recognizer::{FaceRecognizer, RecognizerError, RECOGNIZER_MODEL_FILE};
use crate::types::{BoundingBox, Encoding};
use image::RgbImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("detector: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer: {0}")]
    Recognizer(#[from] RecognizerError),
}

/// Face localization and encoding capability.
pub trait FaceEngine {
    /// Detect all faces in an RGB image, most confident first.
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, EngineError>;

    /// Extract the encoding for one detected face.
    fn encode(&mut self, image: &RgbImage, face: &BoundingBox)
        -> Result<Encoding, EngineError>;
}

/// SCRFD + ArcFace engine backed by ONNX Runtime.
pub struct OnnxFaceEngine {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl OnnxFaceEngine {
    /// Load both models from `model_dir`. Fails fast if either file is
    /// missing or will not load.
    pub fn load(model_dir: &Path) -> Result<Self, EngineError> {
        let detector = FaceDetector::load(&model_dir.join(DETECTOR_MODEL_FILE))?;
        let recognizer = FaceRecognizer::load(&model_dir.join(RECOGNIZER_MODEL_FILE))?;
        Ok(Self {
            detector,
            recognizer,
        })
    }
}

impl FaceEngine for OnnxFaceEngine {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, EngineError> {
        Ok(self.detector.detect(image)?)
    }

    fn encode(
        &mut self,
        image: &RgbImage,
        face: &BoundingBox,
    ) -> Result<Encoding, EngineError> {
        Ok(self.recognizer.encode(image, face)?)
    }
}
