//! SCRFD face detector via ONNX Runtime.
//!
//! Decodes the three anchor-free stride levels of an SCRFD export and
//! post-processes with NMS. Input frames are RGB; the model consumes a
//! letterboxed 640×640 tensor and detections are mapped back to frame
//! coordinates before they leave this module.

use crate::types::BoundingBox;
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

/// File name of the SCRFD model inside the model directory.
pub const DETECTOR_MODEL_FILE: &str = "det_10g.onnx";

const INPUT_SIZE: usize = 640;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 128.0;
const CONFIDENCE_THRESHOLD: f32 = 0.5;
const NMS_IOU_LIMIT: f32 = 0.4;
const STRIDES: [usize; 3] = [8, 16, 32];
const ANCHORS_PER_CELL: usize = 2;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} — download det_10g.onnx from insightface and place it in the model directory")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Output tensor indices for one stride level: (scores, boxes, keypoints).
type LevelSlots = (usize, usize, usize);

/// SCRFD-based face detector.
pub struct FaceDetector {
    session: Session,
    /// Per-stride output indices for strides [8, 16, 32], discovered by
    /// tensor name at load time with a positional fallback.
    output_slots: [LevelSlots; 3],
}

impl FaceDetector {
    /// Load the SCRFD ONNX model from the given path.
    pub fn load(model_path: &Path) -> Result<Self, DetectorError> {
        if !model_path.exists() {
            return Err(DetectorError::ModelNotFound(
                model_path.display().to_string(),
            ));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();

        tracing::info!(
            path = %model_path.display(),
            outputs = ?output_names,
            "loaded SCRFD model"
        );

        if output_names.len() < 9 {
            return Err(DetectorError::InferenceFailed(format!(
                "SCRFD model requires 9 outputs (3 strides × score/bbox/kps), got {}",
                output_names.len()
            )));
        }

        Ok(Self {
            session,
            output_slots: find_output_slots(&output_names),
        })
    }

    /// Detect faces in an RGB frame, returning boxes sorted by confidence
    /// (highest first) in frame pixel coordinates.
    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, DetectorError> {
        let (tensor, scale) = preprocess(image);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(tensor.view())?])?;

        let mut found = Vec::new();
        for (level, &stride) in STRIDES.iter().enumerate() {
            let (s_idx, b_idx, k_idx) = self.output_slots[level];
            let (_, scores) = outputs[s_idx].try_extract_tensor::<f32>().map_err(|e| {
                DetectorError::InferenceFailed(format!("scores stride {stride}: {e}"))
            })?;
            let (_, deltas) = outputs[b_idx].try_extract_tensor::<f32>().map_err(|e| {
                DetectorError::InferenceFailed(format!("boxes stride {stride}: {e}"))
            })?;
            let (_, keypoints) = outputs[k_idx].try_extract_tensor::<f32>().map_err(|e| {
                DetectorError::InferenceFailed(format!("keypoints stride {stride}: {e}"))
            })?;

            decode_level(scores, deltas, keypoints, stride, scale, &mut found);
        }

        let mut kept = non_max_suppression(found, NMS_IOU_LIMIT);
        kept.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(kept)
    }
}

/// Resize into the top-left corner of a 640×640 canvas and normalize to the
/// SCRFD input distribution. Returns the NCHW tensor and the letterbox scale;
/// padding stays at 0.0, which is exactly the normalized mean.
fn preprocess(image: &RgbImage) -> (Array4<f32>, f32) {
    let longest = image.width().max(image.height()).max(1);
    let scale = INPUT_SIZE as f32 / longest as f32;
    let new_w = ((image.width() as f32 * scale).round() as u32).clamp(1, INPUT_SIZE as u32);
    let new_h = ((image.height() as f32 * scale).round() as u32).clamp(1, INPUT_SIZE as u32);
    let resized = image::imageops::resize(image, new_w, new_h, image::imageops::FilterType::Triangle);

    let mut tensor = Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));
    for (x, y, px) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (px[c] as f32 - NORM_MEAN) / NORM_STD;
        }
    }

    (tensor, scale)
}

/// Decode one stride level of anchor-free SCRFD outputs into frame-space
/// boxes. `scale` is the letterbox scale from [`preprocess`].
fn decode_level(
    scores: &[f32],
    deltas: &[f32],
    keypoints: &[f32],
    stride: usize,
    scale: f32,
    out: &mut Vec<BoundingBox>,
) {
    let grid = INPUT_SIZE / stride;
    let anchors = grid * grid * ANCHORS_PER_CELL;
    let step = stride as f32;

    for idx in 0..anchors.min(scores.len()) {
        let score = scores[idx];
        if score <= CONFIDENCE_THRESHOLD {
            continue;
        }

        let cell = idx / ANCHORS_PER_CELL;
        let ax = (cell % grid) as f32 * step;
        let ay = (cell / grid) as f32 * step;

        // Box deltas are [left, top, right, bottom] offsets in stride units.
        let d = idx * 4;
        if d + 3 >= deltas.len() {
            break;
        }
        let x1 = (ax - deltas[d] * step) / scale;
        let y1 = (ay - deltas[d + 1] * step) / scale;
        let x2 = (ax + deltas[d + 2] * step) / scale;
        let y2 = (ay + deltas[d + 3] * step) / scale;

        let k = idx * 10;
        let landmarks = (k + 9 < keypoints.len()).then(|| {
            std::array::from_fn(|i| {
                (
                    (ax + keypoints[k + 2 * i] * step) / scale,
                    (ay + keypoints[k + 2 * i + 1] * step) / scale,
                )
            })
        });

        out.push(BoundingBox {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
            confidence: score,
            landmarks,
        });
    }
}

/// Map stride levels to output tensor indices.
///
/// SCRFD exports either name their tensors ("score_8", "bbox_16", "kps_32",
/// ...) or use opaque numeric names. When every named tensor is present the
/// mapping follows the names; otherwise the standard positional layout is
/// assumed: [0-2] scores, [3-5] boxes, [6-8] keypoints.
fn find_output_slots(names: &[String]) -> [LevelSlots; 3] {
    let position = |prefix: &str, stride: usize| -> Option<usize> {
        let wanted = format!("{prefix}_{stride}");
        names.iter().position(|n| n == &wanted)
    };

    let all_named = STRIDES.iter().all(|&s| {
        position("score", s).is_some() && position("bbox", s).is_some() && position("kps", s).is_some()
    });

    if all_named {
        std::array::from_fn(|i| {
            let s = STRIDES[i];
            (
                position("score", s).unwrap(),
                position("bbox", s).unwrap(),
                position("kps", s).unwrap(),
            )
        })
    } else {
        tracing::info!(?names, "SCRFD output names not recognized, assuming positional layout");
        [(0, 3, 6), (1, 4, 7), (2, 5, 8)]
    }
}

/// Drop detections overlapping a higher-confidence detection by more than
/// `iou_limit`.
fn non_max_suppression(mut detections: Vec<BoundingBox>, iou_limit: f32) -> Vec<BoundingBox> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<BoundingBox> = Vec::new();
    for det in detections {
        if kept.iter().all(|k| iou(k, &det) <= iou_limit) {
            kept.push(det);
        }
    }
    kept
}

/// Intersection-over-union of two boxes.
fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let ix = (a.x + a.width).min(b.x + b.width) - a.x.max(b.x);
    let iy = (a.y + a.height).min(b.y + b.height) - a.y.max(b.y);
    let inter = ix.max(0.0) * iy.max(0.0);
    let union = a.width * a.height + b.width * b.height - inter;
    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: f32, y: f32, w: f32, h: f32, conf: f32) -> BoundingBox {
        BoundingBox {
            x,
            y,
            width: w,
            height: h,
            confidence: conf,
            landmarks: None,
        }
    }

    #[test]
    fn test_iou_identical() {
        let a = bbox(0.0, 0.0, 100.0, 100.0, 1.0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_disjoint() {
        let a = bbox(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = bbox(20.0, 20.0, 10.0, 10.0, 1.0);
        assert!(iou(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_iou_half_overlap() {
        let a = bbox(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = bbox(5.0, 0.0, 10.0, 10.0, 1.0);
        // intersection 50, union 150
        assert!((iou(&a, &b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_nms_keeps_best_of_overlapping_pair() {
        let dets = vec![
            bbox(0.0, 0.0, 100.0, 100.0, 0.9),
            bbox(5.0, 5.0, 100.0, 100.0, 0.8),
            bbox(200.0, 200.0, 50.0, 50.0, 0.7),
        ];
        let kept = non_max_suppression(dets, 0.4);
        assert_eq!(kept.len(), 2);
        assert!((kept[0].confidence - 0.9).abs() < 1e-6);
        assert!((kept[1].confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_nms_empty() {
        assert!(non_max_suppression(vec![], 0.4).is_empty());
    }

    #[test]
    fn test_decode_level_box_math() {
        let grid = INPUT_SIZE / 32;
        let anchors = grid * grid * ANCHORS_PER_CELL;
        let mut scores = vec![0.0f32; anchors];
        let mut deltas = vec![0.0f32; anchors * 4];
        let keypoints = vec![0.0f32; anchors * 10];

        // One confident anchor in cell (2, 1): anchor center (64, 32).
        let cell = grid + 2;
        let idx = cell * ANCHORS_PER_CELL;
        scores[idx] = 0.9;
        deltas[idx * 4] = 1.0; // left
        deltas[idx * 4 + 1] = 0.5; // top
        deltas[idx * 4 + 2] = 2.0; // right
        deltas[idx * 4 + 3] = 1.5; // bottom

        let mut out = Vec::new();
        decode_level(&scores, &deltas, &keypoints, 32, 0.5, &mut out);

        assert_eq!(out.len(), 1);
        let b = &out[0];
        // x1 = (64 - 32) / 0.5, y1 = (32 - 16) / 0.5
        assert!((b.x - 64.0).abs() < 1e-4);
        assert!((b.y - 32.0).abs() < 1e-4);
        // width = (right + left) * stride / scale = 96 / 0.5 … minus x1 math:
        // x2 = (64 + 64) / 0.5 = 256 → width 192
        assert!((b.width - 192.0).abs() < 1e-4);
        // y2 = (32 + 48) / 0.5 = 160 → height 128
        assert!((b.height - 128.0).abs() < 1e-4);
        assert!((b.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_decode_level_threshold_filters() {
        let grid = INPUT_SIZE / 32;
        let anchors = grid * grid * ANCHORS_PER_CELL;
        let scores = vec![CONFIDENCE_THRESHOLD; anchors]; // not strictly above
        let deltas = vec![1.0f32; anchors * 4];
        let keypoints = vec![0.0f32; anchors * 10];
        let mut out = Vec::new();
        decode_level(&scores, &deltas, &keypoints, 32, 1.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_find_output_slots_named() {
        let names: Vec<String> = [
            "score_8", "score_16", "score_32", "bbox_8", "bbox_16", "bbox_32", "kps_8", "kps_16",
            "kps_32",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(find_output_slots(&names), [(0, 3, 6), (1, 4, 7), (2, 5, 8)]);
    }

    #[test]
    fn test_find_output_slots_shuffled_named() {
        let names: Vec<String> = [
            "bbox_8", "kps_8", "score_8", "bbox_16", "kps_16", "score_16", "bbox_32", "kps_32",
            "score_32",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let slots = find_output_slots(&names);
        assert_eq!(slots[0], (2, 0, 1));
        assert_eq!(slots[1], (5, 3, 4));
        assert_eq!(slots[2], (8, 6, 7));
    }

    #[test]
    fn test_find_output_slots_positional_fallback() {
        let names: Vec<String> = (0..9).map(|i: usize| i.to_string()).collect();
        assert_eq!(find_output_slots(&names), [(0, 3, 6), (1, 4, 7), (2, 5, 8)]);
    }

    #[test]
    fn test_preprocess_normalization_and_padding() {
        // 4x2 uniform image: covered pixels normalize to (200-127.5)/128,
        // everything outside the letterbox stays exactly 0.
        let image = RgbImage::from_pixel(4, 2, image::Rgb([200, 200, 200]));
        let (tensor, scale) = preprocess(&image);
        assert!((scale - 160.0).abs() < 1e-4);

        let expected = (200.0 - NORM_MEAN) / NORM_STD;
        assert!((tensor[[0, 0, 0, 0]] - expected).abs() < 1e-6);
        // Below the resized region (height 2 * 160 = 320): padding.
        assert_eq!(tensor[[0, 0, INPUT_SIZE - 1, 0]], 0.0);
    }
}
