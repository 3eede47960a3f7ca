use nametag_core::{pipeline, GalleryReload};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration, loaded from `NAMETAG_*` environment variables.
pub struct Config {
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,
    /// Euclidean-distance threshold for the gallery match predicate.
    pub distance_threshold: f32,
    /// Linear downsampling factor applied before detection.
    pub downsample: f32,
    /// Recognition tick interval.
    pub tick_interval: Duration,
    /// Frames to discard after opening the camera (AGC/AE stabilization).
    pub warmup_frames: usize,
    /// Whether a fresh gallery load appends to or replaces earlier loads.
    pub gallery_reload: GalleryReload,
}

impl Config {
    pub fn from_env() -> Self {
        let model_dir = std::env::var("NAMETAG_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| nametag_core::default_model_dir());

        Self {
            camera_device: std::env::var("NAMETAG_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            model_dir,
            distance_threshold: env_f32(
                "NAMETAG_DISTANCE_THRESHOLD",
                pipeline::DEFAULT_DISTANCE_THRESHOLD,
            ),
            downsample: env_f32("NAMETAG_DOWNSAMPLE", pipeline::DEFAULT_DOWNSAMPLE)
                .clamp(0.05, 1.0),
            tick_interval: Duration::from_millis(env_u64("NAMETAG_TICK_MS", 30)),
            warmup_frames: env_usize("NAMETAG_WARMUP_FRAMES", 4),
            gallery_reload: parse_reload(
                std::env::var("NAMETAG_GALLERY_RELOAD").as_deref().unwrap_or(""),
            ),
        }
    }
}

fn parse_reload(value: &str) -> GalleryReload {
    if value.eq_ignore_ascii_case("replace") {
        GalleryReload::Replace
    } else {
        GalleryReload::Append
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
