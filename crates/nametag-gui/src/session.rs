//! The engine thread: owns the camera, the models, and the gallery.
//!
//! The UI sends [`Request`]s and receives [`Event`]s over std mpsc channels;
//! all capture and inference state lives on this one thread, so ticks never
//! overlap and nothing is shared mutably. While the camera runs, the loop
//! paces itself with `recv_timeout` so UI requests interleave with capture.

use crate::config::Config;
use eframe::egui;
use image::RgbImage;
use nametag_core::{annotate, gallery, pipeline, FileReport, Gallery, OnnxFaceEngine, PipelineOptions};
use nametag_hw::Camera;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};

pub enum Request {
    LoadGallery(PathBuf),
    StartCamera,
    Shutdown,
}

pub enum Event {
    GalleryFile(FileReport),
    GalleryDone {
        loaded: usize,
        skipped: usize,
        total: usize,
    },
    CameraStarted {
        width: u32,
        height: u32,
    },
    Frame(AnnotatedFrame),
    Status(String),
}

/// One fully annotated RGB frame ready for texture upload.
pub struct AnnotatedFrame {
    pub rgb: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// UI-side handle. Dropping it shuts the engine thread down.
pub struct SessionHandle {
    tx: Sender<Request>,
    pub events: Receiver<Event>,
}

impl SessionHandle {
    pub fn send(&self, request: Request) {
        let _ = self.tx.send(request);
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(Request::Shutdown);
    }
}

/// Spawn the engine thread. Model loading happens on the thread so the
/// window opens immediately; a load failure is reported as a status event
/// and the thread exits.
pub fn spawn(config: Config, ctx: egui::Context) -> SessionHandle {
    let (req_tx, req_rx) = mpsc::channel();
    let (ev_tx, ev_rx) = mpsc::channel();

    std::thread::Builder::new()
        .name("nametag-engine".into())
        .spawn(move || run(config, req_rx, ev_tx, ctx))
        .expect("failed to spawn engine thread");

    SessionHandle {
        tx: req_tx,
        events: ev_rx,
    }
}

fn run(config: Config, rx: Receiver<Request>, tx: Sender<Event>, ctx: egui::Context) {
    tracing::info!("engine thread started");

    let mut engine = match OnnxFaceEngine::load(&config.model_dir) {
        Ok(engine) => engine,
        Err(err) => {
            tracing::error!(error = %err, "model load failed");
            let _ = tx.send(Event::Status(format!("model load failed: {err}")));
            ctx.request_repaint();
            return;
        }
    };
    let _ = tx.send(Event::Status("models loaded".to_string()));
    ctx.request_repaint();

    let mut gallery = Gallery::new();
    let mut camera: Option<Camera> = None;
    let opts = PipelineOptions {
        downsample: config.downsample,
        distance_threshold: config.distance_threshold,
    };

    loop {
        let request = if camera.is_some() {
            match rx.recv_timeout(config.tick_interval) {
                Ok(request) => Some(request),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(request) => Some(request),
                Err(_) => break,
            }
        };

        match request {
            Some(Request::Shutdown) => break,
            Some(Request::LoadGallery(dir)) => {
                load_gallery(&config, &mut engine, &mut gallery, &dir, &tx);
                ctx.request_repaint();
            }
            Some(Request::StartCamera) => {
                start_camera(&config, &mut camera, &tx);
                ctx.request_repaint();
            }
            None => {
                if let Some(cam) = camera.as_ref() {
                    tick(cam, &mut engine, &gallery, &opts, &tx, &ctx);
                }
            }
        }
    }

    tracing::info!("engine thread exiting");
}

fn load_gallery(
    config: &Config,
    engine: &mut OnnxFaceEngine,
    gallery: &mut Gallery,
    dir: &std::path::Path,
    tx: &Sender<Event>,
) {
    match gallery::load_directory(engine, dir, gallery, config.gallery_reload) {
        Ok(reports) => {
            let loaded = reports
                .iter()
                .filter(|r| matches!(r.outcome, nametag_core::FileOutcome::Loaded { .. }))
                .count();
            let skipped = reports.len() - loaded;
            for report in reports {
                let _ = tx.send(Event::GalleryFile(report));
            }
            let _ = tx.send(Event::GalleryDone {
                loaded,
                skipped,
                total: gallery.len(),
            });
        }
        Err(err) => {
            tracing::error!(error = %err, "gallery scan failed");
            let _ = tx.send(Event::Status(format!("gallery scan failed: {err}")));
        }
    }
}

fn start_camera(config: &Config, camera: &mut Option<Camera>, tx: &Sender<Event>) {
    if camera.is_some() {
        tracing::warn!("start requested while camera already running, ignoring");
        let _ = tx.send(Event::Status("camera already running".to_string()));
        return;
    }

    match Camera::open(&config.camera_device) {
        Ok(opened) => {
            opened.discard_warmup_frames(config.warmup_frames);
            let _ = tx.send(Event::CameraStarted {
                width: opened.width,
                height: opened.height,
            });
            *camera = Some(opened);
        }
        Err(err) => {
            tracing::error!(device = %config.camera_device, error = %err, "cannot open camera");
            let _ = tx.send(Event::Status(format!(
                "camera unavailable ({}): {err}",
                config.camera_device
            )));
        }
    }
}

/// One tick: capture, recognize, annotate, publish. A failed capture or
/// detection skips the tick; the loop stays healthy.
fn tick(
    camera: &Camera,
    engine: &mut OnnxFaceEngine,
    gallery: &Gallery,
    opts: &PipelineOptions,
    tx: &Sender<Event>,
    ctx: &egui::Context,
) {
    let frame = match camera.capture_frame() {
        Ok(frame) => frame,
        Err(err) => {
            tracing::debug!(error = %err, "frame acquisition failed, skipping tick");
            return;
        }
    };

    let Some(mut image) = RgbImage::from_raw(frame.width, frame.height, frame.data) else {
        tracing::debug!("frame buffer size mismatch, skipping tick");
        return;
    };

    let tags = match pipeline::recognize(engine, gallery, &image, opts) {
        Ok(tags) => tags,
        Err(err) => {
            tracing::warn!(error = %err, "detection failed, skipping tick");
            return;
        }
    };

    annotate::draw_tags(&mut image, &tags);

    let (width, height) = image.dimensions();
    let _ = tx.send(Event::Frame(AnnotatedFrame {
        rgb: image.into_raw(),
        width,
        height,
    }));
    ctx.request_repaint();
}
