//! The Nametag window: live annotated feed plus the two controls.

use crate::config::Config;
use crate::session::{self, Event, Request, SessionHandle};
use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};
use nametag_core::{FileOutcome, FileReport};

const LOG_CAPACITY: usize = 200;

pub struct NametagApp {
    session: SessionHandle,
    texture: Option<TextureHandle>,
    status: String,
    log: Vec<String>,
    known_faces: usize,
    camera_running: bool,
}

impl NametagApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config) -> Self {
        let session = session::spawn(config, cc.egui_ctx.clone());
        Self {
            session,
            texture: None,
            status: "load known faces, then start the camera".to_string(),
            log: Vec::new(),
            known_faces: 0,
            camera_running: false,
        }
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.session.events.try_recv() {
            match event {
                Event::Frame(frame) => {
                    let image = ColorImage::from_rgb(
                        [frame.width as usize, frame.height as usize],
                        &frame.rgb,
                    );
                    match &mut self.texture {
                        Some(texture) => texture.set(image, TextureOptions::LINEAR),
                        None => {
                            self.texture =
                                Some(ctx.load_texture("camera", image, TextureOptions::LINEAR))
                        }
                    }
                }
                Event::GalleryFile(report) => {
                    let line = describe_report(&report);
                    self.push_log(line);
                }
                Event::GalleryDone {
                    loaded,
                    skipped,
                    total,
                } => {
                    self.known_faces = total;
                    self.status =
                        format!("gallery: {loaded} loaded, {skipped} skipped — {total} known faces");
                }
                Event::CameraStarted { width, height } => {
                    self.camera_running = true;
                    self.status = format!("camera running at {width}×{height}");
                }
                Event::Status(message) => {
                    self.push_log(message.clone());
                    self.status = message;
                }
            }
        }
    }

    fn push_log(&mut self, line: String) {
        if self.log.len() >= LOG_CAPACITY {
            self.log.remove(0);
        }
        self.log.push(line);
    }
}

impl eframe::App for NametagApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events(ctx);

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui.button("Load Known Faces").clicked() {
                    if let Some(dir) = rfd::FileDialog::new()
                        .set_title("Select Known Faces Folder")
                        .pick_folder()
                    {
                        self.status = format!("loading gallery from {}", dir.display());
                        self.session.send(Request::LoadGallery(dir));
                    }
                }
                if ui.button("Start Camera").clicked() {
                    self.session.send(Request::StartCamera);
                }
                ui.separator();
                ui.label(&self.status);
            });
            egui::CollapsingHeader::new("Log").show(ui, |ui| {
                egui::ScrollArea::vertical()
                    .max_height(140.0)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for line in &self.log {
                            ui.monospace(line);
                        }
                    });
            });
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| match &self.texture {
            Some(texture) => {
                let size = texture.size_vec2();
                let avail = ui.available_size();
                let scale = (avail.x / size.x).min(avail.y / size.y);
                ui.centered_and_justified(|ui| {
                    ui.image((texture.id(), size * scale));
                });
            }
            None => {
                let hint = if self.camera_running {
                    "waiting for first frame…"
                } else {
                    "no camera feed — press Start Camera"
                };
                ui.centered_and_justified(|ui| {
                    ui.label(hint);
                });
            }
        });
    }
}

fn describe_report(report: &FileReport) -> String {
    let name = report
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| report.path.display().to_string());
    match &report.outcome {
        FileOutcome::Loaded { label } => format!("loaded: {name} → {label}"),
        FileOutcome::NoFace => format!("no face found in {name}"),
        FileOutcome::Failed { reason } => format!("error loading {name}: {reason}"),
    }
}
