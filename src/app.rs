//! Main application loop
//!
//! Each eframe update is one tick: pull a frame from the camera, maybe
//! dispatch a reading, render the annotated feed and the history chart,
//! and handle input. Rendering and input stay non-blocking; the only
//! blocking call is the camera's frame wait, which paces the loop.

use std::time::Instant;

use egui::{Color32, Key, Pos2, Rect, Sense};
use tracing::error;

use crate::capture::{CameraSource, CapturedFrame};
use crate::chart;
use crate::overlay::{draw_overlay, FrameMapping};
use crate::reader::ReadingScheduler;
use crate::selection::RegionSelector;

/// Height of the chart panel beneath the feed
const CHART_PANEL_HEIGHT: f32 = 260.0;

/// The main application
pub struct ThermoscopeApp {
    camera: CameraSource,
    scheduler: ReadingScheduler,
    selector: RegionSelector,
    /// Texture holding the current frame
    feed_texture: Option<egui::TextureHandle>,
    /// Size of the frame currently in the texture
    frame_size: (u32, u32),
}

impl ThermoscopeApp {
    /// Create the application around an opened camera and a scheduler
    pub fn new(camera: CameraSource, scheduler: ReadingScheduler) -> Self {
        Self {
            camera,
            scheduler,
            selector: RegionSelector::new(),
            feed_texture: None,
            frame_size: (0, 0),
        }
    }

    /// Window options sized to the camera resolution plus the chart panel
    pub fn options(camera: &CameraSource) -> eframe::NativeOptions {
        let width = (camera.width() as f32).max(640.0);
        let height = (camera.height() as f32).max(480.0) + CHART_PANEL_HEIGHT;

        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([width, height])
                .with_min_inner_size([640.0, 480.0])
                .with_title("Thermoscope"),
            ..Default::default()
        }
    }

    /// Upload the frame into the feed texture, recreating it on resize
    fn upload_frame(&mut self, ctx: &egui::Context, frame: &CapturedFrame) {
        let color_image = egui::ColorImage::from_rgb(
            [frame.width as usize, frame.height as usize],
            &frame.data,
        );

        let needs_new = self.feed_texture.is_none() || self.frame_size != frame.dimensions();
        if needs_new {
            self.feed_texture =
                Some(ctx.load_texture("camera_feed", color_image, egui::TextureOptions::LINEAR));
            self.frame_size = frame.dimensions();
        } else if let Some(texture) = &mut self.feed_texture {
            texture.set(color_image, egui::TextureOptions::LINEAR);
        }
    }

    /// Feed pointer drag events into the region selector, mapped to frame
    /// pixel coordinates.
    fn handle_drag(&mut self, response: &egui::Response, mapping: &FrameMapping) {
        let Some(pos) = response.interact_pointer_pos() else {
            return;
        };
        let (x, y) = mapping.to_frame_pos(pos);

        if response.drag_started() {
            self.selector.begin_drag(x, y);
        } else if response.dragged() {
            self.selector.update_drag(x, y);
        } else if response.drag_stopped() {
            self.selector.end_drag(x, y);
        }
    }

    /// Render the annotated live feed into the central panel
    fn show_feed(&mut self, ui: &mut egui::Ui, status_text: &str, busy: bool) {
        let Some(texture) = self.feed_texture.clone() else {
            ui.centered_and_justified(|ui| {
                ui.label("Waiting for camera...");
            });
            return;
        };

        // Scale to fit the panel while keeping the aspect ratio
        let tex_size = texture.size_vec2();
        let avail = ui.available_size();
        let scale = (avail.x / tex_size.x).min(avail.y / tex_size.y).min(1.0);
        let scaled = tex_size * scale;

        let (response, painter) = ui.allocate_painter(scaled, Sense::click_and_drag());
        painter.image(
            texture.id(),
            response.rect,
            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
            Color32::WHITE,
        );

        let mapping = FrameMapping {
            image_rect: response.rect,
            frame_size: self.frame_size,
        };

        self.handle_drag(&response, &mapping);

        draw_overlay(
            &painter,
            &mapping,
            self.selector.committed(),
            self.selector.drag_rect(),
            status_text,
            busy,
        );
    }
}

impl eframe::App for ThermoscopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Capture. A mid-loop failure ends the run cleanly; the camera is
        // released when the app is dropped.
        let frame = match self.camera.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Capture failed, exiting: {}", e);
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                return;
            }
        };

        self.upload_frame(ctx, &frame);

        // Dispatch a reading when due, cropping only then
        let now = Instant::now();
        if self.scheduler.due(now) {
            match self.selector.committed() {
                Some(rect) => {
                    self.scheduler.maybe_read(&frame.crop(&rect), now);
                }
                None => {
                    self.scheduler.maybe_read(&frame, now);
                }
            }
        }

        // Input
        if ctx.input(|i| i.key_pressed(Key::Q)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        if ctx.input(|i| i.key_pressed(Key::C)) {
            self.selector.clear();
        }

        // One short critical section for everything the render path needs
        let (status_text, busy, snapshot) = {
            let session = self.scheduler.session();
            let state = session.lock();
            (
                state.display_text.clone(),
                state.reading_in_progress,
                state.history.snapshot(),
            )
        };

        egui::TopBottomPanel::bottom("chart_panel")
            .exact_height(CHART_PANEL_HEIGHT)
            .show(ctx, |ui| {
                chart::show_chart(ui, &snapshot);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_feed(ui, &status_text, busy);
        });

        // Keep ticking; the camera wait paces the effective frame rate
        ctx.request_repaint();
    }
}
