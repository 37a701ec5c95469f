//! Frame overlay
//!
//! Composites the crop rectangle, drag feedback, status panel, and control
//! hints onto the displayed feed. Pure functions of their inputs; all state
//! lives with the caller.

use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Rounding, Stroke};

use crate::selection::CropRect;

const CROP_COLOR: Color32 = Color32::from_rgb(0, 200, 0);
const DRAG_COLOR: Color32 = Color32::from_rgb(0, 150, 255);
const READING_COLOR: Color32 = Color32::from_rgb(0, 255, 255);
const HINT_COLOR: Color32 = Color32::WHITE;
const PANEL_BG: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 180);

/// Mapping between frame pixel coordinates and the on-screen rect the
/// frame is drawn into. Shared by overlay drawing and pointer handling.
#[derive(Debug, Clone, Copy)]
pub struct FrameMapping {
    /// Screen rect the frame texture occupies
    pub image_rect: Rect,
    /// Source frame size in pixels
    pub frame_size: (u32, u32),
}

impl FrameMapping {
    /// Scale factors from frame pixels to screen points
    fn scale(&self) -> (f32, f32) {
        let (w, h) = self.frame_size;
        if w == 0 || h == 0 {
            return (1.0, 1.0);
        }
        (
            self.image_rect.width() / w as f32,
            self.image_rect.height() / h as f32,
        )
    }

    /// Map a frame-pixel rectangle to its on-screen rect
    pub fn to_screen_rect(&self, rect: &CropRect) -> Rect {
        let (sx, sy) = self.scale();
        Rect::from_min_size(
            Pos2::new(
                self.image_rect.min.x + rect.x as f32 * sx,
                self.image_rect.min.y + rect.y as f32 * sy,
            ),
            egui::vec2(rect.width as f32 * sx, rect.height as f32 * sy),
        )
    }

    /// Map an on-screen pointer position to frame pixel coordinates,
    /// clamped to the frame bounds.
    pub fn to_frame_pos(&self, pos: Pos2) -> (f32, f32) {
        let (sx, sy) = self.scale();
        let (w, h) = self.frame_size;
        let x = ((pos.x - self.image_rect.min.x) / sx).clamp(0.0, w as f32);
        let y = ((pos.y - self.image_rect.min.y) / sy).clamp(0.0, h as f32);
        (x, y)
    }
}

/// Draw the full overlay for one displayed frame
pub fn draw_overlay(
    painter: &Painter,
    mapping: &FrameMapping,
    crop: Option<CropRect>,
    drag: Option<CropRect>,
    status_text: &str,
    busy: bool,
) {
    if let Some(rect) = crop {
        painter.rect_stroke(
            mapping.to_screen_rect(&rect),
            Rounding::ZERO,
            Stroke::new(2.0, CROP_COLOR),
        );
    }

    if let Some(rect) = drag {
        let screen_rect = mapping.to_screen_rect(&rect);
        painter.rect_stroke(screen_rect, Rounding::ZERO, Stroke::new(2.0, DRAG_COLOR));

        // Live size readout while dragging
        let size_text = format!("{} x {}", rect.width, rect.height);
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            size_text,
            FontId::proportional(14.0),
            HINT_COLOR,
        );
    }

    draw_status_panel(painter, mapping.image_rect, status_text);
    draw_hints(painter, mapping.image_rect, crop.is_some(), busy);
}

/// Translucent panel anchored bottom-right, sized to fit the status text
fn draw_status_panel(painter: &Painter, area: Rect, status_text: &str) {
    let font = FontId::proportional(22.0);
    let galley = painter.layout_no_wrap(status_text.to_string(), font.clone(), READING_COLOR);

    let padding = egui::vec2(15.0, 12.0);
    let panel = Rect::from_min_max(
        area.max - galley.size() - padding * 2.0 - egui::vec2(10.0, 10.0),
        area.max - egui::vec2(10.0, 10.0),
    );

    painter.rect_filled(panel, Rounding::same(4.0), PANEL_BG);
    painter.galley(panel.min + padding, galley, READING_COLOR);
}

/// Fixed-position control hints and mode indicator
fn draw_hints(painter: &Painter, area: Rect, crop_set: bool, busy: bool) {
    let top_left = area.min + egui::vec2(10.0, 10.0);
    painter.text(
        top_left,
        Align2::LEFT_TOP,
        "Controls: [C]lear crop  [Q]uit",
        FontId::proportional(13.0),
        HINT_COLOR,
    );

    let mode = if crop_set {
        "Crop region set (green box)"
    } else {
        "Drag mouse to select gauge region"
    };
    let mode_color = if crop_set {
        CROP_COLOR
    } else {
        Color32::from_rgb(255, 165, 0)
    };
    painter.text(
        top_left + egui::vec2(0.0, 20.0),
        Align2::LEFT_TOP,
        mode,
        FontId::proportional(13.0),
        mode_color,
    );

    if busy {
        painter.text(
            Pos2::new(area.center().x, area.min.y + 10.0),
            Align2::CENTER_TOP,
            "Reading...",
            FontId::proportional(15.0),
            READING_COLOR,
        );
    }
}
