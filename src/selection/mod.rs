//! Region selection for the inference crop
//!
//! Tracks a pointer-drag gesture over the live feed and commits a rectangular
//! region of interest. Coordinates are frame pixels, not screen points; the
//! UI layer maps pointer positions before feeding events in.

use tracing::{debug, info};

/// Minimum committed dimension in pixels. Drags at or below this in either
/// axis are discarded.
const MIN_SELECTION_PX: f32 = 10.0;

/// A committed crop rectangle in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Create a new crop rectangle
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build the normalized rectangle spanned by two corner points,
    /// regardless of drag direction.
    pub fn from_corners(a: (f32, f32), b: (f32, f32)) -> Self {
        let min_x = a.0.min(b.0).max(0.0);
        let min_y = a.1.min(b.1).max(0.0);
        let max_x = a.0.max(b.0).max(0.0);
        let max_y = a.1.max(b.1).max(0.0);

        Self {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x) as u32,
            height: (max_y - min_y) as u32,
        }
    }
}

/// Outcome of releasing a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// A new rectangle was committed
    Committed(CropRect),
    /// The drag spanned 10 px or less in at least one axis and was discarded
    TooSmall,
    /// Release arrived without a matching press
    NotDragging,
}

/// Drag state machine over pointer events.
///
/// `Idle -> Dragging` on press, `Dragging -> Dragging` on move,
/// `Dragging -> Idle` on release. The committed rectangle persists across
/// drags until replaced or cleared.
#[derive(Debug, Clone, Default)]
pub struct RegionSelector {
    drag: Option<Drag>,
    committed: Option<CropRect>,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    start: (f32, f32),
    current: (f32, f32),
}

impl RegionSelector {
    /// Create a selector with no committed region
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer pressed at the given frame coordinates
    pub fn begin_drag(&mut self, x: f32, y: f32) {
        self.drag = Some(Drag {
            start: (x, y),
            current: (x, y),
        });
    }

    /// Pointer moved while held; updates the provisional end point
    pub fn update_drag(&mut self, x: f32, y: f32) {
        if let Some(drag) = &mut self.drag {
            drag.current = (x, y);
        }
    }

    /// Pointer released; commits the normalized rectangle iff both
    /// dimensions exceed the minimum size, otherwise discards the drag and
    /// leaves any previously committed rectangle unchanged.
    pub fn end_drag(&mut self, x: f32, y: f32) -> SelectionOutcome {
        let Some(drag) = self.drag.take() else {
            return SelectionOutcome::NotDragging;
        };

        let end = (x, y);
        let dx = (end.0 - drag.start.0).abs();
        let dy = (end.1 - drag.start.1).abs();

        if dx > MIN_SELECTION_PX && dy > MIN_SELECTION_PX {
            let rect = CropRect::from_corners(drag.start, end);
            info!("Crop region set: {:?}", rect);
            self.committed = Some(rect);
            SelectionOutcome::Committed(rect)
        } else {
            debug!("Selection too small ({}x{}), discarded", dx, dy);
            SelectionOutcome::TooSmall
        }
    }

    /// Clear the committed region and cancel any drag in progress
    pub fn clear(&mut self) {
        self.drag = None;
        self.committed = None;
        info!("Crop region cleared");
    }

    /// The committed crop rectangle, if any
    pub fn committed(&self) -> Option<CropRect> {
        self.committed
    }

    /// Whether a drag is currently in progress
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// The provisional rectangle of an in-progress drag, for drawing
    pub fn drag_rect(&self) -> Option<CropRect> {
        self.drag
            .map(|d| CropRect::from_corners(d.start, d.current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_normalizes_forward_drag() {
        let mut sel = RegionSelector::new();
        sel.begin_drag(100.0, 200.0);
        sel.update_drag(250.0, 300.0);
        let outcome = sel.end_drag(300.0, 400.0);

        assert_eq!(
            outcome,
            SelectionOutcome::Committed(CropRect::new(100, 200, 200, 200))
        );
        assert_eq!(sel.committed(), Some(CropRect::new(100, 200, 200, 200)));
    }

    #[test]
    fn test_commit_normalizes_reversed_drag() {
        // Dragging bottom-right to top-left yields the same rectangle
        let mut sel = RegionSelector::new();
        sel.begin_drag(300.0, 400.0);
        let outcome = sel.end_drag(100.0, 200.0);

        assert_eq!(
            outcome,
            SelectionOutcome::Committed(CropRect::new(100, 200, 200, 200))
        );
    }

    #[test]
    fn test_small_drag_is_discarded() {
        let mut sel = RegionSelector::new();
        sel.begin_drag(100.0, 100.0);
        assert_eq!(sel.end_drag(108.0, 300.0), SelectionOutcome::TooSmall);
        assert_eq!(sel.committed(), None);

        // Exactly at the threshold is still too small
        sel.begin_drag(100.0, 100.0);
        assert_eq!(sel.end_drag(110.0, 110.0), SelectionOutcome::TooSmall);
        assert_eq!(sel.committed(), None);
    }

    #[test]
    fn test_small_drag_keeps_previous_rect() {
        let mut sel = RegionSelector::new();
        sel.begin_drag(0.0, 0.0);
        sel.end_drag(100.0, 100.0);
        let first = sel.committed();
        assert!(first.is_some());

        sel.begin_drag(50.0, 50.0);
        assert_eq!(sel.end_drag(55.0, 55.0), SelectionOutcome::TooSmall);
        assert_eq!(sel.committed(), first);
    }

    #[test]
    fn test_replacement_and_clear() {
        let mut sel = RegionSelector::new();
        sel.begin_drag(0.0, 0.0);
        sel.end_drag(50.0, 50.0);
        sel.begin_drag(10.0, 10.0);
        sel.end_drag(90.0, 90.0);
        assert_eq!(sel.committed(), Some(CropRect::new(10, 10, 80, 80)));

        sel.clear();
        assert_eq!(sel.committed(), None);
        assert!(!sel.is_dragging());
    }

    #[test]
    fn test_release_without_press() {
        let mut sel = RegionSelector::new();
        assert_eq!(sel.end_drag(50.0, 50.0), SelectionOutcome::NotDragging);
    }

    #[test]
    fn test_drag_rect_tracks_pointer() {
        let mut sel = RegionSelector::new();
        assert_eq!(sel.drag_rect(), None);

        sel.begin_drag(20.0, 30.0);
        sel.update_drag(60.0, 10.0);
        assert!(sel.is_dragging());
        assert_eq!(sel.drag_rect(), Some(CropRect::new(20, 10, 40, 20)));
    }

    #[test]
    fn test_corners_clamped_to_origin() {
        // Drags that leave the frame clamp at zero rather than underflowing
        let rect = CropRect::from_corners((-20.0, -10.0), (80.0, 40.0));
        assert_eq!(rect, CropRect::new(0, 0, 80, 40));
    }
}
