//! View transform for the tree canvas
//!
//! One state struct (scale + translate) with explicit transitions. Zoom keys,
//! mouse drags and the auto-centering on first layout all go through
//! [`ViewController`], nothing else touches the transform.
//!
//! Projection follows CSS `scale(s) translate(tx, ty)` with the transform
//! origin at the viewport center:
//! `screen = center + s * (world + t - center)`.

use crate::tree::{Bounds, Point};

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.1;
/// Gap between the top of the canvas and the topmost card
pub const TOP_PADDING: f64 = 50.0;

/// Size of the drawing surface in virtual pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl ViewTransform {
    /// World coordinates → screen coordinates
    pub fn project(&self, p: Point, viewport: Viewport) -> Point {
        let c = viewport.center();
        Point::new(
            c.x + self.scale * (p.x + self.translate_x - c.x),
            c.y + self.scale * (p.y + self.translate_y - c.y),
        )
    }
}

/// Pointer buttons the canvas cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

impl From<crossterm::event::MouseButton> for PointerButton {
    fn from(button: crossterm::event::MouseButton) -> Self {
        match button {
            crossterm::event::MouseButton::Left => PointerButton::Primary,
            crossterm::event::MouseButton::Right => PointerButton::Secondary,
            crossterm::event::MouseButton::Middle => PointerButton::Middle,
        }
    }
}

/// An active drag: last pointer position seen, in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragGesture {
    last_x: f64,
    last_y: f64,
}

/// Owner of the view transform
#[derive(Debug, Default)]
pub struct ViewController {
    transform: ViewTransform,
    drag: Option<DragGesture>,
    centered_for: Option<Viewport>,
    pending_scale: Option<f64>,
}

impl ViewController {
    pub fn new() -> Self {
        Self {
            pending_scale: Some(1.0),
            ..Default::default()
        }
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn scale(&self) -> f64 {
        self.transform.scale
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.transform.scale + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.transform.scale - ZOOM_STEP);
    }

    /// Set the scale, clamped to `[MIN_SCALE, MAX_SCALE]`
    pub fn set_scale(&mut self, scale: f64) {
        let rounded = (scale * 100.0).round() / 100.0;
        let clamped = if rounded.is_finite() {
            rounded.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            self.transform.scale
        };
        self.transform.scale = clamped;
        self.pending_scale = Some(clamped);
    }

    /// Pan by a screen-space delta. Translate is never clamped.
    pub fn drag_by(&mut self, dx: f64, dy: f64) {
        self.transform.translate_x += dx;
        self.transform.translate_y += dy;
    }

    /// Start a drag gesture. Only the primary button starts one.
    pub fn begin_drag(&mut self, button: PointerButton, x: f64, y: f64) -> bool {
        if button != PointerButton::Primary {
            return false;
        }
        self.drag = Some(DragGesture { last_x: x, last_y: y });
        true
    }

    /// Pointer moved while a gesture may be active
    pub fn drag_to(&mut self, x: f64, y: f64) {
        let Some(gesture) = self.drag.as_mut() else {
            return;
        };
        let (dx, dy) = (x - gesture.last_x, y - gesture.last_y);
        gesture.last_x = x;
        gesture.last_y = y;
        self.drag_by(dx, dy);
    }

    /// Pointer released, wherever it is
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Put the top of the tree at the top of the viewport, horizontally centered
    pub fn recenter(&mut self, bounds: Bounds, viewport: Viewport, node_width: f64, node_height: f64) {
        self.transform.translate_x = viewport.width / 2.0 - node_width / 2.0;
        // Cards are drawn centered on their anchor
        self.transform.translate_y = TOP_PADDING + node_height / 2.0 - bounds.min_y;
        self.centered_for = Some(viewport);
        self.pending_scale = Some(self.transform.scale);
    }

    /// Recenter on the first layout and after the viewport changed size.
    /// Returns whether a recenter happened.
    pub fn ensure_centered(
        &mut self,
        bounds: Bounds,
        viewport: Viewport,
        node_width: f64,
        node_height: f64,
    ) -> bool {
        if self.centered_for == Some(viewport) {
            return false;
        }
        self.recenter(bounds, viewport, node_width, node_height);
        true
    }

    /// Scale to report to the host, if it changed since the last call
    pub fn take_scale_change(&mut self) -> Option<f64> {
        self.pending_scale.take()
    }
}
