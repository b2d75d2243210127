// SPDX-License-Identifier: MIT OR Apache-2.0
//! Draw surface the graph renders into each frame.
//!
//! The core never talks to egui directly: pins, links and nodes draw through
//! [`DrawSurface`] and read pointer state from it. [`EguiSurface`] is the
//! production implementation.

use egui::epaint::CubicBezierShape;
use egui::{Align2, Color32, FontId, Pos2, Rect, Stroke, Vec2};

/// Drawing primitives and pointer state for one frame
pub trait DrawSurface {
    /// Draw left-top anchored text and return its rect
    fn text(&mut self, pos: Pos2, text: &str, color: Color32) -> Rect;

    /// Fill a rounded rectangle
    fn rect_filled(&mut self, rect: Rect, rounding: f32, color: Color32);

    /// Outline a rounded rectangle
    fn rect_stroke(&mut self, rect: Rect, rounding: f32, stroke: Stroke);

    /// Fill a circle
    fn circle_filled(&mut self, center: Pos2, radius: f32, color: Color32);

    /// Outline a circle
    fn circle_stroke(&mut self, center: Pos2, radius: f32, stroke: Stroke);

    /// Draw a cubic Bezier curve
    fn cubic_bezier(&mut self, points: [Pos2; 4], stroke: Stroke);

    /// Run `add_contents` inside a grouped layout region starting at `pos`
    /// and return the region's bounding rect.
    fn group(&mut self, pos: Pos2, add_contents: &mut dyn FnMut(&mut dyn DrawSurface)) -> Rect;

    /// Rect of the most recently drawn item
    fn last_item_rect(&self) -> Rect;

    /// Screen position of the canvas origin
    fn canvas_origin(&self) -> Pos2;

    /// Current pointer position, if the pointer is over the surface
    fn pointer_pos(&self) -> Option<Pos2>;

    /// Primary button went down this frame
    fn primary_pressed(&self) -> bool;

    /// Primary button is held
    fn primary_down(&self) -> bool;

    /// Primary button went up this frame
    fn primary_released(&self) -> bool;

    /// The delete key was pressed this frame
    fn delete_pressed(&self) -> bool;

    /// Whether the pointer is inside `rect`
    fn is_rect_hovered(&self, rect: Rect) -> bool {
        self.pointer_pos().is_some_and(|p| rect.contains(p))
    }

    /// Whether the pointer is over the last drawn item
    fn is_item_hovered(&self) -> bool {
        self.is_rect_hovered(self.last_item_rect())
    }
}

/// [`DrawSurface`] over an egui `Ui`
pub struct EguiSurface<'a> {
    ui: &'a mut egui::Ui,
    painter: egui::Painter,
    font: FontId,
    origin: Pos2,
    last_item: Rect,
    bounds: Rect,
}

impl<'a> EguiSurface<'a> {
    /// Draw into the whole available area of `ui`
    pub fn new(ui: &'a mut egui::Ui) -> Self {
        let rect = ui.available_rect_before_wrap();
        Self::with_canvas(ui, rect)
    }

    /// Draw into `canvas`, clipped to it
    pub fn with_canvas(ui: &'a mut egui::Ui, canvas: Rect) -> Self {
        let painter = ui.painter_at(canvas);
        Self {
            ui,
            painter,
            font: FontId::proportional(14.0),
            origin: canvas.min,
            last_item: Rect::NOTHING,
            bounds: Rect::NOTHING,
        }
    }

    /// Override the label font
    pub fn with_font(mut self, font: FontId) -> Self {
        self.font = font;
        self
    }

    /// Underlying egui `Ui`, for hosts mixing widgets into custom pin renderers
    pub fn ui(&mut self) -> &mut egui::Ui {
        self.ui
    }

    fn touch(&mut self, rect: Rect) {
        self.last_item = rect;
        self.bounds = self.bounds.union(rect);
    }
}

impl DrawSurface for EguiSurface<'_> {
    fn text(&mut self, pos: Pos2, text: &str, color: Color32) -> Rect {
        let rect = self.painter.text(pos, Align2::LEFT_TOP, text, self.font.clone(), color);
        self.touch(rect);
        rect
    }

    fn rect_filled(&mut self, rect: Rect, rounding: f32, color: Color32) {
        self.painter.rect_filled(rect, rounding, color);
    }

    fn rect_stroke(&mut self, rect: Rect, rounding: f32, stroke: Stroke) {
        self.painter.rect_stroke(rect, rounding, stroke);
    }

    fn circle_filled(&mut self, center: Pos2, radius: f32, color: Color32) {
        self.painter.circle_filled(center, radius, color);
    }

    fn circle_stroke(&mut self, center: Pos2, radius: f32, stroke: Stroke) {
        self.painter.circle_stroke(center, radius, stroke);
    }

    fn cubic_bezier(&mut self, points: [Pos2; 4], stroke: Stroke) {
        self.painter.add(CubicBezierShape::from_points_stroke(
            points,
            false,
            Color32::TRANSPARENT,
            stroke,
        ));
    }

    fn group(&mut self, pos: Pos2, add_contents: &mut dyn FnMut(&mut dyn DrawSurface)) -> Rect {
        let clip = self.painter.clip_rect();
        let max_rect = Rect::from_min_max(pos, clip.max.max(pos + Vec2::splat(1.0)));
        let font = self.font.clone();
        let origin = self.origin;
        let inner = self.ui.allocate_new_ui(egui::UiBuilder::new().max_rect(max_rect), |ui| {
            let painter = ui.painter().with_clip_rect(clip);
            let mut child = EguiSurface {
                ui,
                painter,
                font,
                origin,
                last_item: Rect::NOTHING,
                bounds: Rect::NOTHING,
            };
            add_contents(&mut child);
            child.bounds
        });
        let drawn = inner.inner;
        let used = inner.response.rect;
        let rect = if drawn.is_positive() && used.is_positive() {
            drawn.union(used)
        } else if drawn.is_positive() {
            drawn
        } else {
            used
        };
        self.touch(rect);
        rect
    }

    fn last_item_rect(&self) -> Rect {
        self.last_item
    }

    fn canvas_origin(&self) -> Pos2 {
        self.origin
    }

    fn pointer_pos(&self) -> Option<Pos2> {
        self.ui
            .input(|i| i.pointer.hover_pos())
            .filter(|p| self.painter.clip_rect().contains(*p))
    }

    fn primary_pressed(&self) -> bool {
        self.ui.input(|i| i.pointer.primary_pressed())
    }

    fn primary_down(&self) -> bool {
        self.ui.input(|i| i.pointer.primary_down())
    }

    fn primary_released(&self) -> bool {
        self.ui.input(|i| i.pointer.primary_released())
    }

    fn delete_pressed(&self) -> bool {
        self.ui
            .input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace))
    }
}
