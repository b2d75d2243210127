// SPDX-License-Identifier: MIT OR Apache-2.0
//! Links (edges) between an output pin and an input pin.

use crate::frame::FrameContext;
use crate::geometry::{connector_points, distance_to_cubic, hit_test_curve};
use crate::id::PinRef;
use crate::style::PinStyle;
use egui::{Pos2, Stroke};

/// How far from the drawn curve, in pick radii, the approximation may still pick
const HIT_TEST_SLACK: f32 = 3.0;

/// A link from one output pin to one input pin.
///
/// Endpoints are fixed at construction. The graph's link registry owns every
/// link; both endpoint pins refer to it by [`LinkId`](crate::LinkId).
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    source: PinRef,
    destination: PinRef,
    hovered: bool,
    selected: bool,
}

impl Link {
    pub(crate) fn new(source: PinRef, destination: PinRef) -> Self {
        Self {
            source,
            destination,
            hovered: false,
            selected: false,
        }
    }

    /// Output pin the link starts at
    pub fn source(&self) -> PinRef {
        self.source
    }

    /// Input pin the link ends at
    pub fn destination(&self) -> PinRef {
        self.destination
    }

    /// Check if this link touches a pin
    pub fn involves(&self, pin: PinRef) -> bool {
        self.source == pin || self.destination == pin
    }

    /// Pointer was over the link on the last update
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Selected by a click
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Select or deselect
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Draw the link between `start` and `end` and handle picking.
    ///
    /// The pointer picks the link when it is near the drawn curve, or near the
    /// [`hit_test_curve`] approximation while still within a few radii of the
    /// drawn curve. Returns true when the user asked to delete it.
    pub(crate) fn update(&mut self, ctx: &mut FrameContext<'_>, start: Pos2, end: Pos2, style: &PinStyle) -> bool {
        let radius = ctx.config.link_hit_radius;
        let points = connector_points(start, end);
        self.hovered = ctx.surface.pointer_pos().is_some_and(|p| {
            let distance = distance_to_cubic(p, points);
            distance < radius || (distance < radius * HIT_TEST_SLACK && hit_test_curve(p, start, end, radius))
        });

        if ctx.surface.primary_pressed() {
            self.selected = self.hovered;
        }

        if self.selected {
            ctx.surface.cubic_bezier(
                points,
                Stroke::new(style.link_thickness + style.link_selected_outline_thickness, style.outline_color),
            );
        }
        let thickness = if self.hovered {
            style.link_hovered_thickness
        } else {
            style.link_thickness
        };
        ctx.surface.cubic_bezier(points, Stroke::new(thickness, style.color));

        self.selected && ctx.surface.delete_pressed()
    }
}
