// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-frame update context.

use crate::config::GraphConfig;
use crate::id::PinRef;
use crate::surface::DrawSurface;

/// State threaded through one frame of node and pin updates
pub struct FrameContext<'a> {
    /// Surface everything draws into this frame
    pub surface: &'a mut dyn DrawSurface,
    /// Graph settings
    pub config: &'a GraphConfig,
    hovered: Option<PinRef>,
}

impl<'a> FrameContext<'a> {
    /// Start a frame with nothing hovered
    pub fn new(surface: &'a mut dyn DrawSurface, config: &'a GraphConfig) -> Self {
        Self {
            surface,
            config,
            hovered: None,
        }
    }

    /// Report that `pin` is under the pointer. The last report of a frame wins.
    pub fn hover(&mut self, pin: PinRef) {
        self.hovered = Some(pin);
    }

    /// Pin hovered so far this frame
    pub fn hovered(&self) -> Option<PinRef> {
        self.hovered
    }
}
