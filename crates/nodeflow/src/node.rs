// SPDX-License-Identifier: MIT OR Apache-2.0
//! Nodes and their pins.
//!
//! A node owns two kinds of pins. Static pins are declared once, usually in
//! [`NodeBehavior::setup`], and live until dropped. Dynamic pins are declared
//! every frame from [`NodeBehavior::draw`] through [`NodeUi`]; each frame
//! records which dynamic identifiers were requested and the graph sweeps the
//! rest once the node has been drawn.

use crate::config::DuplicatePinPolicy;
use crate::frame::FrameContext;
use crate::id::{NodeId, PinKind, PinUid};
use crate::pin::Pin;
use crate::style::NodeStyle;
use crate::surface::DrawSurface;
use egui::{Pos2, Rect, Stroke, Vec2};
use std::collections::HashSet;
use std::hash::Hash;

/// User-defined behaviour of a node
pub trait NodeBehavior: 'static {
    /// Called once when the node is added, to declare static pins and title
    fn setup(&mut self, _node: &mut Node) {}

    /// Called every frame to draw the body and declare dynamic pins
    fn draw(&mut self, _ui: &mut NodeUi<'_>) {}
}

/// Closures act as setup-only behaviours
impl<F> NodeBehavior for F
where
    F: FnMut(&mut Node) + 'static,
{
    fn setup(&mut self, node: &mut Node) {
        self(node);
    }
}

/// A node instance in the graph
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    title: String,
    /// Position in graph space
    position: Pos2,
    size: Vec2,
    style: Option<NodeStyle>,
    inputs: Vec<Pin>,
    outputs: Vec<Pin>,
    dynamic_inputs: Vec<Pin>,
    dynamic_outputs: Vec<Pin>,
    requested_inputs: HashSet<PinUid>,
    requested_outputs: HashSet<PinUid>,
    duplicate_pins: DuplicatePinPolicy,
    inputs_width: f32,
    outputs_width: f32,
    header_height: f32,
    destroyed: bool,
}

impl Node {
    pub(crate) fn new(id: NodeId, duplicate_pins: DuplicatePinPolicy) -> Self {
        Self {
            id,
            title: String::new(),
            position: Pos2::ZERO,
            size: Vec2::ZERO,
            style: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            dynamic_inputs: Vec::new(),
            dynamic_outputs: Vec::new(),
            requested_inputs: HashSet::new(),
            requested_outputs: HashSet::new(),
            duplicate_pins,
            inputs_width: 0.0,
            outputs_width: 0.0,
            header_height: 0.0,
            destroyed: false,
        }
    }

    /// Unique instance ID
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Header title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the header title
    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    /// Position in graph space
    pub fn position(&self) -> Pos2 {
        self.position
    }

    /// Move the node
    pub fn set_position(&mut self, position: Pos2) -> &mut Self {
        self.position = position;
        self
    }

    /// Size measured on the last update
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Style, if one was set
    pub fn style(&self) -> Option<&NodeStyle> {
        self.style.as_ref()
    }

    /// Set the style
    pub fn set_style(&mut self, style: NodeStyle) -> &mut Self {
        self.style = Some(style);
        self
    }

    pub(crate) fn set_duplicate_policy(&mut self, policy: DuplicatePinPolicy) {
        self.duplicate_pins = policy;
    }

    /// Ask the graph to remove this node at the end of the frame
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    /// Whether [`Node::destroy`] was called
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Declare a static input named `name`, keyed by its name
    pub fn add_input<T: 'static>(&mut self, name: &str) -> Option<&mut Pin> {
        self.add_input_uid::<T>(name, name)
    }

    /// Declare a static input keyed by `key`
    pub fn add_input_uid<T: 'static>(&mut self, key: impl Hash, name: &str) -> Option<&mut Pin> {
        let uid = PinUid::new(key);
        if self.check_duplicate(PinKind::Input, uid, name) {
            return None;
        }
        self.inputs.push(Pin::input::<T>(self.id, uid, name));
        self.inputs.last_mut()
    }

    /// Declare a static output named `name`, keyed by its name
    pub fn add_output<T: 'static>(&mut self, name: &str) -> Option<&mut Pin> {
        self.add_output_uid::<T>(name, name)
    }

    /// Declare a static output keyed by `key`
    pub fn add_output_uid<T: 'static>(&mut self, key: impl Hash, name: &str) -> Option<&mut Pin> {
        let uid = PinUid::new(key);
        if self.check_duplicate(PinKind::Output, uid, name) {
            return None;
        }
        self.outputs.push(Pin::output::<T>(self.id, uid, name));
        self.outputs.last_mut()
    }

    fn check_duplicate(&self, kind: PinKind, uid: PinUid, name: &str) -> bool {
        if self.pin(kind, uid).is_none() {
            return false;
        }
        match self.duplicate_pins {
            DuplicatePinPolicy::Ignore => {
                tracing::warn!("Node {:?} already has {:?} pin {:?}, ignoring", self.title, kind, name);
                true
            }
            DuplicatePinPolicy::Panic => {
                panic!("Node {:?} already has {kind:?} pin {name:?} ({uid:?})", self.title)
            }
        }
    }

    /// Remove a static pin without touching its links. The graph tears them down.
    pub(crate) fn take_pin(&mut self, kind: PinKind, uid: PinUid) -> Option<Pin> {
        let pins = match kind {
            PinKind::Input => &mut self.inputs,
            PinKind::Output => &mut self.outputs,
        };
        let index = pins.iter().position(|p| p.uid() == uid)?;
        Some(pins.remove(index))
    }

    /// Show a dynamic input this frame and return its current value
    pub fn show_input<T: Clone + Default + 'static>(&mut self, name: &str) -> T {
        self.show_input_uid_with::<T>(name, name, |_| {})
    }

    /// Show a dynamic input keyed by `key` and return its current value
    pub fn show_input_uid<T: Clone + Default + 'static>(&mut self, key: impl Hash, name: &str) -> T {
        self.show_input_uid_with::<T>(key, name, |_| {})
    }

    /// Show a dynamic input, running `configure` only when the pin is first created
    pub fn show_input_uid_with<T: Clone + Default + 'static>(
        &mut self,
        key: impl Hash,
        name: &str,
        configure: impl FnOnce(&mut Pin),
    ) -> T {
        let uid = PinUid::new(key);
        if let Some(pin) = self.inputs.iter().find(|p| p.uid() == uid) {
            let value = pin.value::<T>().unwrap_or_default();
            self.check_duplicate(PinKind::Input, uid, name);
            return value;
        }
        self.requested_inputs.insert(uid);
        if let Some(pin) = self.dynamic_inputs.iter().find(|p| p.uid() == uid) {
            return pin.value::<T>().unwrap_or_default();
        }

        let mut pin = Pin::input::<T>(self.id, uid, name);
        configure(&mut pin);
        let value = pin.value::<T>().unwrap_or_default();
        self.dynamic_inputs.push(pin);
        value
    }

    /// Show a dynamic output this frame carrying `value`
    pub fn show_output<T: 'static>(&mut self, name: &str, value: T) {
        self.show_output_uid_with(name, name, value, |_| {});
    }

    /// Show a dynamic output keyed by `key` carrying `value`
    pub fn show_output_uid<T: 'static>(&mut self, key: impl Hash, name: &str, value: T) {
        self.show_output_uid_with(key, name, value, |_| {});
    }

    /// Show a dynamic output, running `configure` only when the pin is first created
    pub fn show_output_uid_with<T: 'static>(
        &mut self,
        key: impl Hash,
        name: &str,
        value: T,
        configure: impl FnOnce(&mut Pin),
    ) {
        let uid = PinUid::new(key);
        if self.outputs.iter().any(|p| p.uid() == uid) {
            self.check_duplicate(PinKind::Output, uid, name);
            return;
        }
        self.requested_outputs.insert(uid);
        if let Some(pin) = self.dynamic_outputs.iter_mut().find(|p| p.uid() == uid) {
            pin.set_value(value);
            return;
        }

        let mut pin = Pin::output::<T>(self.id, uid, name);
        configure(&mut pin);
        pin.set_value(value);
        self.dynamic_outputs.push(pin);
    }

    /// Remove dynamic pins that were not requested since the last sweep
    pub(crate) fn sweep_dynamic(&mut self) -> Vec<Pin> {
        let requested_inputs = std::mem::take(&mut self.requested_inputs);
        let requested_outputs = std::mem::take(&mut self.requested_outputs);

        let (inputs, mut stale): (Vec<Pin>, Vec<Pin>) = std::mem::take(&mut self.dynamic_inputs)
            .into_iter()
            .partition(|p| requested_inputs.contains(&p.uid()));
        let (outputs, stale_outputs): (Vec<Pin>, Vec<Pin>) = std::mem::take(&mut self.dynamic_outputs)
            .into_iter()
            .partition(|p| requested_outputs.contains(&p.uid()));

        self.dynamic_inputs = inputs;
        self.dynamic_outputs = outputs;
        stale.extend(stale_outputs);
        if !stale.is_empty() {
            tracing::trace!("Node {:?} swept {} dynamic pins", self.title, stale.len());
        }
        stale
    }

    /// Find a static or dynamic pin
    pub fn pin(&self, kind: PinKind, uid: PinUid) -> Option<&Pin> {
        let (fixed, dynamic) = match kind {
            PinKind::Input => (&self.inputs, &self.dynamic_inputs),
            PinKind::Output => (&self.outputs, &self.dynamic_outputs),
        };
        fixed.iter().chain(dynamic).find(|p| p.uid() == uid)
    }

    /// Find a static or dynamic pin mutably
    pub fn pin_mut(&mut self, kind: PinKind, uid: PinUid) -> Option<&mut Pin> {
        let (fixed, dynamic) = match kind {
            PinKind::Input => (&mut self.inputs, &mut self.dynamic_inputs),
            PinKind::Output => (&mut self.outputs, &mut self.dynamic_outputs),
        };
        fixed.iter_mut().chain(dynamic.iter_mut()).find(|p| p.uid() == uid)
    }

    /// Look up an input pin by the key it was declared with
    ///
    /// # Panics
    ///
    /// Panics if no static or dynamic input has that key.
    pub fn in_pin(&self, key: impl Hash) -> &Pin {
        let uid = PinUid::new(key);
        self.pin(PinKind::Input, uid)
            .unwrap_or_else(|| panic!("Input pin {uid:?} not found on node {:?}", self.title))
    }

    /// Look up an output pin by the key it was declared with
    ///
    /// # Panics
    ///
    /// Panics if no static or dynamic output has that key.
    pub fn out_pin(&self, key: impl Hash) -> &Pin {
        let uid = PinUid::new(key);
        self.pin(PinKind::Output, uid)
            .unwrap_or_else(|| panic!("Output pin {uid:?} not found on node {:?}", self.title))
    }

    /// Mutable [`Node::in_pin`]
    ///
    /// # Panics
    ///
    /// Panics if no static or dynamic input has that key.
    pub fn in_pin_mut(&mut self, key: impl Hash) -> &mut Pin {
        let uid = PinUid::new(key);
        let title = self.title.clone();
        self.pin_mut(PinKind::Input, uid)
            .unwrap_or_else(|| panic!("Input pin {uid:?} not found on node {title:?}"))
    }

    /// Mutable [`Node::out_pin`]
    ///
    /// # Panics
    ///
    /// Panics if no static or dynamic output has that key.
    pub fn out_pin_mut(&mut self, key: impl Hash) -> &mut Pin {
        let uid = PinUid::new(key);
        let title = self.title.clone();
        self.pin_mut(PinKind::Output, uid)
            .unwrap_or_else(|| panic!("Output pin {uid:?} not found on node {title:?}"))
    }

    /// Non-panicking input lookup
    pub fn try_in_pin(&self, key: impl Hash) -> Option<&Pin> {
        self.pin(PinKind::Input, PinUid::new(key))
    }

    /// Non-panicking output lookup
    pub fn try_out_pin(&self, key: impl Hash) -> Option<&Pin> {
        self.pin(PinKind::Output, PinUid::new(key))
    }

    /// Static then dynamic inputs
    pub fn inputs(&self) -> impl Iterator<Item = &Pin> {
        self.inputs.iter().chain(&self.dynamic_inputs)
    }

    /// Static then dynamic outputs
    pub fn outputs(&self) -> impl Iterator<Item = &Pin> {
        self.outputs.iter().chain(&self.dynamic_outputs)
    }

    pub(crate) fn pins_mut(&mut self) -> impl Iterator<Item = &mut Pin> {
        self.inputs
            .iter_mut()
            .chain(self.dynamic_inputs.iter_mut())
            .chain(self.outputs.iter_mut())
            .chain(self.dynamic_outputs.iter_mut())
    }

    /// Lay out and draw the node with its top-left at `screen_pos`
    pub(crate) fn update(&mut self, ctx: &mut FrameContext<'_>, behavior: &mut dyn NodeBehavior, screen_pos: Pos2) {
        let style = self.style.clone().unwrap_or_default();
        let frame = Rect::from_min_size(screen_pos, self.size);
        if self.size != Vec2::ZERO {
            ctx.surface.rect_filled(frame, style.radius, style.bg);
            let header = Rect::from_min_size(screen_pos, Vec2::new(self.size.x, self.header_height));
            ctx.surface.rect_filled(header, style.radius, style.header_color);
        }

        let title = ctx
            .surface
            .text(screen_pos + style.padding, &self.title, style.header_title_color);
        let header_bottom = title.max.y + style.padding.y;
        self.header_height = header_bottom - screen_pos.y;

        let left = screen_pos.x + style.padding.x;
        let top = header_bottom + style.padding.y;

        // Body first so dynamic pins exist before the pin columns are drawn.
        let body_pos = Pos2::new(left + self.inputs_width + style.column_gap, top);
        let body = ctx.surface.group(body_pos, &mut |surface: &mut dyn DrawSurface| {
            behavior.draw(&mut NodeUi {
                node: &mut *self,
                surface,
                cursor: body_pos,
            });
        });

        let mut bottom = body.max.y.max(top);
        let mut inputs_width: f32 = 0.0;
        let mut y = top;
        for pin in self.inputs.iter_mut().chain(self.dynamic_inputs.iter_mut()) {
            pin.set_pos(Pos2::new(left, y));
            pin.update(ctx);
            inputs_width = inputs_width.max(pin.size().x);
            y += pin.size().y + pin.style().padding.y * 2.0 + style.padding.y;
        }
        bottom = bottom.max(y);
        self.inputs_width = inputs_width;

        let body_right = if body.width() > 0.0 { body.max.x } else { left + inputs_width };
        let column = body_right + style.column_gap;
        let mut outputs_width: f32 = 0.0;
        let mut y = top;
        for pin in self.outputs.iter_mut().chain(self.dynamic_outputs.iter_mut()) {
            let x = column + (self.outputs_width - pin.size().x).max(0.0);
            pin.set_pos(Pos2::new(x, y));
            pin.update(ctx);
            outputs_width = outputs_width.max(pin.size().x);
            y += pin.size().y + pin.style().padding.y * 2.0 + style.padding.y;
        }
        bottom = bottom.max(y);
        self.outputs_width = outputs_width;

        let right = (column + outputs_width).max(title.max.x) + style.padding.x;
        self.size = Vec2::new(right - screen_pos.x, bottom - screen_pos.y);

        let pin_hovered = ctx.hovered().is_some_and(|p| p.node == self.id);
        let border = if pin_hovered {
            style.border_hovered_color
        } else {
            style.border_color
        };
        ctx.surface.rect_stroke(
            Rect::from_min_size(screen_pos, self.size),
            style.radius,
            Stroke::new(style.border_thickness, border),
        );
    }
}

/// Per-frame handle given to [`NodeBehavior::draw`]
pub struct NodeUi<'a> {
    node: &'a mut Node,
    surface: &'a mut dyn DrawSurface,
    cursor: Pos2,
}

impl<'a> NodeUi<'a> {
    /// The node being drawn
    pub fn node(&self) -> &Node {
        &*self.node
    }

    /// The node being drawn, mutably
    pub fn node_mut(&mut self) -> &mut Node {
        &mut *self.node
    }

    /// Surface for drawing the node body
    pub fn surface(&mut self) -> &mut dyn DrawSurface {
        &mut *self.surface
    }

    /// See [`Node::show_input`]
    pub fn show_input<T: Clone + Default + 'static>(&mut self, name: &str) -> T {
        self.node.show_input::<T>(name)
    }

    /// See [`Node::show_input_uid`]
    pub fn show_input_uid<T: Clone + Default + 'static>(&mut self, key: impl Hash, name: &str) -> T {
        self.node.show_input_uid::<T>(key, name)
    }

    /// See [`Node::show_input_uid_with`]
    pub fn show_input_uid_with<T: Clone + Default + 'static>(
        &mut self,
        key: impl Hash,
        name: &str,
        configure: impl FnOnce(&mut Pin),
    ) -> T {
        self.node.show_input_uid_with::<T>(key, name, configure)
    }

    /// See [`Node::show_output`]
    pub fn show_output<T: 'static>(&mut self, name: &str, value: T) {
        self.node.show_output(name, value);
    }

    /// See [`Node::show_output_uid`]
    pub fn show_output_uid<T: 'static>(&mut self, key: impl Hash, name: &str, value: T) {
        self.node.show_output_uid(key, name, value);
    }

    /// Draw a line of body text below the previous one
    pub fn label(&mut self, text: &str) -> Rect {
        let rect = self.surface.text(self.cursor, text, egui::Color32::from_gray(200));
        self.cursor.y = rect.max.y;
        rect
    }
}
