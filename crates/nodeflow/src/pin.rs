// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed connection points on nodes.
//!
//! A [`Pin`] is either an input or an output. Pins never own links: they keep
//! the [`LinkId`]s of the links touching them, and the graph's link registry is
//! the single owner. A pin whose list mentions a link the registry no longer
//! holds simply drops the stale id on the next prune.

use crate::frame::FrameContext;
use crate::id::{LinkId, NodeId, PinKind, PinRef, PinUid};
use crate::link::Link;
use crate::style::PinStyle;
use crate::surface::DrawSurface;
use egui::{Color32, Pos2, Rect, Stroke, Vec2};
use slotmap::SlotMap;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::rc::Rc;

/// Acceptance filter called as `filter(source, destination)`
pub type PinFilter = Box<dyn Fn(&Pin, &Pin) -> bool>;

/// Custom pin renderer replacing the default label and socket
pub type PinRenderer = Box<dyn Fn(&Pin, &mut dyn DrawSurface)>;

/// Shared, type-erased pin value
pub type PinValue = Rc<dyn Any>;

const LABEL_COLOR: Color32 = Color32::from_gray(220);

/// Declared value type of a pin
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinType {
    id: TypeId,
    name: &'static str,
}

impl PinType {
    /// The pin type carrying values of `T`
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Whether this is the pin type of `T`
    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Rust type name, for tooltips and logs
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Raw type id
    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl fmt::Debug for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Built-in acceptance filters
pub mod filters {
    use super::Pin;
    use std::any::TypeId;

    /// Accept every connection
    pub fn none(_source: &Pin, _destination: &Pin) -> bool {
        true
    }

    /// Accept only matching value types. Input pins use this unless a filter is set.
    pub fn same_type(source: &Pin, destination: &Pin) -> bool {
        source.pin_type() == destination.pin_type()
    }

    /// Accept any primitive number on both ends
    pub fn numbers(source: &Pin, destination: &Pin) -> bool {
        is_number(source.pin_type().type_id()) && is_number(destination.pin_type().type_id())
    }

    fn is_number(id: TypeId) -> bool {
        [
            TypeId::of::<i8>(),
            TypeId::of::<i16>(),
            TypeId::of::<i32>(),
            TypeId::of::<i64>(),
            TypeId::of::<i128>(),
            TypeId::of::<isize>(),
            TypeId::of::<u8>(),
            TypeId::of::<u16>(),
            TypeId::of::<u32>(),
            TypeId::of::<u64>(),
            TypeId::of::<u128>(),
            TypeId::of::<usize>(),
            TypeId::of::<f32>(),
            TypeId::of::<f64>(),
        ]
        .contains(&id)
    }
}

/// A named, typed connection point on a node
pub struct Pin {
    uid: PinUid,
    name: String,
    kind: PinKind,
    pin_type: PinType,
    node: NodeId,
    style: PinStyle,
    links: Vec<LinkId>,
    renderer: Option<PinRenderer>,
    filter: Option<PinFilter>,
    /// Output: current value. Input: default used while unconnected.
    value: Option<PinValue>,
    /// Value flowing in through the first link, refreshed once per frame
    incoming: Option<PinValue>,
    pos: Pos2,
    size: Vec2,
}

impl Pin {
    /// Create an input pin carrying `T`
    pub fn input<T: 'static>(node: NodeId, uid: PinUid, name: impl Into<String>) -> Self {
        Self::new(node, uid, name.into(), PinKind::Input, PinType::of::<T>())
    }

    /// Create an output pin carrying `T`
    pub fn output<T: 'static>(node: NodeId, uid: PinUid, name: impl Into<String>) -> Self {
        Self::new(node, uid, name.into(), PinKind::Output, PinType::of::<T>())
    }

    fn new(node: NodeId, uid: PinUid, name: String, kind: PinKind, pin_type: PinType) -> Self {
        Self {
            uid,
            name,
            kind,
            pin_type,
            node,
            style: PinStyle::default(),
            links: Vec::new(),
            renderer: None,
            filter: None,
            value: None,
            incoming: None,
            pos: Pos2::ZERO,
            size: Vec2::ZERO,
        }
    }

    /// Identifier within the owning node's namespace
    pub fn uid(&self) -> PinUid {
        self.uid
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input or output
    pub fn kind(&self) -> PinKind {
        self.kind
    }

    /// Declared value type
    pub fn pin_type(&self) -> PinType {
        self.pin_type
    }

    /// Owning node
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Graph address of this pin
    pub fn pin_ref(&self) -> PinRef {
        PinRef {
            node: self.node,
            kind: self.kind,
            uid: self.uid,
        }
    }

    /// Style
    pub fn style(&self) -> &PinStyle {
        &self.style
    }

    /// Replace the style
    pub fn set_style(&mut self, style: PinStyle) -> &mut Self {
        self.style = style;
        self
    }

    /// Draw this pin with `renderer` instead of the default label and socket
    pub fn set_renderer(&mut self, renderer: impl Fn(&Pin, &mut dyn DrawSurface) + 'static) -> &mut Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Restrict which sources may connect. Only meaningful on input pins.
    pub fn set_filter(&mut self, filter: impl Fn(&Pin, &Pin) -> bool + 'static) -> &mut Self {
        if self.kind == PinKind::Output {
            tracing::warn!("Filter set on output pin {:?} is never consulted", self.name);
        }
        self.filter = Some(Box::new(filter));
        self
    }

    /// Set the held value. Ignored when `T` is not the declared type.
    pub fn set_value<T: 'static>(&mut self, value: T) -> &mut Self {
        if self.pin_type.is::<T>() {
            self.value = Some(Rc::new(value));
        } else {
            tracing::warn!(
                "Pin {:?} holds {} but was given {}",
                self.name,
                self.pin_type.name(),
                type_name::<T>()
            );
        }
        self
    }

    /// Current value: the linked source's value for a connected input,
    /// otherwise the held value.
    pub fn value<T: Clone + 'static>(&self) -> Option<T> {
        let value = match self.kind {
            PinKind::Input if self.is_connected() => self.incoming.as_ref(),
            _ => self.value.as_ref(),
        };
        value.and_then(|v| v.downcast_ref::<T>()).cloned()
    }

    pub(crate) fn held_value(&self) -> Option<PinValue> {
        self.value.clone()
    }

    pub(crate) fn set_incoming(&mut self, value: Option<PinValue>) {
        self.incoming = value;
    }

    /// Whether this input accepts a link from `source`
    pub fn accepts(&self, source: &Pin) -> bool {
        match &self.filter {
            Some(filter) => filter(source, self),
            None => filters::same_type(source, self),
        }
    }

    /// Links touching this pin
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    /// Whether any link touches this pin
    pub fn is_connected(&self) -> bool {
        !self.links.is_empty()
    }

    pub(crate) fn add_link(&mut self, link: LinkId) {
        if !self.links.contains(&link) {
            self.links.push(link);
        }
    }

    /// Forget `link`. Returns false when it was already gone.
    pub(crate) fn remove_link(&mut self, link: LinkId) -> bool {
        let before = self.links.len();
        self.links.retain(|l| *l != link);
        self.links.len() != before
    }

    /// Drop ids of links the registry no longer holds
    pub(crate) fn prune_links(&mut self, registry: &SlotMap<LinkId, Link>) {
        self.links.retain(|l| registry.contains_key(*l));
    }

    pub(crate) fn take_links(&mut self) -> Vec<LinkId> {
        std::mem::take(&mut self.links)
    }

    /// Top-left of the label in screen space
    pub fn pos(&self) -> Pos2 {
        self.pos
    }

    pub(crate) fn set_pos(&mut self, pos: Pos2) {
        self.pos = pos;
    }

    /// Label size measured on the last update
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Screen position where links attach
    pub fn pin_point(&self) -> Pos2 {
        let y = self.pos.y + self.size.y / 2.0;
        match self.kind {
            PinKind::Input => Pos2::new(self.pos.x - self.style.socket_padding, y),
            PinKind::Output => Pos2::new(self.pos.x + self.size.x + self.style.socket_padding, y),
        }
    }

    fn label_rect(&self) -> Rect {
        Rect::from_min_size(self.pos, self.size).expand2(self.style.padding)
    }

    /// Draw the pin and report hover for this frame
    pub fn update(&mut self, ctx: &mut FrameContext<'_>) {
        if let Some(renderer) = &self.renderer {
            let this = &*self;
            let rect = ctx.surface.group(this.pos, &mut |surface: &mut dyn DrawSurface| renderer(this, surface));
            self.size = rect.size();
            if ctx.surface.is_item_hovered() {
                ctx.hover(self.pin_ref());
            }
            return;
        }

        self.draw_decoration(ctx.surface);
        let rect = ctx.surface.text(self.pos, &self.name, LABEL_COLOR);
        self.size = rect.size();
        let item_hovered = ctx.surface.is_item_hovered();

        if self.draw_socket(ctx.surface, item_hovered) || item_hovered {
            ctx.hover(self.pin_ref());
        }
    }

    fn draw_decoration(&self, surface: &mut dyn DrawSurface) {
        let rect = self.label_rect();
        let bg = if surface.is_rect_hovered(rect) {
            self.style.bg_hover_color
        } else {
            self.style.bg_color
        };
        surface.rect_filled(rect, self.style.bg_radius, bg);
        surface.rect_stroke(
            rect,
            self.style.bg_radius,
            Stroke::new(self.style.border_thickness, self.style.border_color),
        );
    }

    /// Draw the socket. Returns whether the pointer is over it.
    fn draw_socket(&self, surface: &mut dyn DrawSurface, item_hovered: bool) -> bool {
        let center = self.pin_point();
        let hit = Rect::from_center_size(center, Vec2::splat(self.style.socket_radius * 2.0));
        let socket_hovered = surface.is_rect_hovered(hit);

        if self.is_connected() {
            surface.circle_filled(center, self.style.socket_connected_radius, self.style.color);
        } else {
            let stroke = Stroke::new(self.style.socket_thickness, self.style.color);
            let radius = if item_hovered || socket_hovered {
                self.style.socket_hovered_radius
            } else {
                self.style.socket_radius
            };
            surface.circle_stroke(center, radius, stroke);
        }

        socket_hovered
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pin")
            .field("uid", &self.uid)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("pin_type", &self.pin_type)
            .field("node", &self.node)
            .field("links", &self.links)
            .field("custom_renderer", &self.renderer.is_some())
            .field("filter", &self.filter.is_some())
            .finish_non_exhaustive()
    }
}
