// SPDX-License-Identifier: MIT OR Apache-2.0
//! The graph: node registry, link registry and the per-frame update loop.

use crate::config::{GraphConfig, InputLinkPolicy};
use crate::frame::FrameContext;
use crate::geometry::connector_points;
use crate::id::{LinkId, NodeId, PinKind, PinRef, PinUid};
use crate::link::Link;
use crate::node::{Node, NodeBehavior};
use crate::pin::{Pin, PinValue};
use crate::style::NodeStyle;
use crate::surface::DrawSurface;
use egui::{Pos2, Stroke, Vec2};
use indexmap::IndexSet;
use slotmap::SlotMap;
use std::hash::Hash;
use thiserror::Error;

type NodeHook = Box<dyn FnMut(&Node)>;
type LinkHook = Box<dyn FnMut(LinkId, &Link)>;

/// Why a connection attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LinkError {
    /// Both ends are the same pin
    #[error("Cannot connect a pin to itself")]
    SamePin,

    /// Both ends have the same direction
    #[error("Both pins are {0:?}s")]
    SameDirection(PinKind),

    /// Both ends are on one node and self connection is off
    #[error("Both pins belong to node {0:?}")]
    SameNode(NodeId),

    /// An end does not exist
    #[error("Pin not found: {0:?}")]
    PinNotFound(PinRef),

    /// The source already feeds this input
    #[error("Pins are already linked")]
    AlreadyLinked,

    /// The input's filter said no
    #[error("Rejected by the input's filter")]
    Filtered,
}

struct NodeSlot {
    node: Node,
    behavior: Box<dyn NodeBehavior>,
}

/// A node graph editor
pub struct Graph {
    config: GraphConfig,
    nodes: SlotMap<NodeId, NodeSlot>,
    /// Registry order, which is also update order
    order: IndexSet<NodeId>,
    links: SlotMap<LinkId, Link>,
    hovered: Option<PinRef>,
    drag: Option<PinRef>,
    origin: Pos2,
    pointer: Option<Pos2>,
    scroll: Vec2,
    on_node_create: Option<NodeHook>,
    on_link_create: Option<LinkHook>,
}

impl Graph {
    /// Create an empty graph with default settings
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Create an empty graph
    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            config,
            nodes: SlotMap::with_key(),
            order: IndexSet::new(),
            links: SlotMap::with_key(),
            hovered: None,
            drag: None,
            origin: Pos2::ZERO,
            pointer: None,
            scroll: Vec2::ZERO,
            on_node_create: None,
            on_link_create: None,
        }
    }

    /// Settings
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Settings, mutably. Changes apply from the next operation, including
    /// the duplicate pin policy of nodes that already exist.
    pub fn config_mut(&mut self) -> &mut GraphConfig {
        &mut self.config
    }

    /// Run `hook` whenever a node is added
    pub fn set_on_node_create(&mut self, hook: impl FnMut(&Node) + 'static) {
        self.on_node_create = Some(Box::new(hook));
    }

    /// Run `hook` whenever a link is created
    pub fn set_on_link_create(&mut self, hook: impl FnMut(LinkId, &Link) + 'static) {
        self.on_link_create = Some(Box::new(hook));
    }

    /// Canvas pan offset
    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    /// Pan the canvas
    pub fn set_scroll(&mut self, scroll: Vec2) {
        self.scroll = scroll;
    }

    /// Convert a screen position to graph space, using the last frame's canvas origin
    pub fn screen_to_grid(&self, pos: Pos2) -> Pos2 {
        pos - self.origin.to_vec2() - self.scroll
    }

    /// Convert a graph-space position to screen space
    pub fn grid_to_screen(&self, pos: Pos2) -> Pos2 {
        pos + self.origin.to_vec2() + self.scroll
    }

    /// Add a node at `position` in graph space
    pub fn add_node(&mut self, position: Pos2, behavior: impl NodeBehavior) -> NodeId {
        let duplicate_pins = self.config.duplicate_pins;
        let id = self.nodes.insert_with_key(|id| NodeSlot {
            node: Node::new(id, duplicate_pins),
            behavior: Box::new(behavior),
        });
        self.order.insert(id);

        if let Some(slot) = self.nodes.get_mut(id) {
            let NodeSlot { node, behavior } = slot;
            node.set_position(position);
            behavior.setup(node);
            if node.style().is_none() {
                node.set_style(NodeStyle::cyan());
            }
            tracing::debug!("Added node {:?} ({:?})", node.title(), id);
            if let Some(hook) = self.on_node_create.as_mut() {
                hook(node);
            }
        }
        id
    }

    /// Add a node at a screen position
    pub fn place_node_at(&mut self, screen_pos: Pos2, behavior: impl NodeBehavior) -> NodeId {
        let position = self.screen_to_grid(screen_pos);
        self.add_node(position, behavior)
    }

    /// Add a node under the pointer, or at the canvas origin when the pointer is away
    pub fn place_node(&mut self, behavior: impl NodeBehavior) -> NodeId {
        let screen_pos = self.pointer.unwrap_or(self.origin);
        self.place_node_at(screen_pos, behavior)
    }

    /// Remove a node and every link touching it
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(mut slot) = self.nodes.remove(id) else {
            return false;
        };
        self.order.shift_remove(&id);
        let links: Vec<LinkId> = slot.node.pins_mut().flat_map(Pin::take_links).collect();
        for link in links {
            self.delete_link(link);
        }
        if self.drag.is_some_and(|pin| pin.node == id) {
            self.drag = None;
        }
        tracing::debug!("Removed node {:?} ({:?})", slot.node.title(), id);
        true
    }

    /// Get a node by ID
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).map(|slot| &slot.node)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let policy = self.config.duplicate_pins;
        let slot = self.nodes.get_mut(id)?;
        slot.node.set_duplicate_policy(policy);
        Some(&mut slot.node)
    }

    /// Nodes in registry order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.node(*id))
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Remove a static input pin and its links
    pub fn drop_input(&mut self, node: NodeId, key: impl Hash) -> bool {
        self.drop_pin(node, PinKind::Input, PinUid::new(key))
    }

    /// Remove a static output pin and its links
    pub fn drop_output(&mut self, node: NodeId, key: impl Hash) -> bool {
        self.drop_pin(node, PinKind::Output, PinUid::new(key))
    }

    fn drop_pin(&mut self, node: NodeId, kind: PinKind, uid: PinUid) -> bool {
        let Some(mut pin) = self.nodes.get_mut(node).and_then(|slot| slot.node.take_pin(kind, uid)) else {
            return false;
        };
        for link in pin.take_links() {
            self.delete_link(link);
        }
        tracing::debug!("Dropped {:?} pin {:?} from {:?}", kind, pin.name(), node);
        true
    }

    /// Find a pin anywhere in the graph
    pub fn pin(&self, pin: PinRef) -> Option<&Pin> {
        find_pin(&self.nodes, pin)
    }

    /// Find a pin mutably
    pub fn pin_mut(&mut self, pin: PinRef) -> Option<&mut Pin> {
        find_pin_mut(&mut self.nodes, pin)
    }

    /// Value seen by a pin right now: an input resolves through its first link
    pub fn input_value<T: Clone + 'static>(&self, pin: PinRef) -> Option<T> {
        let found = self.pin(pin)?;
        if found.kind() == PinKind::Input && found.is_connected() {
            return self.incoming_value(found)?.downcast_ref::<T>().cloned();
        }
        found.value::<T>()
    }

    fn incoming_value(&self, input: &Pin) -> Option<PinValue> {
        let link = input.links().iter().find_map(|id| self.links.get(*id))?;
        find_pin(&self.nodes, link.source())?.held_value()
    }

    /// Pin the pointer was over during the last frame
    pub fn hovered_pin(&self) -> Option<PinRef> {
        self.hovered
    }

    /// Pin a link drag started from, while one is in progress
    pub fn dragging(&self) -> Option<PinRef> {
        self.drag
    }

    /// Get a link by ID
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    /// All links
    pub fn links(&self) -> impl Iterator<Item = (LinkId, &Link)> {
        self.links.iter()
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Connect two pins, in either order.
    ///
    /// Refused attempts are silent and return `None`; they happen all the time
    /// while the user drags across pins.
    pub fn create_link(&mut self, a: PinRef, b: PinRef) -> Option<LinkId> {
        match self.try_create_link(a, b) {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::trace!("Link {:?} -> {:?} refused: {}", a, b, err);
                None
            }
        }
    }

    /// Connect two pins, reporting why a refused attempt failed.
    ///
    /// `receiver` is the pin the connection is requested on. An output
    /// receiver only checks direction and hands over to the input side, which
    /// owns every other rule.
    pub fn try_create_link(&mut self, receiver: PinRef, other: PinRef) -> Result<LinkId, LinkError> {
        match receiver.kind {
            PinKind::Output => {
                if receiver == other {
                    return Err(LinkError::SamePin);
                }
                if other.kind == PinKind::Output {
                    return Err(LinkError::SameDirection(PinKind::Output));
                }
                self.link_into(other, receiver)
            }
            PinKind::Input => self.link_into(receiver, other),
        }
    }

    fn link_into(&mut self, destination: PinRef, source: PinRef) -> Result<LinkId, LinkError> {
        if destination == source {
            return Err(LinkError::SamePin);
        }
        if source.kind == PinKind::Input {
            return Err(LinkError::SameDirection(PinKind::Input));
        }
        if destination.node == source.node && !self.config.allow_self_connection {
            return Err(LinkError::SameNode(source.node));
        }

        let dst = find_pin(&self.nodes, destination).ok_or(LinkError::PinNotFound(destination))?;
        let src = find_pin(&self.nodes, source).ok_or(LinkError::PinNotFound(source))?;
        let duplicate = dst
            .links()
            .iter()
            .filter_map(|id| self.links.get(*id))
            .any(|link| link.source() == source);
        if duplicate {
            return Err(LinkError::AlreadyLinked);
        }
        if !dst.accepts(src) {
            return Err(LinkError::Filtered);
        }

        if self.config.input_links == InputLinkPolicy::Single {
            let replaced = dst.links().to_vec();
            for link in replaced {
                self.delete_link(link);
            }
        }

        let id = self.links.insert(Link::new(source, destination));
        for end in [destination, source] {
            if let Some(pin) = find_pin_mut(&mut self.nodes, end) {
                pin.add_link(id);
            }
        }
        tracing::debug!("Linked {:?} -> {:?} ({:?})", source, destination, id);

        if let (Some(hook), Some(link)) = (self.on_link_create.as_mut(), self.links.get(id)) {
            hook(id, link);
        }
        Ok(id)
    }

    /// Delete a link. Deleting a link that is already gone does nothing.
    pub fn delete_link(&mut self, id: LinkId) -> bool {
        let Some(link) = self.links.remove(id) else {
            return false;
        };
        for end in [link.source(), link.destination()] {
            if let Some(pin) = find_pin_mut(&mut self.nodes, end) {
                pin.remove_link(id);
                pin.prune_links(&self.links);
            }
        }
        tracing::debug!("Deleted link {:?} -> {:?} ({:?})", link.source(), link.destination(), id);
        true
    }

    /// Delete every link touching a pin
    pub fn delete_pin_links(&mut self, pin: PinRef) {
        let Some(links) = find_pin_mut(&mut self.nodes, pin).map(Pin::take_links) else {
            return;
        };
        for link in links {
            self.delete_link(link);
        }
    }

    /// Draw one frame and process its input
    pub fn update(&mut self, surface: &mut dyn DrawSurface) {
        let config = self.config.clone();
        self.origin = surface.canvas_origin();
        self.pointer = surface.pointer_pos();
        let offset = self.origin.to_vec2() + self.scroll;
        let mut ctx = FrameContext::new(surface, &config);

        let order: Vec<NodeId> = self.order.iter().copied().collect();
        for id in order {
            self.refresh_inputs(id);
            let Some(NodeSlot { node, behavior }) = self.nodes.get_mut(id) else {
                continue;
            };
            let screen_pos = node.position() + offset;
            node.set_duplicate_policy(config.duplicate_pins);
            node.update(&mut ctx, &mut **behavior, screen_pos);
            let stale = node.sweep_dynamic();
            for mut pin in stale {
                for link in pin.take_links() {
                    self.delete_link(link);
                }
            }
        }

        self.update_links(&mut ctx);
        let hovered = ctx.hovered();
        self.update_drag(&mut ctx, hovered);

        let destroyed: Vec<NodeId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.nodes.get(*id).is_some_and(|slot| slot.node.is_destroyed()))
            .collect();
        for id in destroyed {
            self.remove_node(id);
        }

        self.hovered = hovered.filter(|pin| self.nodes.contains_key(pin.node));
    }

    fn refresh_inputs(&mut self, id: NodeId) {
        let Some(slot) = self.nodes.get(id) else {
            return;
        };
        let incoming: Vec<(PinUid, Option<PinValue>)> = slot
            .node
            .inputs()
            .map(|pin| (pin.uid(), self.incoming_value(pin)))
            .collect();
        if let Some(slot) = self.nodes.get_mut(id) {
            for (uid, value) in incoming {
                if let Some(pin) = slot.node.pin_mut(PinKind::Input, uid) {
                    pin.set_incoming(value);
                }
            }
        }
    }

    fn update_links(&mut self, ctx: &mut FrameContext<'_>) {
        let ids: Vec<LinkId> = self.links.keys().collect();
        let mut doomed = Vec::new();
        for id in ids {
            let Some(link) = self.links.get_mut(id) else {
                continue;
            };
            let ends = (
                find_pin(&self.nodes, link.source()),
                find_pin(&self.nodes, link.destination()),
            );
            let (Some(src), Some(dst)) = ends else {
                doomed.push(id);
                continue;
            };
            if link.update(ctx, src.pin_point(), dst.pin_point(), src.style()) {
                doomed.push(id);
            }
        }
        for id in doomed {
            self.delete_link(id);
        }
    }

    fn update_drag(&mut self, ctx: &mut FrameContext<'_>, hovered: Option<PinRef>) {
        let Some(origin) = self.drag else {
            if ctx.surface.primary_pressed() {
                self.drag = hovered;
            }
            return;
        };
        let Some(pin) = find_pin(&self.nodes, origin) else {
            self.drag = None;
            return;
        };

        if ctx.surface.primary_down() {
            if let Some(pointer) = ctx.surface.pointer_pos() {
                let (start, end) = match origin.kind {
                    PinKind::Output => (pin.pin_point(), pointer),
                    PinKind::Input => (pointer, pin.pin_point()),
                };
                let stroke = Stroke::new(ctx.config.drag_preview_thickness, pin.style().color);
                ctx.surface.cubic_bezier(connector_points(start, end), stroke);
            }
            return;
        }

        self.drag = None;
        if !ctx.surface.primary_released() {
            // button came up outside the canvas
            return;
        }
        if let Some(target) = hovered.filter(|target| *target != origin) {
            self.create_link(target, origin);
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("config", &self.config)
            .field("nodes", &self.nodes.len())
            .field("links", &self.links.len())
            .field("hovered", &self.hovered)
            .field("drag", &self.drag)
            .finish_non_exhaustive()
    }
}

fn find_pin(nodes: &SlotMap<NodeId, NodeSlot>, pin: PinRef) -> Option<&Pin> {
    nodes.get(pin.node)?.node.pin(pin.kind, pin.uid)
}

fn find_pin_mut(nodes: &mut SlotMap<NodeId, NodeSlot>, pin: PinRef) -> Option<&mut Pin> {
    nodes.get_mut(pin.node)?.node.pin_mut(pin.kind, pin.uid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePinPolicy;
    use crate::node::NodeUi;
    use crate::pin::filters;
    use crate::surface::recording::RecordingSurface;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn number_source(node: &mut Node) {
        node.set_title("Source");
        if let Some(pin) = node.add_output::<f32>("out") {
            pin.set_value(2.5_f32);
        }
    }

    fn number_sink(node: &mut Node) {
        node.set_title("Sink");
        node.add_input::<f32>("in");
    }

    fn out(node: NodeId) -> PinRef {
        PinRef::output(node, PinUid::new("out"))
    }

    fn inp(node: NodeId) -> PinRef {
        PinRef::input(node, PinUid::new("in"))
    }

    fn pair(graph: &mut Graph) -> (NodeId, NodeId) {
        let a = graph.add_node(Pos2::new(0.0, 0.0), number_source);
        let b = graph.add_node(Pos2::new(300.0, 0.0), number_sink);
        (a, b)
    }

    fn frame(graph: &mut Graph, surface: &mut RecordingSurface) {
        graph.update(surface);
        surface.next_frame();
    }

    #[test]
    fn test_connect_once() {
        let mut graph = Graph::new();
        let (a, b) = pair(&mut graph);

        let id = graph.create_link(inp(b), out(a)).unwrap();
        assert_eq!(graph.link_count(), 1);
        let link = graph.link(id).unwrap();
        assert_eq!(link.source(), out(a));
        assert_eq!(link.destination(), inp(b));
        assert_eq!(graph.pin(out(a)).unwrap().links(), &[id]);
        assert_eq!(graph.pin(inp(b)).unwrap().links(), &[id]);
    }

    #[test]
    fn test_connect_twice_is_noop() {
        let mut graph = Graph::new();
        let (a, b) = pair(&mut graph);
        assert!(graph.create_link(inp(b), out(a)).is_some());
        assert!(graph.create_link(inp(b), out(a)).is_none());
        assert!(graph.create_link(out(a), inp(b)).is_none());
        assert_eq!(graph.try_create_link(inp(b), out(a)), Err(LinkError::AlreadyLinked));
        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.pin(inp(b)).unwrap().links().len(), 1);
    }

    #[test]
    fn test_output_side_delegates() {
        let mut graph = Graph::new();
        let (a, b) = pair(&mut graph);
        let id = graph.create_link(out(a), inp(b)).unwrap();
        assert_eq!(graph.link(id).unwrap().source(), out(a));
    }

    #[test]
    fn test_illegal_connections() {
        let mut graph = Graph::new();
        let a = graph.add_node(Pos2::ZERO, |node: &mut Node| {
            node.add_input::<f32>("in");
            node.add_input::<f32>("in2");
            node.add_output::<f32>("out");
            node.add_output::<f32>("out2");
        });
        let b = graph.add_node(Pos2::ZERO, |node: &mut Node| {
            node.add_input::<f32>("in");
            node.add_output::<f32>("out");
        });

        assert_eq!(graph.try_create_link(inp(a), inp(a)), Err(LinkError::SamePin));
        assert_eq!(graph.try_create_link(out(a), out(a)), Err(LinkError::SamePin));
        assert_eq!(
            graph.try_create_link(inp(a), inp(b)),
            Err(LinkError::SameDirection(PinKind::Input))
        );
        assert_eq!(
            graph.try_create_link(out(a), out(b)),
            Err(LinkError::SameDirection(PinKind::Output))
        );
        assert_eq!(graph.try_create_link(inp(a), out(a)), Err(LinkError::SameNode(a)));
        assert!(graph.create_link(PinRef::input(a, PinUid::new("in2")), out(a)).is_none());
        assert_eq!(
            graph.try_create_link(PinRef::input(b, PinUid::new("nope")), out(a)),
            Err(LinkError::PinNotFound(PinRef::input(b, PinUid::new("nope"))))
        );
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn test_self_connection_when_allowed() {
        let mut graph = Graph::new();
        graph.config_mut().allow_self_connection = true;
        let a = graph.add_node(Pos2::ZERO, |node: &mut Node| {
            node.add_input::<f32>("in");
            node.add_output::<f32>("out");
        });
        assert!(graph.create_link(inp(a), out(a)).is_some());
    }

    #[test]
    fn test_filter_rejects() {
        let mut graph = Graph::new();
        let a = graph.add_node(Pos2::ZERO, |node: &mut Node| {
            node.add_output::<String>("out");
        });
        let b = graph.add_node(Pos2::ZERO, number_sink);
        assert_eq!(graph.try_create_link(inp(b), out(a)), Err(LinkError::Filtered));

        graph.pin_mut(inp(b)).unwrap().set_filter(filters::none);
        assert!(graph.create_link(inp(b), out(a)).is_some());
    }

    #[test]
    fn test_single_policy_replaces() {
        let mut graph = Graph::new();
        let (a, b) = pair(&mut graph);
        let c = graph.add_node(Pos2::ZERO, number_source);
        let first = graph.create_link(inp(b), out(a)).unwrap();
        let second = graph.create_link(inp(b), out(c)).unwrap();

        assert!(graph.link(first).is_none());
        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.pin(inp(b)).unwrap().links(), &[second]);
        assert!(!graph.pin(out(a)).unwrap().is_connected());
    }

    #[test]
    fn test_multiple_policy_accumulates() {
        let mut graph = Graph::with_config(GraphConfig {
            input_links: InputLinkPolicy::Multiple,
            ..GraphConfig::default()
        });
        let (a, b) = pair(&mut graph);
        let c = graph.add_node(Pos2::ZERO, number_source);
        graph.create_link(inp(b), out(a)).unwrap();
        graph.create_link(inp(b), out(c)).unwrap();
        assert_eq!(graph.link_count(), 2);
        assert_eq!(graph.pin(inp(b)).unwrap().links().len(), 2);
    }

    #[test]
    fn test_output_fans_out() {
        let mut graph = Graph::new();
        let (a, b) = pair(&mut graph);
        let c = graph.add_node(Pos2::ZERO, number_sink);
        graph.create_link(out(a), inp(b)).unwrap();
        graph.create_link(out(a), inp(c)).unwrap();
        assert_eq!(graph.pin(out(a)).unwrap().links().len(), 2);
    }

    #[test]
    fn test_delete_link_idempotent() {
        let mut graph = Graph::new();
        let (a, b) = pair(&mut graph);
        let id = graph.create_link(inp(b), out(a)).unwrap();
        assert!(graph.delete_link(id));
        assert!(!graph.delete_link(id));
        assert!(!graph.pin(out(a)).unwrap().is_connected());
        assert!(!graph.pin(inp(b)).unwrap().is_connected());
    }

    #[test]
    fn test_delete_pin_links() {
        let mut graph = Graph::new();
        let (a, b) = pair(&mut graph);
        let c = graph.add_node(Pos2::ZERO, number_sink);
        graph.create_link(out(a), inp(b));
        graph.create_link(out(a), inp(c));
        graph.delete_pin_links(out(a));
        assert_eq!(graph.link_count(), 0);
        assert!(!graph.pin(inp(b)).unwrap().is_connected());
        assert!(!graph.pin(inp(c)).unwrap().is_connected());
        graph.delete_pin_links(out(a));
    }

    #[test]
    fn test_remove_node_tears_down_links() {
        let mut graph = Graph::new();
        let (a, b) = pair(&mut graph);
        let c = graph.add_node(Pos2::ZERO, number_sink);
        graph.create_link(out(a), inp(b));
        graph.create_link(out(a), inp(c));

        assert!(graph.remove_node(a));
        assert!(!graph.remove_node(a));
        assert_eq!(graph.link_count(), 0);
        assert_eq!(graph.node_count(), 2);
        assert!(graph.pin(inp(b)).unwrap().links().is_empty());
        assert!(graph.pin(inp(c)).unwrap().links().is_empty());
        assert!(graph.pin(out(a)).is_none());
    }

    #[test]
    fn test_drop_pin_tears_down_links() {
        let mut graph = Graph::new();
        let (a, b) = pair(&mut graph);
        graph.create_link(out(a), inp(b));
        assert!(graph.drop_output(a, "out"));
        assert!(!graph.drop_output(a, "out"));
        assert_eq!(graph.link_count(), 0);
        assert!(!graph.pin(inp(b)).unwrap().is_connected());
        assert!(graph.node(a).unwrap().try_out_pin("out").is_none());
        assert!(graph.drop_input(b, "in"));
    }

    #[test]
    fn test_add_node_defaults_style_and_fires_hook() {
        let created = Rc::new(RefCell::new(Vec::new()));
        let mut graph = Graph::new();
        let seen = Rc::clone(&created);
        graph.set_on_node_create(move |node| seen.borrow_mut().push(node.title().to_string()));

        let plain = graph.add_node(Pos2::new(5.0, 6.0), number_source);
        let styled = graph.add_node(Pos2::ZERO, |node: &mut Node| {
            node.set_title("Red").set_style(NodeStyle::red());
        });

        assert_eq!(graph.node(plain).unwrap().style(), Some(&NodeStyle::cyan()));
        assert_eq!(graph.node(styled).unwrap().style(), Some(&NodeStyle::red()));
        assert_eq!(graph.node(plain).unwrap().position(), Pos2::new(5.0, 6.0));
        assert_eq!(*created.borrow(), vec!["Source", "Red"]);
        assert_ne!(plain, styled);
    }

    #[test]
    fn test_link_hook_fires_on_accept_only() {
        let count = Rc::new(RefCell::new(0));
        let mut graph = Graph::new();
        let seen = Rc::clone(&count);
        graph.set_on_link_create(move |_, _| *seen.borrow_mut() += 1);
        let (a, b) = pair(&mut graph);
        graph.create_link(inp(b), out(a));
        graph.create_link(inp(b), out(a));
        graph.create_link(inp(a), inp(b));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_place_node_converts_screen_to_grid() {
        let mut graph = Graph::new();
        let mut surface = RecordingSurface::new();
        surface.origin = Pos2::new(100.0, 50.0);
        surface.pointer = Some(Pos2::new(130.0, 70.0));
        frame(&mut graph, &mut surface);

        let at = graph.place_node_at(Pos2::new(150.0, 60.0), number_sink);
        assert_eq!(graph.node(at).unwrap().position(), Pos2::new(50.0, 10.0));
        let under = graph.place_node(number_sink);
        assert_eq!(graph.node(under).unwrap().position(), Pos2::new(30.0, 20.0));
    }

    #[test]
    fn test_values_flow_through_links() {
        let mut graph = Graph::new();
        let (a, b) = pair(&mut graph);
        assert_eq!(graph.input_value::<f32>(inp(b)), None);
        graph.create_link(inp(b), out(a));
        assert_eq!(graph.input_value::<f32>(inp(b)), Some(2.5));

        let mut surface = RecordingSurface::new();
        frame(&mut graph, &mut surface);
        assert_eq!(graph.node(b).unwrap().in_pin("in").value::<f32>(), Some(2.5));
    }

    struct Adder {
        inputs: Rc<RefCell<usize>>,
        seen: Rc<RefCell<Vec<i32>>>,
    }

    impl NodeBehavior for Adder {
        fn setup(&mut self, node: &mut Node) {
            node.set_title("Adder");
        }

        fn draw(&mut self, ui: &mut NodeUi<'_>) {
            let count = *self.inputs.borrow();
            let mut sum = 0;
            for i in 0..count {
                sum += ui.show_input_uid::<i32>(i, &format!("in {i}"));
            }
            self.seen.borrow_mut().push(sum);
            ui.show_output("sum", sum);
        }
    }

    #[test]
    fn test_dynamic_pins_swept_with_links() {
        let inputs = Rc::new(RefCell::new(2));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut graph = Graph::new();
        let src = graph.add_node(Pos2::ZERO, |node: &mut Node| {
            if let Some(pin) = node.add_output::<i32>("out") {
                pin.set_value(4_i32);
            }
        });
        let adder = graph.add_node(
            Pos2::new(300.0, 0.0),
            Adder {
                inputs: Rc::clone(&inputs),
                seen: Rc::clone(&seen),
            },
        );
        let mut surface = RecordingSurface::new();
        frame(&mut graph, &mut surface);

        let second = PinRef::input(adder, PinUid::new(1_usize));
        assert!(graph.pin(second).is_some());
        graph.create_link(second, out(src)).unwrap();

        frame(&mut graph, &mut surface);
        assert_eq!(*seen.borrow(), vec![0, 4]);
        assert!(graph.pin(second).unwrap().is_connected());

        *inputs.borrow_mut() = 1;
        frame(&mut graph, &mut surface);
        assert!(graph.pin(second).is_none());
        assert_eq!(graph.link_count(), 0);
        assert!(!graph.pin(out(src)).unwrap().is_connected());
        assert!(graph.pin(PinRef::input(adder, PinUid::new(0_usize))).is_some());
        assert_eq!(graph.node(adder).unwrap().out_pin("sum").value::<i32>(), Some(0));
    }

    #[test]
    fn test_destroy_removes_node_at_frame_end() {
        struct SelfDestruct;
        impl NodeBehavior for SelfDestruct {
            fn setup(&mut self, node: &mut Node) {
                node.add_input::<f32>("in");
            }

            fn draw(&mut self, ui: &mut NodeUi<'_>) {
                ui.node_mut().destroy();
            }
        }

        let mut graph = Graph::new();
        let a = graph.add_node(Pos2::ZERO, number_source);
        let b = graph.add_node(Pos2::new(300.0, 0.0), SelfDestruct);
        graph.create_link(inp(b), out(a));

        let mut surface = RecordingSurface::new();
        frame(&mut graph, &mut surface);
        assert!(graph.node(b).is_none());
        assert_eq!(graph.link_count(), 0);
        assert!(!graph.pin(out(a)).unwrap().is_connected());
    }

    #[test]
    fn test_nodes_in_registry_order() {
        let mut graph = Graph::new();
        let (a, b) = pair(&mut graph);
        let c = graph.add_node(Pos2::ZERO, number_sink);
        graph.remove_node(b);
        let ids: Vec<NodeId> = graph.nodes().map(Node::id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn test_drag_creates_link() {
        let mut graph = Graph::new();
        let (a, b) = pair(&mut graph);
        let mut surface = RecordingSurface::new();
        frame(&mut graph, &mut surface);

        let from = graph.pin(out(a)).unwrap().pin_point();
        let to = graph.pin(inp(b)).unwrap().pin_point();

        surface.pointer = Some(from);
        frame(&mut graph, &mut surface);
        assert_eq!(graph.hovered_pin(), Some(out(a)));

        surface.press_at(from);
        frame(&mut graph, &mut surface);
        assert_eq!(graph.dragging(), Some(out(a)));

        surface.pointer = Some(Pos2::new(200.0, 40.0));
        graph.update(&mut surface);
        assert_eq!(surface.beziers().len(), 1, "drag preview");
        surface.next_frame();

        surface.release_at(to);
        frame(&mut graph, &mut surface);
        assert_eq!(graph.dragging(), None);
        assert_eq!(graph.link_count(), 1);
        let (_, link) = graph.links().next().unwrap();
        assert_eq!(link.source(), out(a));
        assert_eq!(link.destination(), inp(b));
    }

    #[test]
    fn test_drag_released_on_nothing() {
        let mut graph = Graph::new();
        let (a, _) = pair(&mut graph);
        let mut surface = RecordingSurface::new();
        frame(&mut graph, &mut surface);

        let from = graph.pin(out(a)).unwrap().pin_point();
        surface.press_at(from);
        frame(&mut graph, &mut surface);
        assert!(graph.dragging().is_some());
        surface.release_at(Pos2::new(900.0, 900.0));
        frame(&mut graph, &mut surface);
        assert_eq!(graph.dragging(), None);
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn test_drag_cancelled_without_release() {
        let mut graph = Graph::new();
        let (a, b) = pair(&mut graph);
        let mut surface = RecordingSurface::new();
        frame(&mut graph, &mut surface);

        surface.press_at(graph.pin(out(a)).unwrap().pin_point());
        frame(&mut graph, &mut surface);
        assert!(graph.dragging().is_some());

        surface.pointer = Some(graph.pin(inp(b)).unwrap().pin_point());
        surface.down = false;
        frame(&mut graph, &mut surface);
        assert_eq!(graph.dragging(), None);
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn test_hover_last_pin_wins_and_resets() {
        let mut graph = Graph::new();
        let below = graph.add_node(Pos2::new(0.0, 0.0), number_sink);
        let above = graph.add_node(Pos2::new(0.0, 0.0), number_sink);
        let mut surface = RecordingSurface::new();
        frame(&mut graph, &mut surface);
        assert_eq!(graph.pin(inp(below)).unwrap().pin_point(), graph.pin(inp(above)).unwrap().pin_point());

        surface.pointer = Some(graph.pin(inp(below)).unwrap().pin_point());
        frame(&mut graph, &mut surface);
        assert_eq!(graph.hovered_pin(), Some(inp(above)));

        surface.pointer = Some(Pos2::new(900.0, 900.0));
        frame(&mut graph, &mut surface);
        assert_eq!(graph.hovered_pin(), None);
    }

    struct SelfDestruct(Rc<Cell<bool>>);

    impl NodeBehavior for SelfDestruct {
        fn setup(&mut self, node: &mut Node) {
            number_sink(node);
        }

        fn draw(&mut self, ui: &mut NodeUi<'_>) {
            if self.0.get() {
                ui.node_mut().destroy();
            }
        }
    }

    #[test]
    fn test_hover_cleared_when_node_destroyed() {
        let mut graph = Graph::new();
        let armed = Rc::new(Cell::new(false));
        let doomed = graph.add_node(Pos2::new(0.0, 0.0), SelfDestruct(Rc::clone(&armed)));
        let mut surface = RecordingSurface::new();
        frame(&mut graph, &mut surface);

        surface.pointer = Some(graph.pin(inp(doomed)).unwrap().pin_point());
        frame(&mut graph, &mut surface);
        assert_eq!(graph.hovered_pin(), Some(inp(doomed)));

        armed.set(true);
        frame(&mut graph, &mut surface);
        assert!(graph.node(doomed).is_none());
        assert_eq!(graph.hovered_pin(), None);
    }

    #[test]
    #[should_panic(expected = "already has")]
    fn test_duplicate_policy_change_reaches_existing_nodes() {
        let mut graph = Graph::new();
        let b = graph.add_node(Pos2::ZERO, number_sink);
        graph.config_mut().duplicate_pins = DuplicatePinPolicy::Panic;
        if let Some(node) = graph.node_mut(b) {
            node.add_input::<f32>("in");
        }
    }

    #[test]
    fn test_click_and_delete_key_removes_link() {
        let mut graph = Graph::new();
        let (a, b) = pair(&mut graph);
        let mut surface = RecordingSurface::new();
        frame(&mut graph, &mut surface);
        let id = graph.create_link(inp(b), out(a)).unwrap();

        let start = graph.pin(out(a)).unwrap().pin_point();
        let end = graph.pin(inp(b)).unwrap().pin_point();
        let mid = crate::geometry::cubic_point(connector_points(start, end), 0.5);
        surface.press_at(mid);
        frame(&mut graph, &mut surface);
        assert!(graph.link(id).unwrap().is_selected());

        surface.delete = true;
        frame(&mut graph, &mut surface);
        assert!(graph.link(id).is_none());
        assert!(!graph.pin(inp(b)).unwrap().is_connected());
    }
}
