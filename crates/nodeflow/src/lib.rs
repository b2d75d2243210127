// SPDX-License-Identifier: MIT OR Apache-2.0
//! Immediate-mode node graph editor core.
//!
//! Nodes carry typed input and output pins; links join one output to one
//! input. Everything is redrawn each frame through a [`DrawSurface`], with
//! [`EguiSurface`] as the egui backend.
//!
//! ## Architecture
//!
//! - [`Graph`] owns nodes in an arena and every link in a link registry.
//!   Pins only hold [`LinkId`]s, so deleting a link twice is harmless.
//! - [`NodeBehavior`] supplies a node's pins and body. Pins declared from
//!   [`NodeBehavior::draw`] are dynamic and disappear, links included, on the
//!   first frame they are not declared.
//! - Connections are always validated on the input side. Refused attempts
//!   return `None` and are only traced.
//!
//! ```no_run
//! use nodeflow::{Graph, Node, PinRef, PinUid};
//!
//! let mut graph = Graph::new();
//! let a = graph.add_node(egui::pos2(0.0, 0.0), |node: &mut Node| {
//!     node.set_title("Constant");
//!     node.add_output::<f32>("value");
//! });
//! let b = graph.add_node(egui::pos2(250.0, 0.0), |node: &mut Node| {
//!     node.set_title("Display");
//!     node.add_input::<f32>("value");
//! });
//! graph.create_link(
//!     PinRef::input(b, PinUid::new("value")),
//!     PinRef::output(a, PinUid::new("value")),
//! );
//! ```

pub mod config;
pub mod frame;
pub mod geometry;
pub mod graph;
pub mod id;
pub mod link;
pub mod node;
pub mod pin;
pub mod style;
pub mod surface;

pub use config::{ConfigError, DuplicatePinPolicy, GraphConfig, InputLinkPolicy};
pub use frame::FrameContext;
pub use graph::{Graph, LinkError};
pub use id::{LinkId, NodeId, PinKind, PinRef, PinUid};
pub use link::Link;
pub use node::{Node, NodeBehavior, NodeUi};
pub use pin::{filters, Pin, PinFilter, PinRenderer, PinType, PinValue};
pub use style::{NodeStyle, PinStyle};
pub use surface::{DrawSurface, EguiSurface};
