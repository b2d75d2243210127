// SPDX-License-Identifier: MIT OR Apache-2.0
//! Identifiers for nodes, pins and links.

use std::fmt;
use std::hash::Hash;

slotmap::new_key_type! {
    /// Stable handle to a node owned by a [`Graph`](crate::Graph).
    pub struct NodeId;

    /// Stable handle to a link in the graph's link registry.
    pub struct LinkId;
}

/// Hashed identifier of a pin, unique within its node's input or output set
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinUid(u64);

impl PinUid {
    /// Hash any key into a pin identifier.
    ///
    /// Keys with the same hash produce the same identifier, so `"gain"` and
    /// `String::from("gain")` address the same pin. Collisions between
    /// distinct keys are not detected.
    pub fn new(key: impl Hash) -> Self {
        Self(egui::Id::new(key).value())
    }

    /// Wrap an already hashed value
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw hashed value
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PinUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PinUid({:016x})", self.0)
    }
}

/// Direction of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinKind {
    /// Receives links from output pins
    Input,
    /// Sends links to input pins
    Output,
}

impl PinKind {
    /// The direction a link must come from to land on this kind
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

/// Address of a pin inside a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinRef {
    /// Owning node
    pub node: NodeId,
    /// Input or output namespace
    pub kind: PinKind,
    /// Identifier within the namespace
    pub uid: PinUid,
}

impl PinRef {
    /// Address an input pin
    pub fn input(node: NodeId, uid: PinUid) -> Self {
        Self { node, kind: PinKind::Input, uid }
    }

    /// Address an output pin
    pub fn output(node: NodeId, uid: PinUid) -> Self {
        Self { node, kind: PinKind::Output, uid }
    }
}
