// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node types available in the demo.

use nodeflow::{filters, Node, NodeBehavior, NodeStyle, NodeUi, Pin, PinStyle};

/// Outputs a fixed number
pub struct Constant {
    value: f32,
}

impl Constant {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl NodeBehavior for Constant {
    fn setup(&mut self, node: &mut Node) {
        node.set_title("Constant").set_style(NodeStyle::green());
        if let Some(pin) = node.add_output::<f32>("value") {
            pin.set_style(PinStyle::green()).set_value(self.value);
        }
    }

    fn draw(&mut self, ui: &mut NodeUi<'_>) {
        ui.label(&format!("{:.2}", self.value));
    }
}

/// Adds any number of inputs. A fresh input slot appears once the last one is linked.
pub struct Sum {
    slots: usize,
}

impl Default for Sum {
    fn default() -> Self {
        Self { slots: 1 }
    }
}

impl NodeBehavior for Sum {
    fn setup(&mut self, node: &mut Node) {
        node.set_title("Sum");
        node.add_output::<f32>("sum");
    }

    fn draw(&mut self, ui: &mut NodeUi<'_>) {
        let mut sum = 0.0;
        let mut used = 0;
        for i in 0..self.slots {
            sum += ui.show_input_uid::<f32>(i, &format!("x{i}"));
            if ui.node().try_in_pin(i).is_some_and(Pin::is_connected) {
                used = i + 1;
            }
        }
        self.slots = used + 1;

        ui.node_mut().out_pin_mut("sum").set_value(sum);
        ui.label(&format!("= {sum:.2}"));
    }
}

/// Scales its input by a factor
pub struct Scale {
    factor: f32,
}

impl Scale {
    pub fn new(factor: f32) -> Self {
        Self { factor }
    }
}

impl NodeBehavior for Scale {
    fn setup(&mut self, node: &mut Node) {
        node.set_title(format!("Scale x{}", self.factor));
        if let Some(pin) = node.add_input::<f32>("in") {
            pin.set_filter(filters::same_type).set_value(1.0_f32);
        }
        node.add_output::<f32>("out");
    }

    fn draw(&mut self, ui: &mut NodeUi<'_>) {
        let input = ui.node().in_pin("in").value::<f32>().unwrap_or_default();
        ui.node_mut().out_pin_mut("out").set_value(input * self.factor);
    }
}

/// Shows the value it receives
#[derive(Default)]
pub struct Display {
    last: Option<f32>,
}

impl NodeBehavior for Display {
    fn setup(&mut self, node: &mut Node) {
        node.set_title("Display").set_style(NodeStyle::brown());
        if let Some(pin) = node.add_input::<f32>("value") {
            pin.set_style(PinStyle::brown());
        }
    }

    fn draw(&mut self, ui: &mut NodeUi<'_>) {
        let pin = ui.node().in_pin("value");
        let value = pin.is_connected().then(|| pin.value::<f32>()).flatten();
        if value != self.last {
            tracing::debug!("Display changed to {:?}", value);
            self.last = value;
        }
        match value {
            Some(value) => ui.label(&format!("{value:.3}")),
            None => ui.label("-"),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeflow::{Graph, PinRef, PinUid};

    #[test]
    fn test_constant_feeds_display() {
        let mut graph = Graph::new();
        let constant = graph.add_node(egui::Pos2::ZERO, Constant::new(3.0));
        let display = graph.add_node(egui::pos2(200.0, 0.0), Display::default());
        graph
            .create_link(
                PinRef::input(display, PinUid::new("value")),
                PinRef::output(constant, PinUid::new("value")),
            )
            .unwrap();
        assert_eq!(graph.input_value::<f32>(PinRef::input(display, PinUid::new("value"))), Some(3.0));
    }

    #[test]
    fn test_scale_has_default_input() {
        let mut graph = Graph::new();
        let scale = graph.add_node(egui::Pos2::ZERO, Scale::new(2.0));
        let node = graph.node(scale).unwrap();
        assert_eq!(node.in_pin("in").value::<f32>(), Some(1.0));
        assert_eq!(node.title(), "Scale x2");
    }
}
