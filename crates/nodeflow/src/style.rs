// SPDX-License-Identifier: MIT OR Apache-2.0
//! Visual styles for pins, links and nodes.

use egui::{Color32, Vec2};

/// Pin and outgoing link appearance
#[derive(Debug, Clone, PartialEq)]
pub struct PinStyle {
    /// Socket and link color
    pub color: Color32,
    /// Socket radius when idle
    pub socket_radius: f32,
    /// Socket radius when hovered
    pub socket_hovered_radius: f32,
    /// Radius of the filled socket when connected
    pub socket_connected_radius: f32,
    /// Socket outline thickness
    pub socket_thickness: f32,
    /// Gap between the label edge and the socket center
    pub socket_padding: f32,
    /// Padding around the pin label
    pub padding: Vec2,
    /// Label background
    pub bg_color: Color32,
    /// Label background when hovered
    pub bg_hover_color: Color32,
    /// Label border
    pub border_color: Color32,
    /// Label background corner radius
    pub bg_radius: f32,
    /// Label border thickness
    pub border_thickness: f32,
    /// Thickness of links leaving this pin
    pub link_thickness: f32,
    /// Thickness of a hovered link
    pub link_hovered_thickness: f32,
    /// Thickness of the outline drawn under a selected link
    pub link_selected_outline_thickness: f32,
    /// Outline color of a selected link
    pub outline_color: Color32,
}

impl PinStyle {
    fn with_color(color: Color32) -> Self {
        Self {
            color,
            socket_radius: 4.0,
            socket_hovered_radius: 4.67,
            socket_connected_radius: 3.7,
            socket_thickness: 1.0,
            socket_padding: 6.6,
            padding: Vec2::new(3.0, 1.0),
            bg_color: Color32::from_rgba_unmultiplied(23, 16, 16, 0),
            bg_hover_color: Color32::from_rgb(100, 100, 255),
            border_color: Color32::from_rgba_unmultiplied(255, 255, 255, 0),
            bg_radius: 2.5,
            border_thickness: 1.3,
            link_thickness: 3.0,
            link_hovered_thickness: 3.5,
            link_selected_outline_thickness: 4.0,
            outline_color: Color32::from_rgb(80, 20, 255),
        }
    }

    /// Cyan pins (the default)
    pub fn cyan() -> Self {
        Self::with_color(Color32::from_rgb(87, 155, 185))
    }

    /// Green pins
    pub fn green() -> Self {
        Self::with_color(Color32::from_rgb(90, 191, 93))
    }

    /// Blue pins
    pub fn blue() -> Self {
        Self::with_color(Color32::from_rgb(90, 117, 191))
    }

    /// Brown pins
    pub fn brown() -> Self {
        Self::with_color(Color32::from_rgb(191, 134, 90))
    }

    /// Red pins
    pub fn red() -> Self {
        Self::with_color(Color32::from_rgb(191, 90, 90))
    }

    /// White pins
    pub fn white() -> Self {
        let mut style = Self::with_color(Color32::from_rgb(255, 255, 255));
        style.socket_radius = 5.0;
        style.socket_hovered_radius = 6.0;
        style.socket_connected_radius = 4.5;
        style
    }
}

impl Default for PinStyle {
    fn default() -> Self {
        Self::cyan()
    }
}

/// Node frame appearance
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStyle {
    /// Header fill
    pub header_color: Color32,
    /// Header title text
    pub header_title_color: Color32,
    /// Body fill
    pub bg: Color32,
    /// Border
    pub border_color: Color32,
    /// Border while a pin of the node is hovered
    pub border_hovered_color: Color32,
    /// Border thickness
    pub border_thickness: f32,
    /// Corner radius
    pub radius: f32,
    /// Inner padding
    pub padding: Vec2,
    /// Horizontal gap between the input column, body and output column
    pub column_gap: f32,
}

impl NodeStyle {
    fn with_header(header_color: Color32) -> Self {
        Self {
            header_color,
            header_title_color: Color32::from_rgb(233, 241, 244),
            bg: Color32::from_rgb(55, 64, 75),
            border_color: Color32::from_rgb(30, 38, 41),
            border_hovered_color: Color32::from_rgb(170, 190, 205),
            border_thickness: 1.0,
            radius: 6.5,
            padding: Vec2::new(13.7, 6.0),
            column_gap: 12.0,
        }
    }

    /// Cyan header (the default)
    pub fn cyan() -> Self {
        Self::with_header(Color32::from_rgb(71, 142, 173))
    }

    /// Green header
    pub fn green() -> Self {
        Self::with_header(Color32::from_rgb(90, 191, 93))
    }

    /// Red header
    pub fn red() -> Self {
        Self::with_header(Color32::from_rgb(191, 90, 90))
    }

    /// Brown header
    pub fn brown() -> Self {
        Self::with_header(Color32::from_rgb(191, 134, 90))
    }
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self::cyan()
    }
}
