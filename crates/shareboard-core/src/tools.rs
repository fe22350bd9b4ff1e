//! Tool configuration supplied by the host UI.

use crate::elements::{Color, StrokeStyle};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ToolKind {
    #[default]
    Pencil,
    Line,
    Eraser,
    Text,
    Selection,
}

/// Active tool settings. The host passes these into every interaction
/// handler; the core reads them and never mutates them.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    pub active_tool: ToolKind,
    pub stroke_size: f64,
    pub color: Color,
    pub stroke_style: StrokeStyle,
    pub fill_color: Option<Color>,
    pub font_size: f64,
    pub font_face: String,
}

impl ToolSettings {
    pub fn with_tool(mut self, tool: ToolKind) -> Self {
        self.active_tool = tool;
        self
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            active_tool: ToolKind::default(),
            stroke_size: 4.0,
            color: Color::black(),
            stroke_style: StrokeStyle::Solid,
            fill_color: None,
            font_size: 20.0,
            font_face: "sans-serif".to_string(),
        }
    }
}
