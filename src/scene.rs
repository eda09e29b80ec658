use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Non-connector shape kinds supported on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Box,
    Ellipse,
    Diamond,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    Arrow,
    Line,
}

/// Terminator markers a connector endpoint may carry. `Triangle` is the
/// hollow-triangle marker drawn on inheritance edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arrowhead {
    Arrow,
    Triangle,
    Bar,
    Dot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    Solid,
    Dashed,
    Dotted,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::Solid
    }
}

/// A positioned, sized diagram element that is not a connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: String,
    pub kind: ShapeKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Label text carried directly on the shape (box/diamond captions,
    /// free-text content for `Text` shapes).
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub group_ids: Vec<String>,
    /// Id of a `Text` shape that is logically attached to this container
    /// and follows it when it moves.
    #[serde(default)]
    pub bound_label_id: Option<String>,
}

impl Shape {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Universal boundary-radius approximation used when clamping connector
    /// endpoints. Not geometrically exact for boxes and diamonds, but visually
    /// acceptable for the fixed shape set.
    pub fn anchor_radius(&self) -> f32 {
        self.width.min(self.height) / 2.0
    }
}

/// An arrow or line element, optionally bound to a source and/or target shape.
/// `points` are relative to the connector's own origin; the first entry is
/// always the start point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub id: String,
    pub kind: ConnectorKind,
    pub x: f32,
    pub y: f32,
    pub points: Vec<(f32, f32)>,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub stroke: StrokeStyle,
    #[serde(default)]
    pub start_arrowhead: Option<Arrowhead>,
    #[serde(default)]
    pub end_arrowhead: Option<Arrowhead>,
    /// Bumped whenever geometry is rewritten so cached renderings invalidate.
    #[serde(default)]
    pub version: u64,
}

impl Connector {
    /// Direction vector from the first to the last local point, when the
    /// connector carries one.
    pub fn displacement(&self) -> Option<(f32, f32)> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        if self.points.len() < 2 {
            return None;
        }
        Some((last.0 - first.0, last.1 - first.1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Shape(Shape),
    Connector(Connector),
}

impl Element {
    pub fn id(&self) -> &str {
        match self {
            Element::Shape(shape) => &shape.id,
            Element::Connector(connector) => &connector.id,
        }
    }

    pub fn as_shape(&self) -> Option<&Shape> {
        match self {
            Element::Shape(shape) => Some(shape),
            Element::Connector(_) => None,
        }
    }

    pub fn as_connector(&self) -> Option<&Connector> {
        match self {
            Element::Shape(_) => None,
            Element::Connector(connector) => Some(connector),
        }
    }
}

/// The user-selected subset of a scene: selected shapes plus the candidate
/// connector set (every connector whose source AND target are both selected,
/// whether or not the connector itself was picked).
#[derive(Debug, Clone)]
pub struct SelectionView<'a> {
    pub shapes: Vec<&'a Shape>,
    pub connectors: Vec<&'a Connector>,
}

impl<'a> SelectionView<'a> {
    pub fn from_scene(elements: &'a [Element], selected: &HashSet<String>) -> Self {
        let mut shapes = Vec::new();
        let mut connectors = Vec::new();
        for element in elements {
            match element {
                Element::Shape(shape) => {
                    if selected.contains(&shape.id) {
                        shapes.push(shape);
                    }
                }
                Element::Connector(connector) => {
                    let bound_inside = match (&connector.source_id, &connector.target_id) {
                        (Some(source), Some(target)) => {
                            selected.contains(source) && selected.contains(target)
                        }
                        _ => false,
                    };
                    if bound_inside {
                        connectors.push(connector);
                    }
                }
            }
        }
        Self { shapes, connectors }
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.connectors.is_empty()
    }

    /// Total element count the analyzer reasons over.
    pub fn len(&self) -> usize {
        self.shapes.len() + self.connectors.len()
    }
}
