use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::HeuristicsConfig;
use crate::scene::{Connector, SelectionView, Shape, ShapeKind};

/// Condition-like label content: a question mark anywhere, or a branch
/// keyword on a word boundary.
static CONDITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\?|\b(if|else|yes|no|true|false)\b").expect("valid regex"));

static CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(class|interface|struct|enum)\b").expect("valid regex"));

/// Structural signals extracted from one selection. Pure data; every field is
/// recomputed per invocation and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralSignals {
    pub total_elements: usize,
    pub rectangle_count: usize,
    pub text_count: usize,
    pub connection_count: usize,
    /// rectangle_count / connection_count, falling back to rectangle_count
    /// when there are no connections.
    pub box_to_arrow_ratio: f32,
    /// connection_count / total_elements, 0 for an empty selection.
    pub connection_density: f32,
    pub has_decision_nodes: bool,
    pub has_linear_flow: bool,
    pub has_horizontal_actors: bool,
    pub has_vertical_messages: bool,
    pub has_class_structure: bool,
    pub has_inheritance_connections: bool,
    pub has_lifeline_pattern: bool,
}

/// Compute structural signals for a selection. Never fails for well-formed
/// input; empty selections yield all-zero, all-false signals.
pub fn analyze(selection: &SelectionView<'_>, config: &HeuristicsConfig) -> StructuralSignals {
    let shapes = &selection.shapes;
    let connectors = &selection.connectors;

    let rectangle_count = count_kind(shapes, ShapeKind::Box);
    let text_count = count_kind(shapes, ShapeKind::Text);
    let connection_count = connectors.len();
    let total_elements = shapes.len() + connection_count;

    let box_to_arrow_ratio = if connection_count > 0 {
        rectangle_count as f32 / connection_count as f32
    } else {
        rectangle_count as f32
    };
    let connection_density = if total_elements > 0 {
        connection_count as f32 / total_elements as f32
    } else {
        0.0
    };

    StructuralSignals {
        total_elements,
        rectangle_count,
        text_count,
        connection_count,
        box_to_arrow_ratio,
        connection_density,
        has_decision_nodes: has_decision_nodes(shapes),
        has_linear_flow: has_linear_flow(connectors, config),
        has_horizontal_actors: has_horizontal_actors(shapes, config),
        has_vertical_messages: has_vertical_messages(connectors, config),
        has_class_structure: has_class_structure(shapes),
        has_inheritance_connections: connectors
            .iter()
            .any(|c| c.end_arrowhead == Some(crate::scene::Arrowhead::Triangle)),
        has_lifeline_pattern: has_lifeline_pattern(shapes, config),
    }
}

fn count_kind(shapes: &[&Shape], kind: ShapeKind) -> usize {
    shapes.iter().filter(|s| s.kind == kind).count()
}

fn has_decision_nodes(shapes: &[&Shape]) -> bool {
    shapes.iter().any(|s| {
        s.kind == ShapeKind::Diamond
            || (s.kind == ShapeKind::Text
                && s.text.as_deref().is_some_and(|t| CONDITION_RE.is_match(t)))
    })
}

/// Degree census over nodes touched by candidate connectors: a selection is a
/// linear flow when most touched nodes have at most two connector endpoints.
fn has_linear_flow(connectors: &[&Connector], config: &HeuristicsConfig) -> bool {
    let mut degrees: HashMap<&str, usize> = HashMap::new();
    for connector in connectors {
        for endpoint in [&connector.source_id, &connector.target_id] {
            if let Some(id) = endpoint {
                *degrees.entry(id.as_str()).or_insert(0) += 1;
            }
        }
    }
    if degrees.is_empty() {
        return false;
    }
    let low = degrees.values().filter(|&&d| d <= 2).count();
    low as f32 / degrees.len() as f32 > config.linear_degree_share
}

fn has_horizontal_actors(shapes: &[&Shape], config: &HeuristicsConfig) -> bool {
    let texts: Vec<&&Shape> = shapes.iter().filter(|s| s.kind == ShapeKind::Text).collect();
    if texts.is_empty() {
        return false;
    }

    let mean_y = texts.iter().map(|s| s.y).sum::<f32>() / texts.len() as f32;
    let variance =
        texts.iter().map(|s| (s.y - mean_y).powi(2)).sum::<f32>() / texts.len() as f32;
    if variance < config.actor_variance_max {
        return true;
    }

    // Fallback: enough text shapes in the top third of the selection's
    // vertical range still reads as an actor row.
    let min_y = shapes.iter().map(|s| s.y).fold(f32::INFINITY, f32::min);
    let max_y = shapes
        .iter()
        .map(|s| s.y + s.height)
        .fold(f32::NEG_INFINITY, f32::max);
    let range = max_y - min_y;
    if range <= 0.0 {
        return true;
    }
    let top_band = min_y + range / 3.0;
    let in_band = texts.iter().filter(|s| s.y <= top_band).count();
    in_band as f32 / texts.len() as f32 >= config.actor_top_band_share
}

fn has_vertical_messages(connectors: &[&Connector], config: &HeuristicsConfig) -> bool {
    let mut carriers = 0usize;
    let mut vertical = 0usize;
    for connector in connectors {
        let Some((_, dy)) = connector.displacement() else {
            continue;
        };
        carriers += 1;
        if dy.abs() > config.vertical_displacement_min {
            vertical += 1;
        }
    }
    if carriers == 0 {
        return false;
    }
    vertical as f32 / carriers as f32 >= config.vertical_message_share
}

fn label_text<'a>(shape: &'a Shape, shapes: &'a [&'a Shape]) -> Option<&'a str> {
    if let Some(text) = shape.text.as_deref() {
        return Some(text);
    }
    let label_id = shape.bound_label_id.as_deref()?;
    shapes
        .iter()
        .find(|s| s.id == label_id)
        .and_then(|s| s.text.as_deref())
}

fn has_class_structure(shapes: &[&Shape]) -> bool {
    shapes.iter().any(|s| {
        s.kind == ShapeKind::Box
            && label_text(s, shapes).is_some_and(|t| CLASS_RE.is_match(t))
    })
}

/// Lifeline arrangement: text shapes sit clearly above the boxes and the
/// actor-like shapes are spread out horizontally.
fn has_lifeline_pattern(shapes: &[&Shape], config: &HeuristicsConfig) -> bool {
    let mut text_sum = 0.0f32;
    let mut text_n = 0usize;
    let mut box_sum = 0.0f32;
    let mut box_n = 0usize;
    let mut min_x = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    for shape in shapes {
        match shape.kind {
            ShapeKind::Text => {
                text_sum += shape.y;
                text_n += 1;
            }
            ShapeKind::Box => {
                box_sum += shape.y;
                box_n += 1;
            }
            _ => continue,
        }
        min_x = min_x.min(shape.x);
        max_x = max_x.max(shape.x + shape.width);
    }
    if text_n == 0 || box_n == 0 {
        return false;
    }
    let text_avg = text_sum / text_n as f32;
    let box_avg = box_sum / box_n as f32;
    box_avg - text_avg >= config.lifeline_y_gap && max_x - min_x > config.lifeline_spread_min
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Arrowhead, ConnectorKind, StrokeStyle};

    fn shape(id: &str, kind: ShapeKind, x: f32, y: f32) -> Shape {
        Shape {
            id: id.to_string(),
            kind,
            x,
            y,
            width: 100.0,
            height: 60.0,
            text: None,
            group_ids: Vec::new(),
            bound_label_id: None,
        }
    }

    fn text(id: &str, x: f32, y: f32, content: &str) -> Shape {
        let mut s = shape(id, ShapeKind::Text, x, y);
        s.width = 80.0;
        s.height = 24.0;
        s.text = Some(content.to_string());
        s
    }

    fn arrow(id: &str, source: &str, target: &str, dy: f32) -> Connector {
        Connector {
            id: id.to_string(),
            kind: ConnectorKind::Arrow,
            x: 0.0,
            y: 0.0,
            points: vec![(0.0, 0.0), (40.0, dy)],
            source_id: Some(source.to_string()),
            target_id: Some(target.to_string()),
            stroke: StrokeStyle::Solid,
            start_arrowhead: None,
            end_arrowhead: Some(Arrowhead::Arrow),
            version: 0,
        }
    }

    fn view<'a>(shapes: &'a [Shape], connectors: &'a [Connector]) -> SelectionView<'a> {
        SelectionView {
            shapes: shapes.iter().collect(),
            connectors: connectors.iter().collect(),
        }
    }

    #[test]
    fn ratio_falls_back_to_rectangle_count_without_connections() {
        let shapes = vec![
            shape("a", ShapeKind::Box, 0.0, 0.0),
            shape("b", ShapeKind::Box, 200.0, 0.0),
            shape("c", ShapeKind::Box, 400.0, 0.0),
        ];
        let signals = analyze(&view(&shapes, &[]), &HeuristicsConfig::default());
        assert_eq!(signals.connection_count, 0);
        assert_eq!(signals.box_to_arrow_ratio, 3.0);
        assert_eq!(signals.connection_density, 0.0);
    }

    #[test]
    fn empty_selection_is_all_zero() {
        let signals = analyze(&view(&[], &[]), &HeuristicsConfig::default());
        assert_eq!(signals.total_elements, 0);
        assert_eq!(signals.connection_density, 0.0);
        assert!(!signals.has_linear_flow);
        assert!(!signals.has_horizontal_actors);
    }

    #[test]
    fn diamond_or_condition_text_marks_decision_nodes() {
        let with_diamond = vec![shape("d", ShapeKind::Diamond, 0.0, 0.0)];
        assert!(analyze(&view(&with_diamond, &[]), &HeuristicsConfig::default()).has_decision_nodes);

        let with_text = vec![text("t", 0.0, 0.0, "valid input?")];
        assert!(analyze(&view(&with_text, &[]), &HeuristicsConfig::default()).has_decision_nodes);

        let keyword = vec![text("t", 0.0, 0.0, "if ready then start")];
        assert!(analyze(&view(&keyword, &[]), &HeuristicsConfig::default()).has_decision_nodes);

        // "yesterday" must not trip the word-bounded keyword match.
        let plain = vec![text("t", 0.0, 0.0, "yesterday's notes")];
        assert!(!analyze(&view(&plain, &[]), &HeuristicsConfig::default()).has_decision_nodes);
    }

    #[test]
    fn chain_of_three_is_linear_flow() {
        let shapes = vec![
            shape("a", ShapeKind::Box, 0.0, 0.0),
            shape("b", ShapeKind::Box, 0.0, 150.0),
            shape("c", ShapeKind::Box, 0.0, 300.0),
        ];
        let connectors = vec![arrow("ab", "a", "b", 90.0), arrow("bc", "b", "c", 90.0)];
        let signals = analyze(&view(&shapes, &connectors), &HeuristicsConfig::default());
        assert!(signals.has_linear_flow);
    }

    #[test]
    fn double_hub_is_not_linear() {
        // One hub with four spokes: the spokes keep the low-degree share at
        // 4/5, still over the 0.7 threshold.
        let mut shapes = vec![shape("hub", ShapeKind::Box, 0.0, 0.0)];
        let mut connectors = Vec::new();
        for i in 0..4 {
            let id = format!("s{i}");
            shapes.push(shape(&id, ShapeKind::Box, 200.0, i as f32 * 100.0));
            connectors.push(arrow(&format!("e{i}"), "hub", &id, 50.0));
        }
        let signals = analyze(&view(&shapes, &connectors), &HeuristicsConfig::default());
        assert!(signals.has_linear_flow);

        // A second hub wired to the same spokes drops the share to 4/6.
        let mut connectors2 = connectors.clone();
        shapes.push(shape("hub2", ShapeKind::Box, 400.0, 0.0));
        for i in 0..4 {
            connectors2.push(arrow(&format!("f{i}"), "hub2", &format!("s{i}"), 50.0));
        }
        let signals2 = analyze(&view(&shapes, &connectors2), &HeuristicsConfig::default());
        assert!(!signals2.has_linear_flow);
    }

    #[test]
    fn aligned_texts_make_horizontal_actors() {
        let shapes = vec![
            text("t1", 0.0, 10.0, "alice"),
            text("t2", 200.0, 14.0, "bob"),
            shape("b1", ShapeKind::Box, 0.0, 400.0),
            shape("b2", ShapeKind::Box, 200.0, 420.0),
        ];
        let signals = analyze(&view(&shapes, &[]), &HeuristicsConfig::default());
        assert!(signals.has_horizontal_actors);
    }

    #[test]
    fn scattered_texts_are_not_actors() {
        let shapes = vec![
            text("t1", 0.0, 10.0, "alice"),
            text("t2", 100.0, 300.0, "bob"),
            text("t3", 200.0, 600.0, "carol"),
        ];
        let signals = analyze(&view(&shapes, &[]), &HeuristicsConfig::default());
        assert!(!signals.has_horizontal_actors);
    }

    #[test]
    fn vertical_messages_need_a_third_of_carriers() {
        let shapes = vec![
            shape("a", ShapeKind::Box, 0.0, 0.0),
            shape("b", ShapeKind::Box, 0.0, 200.0),
        ];
        let vertical = vec![
            arrow("m1", "a", "b", 80.0),
            arrow("m2", "a", "b", -60.0),
            arrow("m3", "a", "b", 5.0),
        ];
        let signals = analyze(&view(&shapes, &vertical), &HeuristicsConfig::default());
        assert!(signals.has_vertical_messages);

        let flat: Vec<Connector> = (0..4).map(|i| arrow(&format!("m{i}"), "a", "b", 4.0)).collect();
        let signals = analyze(&view(&shapes, &flat), &HeuristicsConfig::default());
        assert!(!signals.has_vertical_messages);
    }

    #[test]
    fn class_keywords_via_bound_label() {
        let mut container = shape("c", ShapeKind::Box, 0.0, 0.0);
        container.bound_label_id = Some("l".to_string());
        let label = text("l", 10.0, 10.0, "interface Repository");
        let shapes = vec![container, label];
        let signals = analyze(&view(&shapes, &[]), &HeuristicsConfig::default());
        assert!(signals.has_class_structure);
    }

    #[test]
    fn triangle_end_marker_means_inheritance() {
        let shapes = vec![
            shape("a", ShapeKind::Box, 0.0, 0.0),
            shape("b", ShapeKind::Box, 0.0, 200.0),
        ];
        let mut c = arrow("e", "a", "b", 100.0);
        c.end_arrowhead = Some(Arrowhead::Triangle);
        let connectors = vec![c];
        let signals = analyze(&view(&shapes, &connectors), &HeuristicsConfig::default());
        assert!(signals.has_inheritance_connections);
    }

    #[test]
    fn lifeline_needs_gap_and_spread() {
        let shapes = vec![
            text("t1", 0.0, 0.0, "alice"),
            text("t2", 300.0, 0.0, "bob"),
            shape("b1", ShapeKind::Box, 0.0, 120.0),
            shape("b2", ShapeKind::Box, 300.0, 120.0),
        ];
        let signals = analyze(&view(&shapes, &[]), &HeuristicsConfig::default());
        assert!(signals.has_lifeline_pattern);

        // Same vertical arrangement but squeezed under the spread threshold.
        let narrow = vec![
            text("t1", 0.0, 0.0, "alice"),
            text("t2", 60.0, 0.0, "bob"),
            shape("b1", ShapeKind::Box, 0.0, 120.0),
        ];
        let signals = analyze(&view(&narrow, &[]), &HeuristicsConfig::default());
        assert!(!signals.has_lifeline_pattern);
    }
}
