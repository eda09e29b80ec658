use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::scene::{Element, Shape};
use crate::solver::LayoutOutcome;

/// Gap between a connector tip and the shape outline it points at, so arrows
/// never visually overlap the shape border.
const CONNECTOR_GAP: f32 = 2.0;

/// Map a layout outcome back onto the live scene and repair the geometry that
/// depends on shape position. Produces one fully-updated element collection
/// for a single atomic replace; ids are never changed, only geometric fields.
///
/// `originals` must hold the pre-layout versions of the selected shapes; they
/// provide the label offsets and the moved/not-moved test.
pub fn reconcile(
    elements: &[Element],
    outcome: &LayoutOutcome,
    originals: &HashMap<String, Shape>,
) -> Vec<Element> {
    let mut updated: Vec<Element> = elements.to_vec();

    // 1. New positions for everything the solver placed. Elements outside the
    //    outcome pass through untouched.
    for element in &mut updated {
        if let Element::Shape(shape) = element {
            if let Some(&(x, y)) = outcome.get(&shape.id) {
                shape.x = x;
                shape.y = y;
            }
        }
    }

    // 2. Bound labels follow their container at the same relative offset they
    //    had before the move; they are never independent graph nodes.
    let mut label_moves: Vec<(String, f32, f32)> = Vec::new();
    for element in &updated {
        let Element::Shape(container) = element else {
            continue;
        };
        let Some(label_id) = &container.bound_label_id else {
            continue;
        };
        if !outcome.contains_key(&container.id) {
            continue;
        }
        let (Some(orig_container), Some(orig_label)) =
            (originals.get(&container.id), originals.get(label_id))
        else {
            continue;
        };
        let offset_x = orig_label.x - orig_container.x;
        let offset_y = orig_label.y - orig_container.y;
        label_moves.push((
            label_id.clone(),
            container.x + offset_x,
            container.y + offset_y,
        ));
    }
    let mut moved_labels: HashSet<String> = HashSet::new();
    for (label_id, x, y) in label_moves {
        for element in &mut updated {
            if let Element::Shape(label) = element {
                if label.id == label_id {
                    label.x = x;
                    label.y = y;
                    break;
                }
            }
        }
        moved_labels.insert(label_id);
    }

    // 3. Recompute connector geometry wherever a bound endpoint moved. Labels
    //    relocated in step 2 count as moved endpoints too.
    let shape_index: HashMap<String, Shape> = updated
        .iter()
        .filter_map(|e| e.as_shape())
        .map(|s| (s.id.clone(), s.clone()))
        .collect();
    for element in &mut updated {
        let Element::Connector(connector) = element else {
            continue;
        };
        let (Some(source_id), Some(target_id)) = (&connector.source_id, &connector.target_id)
        else {
            continue;
        };
        let endpoint_moved = |id: &String| outcome.contains_key(id) || moved_labels.contains(id);
        let moved = endpoint_moved(source_id) || endpoint_moved(target_id);
        if !moved {
            continue;
        }
        // Stale bindings from earlier edits are skipped, not failed: the
        // connector keeps its old geometry and the rest of the batch commits.
        let (Some(source), Some(target)) = (shape_index.get(source_id), shape_index.get(target_id))
        else {
            debug!(
                connector = connector.id.as_str(),
                "skipping connector with dangling endpoint binding"
            );
            continue;
        };

        let (sx, sy) = source.center();
        let (tx, ty) = target.center();
        let dx = tx - sx;
        let dy = ty - sy;
        let length = (dx * dx + dy * dy).sqrt();
        if length <= f32::EPSILON {
            debug!(
                connector = connector.id.as_str(),
                "skipping connector between coincident shape centers"
            );
            continue;
        }
        let ux = dx / length;
        let uy = dy / length;

        let start_clamp = source.anchor_radius() + CONNECTOR_GAP;
        let end_clamp = target.anchor_radius() + CONNECTOR_GAP;
        let start = (sx + ux * start_clamp, sy + uy * start_clamp);
        let end = (tx - ux * end_clamp, ty - uy * end_clamp);

        connector.x = start.0;
        connector.y = start.1;
        connector.points = vec![(0.0, 0.0), (end.0 - start.0, end.1 - start.1)];
        connector.version += 1;
    }

    updated
}
