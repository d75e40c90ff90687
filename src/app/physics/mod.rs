mod forces;

use eframe::egui::Vec2;

use crate::settings::{BoundaryPolicy, ForceParams};

use super::graph::GraphModel;
use forces::{boundary_correction, center_pull, repulsion_between, spring_between};

/// Speed below which a node counts as settled.
const SETTLED_SPEED: f32 = 0.05;

#[derive(Clone, Copy, Debug)]
pub(in crate::app) struct PhysicsConfig {
    pub(in crate::app) forces: ForceParams,
    pub(in crate::app) boundary: BoundaryPolicy,
    pub(in crate::app) viewport: Vec2,
}

/// Advances every non-dragging node by one step.
///
/// A dragging node keeps its position and velocity but still pushes and
/// pulls its neighbours. Returns whether any node is still moving.
pub(in crate::app) fn step_physics(
    model: &mut GraphModel,
    config: &PhysicsConfig,
    forces: &mut Vec<Vec2>,
) -> bool {
    let node_count = model.nodes.len();
    if node_count == 0 {
        return false;
    }

    let params = &config.forces;
    forces.clear();
    forces.resize(node_count, Vec2::ZERO);

    for from in 0..node_count {
        for to in (from + 1)..node_count {
            let push = repulsion_between(
                model.nodes[from].world_pos,
                model.nodes[to].world_pos,
                (from, to),
                params.repulsion,
            );
            forces[from] += push;
            forces[to] -= push;
        }
    }

    for edge in model.edges() {
        let (from, to) = (edge.source, edge.target);
        if from >= node_count || to >= node_count || from == to {
            continue;
        }
        let pull = spring_between(model.nodes[from].world_pos, model.nodes[to].world_pos, params);
        forces[from] += pull;
        forces[to] -= pull;
    }

    let center = config.viewport * 0.5;
    let mut any_motion = false;
    for (node, force) in model.nodes.iter_mut().zip(forces.iter()) {
        if node.is_dragging {
            continue;
        }

        let start = node.world_pos;
        let force = *force + center_pull(start, center, params.center_pull);
        node.velocity += force * params.dt;
        node.world_pos += node.velocity * params.dt;
        node.velocity *= params.friction;
        node.velocity += boundary_correction(
            config.boundary,
            start,
            node.world_pos,
            config.viewport,
            params.dt,
        );

        if node.velocity.length() > SETTLED_SPEED {
            any_motion = true;
        }
    }

    any_motion
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::app::graph::{EdgeKind, GraphNode};

    const VIEWPORT: Vec2 = vec2(800.0, 600.0);

    fn config(forces: ForceParams, boundary: BoundaryPolicy) -> PhysicsConfig {
        PhysicsConfig {
            forces,
            boundary,
            viewport: VIEWPORT,
        }
    }

    fn pair(a: Vec2, b: Vec2, linked: bool) -> GraphModel {
        let mut model = GraphModel::new();
        model.push_node(GraphNode::document("X", "X", "x").at(a));
        model.push_node(GraphNode::document("Y", "Y", "y").at(b));
        if linked {
            model.add_edge(0, 1, EdgeKind::Link);
        }
        model
    }

    #[test]
    fn linked_pair_settles_near_rest_length() {
        let mut model = pair(vec2(300.0, 300.0), vec2(520.0, 260.0), true);
        let config = config(ForceParams::default(), BoundaryPolicy::Rectangular);
        let mut scratch = Vec::new();

        for _ in 0..1000 {
            step_physics(&mut model, &config, &mut scratch);
        }

        let a = model.nodes[0].world_pos;
        let b = model.nodes[1].world_pos;
        assert!(((a - b).length() - 100.0).abs() < 10.0);
        assert!(model.nodes.iter().all(|node| node.velocity.length() < 0.1));
        assert!((((a + b) * 0.5) - VIEWPORT * 0.5).length() < 5.0);
    }

    #[test]
    fn pair_at_repulsion_cutoff_comes_to_rest_within_a_step_budget() {
        const STEP_BUDGET: usize = 1000;

        for boundary in [BoundaryPolicy::Rectangular, BoundaryPolicy::Circular] {
            let mut model = pair(vec2(150.0, 300.0), vec2(650.0, 300.0), true);
            let config = config(ForceParams::default(), boundary);
            let mut scratch = Vec::new();

            let steps = (1..=STEP_BUDGET)
                .find(|_| !step_physics(&mut model, &config, &mut scratch))
                .unwrap_or_else(|| panic!("{boundary:?} pair still moving after {STEP_BUDGET} steps"));

            let a = model.nodes[0].world_pos;
            let b = model.nodes[1].world_pos;
            let separation = (a - b).length();
            assert!(steps > 1, "{boundary:?} settled immediately");
            assert!(
                (separation - 100.0).abs() < 10.0,
                "{boundary:?} separation {separation}"
            );
            assert!((((a + b) * 0.5) - VIEWPORT * 0.5).length() < 5.0);
        }
    }

    #[test]
    fn dragging_node_is_pinned_but_still_pulls() {
        let mut model = pair(vec2(100.0, 300.0), vec2(300.0, 300.0), true);
        model.set_dragging(Some(0));
        let forces = ForceParams {
            center_pull: 0.0,
            ..ForceParams::default()
        };
        let mut scratch = Vec::new();

        step_physics(&mut model, &config(forces, BoundaryPolicy::Rectangular), &mut scratch);

        assert_eq!(model.nodes[0].world_pos, vec2(100.0, 300.0));
        assert_eq!(model.nodes[0].velocity, Vec2::ZERO);

        let net = -8.0 + 3000.0 / (200.0 * 200.0 + 100.0);
        let expected = net * forces.dt * forces.friction;
        assert!((model.nodes[1].velocity.x - expected).abs() < 1e-4);
        assert!(model.nodes[1].velocity.x < 0.0);
        assert!(model.nodes[1].world_pos.x < 300.0);
    }

    #[test]
    fn coincident_nodes_separate() {
        let mut model = pair(vec2(400.0, 300.0), vec2(400.0, 300.0), false);
        let forces = ForceParams {
            center_pull: 0.0,
            ..ForceParams::default()
        };
        let mut scratch = Vec::new();

        step_physics(&mut model, &config(forces, BoundaryPolicy::Rectangular), &mut scratch);

        let separation = (model.nodes[0].world_pos - model.nodes[1].world_pos).length();
        assert!(separation > 1.0, "separation {separation}");
        assert!(model.nodes.iter().all(|node| node.world_pos.is_finite()));
    }

    #[test]
    fn edges_to_missing_nodes_are_ignored() {
        let mut model = pair(vec2(200.0, 300.0), vec2(240.0, 300.0), true);
        model.nodes.pop();
        let mut scratch = Vec::new();

        let moving = step_physics(
            &mut model,
            &config(ForceParams::default(), BoundaryPolicy::Rectangular),
            &mut scratch,
        );

        assert!(model.nodes[0].world_pos.is_finite());
        assert!(moving);
    }

    #[test]
    fn boundary_policy_selects_the_correction() {
        let forces = ForceParams {
            center_pull: 0.0,
            ..ForceParams::default()
        };
        let mut scratch = Vec::new();

        let mut model = GraphModel::new();
        model.push_node(GraphNode::document("edge", "edge", "e").at(vec2(10.0, 300.0)));
        step_physics(&mut model, &config(forces, BoundaryPolicy::Rectangular), &mut scratch);
        assert!((model.nodes[0].velocity.x - 7.5).abs() < 1e-5);

        let mut model = GraphModel::new();
        model.push_node(GraphNode::document("far", "far", "f").at(vec2(770.0, 300.0)));
        step_physics(&mut model, &config(forces, BoundaryPolicy::Circular), &mut scratch);
        assert!((model.nodes[0].velocity.x + 0.75).abs() < 1e-4);
    }

    #[test]
    fn empty_and_resting_graphs_report_no_motion() {
        let mut scratch = Vec::new();
        let config = config(ForceParams::default(), BoundaryPolicy::Rectangular);
        assert!(!step_physics(&mut GraphModel::new(), &config, &mut scratch));

        let mut model = GraphModel::new();
        model.push_node(GraphNode::document("c", "c", "c").at(VIEWPORT * 0.5));
        assert!(!step_physics(&mut model, &config, &mut scratch));
    }
}
