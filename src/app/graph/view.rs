use std::collections::HashSet;

use eframe::egui::epaint::Mesh;
use eframe::egui::{
    Align2, Color32, CursorIcon, Event, FontId, Painter, Pos2, Rect, Response, Sense, Shape, Stroke,
    Ui, Vec2, vec2,
};
use tracing::debug;

use super::super::ViewModel;
use super::super::animation::FrameOutcome;
use super::super::highlight::{HighlightState, SearchMatchCache};
use super::super::physics::PhysicsConfig;
use super::super::render_utils::{
    ACCENT, BACKGROUND, FOREGROUND, MUTED, SEARCH_TINT, blend_color, draw_background,
    star_points, visual_radius, with_alpha,
};
use super::interaction::{GraphEvent, PointerMode, Scene, hit_test};
use super::model::{EdgeKind, GraphEdge, GraphModel, GraphNode};
use super::transform::ViewTransform;

const DEFAULT_VIEWPORT: Vec2 = vec2(960.0, 720.0);
const DIMMED_ALPHA: f32 = 0.15;
const LABEL_ZOOM: f32 = 0.8;
const ARROW_LENGTH: f32 = 8.0;

/// Canvas size in logical points plus the device pixel ratio it is shown at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct RenderSurface {
    logical: Vec2,
    pixels_per_point: f32,
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self {
            logical: DEFAULT_VIEWPORT,
            pixels_per_point: 1.0,
        }
    }
}

impl RenderSurface {
    pub(in crate::app) fn logical(&self) -> Vec2 {
        self.logical
    }

    /// Returns true when either the size or the pixel ratio changed.
    pub(in crate::app) fn resize(&mut self, logical: Vec2, pixels_per_point: f32) -> bool {
        let pixels_per_point = pixels_per_point.max(f32::EPSILON);
        if self.logical == logical && self.pixels_per_point == pixels_per_point {
            return false;
        }
        self.logical = logical;
        self.pixels_per_point = pixels_per_point;
        let [width, height] = self.physical_size();
        debug!(
            width = logical.x,
            height = logical.y,
            pixels_per_point,
            physical_width = width,
            physical_height = height,
            "graph surface resized"
        );
        true
    }

    pub(in crate::app) fn physical_size(&self) -> [u32; 2] {
        let physical = self.logical * self.pixels_per_point;
        [
            physical.x.round().max(0.0) as u32,
            physical.y.round().max(0.0) as u32,
        ]
    }

    /// Snaps a stroke width to whole device pixels, never below one.
    pub(in crate::app) fn crisp(&self, width: f32) -> f32 {
        (width * self.pixels_per_point).round().max(1.0) / self.pixels_per_point
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct EdgeStyle {
    pub(in crate::app) color: Color32,
    pub(in crate::app) width: f32,
}

pub(in crate::app) fn edge_style(
    edge: &GraphEdge,
    model: &GraphModel,
    highlight: &HighlightState,
) -> EdgeStyle {
    let parent_color = model
        .nodes
        .get(edge.source)
        .and_then(GraphNode::color)
        .unwrap_or(MUTED);
    let (color, alpha, width) = match (edge.kind, highlight.has_focus()) {
        (kind, true) if highlight.edge_emphasized(edge) => match kind {
            EdgeKind::Hierarchy => (parent_color, 0.8, 2.5),
            EdgeKind::Link => (ACCENT, 0.8, 2.0),
        },
        (_, true) => (MUTED, 0.1, 1.0),
        (EdgeKind::Hierarchy, false) => (parent_color, 0.5, 1.5),
        (EdgeKind::Link, false) => (MUTED, 0.4, 1.0),
    };
    EdgeStyle {
        color: with_alpha(color, alpha),
        width,
    }
}

pub(in crate::app) fn node_fill(
    node: &GraphNode,
    index: usize,
    highlight: &HighlightState,
    search: Option<&HashSet<usize>>,
) -> Color32 {
    let highlighted = highlight.node_highlighted(index);
    let mut fill = if highlight.is_current(index) {
        ACCENT
    } else if highlighted && !node.is_folder() {
        node.color().unwrap_or_else(|| with_alpha(ACCENT, 0.8))
    } else {
        node.color().unwrap_or(MUTED)
    };
    if search.is_some_and(|matches| matches.contains(&index)) {
        fill = blend_color(fill, SEARCH_TINT, 0.68);
    }
    if highlight.has_focus() && !highlighted {
        fill = fill.gamma_multiply(DIMMED_ALPHA);
    }
    fill
}

pub(in crate::app) fn should_draw_label(show_labels: bool, highlighted: bool, zoom: f32) -> bool {
    show_labels && (highlighted || zoom > LABEL_ZOOM)
}

struct GraphPainter<'a> {
    painter: &'a Painter,
    origin: Vec2,
    viewport: Vec2,
    view: ViewTransform,
    surface: RenderSurface,
    node_size: f32,
    show_labels: bool,
    highlight: &'a HighlightState,
    search: Option<&'a HashSet<usize>>,
}

impl GraphPainter<'_> {
    fn to_screen(&self, world: Vec2) -> Pos2 {
        self.view.world_to_screen(world, self.viewport) + self.origin
    }

    fn paint(&self, model: &GraphModel) {
        for edge in model.edges() {
            self.paint_edge(model, edge);
        }
        for (index, node) in model.nodes.iter().enumerate() {
            self.paint_node(index, node);
        }
    }

    fn paint_edge(&self, model: &GraphModel, edge: &GraphEdge) {
        let (Some(source), Some(target)) = (model.nodes.get(edge.source), model.nodes.get(edge.target))
        else {
            return;
        };

        let style = edge_style(edge, model, self.highlight);
        let stroke = Stroke::new(self.surface.crisp(style.width), style.color);
        let start = self.to_screen(source.world_pos);
        let end = self.to_screen(target.world_pos);
        self.painter.line_segment([start, end], stroke);

        if edge.kind != EdgeKind::Hierarchy {
            return;
        }
        let delta = target.world_pos - source.world_pos;
        if delta.length_sq() <= f32::EPSILON {
            return;
        }
        let direction = delta.normalized();
        let inset = (if target.is_folder() { 12.0 } else { 8.0 }) + 2.0;
        let tip = self.to_screen(target.world_pos - direction * inset);
        let angle = direction.angle();
        for side in [-1.0_f32, 1.0] {
            let wing = Vec2::angled(angle + side * std::f32::consts::FRAC_PI_6);
            self.painter
                .line_segment([tip, tip - wing * ARROW_LENGTH], stroke);
        }
    }

    fn paint_node(&self, index: usize, node: &GraphNode) {
        let zoom = self.view.zoom();
        let center = self.to_screen(node.world_pos);
        let radius = visual_radius(node, self.node_size) * zoom;
        let highlighted = self.highlight.node_highlighted(index);
        let fill = node_fill(node, index, self.highlight, self.search);
        let fade = if self.highlight.has_focus() && !highlighted {
            DIMMED_ALPHA
        } else {
            1.0
        };

        if node.is_folder() {
            let inner = radius * 0.6;
            let outline = star_points(center, radius, inner);
            let mut mesh = Mesh::default();
            mesh.colored_vertex(center, fill);
            for point in &outline {
                mesh.colored_vertex(*point, fill);
            }
            let spokes = outline.len() as u32;
            for spoke in 0..spokes {
                mesh.add_triangle(0, spoke + 1, (spoke + 1) % spokes + 1);
            }
            self.painter.add(Shape::mesh(mesh));

            let border = if highlighted {
                Stroke::new(self.surface.crisp(2.5), FOREGROUND.gamma_multiply(fade))
            } else {
                Stroke::new(self.surface.crisp(1.5), fill)
            };
            self.painter.add(Shape::closed_line(outline, border));
            self.painter
                .circle_filled(center, inner * 0.5, BACKGROUND.gamma_multiply(fade));
        } else {
            self.painter.circle_filled(center, radius, fill);
            if highlighted {
                self.painter.circle_stroke(
                    center,
                    radius,
                    Stroke::new(self.surface.crisp(2.0), FOREGROUND),
                );
            }
        }

        if self.search.is_some_and(|matches| matches.contains(&index)) {
            self.painter.circle_stroke(
                center,
                radius + 3.0,
                Stroke::new(self.surface.crisp(1.5), SEARCH_TINT),
            );
        }

        if should_draw_label(self.show_labels, highlighted, zoom) {
            let alpha = if highlighted {
                1.0
            } else if self.highlight.has_focus() {
                DIMMED_ALPHA
            } else {
                0.7
            };
            let size = if node.is_folder() {
                (11.0 * zoom).max(13.0)
            } else {
                (10.0 * zoom).max(12.0)
            };
            self.painter.text(
                center + vec2(0.0, radius + 14.0),
                Align2::CENTER_BOTTOM,
                &node.label,
                FontId::proportional(size),
                with_alpha(FOREGROUND, alpha),
            );
        }
    }
}

impl ViewModel {
    fn handle_pointer(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        let (pressed, released, pointer, wheel) = ui.input(|input| {
            let wheel: Vec<f32> = input
                .events
                .iter()
                .filter_map(|event| match event {
                    Event::MouseWheel { delta, .. } => Some(delta.y),
                    _ => None,
                })
                .collect();
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.pointer.interact_pos(),
                wheel,
            )
        });
        let to_canvas = |point: Pos2| (point - rect.min).to_pos2();
        let graph = match &mut self.local {
            Some(local) => &mut local.graph,
            None => &mut self.full_graph,
        };
        let mut scene = Scene {
            model: graph,
            view: &mut self.view,
            viewport: rect.size(),
            node_size: self.settings.display.node_size,
        };

        if response.hovered() {
            scene.view.apply_wheel_events(wheel);
        }

        let Some(pointer) = pointer else {
            if !self.controller.is_idle() {
                self.controller.pointer_cancel(&mut scene);
            }
            self.controller.clear_hover();
            return;
        };
        let point = to_canvas(pointer);

        if pressed && response.hovered() {
            self.controller.pointer_down(&mut scene, point);
        }
        if self.controller.is_idle() && !response.hovered() {
            self.controller.clear_hover();
        } else {
            self.controller.pointer_move(&mut scene, point);
        }
        if released && !self.controller.is_idle() {
            self.controller.pointer_up(&mut scene);
        }

        if response.secondary_clicked() {
            let world = scene.view.screen_to_world(point, scene.viewport);
            self.context_target = hit_test(scene.model, world, scene.node_size)
                .map(|index| scene.model.nodes[index].id.clone());
        }
    }

    fn handle_graph_events(&mut self) {
        for event in self.controller.take_events() {
            match event {
                GraphEvent::NodeClicked { path } => self.open_document(&path),
                GraphEvent::SelectionChanged(selected) => {
                    debug!(selected = ?selected, "graph selection changed");
                }
            }
        }
    }

    fn draw_context_menu(&mut self, response: &Response) {
        let Some(target) = self.context_target.clone() else {
            return;
        };
        let is_folder = self.graph().node(&target).is_some_and(GraphNode::is_folder);
        let is_local = self.local.is_some();

        response.context_menu(|ui| {
            if !is_folder && ui.button("Open").clicked() {
                let graph = match &self.local {
                    Some(local) => &local.graph,
                    None => &self.full_graph,
                };
                self.controller.activate(graph, &target);
                ui.close();
            }
            if !is_local && ui.button("Show local graph").clicked() {
                self.show_local_graph(&target);
                ui.close();
            }
            if is_local && ui.button("Back to full graph").clicked() {
                self.show_full_graph();
                ui.close();
            }
        });
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        self.surface.resize(rect.size(), ui.ctx().pixels_per_point());

        draw_background(&painter, rect, self.view.pan, self.view.zoom());

        if self.graph().is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No notes",
                FontId::proportional(16.0),
                MUTED,
            );
            return;
        }

        self.handle_pointer(ui, rect, &response);
        self.handle_graph_events();
        self.draw_context_menu(&response);

        match self.controller.mode() {
            PointerMode::DraggingNode { .. } => {
                ui.output_mut(|output| output.cursor_icon = CursorIcon::Grabbing);
            }
            PointerMode::Idle if self.controller.hover_id().is_some() => {
                ui.output_mut(|output| output.cursor_icon = CursorIcon::PointingHand);
            }
            _ => {}
        }

        let viewport = rect.size();
        let graph_revision = self.graph_revision;
        let graph = match &mut self.local {
            Some(local) => &mut local.graph,
            None => &mut self.full_graph,
        };
        let highlight = HighlightState::new(
            graph,
            self.controller.hover_id(),
            self.controller.selected_id(),
            self.open_document.as_ref().map(|document| document.path.as_str()),
        );
        let search = (!highlight.has_focus() && !self.search.trim().is_empty()).then(|| {
            SearchMatchCache::lookup(&mut self.search_match_cache, graph, &self.search, graph_revision)
        });

        let physics = PhysicsConfig {
            forces: self.settings.forces,
            boundary: self.settings.boundary,
            viewport,
        };
        let graph_painter = GraphPainter {
            painter: &painter,
            origin: rect.min.to_vec2(),
            viewport,
            view: self.view,
            surface: self.surface,
            node_size: self.settings.display.node_size,
            show_labels: self.settings.display.show_labels,
            highlight: &highlight,
            search: search.as_deref(),
        };

        let outcome = self
            .driver
            .frame(graph, &physics, |model| graph_painter.paint(model));
        if let FrameOutcome::Drawn { moving } = outcome
            && (moving || !self.controller.is_idle())
        {
            ui.ctx().request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::model::HierarchyInfo;
    use super::*;
    use crate::app::render_utils::folder_color;

    fn model() -> GraphModel {
        let mut model = GraphModel::new();
        let mut folder = GraphNode::folder("folder:/v/f", "f", "/v/f");
        folder.hierarchy = Some(HierarchyInfo {
            parent_id: None,
            color: folder_color(2),
            depth: 0,
        });
        model.push_node(folder);
        model.push_node(GraphNode::document("A", "A", "/v/f/A.md"));
        model.push_node(GraphNode::document("B", "B", "/v/B.md"));
        model.push_node(GraphNode::document("C", "C", "/v/C.md"));
        model.add_edge(0, 1, EdgeKind::Hierarchy);
        model.add_edge(1, 2, EdgeKind::Link);
        model.add_edge(2, 3, EdgeKind::Link);
        model
    }

    #[test]
    fn surface_tracks_device_pixels() {
        let mut surface = RenderSurface::default();
        assert!(surface.resize(vec2(400.0, 300.0), 2.0));
        assert!(!surface.resize(vec2(400.0, 300.0), 2.0));
        assert_eq!(surface.physical_size(), [800, 600]);
        assert_eq!(surface.logical(), vec2(400.0, 300.0));

        assert_eq!(surface.crisp(1.0), 1.0);
        assert_eq!(surface.crisp(1.2), 1.0);
        assert_eq!(surface.crisp(0.1), 0.5);

        assert!(surface.resize(vec2(400.0, 300.0), 1.5));
        assert_eq!(surface.physical_size(), [600, 450]);
    }

    #[test]
    fn edges_without_focus_use_resting_styles() {
        let model = model();
        let highlight = HighlightState::new(&model, None, None, None);

        let hierarchy = edge_style(&model.edges()[0], &model, &highlight);
        assert_eq!(hierarchy.color, with_alpha(folder_color(2), 0.5));
        assert_eq!(hierarchy.width, 1.5);

        let link = edge_style(&model.edges()[1], &model, &highlight);
        assert_eq!(link.color, with_alpha(MUTED, 0.4));
        assert_eq!(link.width, 1.0);
    }

    #[test]
    fn focus_emphasizes_touching_edges_and_dims_the_rest() {
        let model = model();
        let highlight = HighlightState::new(&model, Some("A"), None, None);

        let touching = edge_style(&model.edges()[1], &model, &highlight);
        assert_eq!(touching.color, with_alpha(ACCENT, 0.8));
        assert_eq!(touching.width, 2.0);

        let parent = edge_style(&model.edges()[0], &model, &highlight);
        assert_eq!(parent.color, with_alpha(folder_color(2), 0.8));
        assert_eq!(parent.width, 2.5);

        let distant = edge_style(&model.edges()[2], &model, &highlight);
        assert_eq!(distant.color, with_alpha(MUTED, 0.1));
        assert_eq!(distant.width, 1.0);
    }

    #[test]
    fn unfocused_nodes_are_dimmed_and_open_document_is_accented() {
        let model = model();
        let highlight = HighlightState::new(&model, None, Some("A"), Some("/v/C.md"));

        assert_eq!(node_fill(&model.nodes[3], 3, &highlight, None), ACCENT);
        assert_eq!(node_fill(&model.nodes[2], 2, &highlight, None), with_alpha(ACCENT, 0.8));
        // The folder is a neighbour of the selection, so it keeps its color.
        assert_eq!(node_fill(&model.nodes[0], 0, &highlight, None), folder_color(2));

        let resting = HighlightState::new(&model, None, None, None);
        assert_eq!(node_fill(&model.nodes[2], 2, &resting, None), MUTED);

        let lonely = HighlightState::new(&model, Some("C"), None, None);
        assert_eq!(
            node_fill(&model.nodes[1], 1, &lonely, None),
            MUTED.gamma_multiply(DIMMED_ALPHA)
        );
    }

    #[test]
    fn search_matches_are_tinted() {
        let model = model();
        let resting = HighlightState::new(&model, None, None, None);
        let matches = HashSet::from([2]);
        assert_eq!(
            node_fill(&model.nodes[2], 2, &resting, Some(&matches)),
            blend_color(MUTED, SEARCH_TINT, 0.68)
        );
        assert_eq!(node_fill(&model.nodes[3], 3, &resting, Some(&matches)), MUTED);
    }

    #[test]
    fn labels_need_the_toggle_and_highlight_or_zoom() {
        assert!(!should_draw_label(false, true, 2.0));
        assert!(should_draw_label(true, true, 0.3));
        assert!(!should_draw_label(true, false, 0.8));
        assert!(should_draw_label(true, false, 0.81));
    }
}
