use eframe::egui::{Pos2, Vec2};

use super::super::render_utils::hit_radius;
use super::model::GraphModel;
use super::transform::ViewTransform;

/// Screen distance a press must travel before it stops counting as a click.
pub const DRAG_THRESHOLD: f32 = 3.0;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PointerMode {
    #[default]
    Idle,
    Panning,
    DraggingNode {
        id: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphEvent {
    NodeClicked { path: String },
    SelectionChanged(Option<String>),
}

/// Everything a pointer event may touch during one frame.
pub struct Scene<'a> {
    pub model: &'a mut GraphModel,
    pub view: &'a mut ViewTransform,
    pub viewport: Vec2,
    pub node_size: f32,
}

impl Scene<'_> {
    fn world(&self, screen: Pos2) -> Vec2 {
        self.view.screen_to_world(screen, self.viewport)
    }

    fn hit(&self, screen: Pos2) -> Option<usize> {
        hit_test(self.model, self.world(screen), self.node_size)
    }
}

/// Index of the node under `world`; the nearest center wins, then array order.
pub fn hit_test(model: &GraphModel, world: Vec2, node_size: f32) -> Option<usize> {
    model
        .nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let distance = (node.world_pos - world).length();
            (distance < hit_radius(node, node_size)).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

/// Pointer state machine for the graph canvas.
///
/// Positions are canvas-local screen points. Clicks and selection changes
/// are queued and drained with [`InteractionController::take_events`].
#[derive(Debug, Default)]
pub struct InteractionController {
    mode: PointerMode,
    press_origin: Option<Pos2>,
    last_pointer: Option<Pos2>,
    moved_past_threshold: bool,
    pressed_node: Option<String>,
    hover_id: Option<String>,
    selected_id: Option<String>,
    events: Vec<GraphEvent>,
}

impl InteractionController {
    pub fn mode(&self) -> &PointerMode {
        &self.mode
    }

    pub fn hover_id(&self) -> Option<&str> {
        self.hover_id.as_deref()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn is_idle(&self) -> bool {
        self.mode == PointerMode::Idle
    }

    pub fn pointer_down(&mut self, scene: &mut Scene<'_>, screen: Pos2) {
        if !self.is_idle() {
            self.pointer_cancel(scene);
        }

        self.press_origin = Some(screen);
        self.last_pointer = Some(screen);
        self.moved_past_threshold = false;

        match scene.hit(screen) {
            Some(index) => {
                let id = scene.model.nodes[index].id.clone();
                scene.model.set_dragging(Some(index));
                self.pressed_node = Some(id.clone());
                self.select(Some(id.clone()));
                self.mode = PointerMode::DraggingNode { id };
            }
            None => {
                self.pressed_node = None;
                self.select(None);
                self.mode = PointerMode::Panning;
            }
        }
    }

    pub fn pointer_move(&mut self, scene: &mut Scene<'_>, screen: Pos2) {
        if let Some(origin) = self.press_origin
            && origin.distance(screen) > DRAG_THRESHOLD
        {
            self.moved_past_threshold = true;
        }

        match &self.mode {
            PointerMode::Idle => {
                self.hover_id = scene
                    .hit(screen)
                    .map(|index| scene.model.nodes[index].id.clone());
            }
            PointerMode::DraggingNode { id } => {
                let world = scene.world(screen);
                if let Some(index) = scene.model.index_of(id) {
                    let node = &mut scene.model.nodes[index];
                    node.world_pos = world;
                    node.velocity = Vec2::ZERO;
                }
            }
            PointerMode::Panning => {
                if let Some(last) = self.last_pointer {
                    scene.view.pan_by(screen - last);
                }
            }
        }
        self.last_pointer = Some(screen);
    }

    pub fn pointer_up(&mut self, scene: &mut Scene<'_>) {
        if !self.moved_past_threshold
            && let Some(id) = self.pressed_node.as_deref()
            && let Some(node) = scene.model.node(id)
            && !node.is_folder()
        {
            let path = node.path.clone();
            self.push_click(path);
        }
        self.finish_gesture(scene);
    }

    /// Ends the gesture without producing a click.
    pub fn pointer_cancel(&mut self, scene: &mut Scene<'_>) {
        self.finish_gesture(scene);
    }

    pub fn clear_hover(&mut self) {
        self.hover_id = None;
    }

    fn finish_gesture(&mut self, scene: &mut Scene<'_>) {
        scene.model.set_dragging(None);
        self.mode = PointerMode::Idle;
        self.press_origin = None;
        self.last_pointer = None;
        self.moved_past_threshold = false;
        self.pressed_node = None;
    }

    pub fn select(&mut self, id: Option<String>) {
        if self.selected_id != id {
            self.selected_id = id.clone();
            self.events.push(GraphEvent::SelectionChanged(id));
        }
    }

    /// Selects `id` and reports it as clicked, as a click on it would.
    pub fn activate(&mut self, model: &GraphModel, id: &str) {
        let Some(node) = model.node(id) else {
            return;
        };
        self.select(Some(node.id.clone()));
        if !node.is_folder() {
            self.push_click(node.path.clone());
        }
    }

    /// A document is opened at most once per batch of pending events.
    fn push_click(&mut self, path: String) {
        let click = GraphEvent::NodeClicked { path };
        if !self.events.contains(&click) {
            self.events.push(click);
        }
    }

    /// Drops references to nodes that did not survive a rebuild.
    pub fn sync_with_model(&mut self, model: &mut GraphModel) {
        if self
            .hover_id
            .as_deref()
            .is_some_and(|id| !model.contains(id))
        {
            self.hover_id = None;
        }

        if self
            .selected_id
            .as_deref()
            .is_some_and(|id| !model.contains(id))
        {
            self.select(None);
        }

        if self
            .pressed_node
            .as_deref()
            .is_some_and(|id| !model.contains(id))
        {
            self.pressed_node = None;
        }

        let dragging = match &self.mode {
            PointerMode::DraggingNode { id } => Some(model.index_of(id)),
            _ => None,
        };
        match dragging {
            Some(Some(index)) => model.set_dragging(Some(index)),
            Some(None) => {
                model.set_dragging(None);
                self.mode = PointerMode::Idle;
                self.press_origin = None;
                self.last_pointer = None;
                self.moved_past_threshold = false;
            }
            None => model.set_dragging(None),
        }
        debug_assert!(model.dragging_count() <= 1);
    }

    pub fn take_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }
}
