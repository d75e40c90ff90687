use std::collections::{HashMap, HashSet};

use eframe::egui::{Color32, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Folder,
}

/// Placement of a node inside the folder overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct HierarchyInfo {
    pub parent_id: Option<String>,
    pub color: Color32,
    pub depth: usize,
}

#[derive(Clone, Debug)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub path: String,
    pub world_pos: Vec2,
    pub velocity: Vec2,
    /// Number of link edges touching this node.
    pub connections: usize,
    pub is_dragging: bool,
    pub kind: NodeKind,
    pub hierarchy: Option<HierarchyInfo>,
}

impl GraphNode {
    pub fn document(id: impl Into<String>, label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            path: path.into(),
            world_pos: Vec2::ZERO,
            velocity: Vec2::ZERO,
            connections: 0,
            is_dragging: false,
            kind: NodeKind::Document,
            hierarchy: None,
        }
    }

    pub fn folder(id: impl Into<String>, label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Folder,
            ..Self::document(id, label, path)
        }
    }

    pub fn at(mut self, world_pos: Vec2) -> Self {
        self.world_pos = world_pos;
        self
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn color(&self) -> Option<Color32> {
        self.hierarchy.as_ref().map(|info| info.color)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Link,
    Hierarchy,
}

/// Unordered pair of node indices. Hierarchy edges keep parent as `source`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphEdge {
    pub source: usize,
    pub target: usize,
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn touches(&self, index: usize) -> bool {
        self.source == index || self.target == index
    }

    pub fn other(&self, index: usize) -> Option<usize> {
        if self.source == index {
            Some(self.target)
        } else if self.target == index {
            Some(self.source)
        } else {
            None
        }
    }

    fn key(&self) -> (usize, usize, EdgeKind) {
        (
            self.source.min(self.target),
            self.source.max(self.target),
            self.kind,
        )
    }
}

/// One complete snapshot of the graph: nodes, deduplicated edges and an id index.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
    pub nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    edge_keys: HashSet<(usize, usize, EdgeKind)>,
    index_by_id: HashMap<String, usize>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn link_edge_count(&self) -> usize {
        self.edges
            .iter()
            .filter(|edge| edge.kind == EdgeKind::Link)
            .count()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index_of(id).and_then(|index| self.nodes.get(index))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    /// Adds a node; returns `None` when the id is already taken.
    pub fn push_node(&mut self, node: GraphNode) -> Option<usize> {
        if self.index_by_id.contains_key(&node.id) {
            return None;
        }
        let index = self.nodes.len();
        self.index_by_id.insert(node.id.clone(), index);
        self.nodes.push(node);
        Some(index)
    }

    /// Adds an edge unless it is a self loop, dangles, or duplicates an
    /// existing edge of the same kind in either direction.
    pub fn add_edge(&mut self, source: usize, target: usize, kind: EdgeKind) -> bool {
        let node_count = self.nodes.len();
        if source == target || source >= node_count || target >= node_count {
            return false;
        }

        let edge = GraphEdge {
            source,
            target,
            kind,
        };
        if !self.edge_keys.insert(edge.key()) {
            return false;
        }

        if kind == EdgeKind::Link {
            self.nodes[source].connections += 1;
            self.nodes[target].connections += 1;
        }
        self.edges.push(edge);
        true
    }

    pub fn recompute_connections(&mut self) {
        for node in &mut self.nodes {
            node.connections = 0;
        }
        for edge in &self.edges {
            if edge.kind == EdgeKind::Link {
                self.nodes[edge.source].connections += 1;
                self.nodes[edge.target].connections += 1;
            }
        }
    }

    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges.iter().filter_map(move |edge| edge.other(index))
    }

    pub fn linked_documents(&self, index: usize) -> Vec<usize> {
        let mut seen = HashSet::new();
        self.edges
            .iter()
            .filter(|edge| edge.kind == EdgeKind::Link)
            .filter_map(|edge| edge.other(index))
            .filter(|other| seen.insert(*other))
            .collect()
    }

    /// Marks at most one node as dragging.
    pub fn set_dragging(&mut self, index: Option<usize>) {
        for (current, node) in self.nodes.iter_mut().enumerate() {
            node.is_dragging = Some(current) == index;
        }
    }

    pub fn dragging_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_dragging).count()
    }

    /// Copies position and velocity from nodes of `previous` with the same id.
    pub fn carry_over_from(&mut self, previous: &GraphModel) -> usize {
        let mut carried = 0;
        for node in &mut self.nodes {
            if let Some(prior) = previous.node(&node.id) {
                node.world_pos = prior.world_pos;
                node.velocity = prior.velocity;
                carried += 1;
            }
        }
        carried
    }

    /// Subgraph of `id` and its direct neighbours.
    pub fn isolate(&self, id: &str) -> Option<GraphModel> {
        let center = self.index_of(id)?;
        let mut keep = vec![center];
        keep.extend(self.neighbors(center));

        let mut subgraph = GraphModel::new();
        let mut remap = HashMap::new();
        for old in keep {
            if remap.contains_key(&old) {
                continue;
            }
            let mut node = self.nodes[old].clone();
            node.is_dragging = false;
            if let Some(new) = subgraph.push_node(node) {
                remap.insert(old, new);
            }
        }

        for edge in &self.edges {
            if let (Some(&source), Some(&target)) = (remap.get(&edge.source), remap.get(&edge.target)) {
                subgraph.add_edge(source, target, edge.kind);
            }
        }
        subgraph.recompute_connections();
        Some(subgraph)
    }
}
