use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use eframe::egui::{Color32, Vec2, vec2};
use rand::Rng;
use tracing::{info, warn};

use crate::util::normalize_title;
use crate::vault::{DocumentEntry, FsLinkReader, LinkReader, scan_vault};

use super::super::render_utils::{MUTED, folder_color};
use super::model::{EdgeKind, GraphModel, GraphNode, HierarchyInfo};

const SEED_RADIUS: f32 = 150.0;
const SEED_JITTER: f32 = 25.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Adds folder nodes and parent/child edges on top of the link graph.
    pub hierarchy: bool,
}

struct Builder<'a> {
    reader: &'a dyn LinkReader,
    options: BuildOptions,
    model: GraphModel,
    title_index: HashMap<String, usize>,
    outbound: Vec<(usize, Vec<String>)>,
    next_color: usize,
    skipped: usize,
}

#[derive(Clone)]
struct Parent {
    index: usize,
    id: String,
    color: Color32,
}

impl<'a> Builder<'a> {
    fn new(reader: &'a dyn LinkReader, options: BuildOptions) -> Self {
        Self {
            reader,
            options,
            model: GraphModel::new(),
            title_index: HashMap::new(),
            outbound: Vec::new(),
            next_color: 0,
            skipped: 0,
        }
    }

    fn walk(&mut self, entries: &[DocumentEntry], parent: Option<&Parent>, depth: usize) {
        for entry in entries {
            if entry.is_container {
                let folder = self.add_folder(entry, parent, depth);
                self.walk(&entry.children, folder.as_ref().or(parent), depth + 1);
            } else {
                self.add_document(entry, parent, depth);
            }
        }
    }

    fn add_folder(
        &mut self,
        entry: &DocumentEntry,
        parent: Option<&Parent>,
        depth: usize,
    ) -> Option<Parent> {
        if !self.options.hierarchy {
            return None;
        }

        let color = folder_color(self.next_color);
        self.next_color += 1;

        let id = format!("folder:{}", entry.id);
        let mut node = GraphNode::folder(id.clone(), entry.name.clone(), entry.id.clone());
        node.hierarchy = Some(HierarchyInfo {
            parent_id: parent.map(|parent| parent.id.clone()),
            color,
            depth,
        });

        let index = self.model.push_node(node)?;
        if let Some(parent) = parent {
            self.model.add_edge(parent.index, index, EdgeKind::Hierarchy);
        }
        Some(Parent { index, id, color })
    }

    fn add_document(&mut self, entry: &DocumentEntry, parent: Option<&Parent>, depth: usize) {
        let links = match self.reader.read_links(entry) {
            Ok(links) => links,
            Err(error) => {
                warn!(document = %entry.id, "skipping unreadable document: {error:#}");
                self.skipped += 1;
                return;
            }
        };

        let title = normalize_title(&entry.name);
        let id = self.unique_id(&title);
        let mut node = GraphNode::document(id, title.clone(), entry.id.clone());
        if self.options.hierarchy {
            node.hierarchy = Some(HierarchyInfo {
                parent_id: parent.map(|parent| parent.id.clone()),
                color: parent.map_or(MUTED, |parent| parent.color),
                depth,
            });
        }

        let Some(index) = self.model.push_node(node) else {
            return;
        };
        self.title_index.entry(title.to_lowercase()).or_insert(index);
        self.outbound.push((index, links));

        if self.options.hierarchy
            && let Some(parent) = parent
        {
            self.model.add_edge(parent.index, index, EdgeKind::Hierarchy);
        }
    }

    fn unique_id(&self, title: &str) -> String {
        if !self.model.contains(title) {
            return title.to_string();
        }
        (2..)
            .map(|suffix| format!("{title} ({suffix})"))
            .find(|candidate| !self.model.contains(candidate))
            .unwrap_or_else(|| title.to_string())
    }

    fn resolve_links(&mut self) {
        for (source, names) in std::mem::take(&mut self.outbound) {
            for name in names {
                let Some(&target) = self.title_index.get(&name.to_lowercase()) else {
                    continue;
                };
                if target != source && !self.model.nodes[target].is_folder() {
                    self.model.add_edge(source, target, EdgeKind::Link);
                }
            }
        }
    }
}

/// Turns a document tree into a fresh graph snapshot with seeded positions.
pub fn build_graph<R: Rng + ?Sized>(
    tree: &[DocumentEntry],
    reader: &dyn LinkReader,
    options: BuildOptions,
    viewport: Vec2,
    rng: &mut R,
) -> GraphModel {
    let mut builder = Builder::new(reader, options);
    builder.walk(tree, None, 0);
    builder.resolve_links();

    let skipped = builder.skipped;
    let mut model = builder.model;
    seed_positions(&mut model, viewport, rng);

    info!(
        nodes = model.node_count(),
        links = model.link_edge_count(),
        edges = model.edges().len(),
        skipped,
        "built graph"
    );
    model
}

/// Places nodes on a jittered circle around the viewport center.
pub fn seed_positions<R: Rng + ?Sized>(model: &mut GraphModel, viewport: Vec2, rng: &mut R) {
    let center = viewport * 0.5;
    let count = model.node_count().max(1) as f32;

    for (index, node) in model.nodes.iter_mut().enumerate() {
        let angle = index as f32 / count * std::f32::consts::TAU;
        let jitter = vec2(
            rng.gen_range(-SEED_JITTER..SEED_JITTER),
            rng.gen_range(-SEED_JITTER..SEED_JITTER),
        );
        node.world_pos = center + Vec2::angled(angle) * SEED_RADIUS + jitter;
        node.velocity = Vec2::ZERO;
    }
}

/// Scans `vault` from disk and builds its graph; runs on the loader thread.
pub fn build_vault_graph(vault: &Path, options: BuildOptions, viewport: Vec2) -> Result<GraphModel> {
    let tree = scan_vault(vault)?;
    let mut rng = rand::thread_rng();
    Ok(build_graph(&tree, &FsLinkReader, options, viewport, &mut rng))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use anyhow::anyhow;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    const VIEWPORT: Vec2 = vec2(800.0, 600.0);

    #[derive(Default)]
    struct MemoryReader {
        links: HashMap<String, Vec<String>>,
    }

    impl MemoryReader {
        fn with(mut self, id: &str, links: &[&str]) -> Self {
            self.links.insert(
                id.to_string(),
                links.iter().map(|name| name.to_string()).collect(),
            );
            self
        }
    }

    impl LinkReader for MemoryReader {
        fn read_links(&self, document: &DocumentEntry) -> Result<Vec<String>> {
            self.links
                .get(&document.id)
                .cloned()
                .ok_or_else(|| anyhow!("no such document {}", document.id))
        }
    }

    fn doc(name: &str) -> DocumentEntry {
        DocumentEntry::document(format!("{name}.md"), format!("/v/{name}.md"))
    }

    fn build(tree: &[DocumentEntry], reader: &MemoryReader, options: BuildOptions) -> GraphModel {
        let mut rng = StdRng::seed_from_u64(7);
        build_graph(tree, reader, options, VIEWPORT, &mut rng)
    }

    fn link_pairs(model: &GraphModel) -> HashSet<(String, String)> {
        model
            .edges()
            .iter()
            .filter(|edge| edge.kind == EdgeKind::Link)
            .map(|edge| {
                let a = model.nodes[edge.source].id.clone();
                let b = model.nodes[edge.target].id.clone();
                if a <= b { (a, b) } else { (b, a) }
            })
            .collect()
    }

    #[test]
    fn links_are_resolved_deduplicated_and_counted() {
        let tree = vec![doc("A"), doc("B"), doc("C")];
        let reader = MemoryReader::default()
            .with("/v/A.md", &["B", "b", "A", "Missing"])
            .with("/v/B.md", &["A", "C"])
            .with("/v/C.md", &[]);

        let model = build(&tree, &reader, BuildOptions::default());

        assert_eq!(model.node_count(), 3);
        assert_eq!(model.edges().len(), 2);
        let expected: HashSet<_> = [
            ("A".to_string(), "B".to_string()),
            ("B".to_string(), "C".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(link_pairs(&model), expected);
        assert_eq!(model.node("A").unwrap().connections, 1);
        assert_eq!(model.node("B").unwrap().connections, 2);
        assert_eq!(model.node("C").unwrap().connections, 1);
        assert_eq!(model.node("A").unwrap().path, "/v/A.md");
    }

    #[test]
    fn unreadable_documents_contribute_no_node() {
        let tree = vec![doc("A"), doc("Locked")];
        let reader = MemoryReader::default().with("/v/A.md", &["Locked"]);

        let model = build(&tree, &reader, BuildOptions::default());

        assert_eq!(model.node_count(), 1);
        assert!(!model.contains("Locked"));
        assert!(model.edges().is_empty());
        assert_eq!(model.node("A").unwrap().connections, 0);
    }

    #[test]
    fn duplicate_titles_get_distinct_ids() {
        let tree = vec![
            DocumentEntry::container("one", "/v/one", vec![DocumentEntry::document("Note.md", "/v/one/Note.md")]),
            DocumentEntry::container("two", "/v/two", vec![DocumentEntry::document("note.md", "/v/two/note.md")]),
            doc("Hub"),
        ];
        let reader = MemoryReader::default()
            .with("/v/one/Note.md", &[])
            .with("/v/two/note.md", &[])
            .with("/v/Hub.md", &["NOTE"]);

        let model = build(&tree, &reader, BuildOptions::default());

        assert_eq!(model.node_count(), 3);
        assert!(model.contains("Note"));
        assert!(model.contains("note"));

        let tree = vec![doc("X"), DocumentEntry::document("X.md", "/v/other/X.md")];
        let reader = MemoryReader::default()
            .with("/v/X.md", &[])
            .with("/v/other/X.md", &["X"]);
        let model = build(&tree, &reader, BuildOptions::default());
        assert!(model.contains("X"));
        assert!(model.contains("X (2)"));
        assert_eq!(model.node("X (2)").unwrap().label, "X");
        // Title lookups resolve to the first document with that title.
        assert_eq!(model.node("X").unwrap().connections, 1);
        assert_eq!(model.node("X (2)").unwrap().connections, 1);
    }

    #[test]
    fn hierarchy_overlay_adds_folders_colors_and_parent_edges() {
        let tree = vec![
            DocumentEntry::container(
                "projects",
                "/v/projects",
                vec![
                    DocumentEntry::document("Plan.md", "/v/projects/Plan.md"),
                    DocumentEntry::container(
                        "old",
                        "/v/projects/old",
                        vec![DocumentEntry::document("Archive.md", "/v/projects/old/Archive.md")],
                    ),
                ],
            ),
            DocumentEntry::document("Inbox.md", "/v/Inbox.md"),
        ];
        let reader = MemoryReader::default()
            .with("/v/projects/Plan.md", &["Archive", "projects"])
            .with("/v/projects/old/Archive.md", &[])
            .with("/v/Inbox.md", &[]);

        let model = build(&tree, &reader, BuildOptions { hierarchy: true });

        assert_eq!(model.node_count(), 5);
        let projects = model.node("folder:/v/projects").unwrap();
        assert!(projects.is_folder());
        assert_eq!(projects.label, "projects");
        assert_eq!(projects.color(), Some(folder_color(0)));

        let old = model.node("folder:/v/projects/old").unwrap().hierarchy.clone().unwrap();
        assert_eq!(old.parent_id.as_deref(), Some("folder:/v/projects"));
        assert_eq!(old.color, folder_color(1));
        assert_eq!(old.depth, 1);

        let archive = model.node("Archive").unwrap().hierarchy.clone().unwrap();
        assert_eq!(archive.color, folder_color(1));
        assert_eq!(archive.parent_id.as_deref(), Some("folder:/v/projects/old"));
        assert_eq!(archive.depth, 2);

        let inbox = model.node("Inbox").unwrap().hierarchy.clone().unwrap();
        assert_eq!(inbox.parent_id, None);
        assert_eq!(inbox.color, MUTED);

        let hierarchy_edges = model
            .edges()
            .iter()
            .filter(|edge| edge.kind == EdgeKind::Hierarchy)
            .count();
        assert_eq!(hierarchy_edges, 3);
        // Folder names never resolve as link targets.
        assert_eq!(model.link_edge_count(), 1);
        assert_eq!(model.node("folder:/v/projects").unwrap().connections, 0);
    }

    #[test]
    fn folders_are_ignored_without_hierarchy() {
        let tree = vec![DocumentEntry::container("projects", "/v/projects", vec![doc("Plan")])];
        let reader = MemoryReader::default().with("/v/Plan.md", &[]);

        let model = build(&tree, &reader, BuildOptions::default());

        assert_eq!(model.node_count(), 1);
        assert!(model.node("Plan").unwrap().hierarchy.is_none());
    }

    #[test]
    fn seeded_positions_lie_on_a_jittered_circle() {
        let tree: Vec<_> = (0..12).map(|i| doc(&format!("N{i}"))).collect();
        let mut reader = MemoryReader::default();
        for i in 0..12 {
            reader = reader.with(&format!("/v/N{i}.md"), &[]);
        }

        let model = build(&tree, &reader, BuildOptions::default());
        let center = VIEWPORT * 0.5;
        let limit = SEED_RADIUS + SEED_JITTER * std::f32::consts::SQRT_2;
        for node in &model.nodes {
            let distance = (node.world_pos - center).length();
            assert!(distance <= limit, "{} at {distance}", node.id);
            assert!(distance >= SEED_RADIUS - SEED_JITTER * std::f32::consts::SQRT_2);
            assert_eq!(node.velocity, Vec2::ZERO);
        }

        let again = build(&tree, &reader, BuildOptions::default());
        assert_eq!(model.nodes[3].world_pos, again.nodes[3].world_pos);
    }

    #[test]
    fn empty_tree_builds_empty_graph() {
        let model = build(&[], &MemoryReader::default(), BuildOptions { hierarchy: true });
        assert!(model.is_empty());
        assert!(model.edges().is_empty());
    }

    #[test]
    fn builds_from_a_vault_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("A.md"), "see [[B]]").unwrap();
        std::fs::write(dir.path().join("B.md"), "back to [[a|A]]").unwrap();
        std::fs::write(dir.path().join("image.png"), "").unwrap();

        let model = build_vault_graph(dir.path(), BuildOptions::default(), VIEWPORT).unwrap();

        assert_eq!(model.node_count(), 2);
        assert_eq!(model.link_edge_count(), 1);
    }

    proptest! {
        #[test]
        fn built_graphs_keep_model_invariants(
            (count, links) in (1usize..10).prop_flat_map(|count| {
                (
                    Just(count),
                    proptest::collection::vec(
                        proptest::collection::vec(0usize..count + 3, 0..6),
                        count,
                    ),
                )
            })
        ) {
            let tree: Vec<_> = (0..count).map(|i| doc(&format!("N{i}"))).collect();
            let mut reader = MemoryReader::default();
            for (i, targets) in links.iter().enumerate() {
                let names: Vec<String> = targets.iter().map(|t| format!("n{t}")).collect();
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                reader = reader.with(&format!("/v/N{i}.md"), &names);
            }

            let model = build(&tree, &reader, BuildOptions::default());

            let mut pairs = HashSet::new();
            let mut incident = vec![0usize; model.node_count()];
            for edge in model.edges() {
                prop_assert!(edge.source < model.node_count());
                prop_assert!(edge.target < model.node_count());
                prop_assert_ne!(edge.source, edge.target);
                let key = (edge.source.min(edge.target), edge.source.max(edge.target));
                prop_assert!(pairs.insert(key));
                incident[edge.source] += 1;
                incident[edge.target] += 1;
            }
            for (index, node) in model.nodes.iter().enumerate() {
                prop_assert_eq!(node.connections, incident[index]);
            }
        }
    }
}
