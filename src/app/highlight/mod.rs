use std::collections::HashSet;
use std::sync::Arc;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::graph::{GraphEdge, GraphModel};

/// Which nodes and edges stand out in the current frame.
///
/// The focus is the hovered node, or the selected one when nothing is
/// hovered. The open document is always highlighted but is never a focus.
#[derive(Debug, Default)]
pub(in crate::app) struct HighlightState {
    focus: Option<usize>,
    hovered: Option<usize>,
    selected: Option<usize>,
    current: Option<usize>,
    neighbors: HashSet<usize>,
}

impl HighlightState {
    pub(in crate::app) fn new(
        model: &GraphModel,
        hover_id: Option<&str>,
        selected_id: Option<&str>,
        current_path: Option<&str>,
    ) -> Self {
        let hovered = hover_id.and_then(|id| model.index_of(id));
        let selected = selected_id.and_then(|id| model.index_of(id));
        let focus = hovered.or(selected);
        let current = current_path.and_then(|path| {
            model
                .nodes
                .iter()
                .position(|node| !node.is_folder() && node.path == path)
        });
        let neighbors = focus
            .map(|index| model.neighbors(index).collect())
            .unwrap_or_default();

        Self {
            focus,
            hovered,
            selected,
            current,
            neighbors,
        }
    }

    pub(in crate::app) fn has_focus(&self) -> bool {
        self.focus.is_some()
    }

    pub(in crate::app) fn is_current(&self, index: usize) -> bool {
        self.current == Some(index)
    }

    pub(in crate::app) fn edge_emphasized(&self, edge: &GraphEdge) -> bool {
        self.focus.is_some_and(|focus| edge.touches(focus))
    }

    pub(in crate::app) fn node_highlighted(&self, index: usize) -> bool {
        self.hovered == Some(index)
            || self.selected == Some(index)
            || self.current == Some(index)
            || self.neighbors.contains(&index)
    }
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

pub(in crate::app) fn search_matches(model: &GraphModel, query: &str) -> HashSet<usize> {
    let query = query.trim();
    if query.is_empty() {
        return HashSet::new();
    }

    let matcher = SkimMatcherV2::default();
    model
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| fuzzy_match_score(&matcher, &node.label, query).is_some())
        .map(|(index, _)| index)
        .collect()
}

/// Fuzzy matches for one query against one graph revision.
pub(in crate::app) struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<usize>>,
}

impl SearchMatchCache {
    pub(in crate::app) fn lookup(
        cache: &mut Option<Self>,
        model: &GraphModel,
        query: &str,
        graph_revision: u64,
    ) -> Arc<HashSet<usize>> {
        let query = query.trim();
        if let Some(cached) = cache
            && cached.graph_revision == graph_revision
            && cached.query == query
        {
            return Arc::clone(&cached.matches);
        }

        let matches = Arc::new(search_matches(model, query));
        *cache = Some(Self {
            query: query.to_owned(),
            graph_revision,
            matches: Arc::clone(&matches),
        });
        matches
    }
}
