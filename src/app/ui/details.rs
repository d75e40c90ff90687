use std::collections::BTreeSet;
use std::fs;

use anyhow::{Context, Result};
use eframe::egui::{self, RichText, Ui};
use tracing::{info, warn};

use crate::util::{normalize_title, short_name};

use super::super::graph::GraphModel;
use super::super::{OpenDocument, ViewModel};

const CONNECTED_PREVIEW_ROWS: usize = 8;

/// Documents one hop away from `index`, by label.
fn connected_documents(graph: &GraphModel, index: usize) -> Vec<usize> {
    let Some(node) = graph.nodes.get(index) else {
        return Vec::new();
    };
    if !node.is_folder() {
        return graph.linked_documents(index);
    }

    let children: BTreeSet<usize> = graph
        .neighbors(index)
        .filter(|other| !graph.nodes[*other].is_folder())
        .collect();
    let mut children: Vec<usize> = children.into_iter().collect();
    children.sort_by(|a, b| graph.nodes[*a].label.cmp(&graph.nodes[*b].label));
    children
}

fn read_document(path: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
}

impl ViewModel {
    pub(in crate::app) fn open_document(&mut self, path: &str) {
        let content = read_document(path).map_err(|error| {
            warn!("{error:#}");
            format!("{error:#}")
        });
        info!(path, "opened document");
        self.open_document = Some(OpenDocument {
            path: path.to_owned(),
            title: normalize_title(short_name(path)),
            content,
        });
    }

    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        self.draw_selection(ui);

        ui.separator();
        self.draw_open_document(ui);
    }

    fn draw_selection(&mut self, ui: &mut Ui) {
        let Some(selected_id) = self.controller.selected_id().map(str::to_owned) else {
            ui.label("Click a node to select it.");
            return;
        };
        let graph = self.graph();
        let Some(index) = graph.index_of(&selected_id) else {
            ui.label("Selected node is not part of the shown graph.");
            return;
        };

        let node = &graph.nodes[index];
        let is_folder = node.is_folder();
        ui.label(RichText::new(node.label.as_str()).strong());
        ui.small(node.path.as_str());
        ui.label(if is_folder { "Folder" } else { "Document" });
        ui.label(format!("Connections: {}", node.connections));

        let connected: Vec<(String, String)> = connected_documents(graph, index)
            .into_iter()
            .map(|other| (graph.nodes[other].id.clone(), graph.nodes[other].label.clone()))
            .collect();

        ui.separator();
        ui.label(RichText::new("Connected documents").strong());
        if connected.is_empty() {
            ui.label("No connected documents.");
        }
        let mut activated = None;
        for (id, label) in connected.iter().take(CONNECTED_PREVIEW_ROWS) {
            if ui.link(label.as_str()).clicked() {
                activated = Some(id.clone());
            }
        }
        if connected.len() > CONNECTED_PREVIEW_ROWS {
            ui.label(format!("+{} more", connected.len() - CONNECTED_PREVIEW_ROWS));
        }
        if let Some(id) = activated {
            let graph = match &self.local {
                Some(local) => &local.graph,
                None => &self.full_graph,
            };
            self.controller.activate(graph, &id);
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if !is_folder && ui.button("Open").clicked() {
                let graph = match &self.local {
                    Some(local) => &local.graph,
                    None => &self.full_graph,
                };
                self.controller.activate(graph, &selected_id);
            }
            if self.local.is_some() {
                if ui.button("Back to full graph").clicked() {
                    self.show_full_graph();
                }
            } else if ui.button("Show local graph").clicked() {
                self.show_local_graph(&selected_id);
            }
        });
    }

    fn draw_open_document(&mut self, ui: &mut Ui) {
        let Some(title) = self.open_document.as_ref().map(|document| document.title.clone()) else {
            ui.label("No document open.");
            return;
        };

        ui.horizontal(|ui| {
            ui.label(RichText::new(title).strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("Close").clicked() {
                    self.open_document = None;
                }
            });
        });
        let Some(document) = &self.open_document else {
            return;
        };

        match &document.content {
            Ok(text) => {
                egui::ScrollArea::vertical()
                    .id_salt("document_preview")
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        ui.label(text.as_str());
                    });
            }
            Err(error) => {
                ui.colored_label(ui.visuals().error_fg_color, error.as_str());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::app::graph::{EdgeKind, GraphNode};

    #[test]
    fn documents_list_their_link_neighbours_once() {
        let mut graph = GraphModel::new();
        graph.push_node(GraphNode::document("A", "A", "/v/A.md"));
        graph.push_node(GraphNode::document("B", "B", "/v/B.md"));
        graph.push_node(GraphNode::document("C", "C", "/v/C.md"));
        graph.push_node(GraphNode::folder("folder:/v", "v", "/v"));
        graph.add_edge(0, 1, EdgeKind::Link);
        graph.add_edge(2, 0, EdgeKind::Link);
        graph.add_edge(3, 0, EdgeKind::Hierarchy);

        assert_eq!(connected_documents(&graph, 0), vec![1, 2]);
        assert!(connected_documents(&graph, 9).is_empty());
    }

    #[test]
    fn folders_list_their_documents_by_label() {
        let mut graph = GraphModel::new();
        graph.push_node(GraphNode::folder("folder:/v", "v", "/v"));
        graph.push_node(GraphNode::document("Zeta", "Zeta", "/v/Zeta.md"));
        graph.push_node(GraphNode::document("Alpha", "Alpha", "/v/Alpha.md"));
        graph.push_node(GraphNode::folder("folder:/v/sub", "sub", "/v/sub"));
        graph.add_edge(0, 1, EdgeKind::Hierarchy);
        graph.add_edge(0, 2, EdgeKind::Hierarchy);
        graph.add_edge(0, 3, EdgeKind::Hierarchy);

        assert_eq!(connected_documents(&graph, 0), vec![2, 1]);
    }

    #[test]
    fn read_document_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Note.md");
        fs::write(&path, "# Note\n[[Other]]").unwrap();

        let path = path.to_string_lossy().into_owned();
        assert_eq!(read_document(&path).unwrap(), "# Note\n[[Other]]");

        let missing = dir.path().join("Missing.md").to_string_lossy().into_owned();
        let error = format!("{:#}", read_document(&missing).unwrap_err());
        assert!(error.contains("Missing.md"));
    }
}
