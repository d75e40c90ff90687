use eframe::egui::{self, Align, Context, Layout};
use tracing::{debug, info};

use crate::settings::GraphSettings;

use super::super::animation::AnimationDriver;
use super::super::graph::{
    BuildOptions, GraphModel, InteractionController, RenderSurface, ViewTransform,
};
use super::super::{LocalGraph, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(graph: GraphModel, settings: GraphSettings) -> Self {
        Self {
            full_graph: graph,
            local: None,
            settings,
            view: ViewTransform::default(),
            controller: InteractionController::default(),
            driver: AnimationDriver::default(),
            surface: RenderSurface::default(),
            graph_revision: 0,
            search: String::new(),
            search_match_cache: None,
            open_document: None,
            context_target: None,
            show_settings: true,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        vault_label: &str,
        rebuild_requested: &mut bool,
        is_rebuilding: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.toggle_value(&mut self.show_settings, "Settings");
                    ui.separator();
                    ui.heading("vault-graph");
                    ui.label(format!("vault: {vault_label}"));
                    ui.separator();
                    let graph = self.graph();
                    ui.label(format!("nodes: {}", graph.node_count()));
                    ui.label(format!("links: {}", graph.link_edge_count()));
                    if self.local.is_some() {
                        ui.label("(local graph)");
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let refresh =
                            ui.add_enabled(!is_rebuilding, egui::Button::new("Refresh"));
                        if refresh.on_hover_text("Rescan the vault").clicked() {
                            *rebuild_requested = true;
                        }
                        if is_rebuilding {
                            ui.spinner();
                        }
                        if ui.button("Reset view").clicked() {
                            self.view.reset();
                        }
                        if ui.button("+").on_hover_text("Zoom in").clicked() {
                            self.view.zoom_in();
                        }
                        ui.label(format!("{:.0}%", self.view.zoom() * 100.0));
                        if ui.button("-").on_hover_text("Zoom out").clicked() {
                            self.view.zoom_out();
                        }
                    });
                });
            });

        if self.show_settings {
            egui::SidePanel::left("controls")
                .resizable(true)
                .default_width(300.0)
                .show(ctx, |ui| {
                    if self.draw_controls(ui) {
                        *rebuild_requested = true;
                    }
                });
        }

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }

    pub(in crate::app) fn graph(&self) -> &GraphModel {
        match &self.local {
            Some(local) => &local.graph,
            None => &self.full_graph,
        }
    }

    pub(in crate::app) fn build_options(&self) -> BuildOptions {
        BuildOptions {
            hierarchy: self.settings.hierarchy,
        }
    }

    /// Swaps in a freshly built graph, keeping the layout of surviving nodes.
    pub(in crate::app) fn install_graph(&mut self, mut graph: GraphModel) {
        let carried = graph.carry_over_from(&self.full_graph);
        if let Some(local) = &self.local {
            graph.carry_over_from(&local.graph);
        }
        info!(
            nodes = graph.node_count(),
            edges = graph.edges().len(),
            carried,
            "installed rebuilt graph"
        );
        self.full_graph = graph;

        if let Some(center_id) = self.local.as_ref().map(|local| local.center_id.clone()) {
            self.local = self
                .full_graph
                .isolate(&center_id)
                .map(|graph| LocalGraph { center_id, graph });
        }
        self.graph_revision += 1;
        self.refresh_displayed_graph();
    }

    pub(in crate::app) fn show_local_graph(&mut self, id: &str) {
        let Some(graph) = self.full_graph.isolate(id) else {
            return;
        };
        debug!(center = id, nodes = graph.node_count(), "showing local graph");
        self.local = Some(LocalGraph {
            center_id: id.to_owned(),
            graph,
        });
        self.graph_revision += 1;
        self.refresh_displayed_graph();
    }

    pub(in crate::app) fn show_full_graph(&mut self) {
        let Some(local) = self.local.take() else {
            return;
        };
        self.full_graph.carry_over_from(&local.graph);
        self.graph_revision += 1;
        self.refresh_displayed_graph();
    }

    fn refresh_displayed_graph(&mut self) {
        self.search_match_cache = None;
        self.context_target = None;
        let graph = match &mut self.local {
            Some(local) => &mut local.graph,
            None => &mut self.full_graph,
        };
        self.controller.sync_with_model(graph);
    }
}
