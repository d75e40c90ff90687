use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use eframe::egui::{self, Context, Vec2};
use tracing::{info, warn};

use crate::settings::GraphSettings;
use crate::vault::VaultWatcher;

mod animation;
mod graph;
mod highlight;
mod physics;
mod rebuild;
mod render_utils;
mod ui;

use animation::AnimationDriver;
use graph::{BuildOptions, GraphModel, InteractionController, RenderSurface, ViewTransform};
use highlight::SearchMatchCache;
use rebuild::{BuildPoll, RebuildQueue};

const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(250);
const PENDING_POLL_INTERVAL: Duration = Duration::from_millis(100);
const REBUILD_POLL_INTERVAL: Duration = Duration::from_millis(50);

type BuildResult = Result<GraphModel, String>;

pub struct NoteGraphApp {
    vault: PathBuf,
    settings: GraphSettings,
    state: AppState,
    rebuild: RebuildQueue<BuildResult>,
    watcher: Option<VaultWatcher>,
}

enum AppState {
    Loading { rx: Receiver<BuildResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    full_graph: GraphModel,
    local: Option<LocalGraph>,
    settings: GraphSettings,
    view: ViewTransform,
    controller: InteractionController,
    driver: AnimationDriver,
    surface: RenderSurface,
    graph_revision: u64,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    open_document: Option<OpenDocument>,
    context_target: Option<String>,
    show_settings: bool,
}

/// A node and its direct neighbours shown on their own.
struct LocalGraph {
    center_id: String,
    graph: GraphModel,
}

struct OpenDocument {
    path: String,
    title: String,
    content: Result<String, String>,
}

impl NoteGraphApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        vault: PathBuf,
        settings: GraphSettings,
        watch: bool,
    ) -> Self {
        let watcher = if watch {
            match VaultWatcher::new(&vault) {
                Ok(watcher) => Some(watcher),
                Err(error) => {
                    warn!("live refresh disabled: {error:#}");
                    None
                }
            }
        } else {
            None
        };

        let state = Self::start_load(vault.clone(), settings);
        Self {
            vault,
            settings,
            state,
            rebuild: RebuildQueue::default(),
            watcher,
        }
    }

    fn spawn_build(vault: PathBuf, options: BuildOptions, viewport: Vec2) -> Receiver<BuildResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = graph::build_vault_graph(&vault, options, viewport)
                .map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(vault: PathBuf, settings: GraphSettings) -> AppState {
        let options = BuildOptions {
            hierarchy: settings.hierarchy,
        };
        AppState::Loading {
            rx: Self::spawn_build(vault, options, RenderSurface::default().logical()),
        }
    }

    fn vault_changed(&mut self, ctx: &Context) -> bool {
        let Some(watcher) = self.watcher.as_mut() else {
            return false;
        };
        let changed = watcher.poll();
        let interval = if watcher.has_pending() {
            PENDING_POLL_INTERVAL
        } else {
            WATCH_POLL_INTERVAL
        };
        ctx.request_repaint_after(interval);
        changed
    }
}

impl eframe::App for NoteGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let vault_changed = self.vault_changed(ctx);

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(graph)) => {
                        transition = Some(AppState::Ready(Box::new(ViewModel::new(
                            graph,
                            self.settings,
                        ))));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(AppState::Error(
                            "Background build worker disconnected".to_owned(),
                        ));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Building note graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to read the vault");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.vault.clone(), self.settings));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut rebuild_requested = vault_changed;
                let is_rebuilding = self.rebuild.is_running();
                let vault_label = self.vault.display().to_string();
                model.show(ctx, &vault_label, &mut rebuild_requested, is_rebuilding);

                let vault = &self.vault;
                if rebuild_requested {
                    self.rebuild.request(|| {
                        Self::spawn_build(vault.clone(), model.build_options(), model.surface.logical())
                    });
                }

                let polled = self.rebuild.poll(|| {
                    Self::spawn_build(vault.clone(), model.build_options(), model.surface.logical())
                });
                match polled {
                    BuildPoll::Idle | BuildPoll::Pending => {}
                    BuildPoll::Finished(Ok(graph)) => model.install_graph(graph),
                    BuildPoll::Finished(Err(error)) => {
                        warn!("vault rescan failed, keeping the current graph: {error}");
                    }
                    BuildPoll::Lost => warn!("background rescan worker disconnected"),
                }
                if self.rebuild.is_running() {
                    ctx.request_repaint_after(REBUILD_POLL_INTERVAL);
                }
            }
        }

        if let Some(next_state) = transition {
            self.rebuild.clear();
            self.state = next_state;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let AppState::Ready(model) = &mut self.state
            && model.driver.is_running()
        {
            model.driver.stop();
        }
        info!("closing vault graph");
    }
}
