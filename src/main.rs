mod app;
mod settings;
mod util;
mod vault;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use settings::{BoundaryPolicy, GraphSettings};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BoundaryArg {
    Rectangular,
    Circular,
}

impl From<BoundaryArg> for BoundaryPolicy {
    fn from(arg: BoundaryArg) -> Self {
        match arg {
            BoundaryArg::Rectangular => Self::Rectangular,
            BoundaryArg::Circular => Self::Circular,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory of Markdown notes.
    #[arg(default_value = ".")]
    vault: PathBuf,

    /// JSON file with graph settings.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Show folders and parent/child edges.
    #[arg(long)]
    hierarchy: bool,

    #[arg(long, value_enum)]
    boundary: Option<BoundaryArg>,

    /// Do not rebuild when notes change on disk.
    #[arg(long)]
    no_watch: bool,
}

impl Args {
    fn graph_settings(&self) -> Result<GraphSettings> {
        let mut settings = match &self.settings {
            Some(path) => GraphSettings::load(path)?,
            None => GraphSettings::default(),
        };
        if self.hierarchy {
            settings.hierarchy = true;
        }
        if let Some(boundary) = self.boundary {
            settings.boundary = boundary.into();
        }
        Ok(settings)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vault_graph=info")),
        )
        .init();

    let args = Args::parse();
    let settings = args.graph_settings()?;
    let vault = args.vault.clone();
    let watch = !args.no_watch;
    info!(vault = %vault.display(), ?settings, "starting vault graph");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "vault-graph",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::NoteGraphApp::new(
                cc, vault, settings, watch,
            )))
        }),
    )
    .map_err(|error| anyhow!("failed to start the window: {error}"))
}
