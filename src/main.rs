mod app;
mod filter;
mod graph;
mod util;

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use app::{LayoutConfig, SessionConfig};
use graph::DocumentSources;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph document produced by the analyzer
    graph: PathBuf,

    /// Statistics document shown in the side panel
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Class or package to hide on startup (repeatable)
    #[arg(long = "filter", value_name = "TOKEN")]
    filters: Vec<String>,

    /// Package to color on startup (repeatable)
    #[arg(long = "color", value_name = "TOKEN")]
    colors: Vec<String>,

    /// Hide entities without any visible link
    #[arg(long)]
    isolate: bool,

    #[arg(long, default_value_t = 100.0)]
    link_distance: f32,

    /// Many-body strength; negative values repel
    #[arg(long, default_value_t = -50.0, allow_negative_numbers = true)]
    charge: f32,

    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_target(false)
        .init();

    let config = SessionConfig {
        sources: DocumentSources {
            graph: args.graph,
            stats: args.stats,
        },
        filters: args.filters,
        package_colors: args.colors,
        isolate: args.isolate,
        layout: LayoutConfig {
            link_distance: args.link_distance,
            charge: args.charge,
            ..LayoutConfig::default()
        },
    };
    tracing::info!(graph = %config.sources.graph.display(), "starting viewer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "symfinder",
        options,
        Box::new(move |cc| Ok(Box::new(app::SymfinderApp::new(cc, config)))),
    )
}
