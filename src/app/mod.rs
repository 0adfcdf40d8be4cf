use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{self, Context};

mod canvas;
mod layout;
mod render;
mod render_utils;
mod session;
mod ui;

pub(crate) use layout::LayoutConfig;
pub(crate) use session::SessionConfig;

use render_utils::ViewTransform;
use session::{Command, DisplayPhase, Session};

const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct SymfinderApp {
    session: Session,
    view: ViewTransform,
    filter_input: String,
    color_input: String,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    hovered: Option<String>,
}

struct SearchMatchCache {
    query: String,
    render_revision: u64,
    matches: Arc<HashSet<usize>>,
}

impl SymfinderApp {
    pub(crate) fn new(_cc: &eframe::CreationContext<'_>, config: SessionConfig) -> Self {
        let mut session = Session::new(config);
        session.display();

        Self {
            session,
            view: ViewTransform::default(),
            filter_input: String::new(),
            color_input: String::new(),
            search: String::new(),
            search_match_cache: None,
            hovered: None,
        }
    }

    fn draw_loading(ui: &mut egui::Ui, graph: &str) {
        ui.vertical_centered(|ui| {
            ui.add_space(120.0);
            ui.heading(format!("Loading {graph}..."));
            ui.add_space(8.0);
            ui.spinner();
        });
    }

    fn draw_failure(&self, ui: &mut egui::Ui, message: &str) {
        ui.heading("Failed to display the graph");
        ui.add_space(6.0);
        ui.label(message);
        ui.add_space(10.0);
        if ui.button("Retry").clicked() {
            self.session.send(Command::Reload);
        }
    }
}

impl eframe::App for SymfinderApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.session.process_commands();
        self.session.poll_load();
        if self.session.is_loading() {
            ctx.request_repaint_after(LOAD_POLL_INTERVAL);
        }

        self.draw_top_bar(ctx);

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| match self.session.phase().clone() {
                DisplayPhase::Failed(message) => {
                    egui::Frame::central_panel(ui.style()).show(ui, |ui| {
                        self.draw_failure(ui, &message);
                    });
                }
                _ if self.session.render().is_empty() && self.session.is_loading() => {
                    let graph = self.session.sources().graph.display().to_string();
                    Self::draw_loading(ui, &graph);
                }
                _ => self.draw_graph(ui),
            });

        if self.session.process_commands() {
            ctx.request_repaint();
        }
    }
}
