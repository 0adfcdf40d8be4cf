use eframe::egui::{self, Align, Context, Layout};

use super::super::SymfinderApp;
use super::super::session::{Command, DisplayPhase};

impl SymfinderApp {
    pub(in crate::app) fn draw_top_bar(&mut self, ctx: &Context) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("symfinder");
                    ui.separator();
                    ui.label(format!("graph: {}", self.session.sources().graph.display()));
                    if let Some(stats) = &self.session.sources().stats {
                        ui.label(format!("stats: {}", stats.display()));
                    }

                    let reload = ui.add_enabled(
                        !self.session.is_loading(),
                        egui::Button::new("Reload"),
                    );
                    if reload
                        .on_hover_text("Read both documents again and rebuild the scene.")
                        .clicked()
                    {
                        self.session.send(Command::Reload);
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.status_text());
                        if self.session.is_loading() {
                            ui.spinner();
                        }
                    });
                });
            });
    }

    fn status_text(&self) -> String {
        let render = self.session.render();
        let phase = match self.session.phase() {
            DisplayPhase::Idle => "idle",
            DisplayPhase::Loading => "loading",
            DisplayPhase::Enriching => "enriching",
            DisplayPhase::Bound => "bound",
            DisplayPhase::Simulating => "simulating",
            DisplayPhase::Settled => "settled",
            DisplayPhase::Failed(_) => "failed",
        };

        let mut text = format!(
            "{phase} (#{})  |  nodes {}  |  links {}",
            self.session.generation(),
            render.nodes().len(),
            render.links().len()
        );
        if render.is_running() {
            text.push_str(&format!("  |  alpha {:.3}", render.alpha()));
        }
        text
    }
}
