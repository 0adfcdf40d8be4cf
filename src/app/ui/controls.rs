use eframe::egui::{self, Key, RichText, Ui};

use crate::filter::FilterItem;
use crate::graph::style::contrast_color;

use super::super::SymfinderApp;
use super::super::session::Command;

const FILTER_HINT: &str = "A token whose last segment has an uppercase letter hides that exact \
     class; any other token hides every name starting with it.";

/// Text field plus button; returns the trimmed token once submitted.
fn token_input(ui: &mut Ui, text: &mut String, hint: &str, button: &str) -> Option<String> {
    let mut submitted = false;
    ui.horizontal(|ui| {
        let response = ui.add(egui::TextEdit::singleline(text).hint_text(hint));
        if response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter)) {
            submitted = true;
            response.request_focus();
        }
        submitted |= ui.button(button).clicked();
    });

    if !submitted {
        return None;
    }
    let token = text.trim().to_owned();
    text.clear();
    (!token.is_empty()).then_some(token)
}

fn filter_list(ui: &mut Ui, items: &[FilterItem], empty: &str) -> Option<String> {
    if items.is_empty() {
        ui.weak(empty);
        return None;
    }

    let mut removed = None;
    for item in items {
        let mut frame = egui::Frame::new().inner_margin(egui::Margin::symmetric(6, 2));
        let mut text = RichText::new(item.token.as_str());
        if let Some(background) = item.background {
            frame = frame.fill(background).corner_radius(3.0);
            text = text.color(contrast_color(background));
        }

        frame.show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(text);
                if ui
                    .small_button("×")
                    .on_hover_text("Remove this filter")
                    .clicked()
                {
                    removed = Some(item.token.clone());
                }
            });
        });
    }
    removed
}

impl SymfinderApp {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Filters");
        ui.separator();

        ui.label("Hide classes or packages").on_hover_text(FILTER_HINT);
        if let Some(token) =
            token_input(ui, &mut self.filter_input, "e.g. com.foo or IShape", "Add")
        {
            self.session.send(Command::AddFilter(token));
        }
        let items = self.session.filter_items();
        if let Some(token) = filter_list(ui, &items, "Nothing hidden. Click a node to hide it.") {
            self.session.send(Command::RemoveFilter(token));
        }

        ui.add_space(6.0);
        let mut isolate = self.session.isolate();
        if ui
            .checkbox(&mut isolate, "Hide isolated nodes")
            .on_hover_text("Only keep entities that still have at least one visible link.")
            .changed()
        {
            self.session.send(Command::SetIsolation(isolate));
        }

        ui.separator();
        ui.label("Color packages");
        if let Some(token) = token_input(ui, &mut self.color_input, "e.g. com.foo", "Color") {
            self.session.send(Command::AddPackageColor(token));
        }
        let items = self.session.package_color_items();
        if let Some(token) = filter_list(ui, &items, "Fill follows constructor count.") {
            self.session.send(Command::RemovePackageColor(token));
        }

        ui.separator();
        ui.label("Search")
            .on_hover_text("Outline nodes whose simple name fuzzy-matches; nothing is hidden.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();
        self.draw_layout_controls(ui);
    }

    fn draw_layout_controls(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Layout").strong());

        let mut config = self.session.layout();
        ui.add(egui::Slider::new(&mut config.link_distance, 10.0..=400.0).text("link distance"));
        ui.add(egui::Slider::new(&mut config.charge, -400.0..=0.0).text("charge"));
        self.session.set_layout(config);

        ui.horizontal(|ui| {
            if ui
                .button("Reheat")
                .on_hover_text("Restart the layout at full energy.")
                .clicked()
            {
                self.session.reheat();
            }
            if ui.button("Reset view").clicked() {
                self.view = Default::default();
            }
        });
    }
}
