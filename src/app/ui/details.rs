use eframe::egui::{self, Color32, RichText, Stroke, Ui, vec2};

use crate::graph::style::{INTERFACE_FILL, StrokeDash, pattern_glyph};

use super::super::SymfinderApp;
use super::super::render_utils::circle_outline;

const MAX_LINK_ROWS: usize = 12;

impl SymfinderApp {
    pub(in crate::app) fn draw_details(&self, ui: &mut Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.draw_statistics(ui);
                ui.separator();
                self.draw_hovered_entity(ui);
                ui.separator();
                Self::draw_legend(ui);
            });
    }

    fn draw_statistics(&self, ui: &mut Ui) {
        ui.heading("Statistics");
        let Some(statistics) = self.session.statistics() else {
            ui.weak("unavailable");
            return;
        };

        egui::Grid::new("statistics_grid")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                for (label, value) in statistics.rows() {
                    ui.label(label);
                    ui.label(value.to_string());
                    ui.end_row();
                }
            });
    }

    fn draw_hovered_entity(&self, ui: &mut Ui) {
        ui.heading("Entity");
        let Some(entity) = self
            .hovered
            .as_deref()
            .and_then(|name| self.session.model()?.entity(name))
        else {
            ui.weak("Hover a node to inspect it; click it to hide it.");
            return;
        };

        ui.label(RichText::new(entity.name.as_str()).strong());
        let types = entity
            .types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        egui::Grid::new("entity_grid").num_columns(2).show(ui, |ui| {
            for (label, value) in [
                ("types", types),
                ("methods", entity.methods.to_string()),
                ("constructors", entity.constructors.to_string()),
                ("variants", entity.nb_variants.to_string()),
                ("patterns", pattern_glyph(&entity.types)),
            ] {
                ui.label(label);
                ui.label(value);
                ui.end_row();
            }
        });

        let render = self.session.render();
        let Some(index) = render.index_of(&entity.name) else {
            return;
        };
        let touching = render
            .links()
            .iter()
            .filter(|link| {
                let (source, target) = link.endpoints();
                source == index || target == index
            })
            .collect::<Vec<_>>();
        if touching.is_empty() {
            return;
        }

        ui.add_space(6.0);
        ui.label(RichText::new(format!("Visible links ({})", touching.len())).strong());
        for link in touching.iter().take(MAX_LINK_ROWS) {
            ui.small(link.title.as_str())
                .on_hover_text(link.endpoint_types.as_str());
        }
        if touching.len() > MAX_LINK_ROWS {
            ui.weak(format!("... and {} more", touching.len() - MAX_LINK_ROWS));
        }
    }

    fn draw_legend(ui: &mut Ui) {
        ui.heading("Legend");

        let swatch = |ui: &mut Ui, fill: Color32, dash: StrokeDash, text: &str| {
            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(vec2(18.0, 18.0), egui::Sense::hover());
                let painter = ui.painter_at(rect);
                painter.circle_filled(rect.center(), 7.0, fill);
                let stroke = Stroke::new(1.5, Color32::BLACK);
                match dash {
                    StrokeDash::Solid => {
                        painter.circle_stroke(rect.center(), 7.0, stroke);
                    }
                    StrokeDash::Dashed => {
                        painter.extend(egui::Shape::dashed_line(
                            &circle_outline(rect.center(), 7.0),
                            stroke,
                            2.0,
                            2.0,
                        ));
                    }
                }
                ui.label(text);
            });
        };

        swatch(ui, INTERFACE_FILL, StrokeDash::Solid, "interface");
        swatch(
            ui,
            Color32::from_rgb(255, 120, 120),
            StrokeDash::Solid,
            "class, redder = more constructors",
        );
        swatch(ui, Color32::WHITE, StrokeDash::Dashed, "abstract class");
        ui.small("Radius grows with method count; stroke width is the number of variants.");
        ui.small("Labels: S strategy, F factory, T template, D decorator.");
        ui.small("Arrowheads point at the source of a relationship.");
    }
}
