use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Shape, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::style::StrokeDash;
use crate::util::short_name;

use super::render_utils::{
    arrowhead, circle_outline, circle_visible, draw_background, segment_visible,
};
use super::{SearchMatchCache, SymfinderApp};

mod interaction;

const LINK_COLOR: Color32 = Color32::from_rgb(153, 153, 153);
const ARROW_COLOR: Color32 = Color32::GRAY;
const SEARCH_COLOR: Color32 = Color32::from_rgb(40, 140, 235);
const DASH: f32 = 3.0;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl SymfinderApp {
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let revision = self.session.render().revision();
        if let Some(cached) = &self.search_match_cache
            && cached.render_revision == revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .session
            .render()
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                fuzzy_match_score(&matcher, short_name(node.name()), query).is_some()
            })
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            render_revision: revision,
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_node_drag(ui, rect, &response);
        self.handle_graph_pan(&response);

        let hovered = self.hovered_index(ui, rect);
        self.handle_node_click(&response, hovered);
        self.update_cursor(ui, hovered);
        self.hovered = hovered
            .and_then(|index| self.session.render().nodes().get(index))
            .map(|node| node.name().to_owned());

        if self.session.tick() || response.dragged() {
            ui.ctx().request_repaint();
        }

        let search_matches = self.cached_search_matches();
        let view = self.view;
        draw_background(&painter, rect, view);

        let render = self.session.render();
        if render.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No entities left after filtering.",
                FontId::proportional(14.0),
                Color32::from_gray(90),
            );
            return;
        }

        let nodes = render.nodes();
        let link_width = (1.0 * view.zoom).clamp(0.5, 3.0);
        let arrow_size = (8.0 * view.zoom).clamp(3.0, 16.0);
        for link in render.links() {
            let start = view.to_screen(rect, link.start);
            let end = view.to_screen(rect, link.end);
            if !segment_visible(rect, start, end, arrow_size) {
                continue;
            }
            painter.line_segment([start, end], Stroke::new(link_width, LINK_COLOR));

            let (source, _) = link.endpoints();
            let direction = start - end;
            if direction.length_sq() > f32::EPSILON {
                let tip = start - direction.normalized() * (nodes[source].radius * view.zoom);
                painter.add(Shape::convex_polygon(
                    arrowhead(tip, direction, arrow_size).to_vec(),
                    ARROW_COLOR,
                    Stroke::NONE,
                ));
            }
        }

        for (index, node) in nodes.iter().enumerate() {
            let center = view.to_screen(rect, node.position);
            let radius = node.radius * view.zoom;
            if !circle_visible(rect, center, radius + node.stroke_width) {
                continue;
            }

            painter.circle_filled(center, radius, node.fill);
            let stroke = Stroke::new(node.stroke_width * view.zoom, Color32::BLACK);
            if node.stroke_width > 0.0 {
                match node.dash {
                    StrokeDash::Solid => {
                        painter.circle_stroke(center, radius, stroke);
                    }
                    StrokeDash::Dashed => {
                        let dash = DASH * view.zoom;
                        painter.extend(Shape::dashed_line(
                            &circle_outline(center, radius),
                            stroke,
                            dash,
                            dash,
                        ));
                    }
                }
            }

            if search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index))
            {
                painter.circle_stroke(
                    center,
                    radius + node.stroke_width * view.zoom + 3.0,
                    Stroke::new(2.0, SEARCH_COLOR),
                );
            }
        }

        let font = FontId::proportional((12.0 * view.zoom).clamp(6.0, 28.0));
        for label in render.labels() {
            if label.text.is_empty() {
                continue;
            }
            let position = view.to_screen(rect, label.position);
            if !rect.contains(position) {
                continue;
            }
            painter.text(
                position + vec2(-5.0 * view.zoom, 0.0),
                Align2::LEFT_CENTER,
                &label.text,
                font.clone(),
                label.color,
            );
        }

        if let Some(node) = hovered.and_then(|index| nodes.get(index)) {
            let galley_pos = rect.left_top() + vec2(10.0, 10.0);
            let text = painter.layout_no_wrap(
                node.title.clone(),
                FontId::proportional(13.0),
                Color32::from_gray(20),
            );
            let frame = egui::Rect::from_min_size(galley_pos, text.size()).expand(6.0);
            painter.rect_filled(frame, 4.0, Color32::from_rgba_unmultiplied(255, 255, 255, 230));
            painter.galley(galley_pos, text, Color32::from_gray(20));
        }
    }
}
