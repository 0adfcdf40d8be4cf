use eframe::egui::{self, PointerButton, Rect, Response, Ui};

use super::super::SymfinderApp;
use super::super::session::Command;

impl SymfinderApp {
    pub(in crate::app) fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.view.zoom_at(rect, pointer, factor);
    }

    /// Secondary or middle drag pans anywhere; primary drag pans only off-node.
    pub(in crate::app) fn handle_graph_pan(&mut self, response: &Response) {
        let node_drag = self.session.render().dragging().is_some();
        if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
            || (response.dragged_by(PointerButton::Primary) && !node_drag)
        {
            self.view.pan += response.drag_delta();
        }
    }

    /// Pins the node under the press point and keeps it under the pointer until release.
    pub(in crate::app) fn handle_node_drag(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        let view = self.view;

        if response.drag_started_by(PointerButton::Primary)
            && let Some(origin) = ui.input(|input| input.pointer.press_origin())
        {
            let world = view.to_world(rect, origin);
            let render = self.session.render_mut();
            if let Some(index) = render.node_at(world) {
                render.drag_start(index, world);
            }
        }

        if response.dragged_by(PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            self.session
                .render_mut()
                .drag_move(view.to_world(rect, pointer));
        }

        if response.drag_stopped() {
            self.session.render_mut().drag_end();
        }
    }

    pub(in crate::app) fn hovered_index(&self, ui: &Ui, rect: Rect) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        if !rect.contains(pointer) {
            return None;
        }
        self.session
            .render()
            .node_at(self.view.to_world(rect, pointer))
    }

    pub(in crate::app) fn handle_node_click(&self, response: &Response, hovered: Option<usize>) {
        if !response.clicked_by(PointerButton::Primary) {
            return;
        }
        let Some(node) = hovered.and_then(|index| self.session.render().nodes().get(index)) else {
            return;
        };
        tracing::debug!(name = node.name(), serial = node.serial(), "node clicked");
        self.session.send(Command::AddFilter(node.name().to_owned()));
    }

    pub(in crate::app) fn update_cursor(&self, ui: &Ui, hovered: Option<usize>) {
        let icon = if self.session.render().dragging().is_some() {
            egui::CursorIcon::Grabbing
        } else if hovered.is_some() {
            egui::CursorIcon::PointingHand
        } else {
            return;
        };
        ui.output_mut(|output| output.cursor_icon = icon);
    }
}
