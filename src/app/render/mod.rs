//! Retained scene elements bound to the working graph by key.
//!
//! Nodes and labels are keyed by entity name, links by endpoint pair plus an
//! ordinal so parallel relationships stay distinct. Reconciling a new working
//! view only creates and destroys the difference; surviving elements keep
//! their identity and their simulated position.

mod reconcile;

use std::collections::HashMap;

use eframe::egui::{Color32, Vec2};

use crate::filter::PackageColorer;
use crate::graph::style::{
    ConstructorScale, INTERFACE_FILL, StrokeDash, contrast_color, entity_title, fill_color,
    pattern_glyph, relationship_title, stroke_width,
};
use crate::graph::{Entity, GraphData, Relationship, TypeTag};
use crate::util::stable_pair;

use super::layout::{Body, LayoutConfig, Simulation};
use reconcile::{Keyed, reconcile};

pub(crate) use reconcile::Delta;

#[derive(Clone, Copy, Debug, PartialEq)]
struct PaletteStamp {
    scale: Option<ConstructorScale>,
    packages: Option<u64>,
}

/// Fill rules for one reconciliation pass.
///
/// The constructor scale is built over the baseline so fills do not shift as
/// filters hide entities. Package colors take over once any package token exists.
pub(crate) struct Palette<'a> {
    scale: Option<ConstructorScale>,
    packages: Option<&'a PackageColorer>,
}

impl<'a> Palette<'a> {
    pub(crate) fn new(baseline: &[Entity], colorer: &'a PackageColorer) -> Self {
        Self {
            scale: ConstructorScale::from_entities(baseline),
            packages: (!colorer.is_empty()).then_some(colorer),
        }
    }

    fn fill(&self, entity: &Entity) -> Color32 {
        if entity.is_interface() {
            return INTERFACE_FILL;
        }
        match self.packages {
            Some(colorer) => colorer.color_for_entity(&entity.name),
            None => fill_color(entity, self.scale.as_ref()),
        }
    }

    fn stamp(&self) -> PaletteStamp {
        PaletteStamp {
            scale: self.scale,
            packages: self.packages.map(PackageColorer::revision),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct NodeElement {
    key: String,
    serial: u64,
    pub(crate) radius: f32,
    pub(crate) fill: Color32,
    pub(crate) dash: StrokeDash,
    pub(crate) stroke_width: f32,
    pub(crate) title: String,
    pub(crate) position: Vec2,
    stamp: PaletteStamp,
}

impl NodeElement {
    fn enter(entity: &Entity, palette: &Palette<'_>, serial: u64) -> Self {
        Self {
            key: entity.name.clone(),
            serial,
            radius: entity.radius,
            fill: palette.fill(entity),
            dash: StrokeDash::for_entity(entity),
            stroke_width: stroke_width(entity),
            title: entity_title(entity),
            position: Vec2::ZERO,
            stamp: palette.stamp(),
        }
    }

    fn restyle(&mut self, entity: &Entity, palette: &Palette<'_>) {
        let stamp = palette.stamp();
        if self.stamp != stamp {
            self.fill = palette.fill(entity);
            self.stamp = stamp;
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.key
    }

    pub(crate) fn serial(&self) -> u64 {
        self.serial
    }
}

impl Keyed for NodeElement {
    type Key = String;

    fn key(&self) -> &String {
        &self.key
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct LinkKey {
    pub(crate) source: String,
    pub(crate) target: String,
    pub(crate) ordinal: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct LinkElement {
    key: LinkKey,
    pub(crate) title: String,
    pub(crate) endpoint_types: String,
    source_index: usize,
    target_index: usize,
    pub(crate) start: Vec2,
    pub(crate) end: Vec2,
}

impl LinkElement {
    pub(crate) fn endpoints(&self) -> (usize, usize) {
        (self.source_index, self.target_index)
    }
}

impl Keyed for LinkElement {
    type Key = LinkKey;

    fn key(&self) -> &LinkKey {
        &self.key
    }
}

#[derive(Clone, Debug)]
pub(crate) struct LabelElement {
    key: String,
    pub(crate) text: String,
    pub(crate) color: Color32,
    pub(crate) position: Vec2,
    stamp: PaletteStamp,
}

impl LabelElement {
    fn enter(entity: &Entity, palette: &Palette<'_>) -> Self {
        Self {
            key: entity.name.clone(),
            text: pattern_glyph(&entity.types),
            color: contrast_color(palette.fill(entity)),
            position: Vec2::ZERO,
            stamp: palette.stamp(),
        }
    }

    fn restyle(&mut self, entity: &Entity, palette: &Palette<'_>) {
        let stamp = palette.stamp();
        if self.stamp != stamp {
            self.color = contrast_color(palette.fill(entity));
            self.stamp = stamp;
        }
    }
}

impl Keyed for LabelElement {
    type Key = String;

    fn key(&self) -> &String {
        &self.key
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct RenderDelta {
    pub(crate) nodes: Delta<String>,
    pub(crate) links: Delta<LinkKey>,
    pub(crate) labels: Delta<String>,
}

pub(crate) struct RenderController {
    nodes: Vec<NodeElement>,
    links: Vec<LinkElement>,
    labels: Vec<LabelElement>,
    index_by_key: HashMap<String, usize>,
    simulation: Simulation,
    dragging: Option<usize>,
    next_serial: u64,
    revision: u64,
}

impl RenderController {
    pub(crate) fn new(config: LayoutConfig) -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            labels: Vec::new(),
            index_by_key: HashMap::new(),
            simulation: Simulation::new(config),
            dragging: None,
            next_serial: 0,
            revision: 0,
        }
    }

    /// Binds the scene to `data`, keeping identity and position of surviving keys.
    ///
    /// The simulation is reseeded with the new arrays but not restarted.
    pub(crate) fn reconcile(&mut self, data: &GraphData, palette: &Palette<'_>) -> RenderDelta {
        self.release_drag();

        let mut prior_bodies = self
            .nodes
            .iter()
            .zip(self.simulation.bodies())
            .map(|(node, body)| (node.key.clone(), *body))
            .collect::<HashMap<_, _>>();

        let serial = &mut self.next_serial;
        let nodes = reconcile(
            &mut self.nodes,
            &data.entities,
            |entity| entity.name.clone(),
            |entity| NodeElement::enter(entity, palette, next(serial)),
            |node, entity| node.restyle(entity, palette),
        );
        let labels = reconcile(
            &mut self.labels,
            &data.entities,
            |entity| entity.name.clone(),
            |entity| LabelElement::enter(entity, palette),
            |label, entity| label.restyle(entity, palette),
        );

        self.index_by_key = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.key.clone(), index))
            .collect();

        let index_by_key = &self.index_by_key;
        let keyed = keyed_links(index_by_key, &data.relationships);
        let links = reconcile(
            &mut self.links,
            &keyed,
            |(key, _)| key.clone(),
            |(key, relationship)| LinkElement {
                key: key.clone(),
                title: relationship_title(relationship),
                endpoint_types: endpoint_types(relationship),
                source_index: index_by_key[&key.source],
                target_index: index_by_key[&key.target],
                start: Vec2::ZERO,
                end: Vec2::ZERO,
            },
            |link, (key, _)| {
                link.source_index = index_by_key[&key.source];
                link.target_index = index_by_key[&key.target];
            },
        );

        let spread = 40.0 + 12.0 * (self.nodes.len() as f32).sqrt();
        let bodies = self
            .nodes
            .iter()
            .map(|node| {
                prior_bodies.remove(&node.key).unwrap_or_else(|| {
                    let (x, y) = stable_pair(&node.key);
                    Body::at(Vec2::new(x, y) * spread)
                })
            })
            .collect();
        let edges = self.links.iter().map(LinkElement::endpoints).collect();
        self.simulation.reseed(bodies, edges);
        self.sync_positions();
        self.revision += 1;

        tracing::debug!(
            entered = nodes.entered.len(),
            exited = nodes.exited.len(),
            kept = nodes.kept,
            links = self.links.len(),
            "scene reconciled"
        );

        RenderDelta {
            nodes,
            links,
            labels,
        }
    }

    pub(crate) fn restart(&mut self) {
        self.simulation.restart();
    }

    pub(crate) fn tick(&mut self) -> bool {
        let moving = self.simulation.tick();
        self.sync_positions();
        moving
    }

    fn sync_positions(&mut self) {
        let bodies = self.simulation.bodies();
        for (node, body) in self.nodes.iter_mut().zip(bodies) {
            node.position = body.position;
        }
        for label in &mut self.labels {
            if let Some(&index) = self.index_by_key.get(&label.key) {
                label.position = bodies[index].position;
            }
        }
        for link in &mut self.links {
            link.start = bodies[link.source_index].position;
            link.end = bodies[link.target_index].position;
        }
    }

    pub(crate) fn node_at(&self, world: Vec2) -> Option<usize> {
        self.nodes
            .iter()
            .rposition(|node| (node.position - world).length() <= node.radius)
    }

    pub(crate) fn drag_start(&mut self, index: usize, world: Vec2) {
        if index >= self.nodes.len() {
            return;
        }
        self.release_drag();
        self.simulation.drag_start(index, world);
        self.dragging = Some(index);
        self.sync_positions();
    }

    pub(crate) fn drag_move(&mut self, world: Vec2) {
        if let Some(index) = self.dragging {
            self.simulation.drag_move(index, world);
        }
    }

    pub(crate) fn drag_end(&mut self) {
        self.release_drag();
    }

    fn release_drag(&mut self) {
        if let Some(index) = self.dragging.take() {
            self.simulation.drag_end(index);
        }
    }

    pub(crate) fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    pub(crate) fn clear(&mut self) {
        self.release_drag();
        self.nodes.clear();
        self.links.clear();
        self.labels.clear();
        self.index_by_key.clear();
        self.simulation.reseed(Vec::new(), Vec::new());
        self.revision += 1;
    }

    pub(crate) fn nodes(&self) -> &[NodeElement] {
        &self.nodes
    }

    pub(crate) fn links(&self) -> &[LinkElement] {
        &self.links
    }

    pub(crate) fn labels(&self) -> &[LabelElement] {
        &self.labels
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.index_by_key.get(name).copied()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.simulation.is_running()
    }

    pub(crate) fn alpha(&self) -> f32 {
        self.simulation.alpha()
    }

    pub(crate) fn layout_config(&self) -> LayoutConfig {
        self.simulation.config()
    }

    pub(crate) fn set_layout_config(&mut self, config: LayoutConfig) {
        self.simulation.set_config(config);
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }
}

fn endpoint_types(relationship: &Relationship) -> String {
    let join = |types: &[TypeTag]| {
        types
            .iter()
            .map(TypeTag::as_str)
            .collect::<Vec<_>>()
            .join(",")
    };
    format!(
        "{} -> {}",
        join(&relationship.source_types),
        join(&relationship.target_types)
    )
}

/// Relationships paired with their keys; those with an unbound endpoint are skipped.
fn keyed_links<'r>(
    index_by_key: &HashMap<String, usize>,
    relationships: &'r [Relationship],
) -> Vec<(LinkKey, &'r Relationship)> {
    let mut ordinals = HashMap::<(&str, &str), usize>::new();
    let mut keyed = Vec::with_capacity(relationships.len());

    for relationship in relationships {
        if !index_by_key.contains_key(&relationship.source)
            || !index_by_key.contains_key(&relationship.target)
        {
            tracing::warn!(
                source = %relationship.source,
                target = %relationship.target,
                "link endpoint is not on screen"
            );
            continue;
        }

        let ordinal = ordinals
            .entry((relationship.source.as_str(), relationship.target.as_str()))
            .or_insert(0);
        keyed.push((
            LinkKey {
                source: relationship.source.clone(),
                target: relationship.target.clone(),
                ordinal: *ordinal,
            },
            relationship,
        ));
        *ordinal += 1;
    }

    keyed
}

fn next(serial: &mut u64) -> u64 {
    *serial += 1;
    *serial
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterEngine;
    use crate::graph::style::DEFAULT_FILL;

    fn entity(name: &str, types: Vec<TypeTag>, constructors: u32) -> Entity {
        Entity {
            name: name.to_owned(),
            types,
            methods: 0,
            constructors,
            nb_variants: 1,
            radius: 12.0,
        }
    }

    fn class(name: &str) -> Entity {
        entity(name, vec![TypeTag::Class], 0)
    }

    fn relationship(source: &str, target: &str) -> Relationship {
        Relationship {
            source: source.to_owned(),
            target: target.to_owned(),
            source_types: Vec::new(),
            target_types: Vec::new(),
        }
    }

    fn data(entities: Vec<Entity>, relationships: Vec<Relationship>) -> GraphData {
        GraphData {
            entities,
            relationships,
        }
    }

    fn serials(controller: &RenderController) -> HashMap<String, u64> {
        controller
            .nodes()
            .iter()
            .map(|node| (node.name().to_owned(), node.serial()))
            .collect()
    }

    #[test]
    fn only_the_difference_enters_or_exits() {
        let colorer = PackageColorer::with_seed(1);
        let mut controller = RenderController::new(LayoutConfig::default());

        let first = data(
            vec![class("A"), class("B"), class("C")],
            vec![relationship("A", "B"), relationship("B", "C")],
        );
        let palette = Palette::new(&first.entities, &colorer);
        controller.reconcile(&first, &palette);
        let before = serials(&controller);

        let second = data(
            vec![class("A"), class("C"), class("D")],
            vec![relationship("A", "C")],
        );
        let mut delta = controller.reconcile(&second, &palette);
        delta.nodes.exited.sort();

        assert_eq!(delta.nodes.entered, vec!["D"]);
        assert_eq!(delta.nodes.exited, vec!["B"]);
        assert_eq!(delta.nodes.kept, 2);
        assert_eq!(delta.labels.entered, vec!["D"]);
        assert_eq!(delta.links.exited.len(), 2);
        assert_eq!(delta.links.entered.len(), 1);

        let after = serials(&controller);
        assert_eq!(after["A"], before["A"]);
        assert_eq!(after["C"], before["C"]);
        assert!(!before.values().any(|serial| *serial == after["D"]));
    }

    #[test]
    fn rebinding_the_same_data_changes_nothing() {
        let colorer = PackageColorer::with_seed(1);
        let mut controller = RenderController::new(LayoutConfig::default());
        let graph = data(vec![class("A"), class("B")], vec![relationship("A", "B")]);
        let palette = Palette::new(&graph.entities, &colorer);

        controller.reconcile(&graph, &palette);
        let delta = controller.reconcile(&graph, &palette);

        assert!(delta.nodes.entered.is_empty() && delta.nodes.exited.is_empty());
        assert!(delta.links.entered.is_empty() && delta.links.exited.is_empty());
        assert_eq!(delta.nodes.kept, 2);
    }

    #[test]
    fn surviving_nodes_keep_their_position() {
        let colorer = PackageColorer::with_seed(1);
        let mut controller = RenderController::new(LayoutConfig::default());
        let graph = data(
            vec![class("A"), class("B"), class("C")],
            vec![relationship("A", "B")],
        );
        let palette = Palette::new(&graph.entities, &colorer);
        controller.reconcile(&graph, &palette);
        controller.restart();
        for _ in 0..50 {
            controller.tick();
        }
        let position_of_a = controller.nodes()[0].position;

        let shrunk = data(vec![class("A"), class("B")], vec![relationship("A", "B")]);
        controller.reconcile(&shrunk, &palette);
        assert_eq!(controller.nodes()[0].position, position_of_a);
    }

    #[test]
    fn parallel_relationships_stay_distinct() {
        let colorer = PackageColorer::with_seed(1);
        let mut controller = RenderController::new(LayoutConfig::default());
        let graph = data(
            vec![class("A"), class("B")],
            vec![relationship("A", "B"), relationship("A", "B")],
        );
        let palette = Palette::new(&graph.entities, &colorer);
        controller.reconcile(&graph, &palette);

        let ordinals = controller
            .links()
            .iter()
            .map(|link| link.key.ordinal)
            .collect::<Vec<_>>();
        assert_eq!(ordinals, vec![0, 1]);
        assert_eq!(controller.links()[0].endpoints(), (0, 1));
    }

    #[test]
    fn links_to_unbound_nodes_are_skipped() {
        let colorer = PackageColorer::with_seed(1);
        let mut controller = RenderController::new(LayoutConfig::default());
        let graph = data(vec![class("A")], vec![relationship("A", "Ghost")]);
        let palette = Palette::new(&graph.entities, &colorer);
        controller.reconcile(&graph, &palette);
        assert!(controller.links().is_empty());
    }

    #[test]
    fn package_colors_restyle_survivors_in_place() {
        let mut engine = FilterEngine::new(PackageColorer::with_seed(5));
        let mut controller = RenderController::new(LayoutConfig::default());
        let graph = data(
            vec![
                entity("com.a.X", vec![TypeTag::Class], 2),
                entity("com.a.I", vec![TypeTag::Interface], 0),
            ],
            Vec::new(),
        );

        controller.reconcile(&graph, &Palette::new(&graph.entities, engine.set()));
        let serial = controller.nodes()[0].serial();
        assert_eq!(controller.nodes()[0].fill, Color32::from_rgb(255, 0, 0));

        engine.add_filter("com.a");
        let expected = engine.set().color_for_entity("com.a.X");
        let delta = controller.reconcile(&graph, &Palette::new(&graph.entities, engine.set()));

        assert!(delta.nodes.entered.is_empty());
        assert_eq!(controller.nodes()[0].serial(), serial);
        assert_eq!(controller.nodes()[0].fill, expected);
        assert_eq!(controller.nodes()[1].fill, INTERFACE_FILL);
        assert_eq!(controller.labels()[1].color, Color32::WHITE);
    }

    #[test]
    fn graphs_without_classes_fill_white() {
        let colorer = PackageColorer::with_seed(1);
        let mut controller = RenderController::new(LayoutConfig::default());
        let graph = data(
            vec![entity("E", vec![TypeTag::Other("ENUM".to_owned())], 3)],
            Vec::new(),
        );
        controller.reconcile(&graph, &Palette::new(&graph.entities, &colorer));
        assert_eq!(controller.nodes()[0].fill, DEFAULT_FILL);
        assert_eq!(controller.labels()[0].color, Color32::BLACK);
    }

    #[test]
    fn dragging_a_node_pins_it_under_the_pointer() {
        let colorer = PackageColorer::with_seed(1);
        let mut controller = RenderController::new(LayoutConfig::default());
        let graph = data(vec![class("A"), class("B")], vec![relationship("A", "B")]);
        controller.reconcile(&graph, &Palette::new(&graph.entities, &colorer));
        controller.restart();

        let target = controller.nodes()[1].position;
        let index = controller.node_at(target).expect("node under its own center");
        assert_eq!(controller.nodes()[index].name(), "B");

        controller.drag_start(index, Vec2::new(200.0, 0.0));
        controller.drag_move(Vec2::new(250.0, 10.0));
        controller.tick();
        assert_eq!(controller.nodes()[index].position, Vec2::new(250.0, 10.0));
        assert_eq!(controller.links()[0].end, Vec2::new(250.0, 10.0));

        controller.drag_end();
        assert_eq!(controller.dragging(), None);
        assert!(controller.is_running());
    }

    #[test]
    fn clearing_destroys_everything() {
        let colorer = PackageColorer::with_seed(1);
        let mut controller = RenderController::new(LayoutConfig::default());
        let graph = data(vec![class("A"), class("B")], vec![relationship("A", "B")]);
        controller.reconcile(&graph, &Palette::new(&graph.entities, &colorer));

        controller.clear();
        assert!(controller.is_empty());
        assert!(controller.links().is_empty() && controller.labels().is_empty());

        let delta = controller.reconcile(&graph, &Palette::new(&graph.entities, &colorer));
        assert_eq!(delta.nodes.entered.len(), 2);
    }
}
