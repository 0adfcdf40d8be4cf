use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use anyhow::Result;

use crate::filter::{FilterEngine, FilterEvent, FilterItem, NodesFilter, PackageColorer};
use crate::graph::{DocumentSources, GraphModel, LoadedDocuments, Statistics, load_documents};

use super::layout::LayoutConfig;
use super::render::{Palette, RenderController};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    AddFilter(String),
    RemoveFilter(String),
    AddPackageColor(String),
    RemovePackageColor(String),
    SetIsolation(bool),
    Reload,
    Redisplay,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DisplayPhase {
    Idle,
    Loading,
    Enriching,
    Bound,
    Simulating,
    Settled,
    Failed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LoadOutcome {
    Applied,
    Stale,
    Failed,
}

struct LoadResult {
    generation: u64,
    documents: Result<LoadedDocuments>,
}

pub(crate) struct SessionConfig {
    pub(crate) sources: DocumentSources,
    pub(crate) filters: Vec<String>,
    pub(crate) package_colors: Vec<String>,
    pub(crate) isolate: bool,
    pub(crate) layout: LayoutConfig,
}

pub(crate) struct Session {
    sources: DocumentSources,
    filters: FilterEngine<NodesFilter>,
    colors: FilterEngine<PackageColorer>,
    isolate: bool,
    generation: u64,
    load_tx: Sender<LoadResult>,
    load_rx: Receiver<LoadResult>,
    model: Option<GraphModel>,
    statistics: Option<Statistics>,
    render: RenderController,
    phase: DisplayPhase,
    command_tx: Sender<Command>,
    command_rx: Receiver<Command>,
}

impl Session {
    pub(crate) fn new(config: SessionConfig) -> Self {
        let (load_tx, load_rx) = mpsc::channel();
        let (command_tx, command_rx) = mpsc::channel();

        let filters = FilterEngine::with_tokens(
            NodesFilter::default(),
            config.filters.iter().map(String::as_str),
        )
        .with_observer(redisplay_on_change(command_tx.clone()));
        let colors = FilterEngine::with_tokens(
            PackageColorer::default(),
            config.package_colors.iter().map(String::as_str),
        )
        .with_observer(redisplay_on_change(command_tx.clone()));

        Self {
            sources: config.sources,
            filters,
            colors,
            isolate: config.isolate,
            generation: 0,
            load_tx,
            load_rx,
            model: None,
            statistics: None,
            render: RenderController::new(config.layout),
            phase: DisplayPhase::Idle,
            command_tx,
            command_rx,
        }
    }

    pub(crate) fn send(&self, command: Command) {
        let _ = self.command_tx.send(command);
    }

    /// Starts loading both documents on a worker thread and returns the new generation.
    ///
    /// Only the result of the latest generation is ever applied.
    pub(crate) fn display(&mut self) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        self.phase = DisplayPhase::Loading;
        tracing::info!(
            generation,
            filters = self.filters.tokens().len(),
            isolate = self.isolate,
            "display requested"
        );

        let sources = self.sources.clone();
        let tx = self.load_tx.clone();
        thread::spawn(move || {
            let documents = load_documents(&sources);
            let _ = tx.send(LoadResult {
                generation,
                documents,
            });
        });

        generation
    }

    pub(crate) fn poll_load(&mut self) -> Option<LoadOutcome> {
        let mut outcome = None;
        while let Ok(result) = self.load_rx.try_recv() {
            outcome = Some(self.complete_load(result.generation, result.documents));
        }
        outcome
    }

    /// Enriches, filters and binds a finished load unless a newer display superseded it.
    pub(crate) fn complete_load(
        &mut self,
        generation: u64,
        documents: Result<LoadedDocuments>,
    ) -> LoadOutcome {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "discarding stale load");
            return LoadOutcome::Stale;
        }

        let documents = match documents {
            Ok(documents) => documents,
            Err(error) => return self.fail(format!("{error:#}")),
        };

        self.phase = DisplayPhase::Enriching;
        let mut model = match GraphModel::load(documents.graph) {
            Ok(model) => model,
            Err(error) => return self.fail(error.to_string()),
        };
        if let Err(error) = model.derive_attributes() {
            return self.fail(error.to_string());
        }

        self.statistics = documents.statistics;
        self.model = Some(model);
        self.bind();
        LoadOutcome::Applied
    }

    fn bind(&mut self) {
        let Some(model) = self.model.as_mut() else {
            return;
        };

        model.refresh(&self.filters, self.isolate);
        let palette = Palette::new(&model.baseline().entities, self.colors.set());
        let delta = self.render.reconcile(model.working(), &palette);
        self.phase = DisplayPhase::Bound;

        tracing::info!(
            generation = self.generation,
            entities = model.baseline().entities.len(),
            relationships = model.baseline().relationships.len(),
            visible_entities = model.working().entities.len(),
            visible_relationships = model.working().relationships.len(),
            nodes_entered = delta.nodes.entered.len(),
            nodes_exited = delta.nodes.exited.len(),
            nodes_kept = delta.nodes.kept,
            links_entered = delta.links.entered.len(),
            links_exited = delta.links.exited.len(),
            links_kept = delta.links.kept,
            labels_entered = delta.labels.entered.len(),
            labels_exited = delta.labels.exited.len(),
            labels_kept = delta.labels.kept,
            "graph bound"
        );

        self.render.restart();
        self.phase = DisplayPhase::Simulating;
    }

    fn fail(&mut self, message: String) -> LoadOutcome {
        tracing::error!(generation = self.generation, "display failed: {message}");
        self.render.clear();
        self.model = None;
        self.statistics = None;
        self.phase = DisplayPhase::Failed(message);
        LoadOutcome::Failed
    }

    /// Drains queued commands; any number of redisplay requests yields one `display`.
    pub(crate) fn process_commands(&mut self) -> bool {
        let mut redisplay = false;
        while let Ok(command) = self.command_rx.try_recv() {
            match command {
                Command::AddFilter(token) => {
                    self.filters.add_filter(&token);
                }
                Command::RemoveFilter(token) => self.filters.remove_filter(&token),
                Command::AddPackageColor(token) => {
                    self.colors.add_filter(&token);
                }
                Command::RemovePackageColor(token) => self.colors.remove_filter(&token),
                Command::SetIsolation(isolate) => {
                    self.isolate = isolate;
                    redisplay = true;
                }
                Command::Reload => {
                    self.render.clear();
                    redisplay = true;
                }
                Command::Redisplay => redisplay = true,
            }
        }

        if redisplay {
            self.display();
        }
        redisplay
    }

    /// Advances the layout one frame while a scene is bound, including while
    /// the next load is still pending.
    pub(crate) fn tick(&mut self) -> bool {
        if self.render.is_empty() || matches!(self.phase, DisplayPhase::Failed(_)) {
            return false;
        }

        let moving = self.render.tick();
        if self.is_laid_out() {
            self.phase = if moving {
                DisplayPhase::Simulating
            } else {
                DisplayPhase::Settled
            };
        }
        moving
    }

    pub(crate) fn reheat(&mut self) {
        if self.render.is_empty() {
            return;
        }
        self.render.restart();
        if self.is_laid_out() {
            self.phase = DisplayPhase::Simulating;
        }
    }

    fn is_laid_out(&self) -> bool {
        matches!(
            self.phase,
            DisplayPhase::Simulating | DisplayPhase::Settled
        )
    }

    pub(crate) fn set_layout(&mut self, config: LayoutConfig) {
        if self.render.layout_config() == config {
            return;
        }
        self.render.set_layout_config(config);
        self.reheat();
    }

    pub(crate) fn layout(&self) -> LayoutConfig {
        self.render.layout_config()
    }

    pub(crate) fn phase(&self) -> &DisplayPhase {
        &self.phase
    }

    pub(crate) fn is_loading(&self) -> bool {
        matches!(self.phase, DisplayPhase::Loading | DisplayPhase::Enriching)
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn model(&self) -> Option<&GraphModel> {
        self.model.as_ref()
    }

    pub(crate) fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    pub(crate) fn render(&self) -> &RenderController {
        &self.render
    }

    pub(crate) fn render_mut(&mut self) -> &mut RenderController {
        &mut self.render
    }

    pub(crate) fn isolate(&self) -> bool {
        self.isolate
    }

    pub(crate) fn filter_items(&self) -> Vec<FilterItem> {
        self.filters.items()
    }

    pub(crate) fn package_color_items(&self) -> Vec<FilterItem> {
        self.colors.items()
    }

    pub(crate) fn sources(&self) -> &DocumentSources {
        &self.sources
    }
}

fn redisplay_on_change(tx: Sender<Command>) -> impl FnMut(&FilterEvent) + 'static {
    move |event| {
        let (FilterEvent::Added(token) | FilterEvent::Removed(token)) = event;
        tracing::trace!(token = token.as_str(), "filter set changed");
        let _ = tx.send(Command::Redisplay);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    use eframe::egui::vec2;

    use super::*;
    use crate::graph::{RawEntity, RawGraph, RawLink, TypeTag};

    fn session() -> Session {
        Session::new(SessionConfig {
            sources: DocumentSources {
                graph: PathBuf::from("/nonexistent/graph.json"),
                stats: None,
            },
            filters: Vec::new(),
            package_colors: Vec::new(),
            isolate: false,
            layout: LayoutConfig::default(),
        })
    }

    fn entity(name: &str, tag: &str) -> RawEntity {
        RawEntity {
            name: name.to_owned(),
            types: vec![TypeTag::from(tag.to_owned())],
            methods: 2,
            constructors: 1,
            nb_variants: 0,
        }
    }

    fn link(source: &str, target: &str) -> RawLink {
        RawLink {
            source: source.to_owned(),
            target: target.to_owned(),
        }
    }

    fn shapes() -> Result<LoadedDocuments> {
        Ok(LoadedDocuments {
            graph: RawGraph {
                nodes: vec![
                    entity("Shape", "CLASS"),
                    entity("IShape", "INTERFACE"),
                    entity("com.a.Circle", "CLASS"),
                ],
                links: vec![link("Shape", "IShape"), link("com.a.Circle", "Shape")],
            },
            statistics: Some(Statistics::default()),
        })
    }

    fn node_names(session: &Session) -> Vec<&str> {
        session
            .render()
            .nodes()
            .iter()
            .map(|node| node.name())
            .collect()
    }

    #[test]
    fn stale_loads_never_touch_the_scene() {
        let mut session = session();
        let first = session.display();
        let second = session.display();

        assert_eq!(session.complete_load(first, shapes()), LoadOutcome::Stale);
        assert!(session.render().is_empty());
        assert_eq!(session.phase(), &DisplayPhase::Loading);

        assert_eq!(session.complete_load(second, shapes()), LoadOutcome::Applied);
        assert_eq!(node_names(&session), vec!["Shape", "IShape", "com.a.Circle"]);
        assert_eq!(session.phase(), &DisplayPhase::Simulating);
        assert!(session.statistics().is_some());
    }

    #[test]
    fn dangling_link_fails_without_a_partial_render() {
        let mut session = session();
        let generation = session.display();
        session.complete_load(generation, shapes());
        assert!(!session.render().is_empty());

        let generation = session.display();
        let broken = Ok(LoadedDocuments {
            graph: RawGraph {
                nodes: vec![entity("Shape", "CLASS")],
                links: vec![link("Shape", "Ghost")],
            },
            statistics: None,
        });

        assert_eq!(session.complete_load(generation, broken), LoadOutcome::Failed);
        assert!(session.render().is_empty());
        assert!(session.model().is_none());
        assert!(
            matches!(session.phase(), DisplayPhase::Failed(message) if message.contains("Ghost"))
        );
    }

    #[test]
    fn clicked_node_becomes_a_filter_and_redisplays_once() {
        let mut session = session();
        let generation = session.display();
        session.complete_load(generation, shapes());

        session.send(Command::AddFilter("IShape".to_owned()));
        session.send(Command::AddFilter("com.a".to_owned()));
        session.send(Command::SetIsolation(true));
        assert!(session.process_commands());
        assert_eq!(session.generation(), generation + 1);
        assert!(!session.process_commands());

        let outcome = session.complete_load(session.generation(), shapes());
        assert_eq!(outcome, LoadOutcome::Applied);
        assert!(node_names(&session).is_empty());
        assert!(session.render().links().is_empty());

        session.send(Command::SetIsolation(false));
        session.process_commands();
        session.complete_load(session.generation(), shapes());
        assert_eq!(node_names(&session), vec!["Shape"]);
    }

    #[test]
    fn filters_are_read_when_the_load_lands() {
        let mut session = session();
        let generation = session.display();

        session.filters.add_filter("IShape");
        assert_eq!(session.complete_load(generation, shapes()), LoadOutcome::Applied);
        assert_eq!(node_names(&session), vec!["Shape", "com.a.Circle"]);
    }

    #[test]
    fn package_colors_recolor_without_rebinding() {
        let mut session = session();
        let generation = session.display();
        session.complete_load(generation, shapes());
        let serial = session.render().nodes()[2].serial();

        session.send(Command::AddPackageColor("com.a".to_owned()));
        session.process_commands();
        session.complete_load(session.generation(), shapes());

        let circle = &session.render().nodes()[2];
        assert_eq!(circle.serial(), serial);
        assert_eq!(
            circle.fill,
            session.colors.set().color_for_entity("com.a.Circle")
        );
        assert_eq!(session.package_color_items().len(), 1);
    }

    #[test]
    fn bound_scene_keeps_moving_while_a_load_is_pending() {
        let mut session = session();
        let generation = session.display();
        session.complete_load(generation, shapes());
        let before = session.render().nodes()[1].position;

        let pending = session.display();
        assert_eq!(session.phase(), &DisplayPhase::Loading);

        let render = session.render_mut();
        render.drag_start(0, vec2(0.0, 0.0));
        render.drag_move(vec2(300.0, 300.0));
        assert!(session.tick());

        assert_eq!(session.phase(), &DisplayPhase::Loading);
        assert_eq!(session.render().nodes()[0].position, vec2(300.0, 300.0));
        assert_ne!(session.render().nodes()[1].position, before);

        assert_eq!(session.complete_load(pending, shapes()), LoadOutcome::Applied);
        assert_eq!(session.phase(), &DisplayPhase::Simulating);
    }

    #[test]
    fn layout_settles_after_binding() {
        let mut session = session();
        let generation = session.display();
        session.complete_load(generation, shapes());

        let mut ticks = 0;
        while session.tick() {
            ticks += 1;
            assert!(ticks < 1_000);
        }
        assert_eq!(session.phase(), &DisplayPhase::Settled);

        session.reheat();
        assert_eq!(session.phase(), &DisplayPhase::Simulating);
        assert!(session.tick());
    }

    #[test]
    fn worker_load_of_a_missing_file_fails_visibly() {
        let mut session = session();
        session.display();

        let deadline = Instant::now() + Duration::from_secs(5);
        let outcome = loop {
            if let Some(outcome) = session.poll_load() {
                break outcome;
            }
            assert!(Instant::now() < deadline, "load never finished");
            thread::sleep(Duration::from_millis(5));
        };

        assert_eq!(outcome, LoadOutcome::Failed);
        assert!(matches!(
            session.phase(),
            DisplayPhase::Failed(message) if message.contains("graph.json")
        ));
    }
}
