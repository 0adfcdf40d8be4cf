//! Name-based exclusion filters.
//!
//! A token whose last dot-separated segment contains an uppercase ASCII
//! letter names a single class and must match exactly; any other token is a
//! package prefix and matches every name that starts with it. Prefixes are
//! literal: `com.foo` also matches `com.foobar.X`.

use std::fmt;

use eframe::egui::Color32;

mod colorer;
mod nodes;

pub use colorer::PackageColorer;
pub use nodes::NodesFilter;

pub trait Named {
    fn name(&self) -> &str;
}

pub trait Linked {
    fn source(&self) -> &str;
    fn target(&self) -> &str;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Exact,
    Prefix,
}

pub fn classify(token: &str) -> FilterKind {
    let last_segment = token.rsplit('.').next().unwrap_or(token);
    if last_segment.chars().any(|ch| ch.is_ascii_uppercase()) {
        FilterKind::Exact
    } else {
        FilterKind::Prefix
    }
}

pub fn matches(name: &str, token: &str) -> bool {
    match classify(token) {
        FilterKind::Exact => name == token,
        FilterKind::Prefix => name.starts_with(token),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterItem {
    pub token: String,
    pub background: Option<Color32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterEvent {
    Added(String),
    Removed(String),
}

pub trait FilterSet {
    fn add_value(&mut self, token: &str);

    /// Removes the first stored occurrence of `token`, if any.
    fn remove_value(&mut self, token: &str);

    fn tokens(&self) -> impl Iterator<Item = &str>;

    fn render_item(&self, token: &str) -> FilterItem {
        FilterItem {
            token: token.to_owned(),
            background: None,
        }
    }
}

type Observer = Box<dyn FnMut(&FilterEvent)>;

pub struct FilterEngine<S> {
    set: S,
    observer: Option<Observer>,
}

impl<S: FilterSet> FilterEngine<S> {
    pub fn new(set: S) -> Self {
        Self {
            set,
            observer: None,
        }
    }

    /// Pre-seeds the set without notifying anyone.
    pub fn with_tokens<'a>(mut set: S, tokens: impl IntoIterator<Item = &'a str>) -> Self {
        for token in tokens {
            if !token.is_empty() {
                set.add_value(token);
            }
        }
        Self::new(set)
    }

    pub fn with_observer(mut self, observer: impl FnMut(&FilterEvent) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Appends `token`; empty input is ignored and produces no item.
    pub fn add_filter(&mut self, token: &str) -> Option<FilterItem> {
        if token.is_empty() {
            return None;
        }

        self.set.add_value(token);
        tracing::debug!(token, "filter added");
        self.notify(FilterEvent::Added(token.to_owned()));
        Some(self.set.render_item(token))
    }

    pub fn remove_filter(&mut self, token: &str) {
        self.set.remove_value(token);
        tracing::debug!(token, "filter removed");
        self.notify(FilterEvent::Removed(token.to_owned()));
    }

    fn notify(&mut self, event: FilterEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.set.tokens().any(|token| matches(name, token))
    }

    pub fn filter_entities<T: Named + Clone>(&self, entities: &[T]) -> Vec<T> {
        entities
            .iter()
            .filter(|entity| !self.is_excluded(entity.name()))
            .cloned()
            .collect()
    }

    pub fn filter_relationships<T: Linked + Clone>(&self, relationships: &[T]) -> Vec<T> {
        relationships
            .iter()
            .filter(|link| !self.is_excluded(link.source()) && !self.is_excluded(link.target()))
            .cloned()
            .collect()
    }

    pub fn items(&self) -> Vec<FilterItem> {
        self.set
            .tokens()
            .map(|token| self.set.render_item(token))
            .collect()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.set.tokens().map(str::to_owned).collect()
    }

    pub fn set(&self) -> &S {
        &self.set
    }
}

impl<S: fmt::Debug> fmt::Debug for FilterEngine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterEngine")
            .field("set", &self.set)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Item(&'static str);

    impl Named for Item {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Edge(&'static str, &'static str);

    impl Linked for Edge {
        fn source(&self) -> &str {
            self.0
        }

        fn target(&self) -> &str {
            self.1
        }
    }

    const NAMES: [&str; 8] = [
        "com.foo.Bar",
        "com.foobar.X",
        "com.foo",
        "IShape",
        "Shape",
        "org.a.B.Inner",
        "",
        "com.Foo.bar",
    ];

    #[test]
    fn classification_looks_at_the_last_segment_only() {
        assert_eq!(classify("IShape"), FilterKind::Exact);
        assert_eq!(classify("com.foo.Bar"), FilterKind::Exact);
        assert_eq!(classify("com.Foo.bar"), FilterKind::Prefix);
        assert_eq!(classify("com.foo"), FilterKind::Prefix);
        assert_eq!(classify("com.foo."), FilterKind::Prefix);
        assert_eq!(classify("com.foo.É"), FilterKind::Prefix);
    }

    #[test]
    fn matching_is_equality_or_literal_prefix() {
        let tokens = ["IShape", "com.foo", "com.foo.Bar", "com.Foo.bar", "com", ""];
        for token in tokens {
            for name in NAMES {
                let expected = match classify(token) {
                    FilterKind::Exact => name == token,
                    FilterKind::Prefix => name.starts_with(token),
                };
                assert_eq!(matches(name, token), expected, "{name} vs {token}");
            }
        }
        assert!(matches("com.foobar.X", "com.foo"));
    }

    #[test]
    fn exclusion_is_monotonic_in_the_token_set() {
        let mut engine = FilterEngine::new(NodesFilter::default());
        let mut previous = NAMES.map(|name| engine.is_excluded(name));

        for token in ["com.foo", "IShape", "org"] {
            engine.add_filter(token);
            let current = NAMES.map(|name| engine.is_excluded(name));
            for (before, after) in previous.iter().zip(current.iter()) {
                assert!(!before || *after);
            }
            previous = current;
        }

        for token in ["IShape", "com.foo", "org"] {
            engine.remove_filter(token);
            let current = NAMES.map(|name| engine.is_excluded(name));
            for (before, after) in previous.iter().zip(current.iter()) {
                assert!(*before || !after);
            }
            previous = current;
        }
        assert!(previous.iter().all(|excluded| !excluded));
    }

    #[test]
    fn links_need_both_endpoints_to_survive() {
        let engine = FilterEngine::with_tokens(NodesFilter::default(), ["IShape"]);
        let kept = engine.filter_relationships(&[
            Edge("Shape", "IShape"),
            Edge("Shape", "Circle"),
            Edge("IShape", "Circle"),
        ]);
        assert_eq!(kept, vec![Edge("Shape", "Circle")]);

        let entities = engine.filter_entities(&[Item("Shape"), Item("IShape")]);
        assert_eq!(entities, vec![Item("Shape")]);
    }

    #[test]
    fn empty_tokens_are_ignored_and_missing_removals_are_harmless() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let mut engine = FilterEngine::new(NodesFilter::default())
            .with_observer(move |event| sink.borrow_mut().push(event.clone()));

        assert_eq!(engine.add_filter(""), None);
        assert!(engine.tokens().is_empty());

        engine.add_filter("com");
        engine.add_filter("com");
        engine.remove_filter("org");
        assert_eq!(engine.tokens(), vec!["com", "com"]);

        engine.remove_filter("com");
        assert_eq!(engine.tokens(), vec!["com"]);
        assert_eq!(
            *events.borrow(),
            vec![
                FilterEvent::Added("com".to_owned()),
                FilterEvent::Added("com".to_owned()),
                FilterEvent::Removed("org".to_owned()),
                FilterEvent::Removed("com".to_owned()),
            ]
        );
    }

    #[test]
    fn added_filter_yields_a_plain_list_item() {
        let mut engine = FilterEngine::new(NodesFilter::default());
        let item = engine.add_filter("com.a").expect("non-empty token");
        assert_eq!(item.token, "com.a");
        assert_eq!(item.background, None);
        assert_eq!(engine.items(), vec![item]);
    }
}
