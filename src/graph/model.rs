use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::filter::{FilterEngine, FilterSet, Linked, Named};

use super::parse::RawGraph;

pub const BASE_RADIUS: f32 = 10.0;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum TypeTag {
    Class,
    Interface,
    Abstract,
    Vp,
    Variant,
    Strategy,
    Factory,
    Template,
    Decorator,
    MethodLevelVp,
    Other(String),
}

impl TypeTag {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Class => "CLASS",
            Self::Interface => "INTERFACE",
            Self::Abstract => "ABSTRACT",
            Self::Vp => "VP",
            Self::Variant => "VARIANT",
            Self::Strategy => "STRATEGY",
            Self::Factory => "FACTORY",
            Self::Template => "TEMPLATE",
            Self::Decorator => "DECORATOR",
            Self::MethodLevelVp => "METHOD_LEVEL_VP",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for TypeTag {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CLASS" => Self::Class,
            "INTERFACE" => Self::Interface,
            "ABSTRACT" => Self::Abstract,
            "VP" => Self::Vp,
            "VARIANT" => Self::Variant,
            "STRATEGY" => Self::Strategy,
            "FACTORY" => Self::Factory,
            "TEMPLATE" => Self::Template,
            "DECORATOR" => Self::Decorator,
            "METHOD_LEVEL_VP" => Self::MethodLevelVp,
            _ => Self::Other(value),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub name: String,
    pub types: Vec<TypeTag>,
    pub methods: u32,
    pub constructors: u32,
    pub nb_variants: u32,
    pub radius: f32,
}

impl Entity {
    pub fn has(&self, tag: &TypeTag) -> bool {
        self.types.contains(tag)
    }

    pub fn is_class(&self) -> bool {
        self.has(&TypeTag::Class)
    }

    pub fn is_interface(&self) -> bool {
        self.has(&TypeTag::Interface)
    }

    fn derived_radius(&self) -> f32 {
        if self.is_class() {
            BASE_RADIUS + self.methods as f32
        } else {
            BASE_RADIUS
        }
    }
}

impl Named for Entity {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub source_types: Vec<TypeTag>,
    pub target_types: Vec<TypeTag>,
}

impl Linked for Relationship {
    fn source(&self) -> &str {
        &self.source
    }

    fn target(&self) -> &str {
        &self.target
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("relationship {from} -> {to} references unknown entity `{endpoint}`")]
    UnknownEndpoint {
        from: String,
        to: String,
        endpoint: String,
    },
    #[error("entity `{name}` is declared more than once")]
    DuplicateEntity { name: String },
}

#[derive(Clone, Debug)]
pub struct GraphModel {
    baseline: GraphData,
    working: GraphData,
    index_by_name: HashMap<String, usize>,
}

impl GraphModel {
    pub fn load(raw: RawGraph) -> Result<Self, GraphError> {
        let mut index_by_name = HashMap::with_capacity(raw.nodes.len());
        let mut entities = Vec::with_capacity(raw.nodes.len());

        for (index, node) in raw.nodes.into_iter().enumerate() {
            if index_by_name.insert(node.name.clone(), index).is_some() {
                return Err(GraphError::DuplicateEntity { name: node.name });
            }

            let entity = Entity {
                name: node.name,
                types: node.types,
                methods: node.methods,
                constructors: node.constructors,
                nb_variants: node.nb_variants,
                radius: BASE_RADIUS,
            };
            if entity.is_class() && entity.is_interface() {
                tracing::warn!(name = %entity.name, "entity is tagged both CLASS and INTERFACE");
            }
            entities.push(entity);
        }

        let relationships = raw
            .links
            .into_iter()
            .map(|link| Relationship {
                source: link.source,
                target: link.target,
                source_types: Vec::new(),
                target_types: Vec::new(),
            })
            .collect::<Vec<_>>();

        let baseline = GraphData {
            entities,
            relationships,
        };
        let working = baseline.clone();

        Ok(Self {
            baseline,
            working,
            index_by_name,
        })
    }

    /// Computes radii and resolves endpoint tags against the baseline.
    ///
    /// Fails on the first relationship whose endpoint is not a known entity,
    /// leaving the model unchanged.
    pub fn derive_attributes(&mut self) -> Result<(), GraphError> {
        let mut resolved = Vec::with_capacity(self.baseline.relationships.len());
        for link in &self.baseline.relationships {
            let source_types = self.types_of(link, &link.source)?;
            let target_types = self.types_of(link, &link.target)?;
            resolved.push((source_types, target_types));
        }

        for entity in &mut self.baseline.entities {
            entity.radius = entity.derived_radius();
        }
        for (link, (source_types, target_types)) in
            self.baseline.relationships.iter_mut().zip(resolved)
        {
            link.source_types = source_types;
            link.target_types = target_types;
        }

        self.working = self.baseline.clone();
        Ok(())
    }

    fn types_of(&self, link: &Relationship, endpoint: &str) -> Result<Vec<TypeTag>, GraphError> {
        self.index_by_name
            .get(endpoint)
            .map(|&index| self.baseline.entities[index].types.clone())
            .ok_or_else(|| GraphError::UnknownEndpoint {
                from: link.source.clone(),
                to: link.target.clone(),
                endpoint: endpoint.to_owned(),
            })
    }

    pub fn apply_filters<S: FilterSet>(&mut self, engine: &FilterEngine<S>) {
        self.working.entities = engine.filter_entities(&self.baseline.entities);
        self.working.relationships = engine.filter_relationships(&self.baseline.relationships);
    }

    pub fn apply_isolation_filter(&mut self, enabled: bool) {
        if !enabled {
            return;
        }

        let connected = self
            .working
            .relationships
            .iter()
            .flat_map(|link| [link.source.as_str(), link.target.as_str()])
            .collect::<HashSet<_>>();
        let entities = self
            .working
            .entities
            .iter()
            .filter(|entity| connected.contains(entity.name.as_str()))
            .cloned()
            .collect();
        self.working.entities = entities;
    }

    /// Recomputes the working view from the baseline: name filters, then isolation.
    pub fn refresh<S: FilterSet>(&mut self, engine: &FilterEngine<S>, isolate: bool) {
        self.apply_filters(engine);
        self.apply_isolation_filter(isolate);
    }

    pub fn baseline(&self) -> &GraphData {
        &self.baseline
    }

    pub fn working(&self) -> &GraphData {
        &self.working
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.index_by_name
            .get(name)
            .map(|&index| &self.baseline.entities[index])
    }
}
