mod load;
mod model;
mod parse;
pub mod style;

pub use load::{DocumentSources, LoadedDocuments, load_documents};
pub use model::{Entity, GraphData, GraphError, GraphModel, Relationship, TypeTag};
pub use parse::{RawEntity, RawGraph, RawLink, Statistics};
