use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::parse::{RawGraph, Statistics, parse_graph_document, parse_statistics_document};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentSources {
    pub graph: PathBuf,
    pub stats: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct LoadedDocuments {
    pub graph: RawGraph,
    pub statistics: Option<Statistics>,
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub fn load_documents(sources: &DocumentSources) -> Result<LoadedDocuments> {
    let raw = read_document(&sources.graph)?;
    let graph = parse_graph_document(&raw)
        .with_context(|| format!("failed to parse {}", sources.graph.display()))?;

    let statistics = sources.stats.as_deref().and_then(|path| {
        match read_document(path).and_then(|raw| parse_statistics_document(&raw)) {
            Ok(statistics) => Some(statistics),
            Err(error) => {
                tracing::warn!(path = %path.display(), "statistics unavailable: {error:#}");
                None
            }
        }
    });

    Ok(LoadedDocuments { graph, statistics })
}
