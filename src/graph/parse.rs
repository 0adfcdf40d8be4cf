use anyhow::{Context, Result};
use serde::Deserialize;

use super::model::TypeTag;

#[derive(Clone, Debug, Deserialize)]
pub struct RawEntity {
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeTag>,
    #[serde(default)]
    pub methods: u32,
    #[serde(default)]
    pub constructors: u32,
    #[serde(default, rename = "nbVariants")]
    pub nb_variants: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawLink {
    pub source: String,
    pub target: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Vec<RawEntity>,
    #[serde(default)]
    pub links: Vec<RawLink>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Statistics {
    #[serde(rename = "methodsVPs")]
    pub methods_vps: u64,
    #[serde(rename = "constructorsVPs")]
    pub constructors_vps: u64,
    #[serde(rename = "methodLevelVPs")]
    pub method_level_vps: u64,
    #[serde(rename = "classLevelVPs")]
    pub class_level_vps: u64,
    #[serde(rename = "methodsVariants")]
    pub methods_variants: u64,
    #[serde(rename = "constructorsVariants")]
    pub constructors_variants: u64,
    #[serde(rename = "methodLevelVariants")]
    pub method_level_variants: u64,
    #[serde(rename = "classLevelVariants")]
    pub class_level_variants: u64,
    #[serde(rename = "VPs")]
    pub vps: u64,
    pub variants: u64,
}

impl Statistics {
    pub fn rows(&self) -> [(&'static str, u64); 10] {
        [
            ("Number of methods VPs", self.methods_vps),
            ("Number of constructors VPs", self.constructors_vps),
            ("Number of method level VPs", self.method_level_vps),
            ("Number of class level VPs", self.class_level_vps),
            ("Number of methods variants", self.methods_variants),
            ("Number of constructors variants", self.constructors_variants),
            ("Number of method level variants", self.method_level_variants),
            ("Number of class level variants", self.class_level_variants),
            ("Number of VPs", self.vps),
            ("Number of variants", self.variants),
        ]
    }
}

pub fn parse_graph_document(raw: &str) -> Result<RawGraph> {
    serde_json::from_str(raw).context("invalid graph JSON document")
}

pub fn parse_statistics_document(raw: &str) -> Result<Statistics> {
    serde_json::from_str(raw).context("invalid statistics JSON document")
}
