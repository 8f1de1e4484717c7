//! Bundled tool catalog and the filter engine over it.

use std::collections::HashSet;

use aikesif_core::{CategoryFilter, Tool};
use anyhow::Context as _;

mod filter;

pub use filter::{FilterCriteria, filter_tools, matches_query};

const BUNDLED_TOOLS: &str = include_str!("../data/tools.json");

/// Immutable, ordered set of tools. Order is the dataset order.
#[derive(Debug, Clone)]
pub struct Catalog {
    tools: Vec<Tool>,
}

impl Catalog {
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_json(BUNDLED_TOOLS).context("load bundled tool catalog")
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let tools: Vec<Tool> = serde_json::from_str(json).context("parse tool catalog")?;
        Self::from_tools(tools)
    }

    pub fn from_tools(tools: Vec<Tool>) -> anyhow::Result<Self> {
        let mut seen = HashSet::new();
        for tool in &tools {
            anyhow::ensure!(!tool.id.trim().is_empty(), "tool {:?} has an empty id", tool.name);
            anyhow::ensure!(seen.insert(tool.id.as_str()), "duplicate tool id {:?}", tool.id);
        }
        Ok(Self { tools })
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn get(&self, id: &str) -> Option<&Tool> {
        self.tools.iter().find(|tool| tool.id == id)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Number of tools a category chip would show.
    pub fn count_in(&self, filter: CategoryFilter) -> usize {
        self.tools
            .iter()
            .filter(|tool| filter.matches(tool.category))
            .count()
    }
}
