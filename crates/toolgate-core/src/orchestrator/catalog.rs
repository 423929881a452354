//! Catalog filtering and translation to the model-facing tool format

use std::collections::HashSet;

use crate::config::AssistantSettings;
use crate::types::{Tool, ToolDescriptor};

/// Filter for selecting which tools the model is offered
#[derive(Debug, Clone, Default)]
pub struct ToolFilter {
    /// If set, only include tools with these names
    pub include: Option<HashSet<String>>,
    /// Exclude tools with these names
    pub exclude: HashSet<String>,
}

impl ToolFilter {
    /// A filter that lets every tool through
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter for the assistant settings: offline mode drops the web tools
    pub fn for_assistant(settings: &AssistantSettings) -> Self {
        if settings.internet {
            Self::new()
        } else {
            Self::new().with_exclude(settings.online_tools.iter().cloned())
        }
    }

    /// Include only specific tools
    pub fn with_include(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.include = Some(names.into_iter().collect());
        self
    }

    /// Exclude specific tools
    pub fn with_exclude(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.exclude.extend(names);
        self
    }

    /// Check if a tool matches this filter
    pub fn matches(&self, tool: &ToolDescriptor) -> bool {
        if self.exclude.contains(&tool.name) {
            return false;
        }

        match &self.include {
            Some(include) => include.contains(&tool.name),
            None => true,
        }
    }
}

/// Translate the catalog into model-facing tools, keeping its order
///
/// Name, description and schema pass through unchanged.
pub fn translate(catalog: &[ToolDescriptor], filter: &ToolFilter) -> Vec<Tool> {
    catalog
        .iter()
        .filter(|d| filter.matches(d))
        .map(Tool::from)
        .collect()
}
