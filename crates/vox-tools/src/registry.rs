//! Ordered tool registry.
//!
//! Listing order is registration order, which is the order the model sees.
//! Registering a name twice replaces the earlier tool in place, so the name
//! keeps its original position. Merge order decides who wins a collision.

use std::sync::Arc;

use tracing::debug;
use vox_ai::ToolDefinition;

use crate::Tool;

#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<(String, Arc<dyn Tool>)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a tool under its advertised name. Last registration wins,
    /// replacing in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => {
                debug!(tool = %name, "replacing registered tool");
                entry.1 = tool;
            }
            None => self.entries.push((name, tool)),
        }
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, tool)| Arc::clone(tool))
    }

    /// Tool schemas in registration order, advertised to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.entries.iter().map(|(_, tool)| tool.definition()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
