use crate::Procedure;
use crate::procedures::{Insert, RowCount};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

type ProcedureMap = BTreeMap<&'static str, Arc<dyn Procedure>>;

/// Procedures available for invocation, keyed by name
#[derive(Clone, Debug)]
pub struct ProcedureRegistry {
    procedures: ProcedureMap,
}

impl ProcedureRegistry {
    /// Create a registry without any procedures
    #[must_use]
    pub fn new() -> Self {
        Self {
            procedures: BTreeMap::new(),
        }
    }

    /// Add a procedure, replacing any procedure registered under the same name
    pub fn add(&mut self, procedure: Arc<dyn Procedure>) {
        let name = procedure.name();
        debug!(
            "registering procedure {name} ({:?})",
            procedure.partitioning()
        );
        let _ = self.procedures.insert(name, procedure);
    }

    /// Get a procedure by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Procedure>> {
        self.procedures.get(name).cloned()
    }

    /// Get all procedures, ordered by name
    #[must_use]
    pub fn procedures(&self) -> Vec<Arc<dyn Procedure>> {
        self.procedures.values().cloned().collect()
    }
}

/// Registry with the built-in procedures
impl Default for ProcedureRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.add(Arc::new(Insert));
        registry.add(Arc::new(RowCount));
        registry
    }
}
