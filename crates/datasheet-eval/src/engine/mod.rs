//! Dependency tracking and recalculation.

mod error;
pub mod eval;
pub mod graph;
pub mod scheduler;
pub mod vertex;

#[cfg(test)]
mod tests;

pub use error::EngineError;
pub use eval::{FormulaEngine, VariableInfo, VariableValue};
pub use graph::{DependencyGraph, GraphChange, GraphRestoreData};
pub use scheduler::Scheduler;
pub use vertex::{Vertex, VertexId, VertexKey, VertexKind};

/// Configuration for the formula engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// How deeply members of a circular group may re-enter each other
    /// before the group is given up as `#CIRCULAR!`.
    pub max_iterations_per_group: usize,
    /// Recalculate as soon as a variable or formula changes.
    pub auto_calculate: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations_per_group: 100,
            auto_calculate: true,
        }
    }
}
