//! Formula evaluation for the datasheet engine: the function contract and
//! registry, the AST interpreter, and the dependency graph that decides what
//! to recalculate and in which order.

pub mod builtins;
pub mod context;
pub mod engine;
pub mod function;
pub mod function_registry;
pub mod interpreter;
pub mod test_env;
pub mod traits;

pub use context::{ExecutionContext, GroupMember};
pub use engine::{
    DependencyGraph, EngineConfig, EngineError, FormulaEngine, GraphChange, GraphRestoreData,
    VariableInfo, VariableValue, VertexKey, VertexKind,
};
pub use function::{ArgKind, ArgSpec, Function};
pub use function_registry::FunctionRegistry;
pub use interpreter::Interpreter;
pub use traits::{ArgumentHandle, Environment, FunctionContext};

pub use datasheet_common::{CellError, CellValue, ErrorKind};
