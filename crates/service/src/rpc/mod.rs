//! Macro surface: the store's operations callable by stable name with
//! positional JSON arguments.

pub mod functions;
pub mod registry;

pub use functions::{FunctionTable, SharedPredicate, SharedTransformer};
pub use registry::MacroRegistry;
