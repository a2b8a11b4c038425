//! Types and helpers shared by the service and server crates.

pub mod env;
pub mod types;
pub mod utils {
    pub mod logging;
}

pub use utils::logging::{init_logging, LogFormat};
