//! Service layer: the catalog store and everything that calls into it.
//! - `storage` persists schemaless JSON catalogs on a narrow property backend.
//! - `rpc` exposes the store as named `db.*` macros with positional arguments.
//! - `campaign` keeps the campaign manager's lists as catalogs.

pub mod campaign;
pub mod errors;
pub mod metrics;
pub mod rpc;
pub mod runtime;
pub mod storage;
#[cfg(test)]
pub mod test_support;
