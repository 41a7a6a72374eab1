//! Shared domain core for the harvest planner
//!
//! Models, list filtering, the selection cascade behind the harvest dialog,
//! draft validation and normalization, and stock reconciliation. Nothing in
//! this crate performs I/O, so it is used both by the client and, via WASM,
//! by the browser UI.

pub mod draft;
pub mod filter;
pub mod models;
pub mod reconciliation;
pub mod selection;
pub mod types;
pub mod validation;

pub use draft::*;
pub use filter::*;
pub use models::*;
pub use reconciliation::*;
pub use selection::*;
pub use types::*;
pub use validation::*;
