//! Shared types and ledger rules for FreshControl
//!
//! This crate holds everything that does not touch storage: the domain
//! models, input validation and the pure FIFO allocation rules. The backend
//! applies these rules inside its transactions and the WASM module uses them
//! to preview operations in the browser while offline.

pub mod error;
pub mod fifo;
pub mod models;
pub mod types;
pub mod validation;

pub use error::*;
pub use fifo::*;
pub use models::*;
pub use types::*;
pub use validation::*;
