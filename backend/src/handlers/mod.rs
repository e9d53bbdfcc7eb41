//! HTTP request handlers

pub mod alerts;
pub mod health;
pub mod inventory;
pub mod losses;
pub mod products;
pub mod reporting;
pub mod sales;

pub use alerts::*;
pub use health::*;
pub use inventory::*;
pub use losses::*;
pub use products::*;
pub use reporting::*;
pub use sales::*;
