//! Domain models for the FreshControl batch ledger

mod alert;
mod batch;
mod loss;
mod product;
mod report;
mod sale;

pub use alert::*;
pub use batch::*;
pub use loss::*;
pub use product::*;
pub use report::*;
pub use sale::*;
