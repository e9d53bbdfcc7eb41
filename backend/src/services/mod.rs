//! Business logic services for the FreshControl ledger

pub mod alerts;
pub mod ledger;
pub mod losses;
pub mod products;
pub mod reporting;
pub mod sales;

pub use alerts::StockAlertService;
pub use ledger::BatchLedger;
pub use losses::LossService;
pub use products::ProductService;
pub use reporting::ReportingService;
pub use sales::SaleService;
