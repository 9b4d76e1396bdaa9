pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{MetricEventKind, PropertyStatus, SaleStatus};
pub use error::CoreError;
pub use structs::{
    ClosedSale, PropertyRecord, SaleRecord, SellerAccount, SellerMetricsRecord, SellerWindowStats,
};
