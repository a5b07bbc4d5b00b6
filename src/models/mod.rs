//! Data models for Depot

pub mod activity;
pub mod admin;
pub mod auth;
pub mod borrowing;
pub mod category;
pub mod customer;
pub mod employee;
pub mod enums;
pub mod item_type;
pub mod location;
pub mod material;
pub mod transaction;
pub mod transfer;

// Re-export commonly used types
pub use admin::Admin;
pub use auth::{AdminRole, AuthContext, Permission};
pub use borrowing::{BorrowingItem, BorrowingRequest, BorrowingStatus};
pub use enums::RecordStatus;
pub use transaction::{BorrowingTransaction, DamageReport, ReturnItem, TransactionType};
