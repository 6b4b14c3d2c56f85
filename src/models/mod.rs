pub mod admin;
pub mod common;
pub mod customer;
pub mod loyalty_settings;
pub mod purchase;
pub mod transaction;
pub mod wallet;

pub use admin::*;
pub use common::*;
pub use customer::*;
pub use loyalty_settings::*;
pub use purchase::*;
pub use transaction::*;
pub use wallet::*;
pub use crate::utils::pagination::{PaginatedResponse, PaginationInfo, PaginationParams};
