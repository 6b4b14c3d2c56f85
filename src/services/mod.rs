pub mod birthday_reward_service;
pub mod customer_service;
pub mod loyalty_settings_service;
pub mod points_expiry_service;
pub mod purchase_service;
pub mod wallet_service;

pub use birthday_reward_service::*;
pub use customer_service::*;
pub use loyalty_settings_service::*;
pub use points_expiry_service::*;
pub use purchase_service::*;
pub use wallet_service::*;
