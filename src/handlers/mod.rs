pub mod admin;
pub mod customer;
pub mod loyalty_settings;
pub mod purchase;
pub mod wallet;

pub use admin::admin_config;
pub use customer::customer_config;
pub use loyalty_settings::loyalty_settings_config;
pub use purchase::purchase_config;
pub use wallet::wallet_config;
