pub mod alloy;
pub mod config;
pub mod disk_storage;
pub mod error;
pub mod log;
pub mod network;
pub mod price_history;
pub mod registry;
pub mod reqwest;
pub mod serde;

pub use error::{Result, UtilsError as Error};

pub use reqwest::Reqwest;
