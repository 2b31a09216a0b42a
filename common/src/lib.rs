pub mod address;
pub mod erc20;
pub mod error;
pub mod set_token;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
