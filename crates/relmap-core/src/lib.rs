pub mod config;
pub use config::Config;

pub mod driver;
pub use driver::Connection;

mod error;
pub use error::Error;

pub mod mapping;

pub mod schema;
pub use schema::Schema;

pub mod stmt;

/// A Result type alias that uses relmap's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
