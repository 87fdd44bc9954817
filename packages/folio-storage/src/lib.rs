pub mod cache;
pub mod models;
pub mod vector_store;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
