//! Concrete database adapters implementing the domain repository traits.

pub mod postgres;

pub use postgres::{PostgresClient, PostgresConfig};
