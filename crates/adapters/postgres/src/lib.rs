//! grc-adapter-postgres - PostgreSQL 适配器

mod connection;
mod error;
mod schema;

pub use connection::*;
pub use error::*;
pub use schema::*;
