pub mod error;
pub mod resolver;
pub mod schema;
pub mod session;
