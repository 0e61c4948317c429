pub mod bridge;
pub mod error;
pub mod identity;
pub mod surface;
