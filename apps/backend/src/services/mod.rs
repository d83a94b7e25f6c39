//! Business services behind the HTTP routes.

pub mod generator;
pub mod retry;
pub mod sessions;
