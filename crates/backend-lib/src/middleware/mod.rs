// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the forum server.

pub mod gate;

pub use gate::{authenticate, requires_authentication, AuthenticatedLogin};

#[cfg(test)]
mod tests;
