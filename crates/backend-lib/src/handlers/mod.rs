//! HTTP handlers.

pub mod account;
