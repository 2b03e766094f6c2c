// ============================
// forum-backend-lib/src/auth/mod.rs
// ============================
//! Authentication primitives: token codec and password hashing.

pub mod codec;
pub mod password;

pub use codec::{decode, encode, Credential};
pub use password::{
    hash_password, hash_password_blocking, hash_password_secure, verify_password,
    verify_password_blocking,
};
