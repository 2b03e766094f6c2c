//! Accounts: the persisted record, per-login locking and the lifecycle service.

mod locks;
pub mod model;
pub mod service;

pub use locks::{LockTable, LoginLock};
pub use model::Account;
pub use service::AccountService;
