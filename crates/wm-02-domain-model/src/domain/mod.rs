//! Domain rules that sit above the raw entity tables.

pub mod errors;
pub mod nickname;
pub mod secret;
pub mod session;

pub use errors::{DomainError, DomainResult};
pub use nickname::{check_account_nickname, default_account_nickname, default_group_nickname};
pub use secret::VaultSecret;
pub use session::Session;
