/// Data models for authentication
pub mod account;

pub use account::{Account, AccountSummary, Address, NewAccount, Role, VerificationMethod};
