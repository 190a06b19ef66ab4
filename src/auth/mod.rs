pub mod credential;

pub use credential::{CredentialError, CredentialStore};
