//! # tally-auth
//!
//! Who is calling: the [`AuthProvider`] contract, salted password hashes,
//! opaque bearer tokens, and Clerk JWT validation via JWKS (`clerk-rs`).
//!
//! The database-backed provider lives in `tally-db`, next to the accounts and
//! sessions it reads.

pub mod claims;
pub mod error;
pub mod jwks;
pub mod password;
pub mod provider;
pub mod token;

pub use claims::ClerkClaims;
pub use error::AuthError;
pub use jwks::ClerkJwksProvider;
pub use provider::{AuthProvider, Session};
