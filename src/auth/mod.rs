//! Authentication and account management.
//!
//! One `accounts` table holds every identity with a role tag; login is a
//! single lookup regardless of role. Sessions are stateless HS256 bearer
//! tokens carrying the subject id, email and role.

pub mod accounts;
pub mod handlers;
pub mod password;
pub mod sessions;

pub use accounts::{Account, Role};
pub use sessions::{create_token, verify_token, Claims};
