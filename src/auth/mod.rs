//! Authentication module for PeerLend
//!
//! Password-based authentication with signed bearer tokens:
//! - bcrypt password hashing
//! - JWT generation and validation with a fixed validity window
//! - User lookup backing per-request verification

mod jwt;
mod password;
mod service;

pub use jwt::{generate_token, get_role_from_claims, get_user_id_from_claims, verify_token, Claims};
pub use password::{hash_password, verify_password};
pub use service::{AuthError, AuthService};
