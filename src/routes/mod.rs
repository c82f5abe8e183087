//! Route definitions for the PeerLend API

mod alerts;
mod auth;
mod loans;

pub use alerts::alert_routes;
pub use auth::auth_routes;
pub use loans::loan_routes;
