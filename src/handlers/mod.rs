//! HTTP handlers for the PeerLend API
//!
//! Thin orchestration only: parse the request, call the service layer, map
//! domain errors to responses.

pub mod alerts;
pub mod auth;
pub mod loans;
