//! In-app notification sink

mod service;

pub use service::{AlertError, AlertService};
