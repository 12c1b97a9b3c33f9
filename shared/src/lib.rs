//! Shared types for the Armory storefront
//!
//! Common types used by the server and any future clients: the unified
//! error system, domain models, the license eligibility policy, and small
//! utility helpers.

pub mod error;
pub mod license;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};
