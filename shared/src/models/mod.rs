//! Domain models for the Armory storefront

pub mod order;
pub mod user;
pub mod weapon;

pub use order::*;
pub use user::*;
pub use weapon::*;
