//! Business services — logic that spans multiple db modules

pub mod orders;
