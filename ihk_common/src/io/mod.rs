//! Signal identities, address table configuration, and the Address Map.

pub mod config;
pub mod map;
pub mod signal;
