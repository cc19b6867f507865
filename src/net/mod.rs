//! Network layer: leads REST API client and wire types.

pub mod api;
pub mod types;
