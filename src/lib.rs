//! Lead inbox filter/sort/sync engine.
//!
//! ARCHITECTURE
//! ============
//! One owned engine (`engine::LeadEngine`) holds the filter criteria, the
//! lead cache, the selection set, and the open detail view. It keeps the
//! criteria mirrored into the navigable URL (`nav`), debounces outbound list
//! queries against the leads REST API (`net`), and exposes derived views
//! computed by the pure functions in `state`.
//!
//! Presentation is out of scope: a renderer reads `LeadEngine::view` and
//! calls the mutation methods.

pub mod config;
pub mod engine;
pub mod nav;
pub mod net;
pub mod state;

pub use config::SyncConfig;
pub use engine::LeadEngine;
