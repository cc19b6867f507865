//! Client-side state: filter criteria, lead records, selection, and the
//! open detail view. Everything here is plain data plus pure functions; the
//! engine owns the instances and decides when they change.

pub mod detail;
pub mod filters;
pub mod leads;
pub mod query;
pub mod selection;
