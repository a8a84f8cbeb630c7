//! Operational scripts built on top of `ctbrec-client`: disk-space
//! reclamation and orphaned-recording cleanup.

pub mod env;
pub mod reclaim;
pub mod reclean;
