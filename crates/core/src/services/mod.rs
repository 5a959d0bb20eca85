//! Triage services: filtering, classification, aggregation and the session
//! controller, plus the collaborator traits they talk to.

pub mod aggregator;
pub mod criticality;
pub mod filter;
pub mod host;
pub mod resolution;
pub mod selection;
pub mod session;
pub mod source;
