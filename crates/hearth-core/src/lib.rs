//! Core types and trait definitions for the Hearth access-control engine.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the people/presence/permission data model, the collaborator traits the
//! engine is wired against, and the pure [`policy::RestrictionPolicy`].

pub mod error;
pub mod permission;
pub mod person;
pub mod policy;
pub mod ports;
pub mod presence;

pub use error::{Error, Result};
