//! Domain core for the digital marketplace procurement API.
//!
//! Everything in this crate is free of storage concerns: entity guards,
//! derived lifecycle statuses, payload scrubbing and serialization. The
//! `marketplace-db` crate persists these entities and mirrors the derived
//! statuses as SQL predicates.

pub mod agreement;
pub mod brief;
pub mod brief_response;
pub mod catalog;
pub mod error;
pub mod render;
pub mod scrub;
pub mod service;
pub mod supplier;
pub mod types;
pub mod user;
pub mod validation;
