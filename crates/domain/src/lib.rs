//! # cmdhub-domain
//!
//! Pure domain model for the cmdhub home automation system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Entities** (state holders with identity) and their tri-state
//!   [`EntityState`](entity::EntityState)
//! - Define the fixed set of binary-sensor **device classes**
//! - Define **Events** (state-change and registration records)
//! - Define **Issues** (advisory repair/deprecation notices)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod binary_sensor;
pub mod entity;
pub mod event;
pub mod issue;
