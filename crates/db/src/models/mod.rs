//! Row structs matching the database tables.
//!
//! Each submodule contains a `FromRow` struct and its conversion into the
//! corresponding `wtstat_core` domain type.

pub mod mission;
pub mod profile;
