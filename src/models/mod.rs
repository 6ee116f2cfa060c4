//! Core data models for the asset deploy pipeline.
//!
//! `asset`, `rule`, `deployed` and `outcome` describe one pass of the sync
//! engine. `object` is the metadata row kept by the local object store and
//! maps to SQLite via `sqlx::FromRow`.

pub mod asset;
pub mod deployed;
pub mod object;
pub mod outcome;
pub mod rule;
