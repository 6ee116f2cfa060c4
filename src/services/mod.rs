//! The sync engine and the capabilities it drives.

pub mod aws;
pub mod cdn;
pub mod classifier;
pub mod decision;
pub mod executor;
pub mod local_store;
#[cfg(test)]
pub mod mock;
pub mod prober;
pub mod store;
pub mod sync;
