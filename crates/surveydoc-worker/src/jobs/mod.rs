//! Job implementations run by the scheduler.

pub mod sweep;

pub use sweep::BlobSweepJob;
