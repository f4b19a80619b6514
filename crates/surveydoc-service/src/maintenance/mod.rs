//! Background maintenance of stored content.

pub mod sweep;

pub use sweep::{BlobSweeper, SweepReport};
