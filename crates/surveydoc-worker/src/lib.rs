//! Scheduled maintenance for SurveyDoc.
//!
//! This crate provides:
//! - A cron scheduler driving periodic tasks
//! - The blob sweep job that reclaims unreferenced version content

pub mod jobs;
pub mod scheduler;

pub use jobs::BlobSweepJob;
pub use scheduler::CronScheduler;
