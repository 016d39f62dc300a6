//! Habit tracking with recurrence rules, streaks and monthly statistics.
//!
//! The engine lives in [`recurrence`], [`summary`] and [`milestones`]; it reads
//! and writes through the [`storage::Storage`] trait only.

pub mod commands;
pub mod error;
pub mod milestones;
pub mod models;
pub mod recurrence;
pub mod storage;
pub mod summary;
pub mod tui;
