//! Weekly timetable generator.
//!
//! Given a semester catalogue and per-course preferences, finds every
//! collision-free choice of one section per (course, type) that minimizes
//! time spent at school: a fixed penalty per attended day plus the span of
//! each day.

pub mod catalogue;
pub mod config;
pub mod data;
pub mod error;
pub mod merge;
pub mod progress;
pub mod selection;
pub mod server;
pub mod solver;
pub mod timeline;
pub mod worker;

pub use catalogue::{Catalogue, Semester};
pub use config::Config;
pub use server::run_server;
pub use solver::{BestResult, ScheduleSolver};
