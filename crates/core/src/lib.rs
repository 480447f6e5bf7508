//! Studyloom domain logic.
//!
//! This crate holds the pure, dependency-light core of the study-plan
//! manager so the API layer, repositories, and the reminder sweep can all
//! share one definition of:
//!
//! - [`error::CoreError`] — the domain error taxonomy.
//! - [`resources`] — resource typing, time-estimate formulas, and
//!   normalizer input validation.
//! - [`progress`] — completion/time aggregation over a resource set.
//! - [`sharing`] — viewer/editor capability predicates for shared plans.
//! - [`reminders`] — reminder rules and fire-window evaluation.
//!
//! Nothing in here touches the network or the database.

pub mod error;
pub mod instances;
pub mod progress;
pub mod reminders;
pub mod resources;
pub mod roles;
pub mod sharing;
pub mod types;
