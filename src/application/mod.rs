//! Application layer managing state and business workflows.
//!
//! This module coordinates between the domain layer and presentation layer,
//! managing the panel tables, user interactions and the load/save workflow.

pub mod panel;
pub mod state;

pub use panel::*;
pub use state::*;
