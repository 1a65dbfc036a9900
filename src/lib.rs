//! sheetpanel - Spreadsheet Data-Entry Panel Library
//!
//! A terminal panel that mirrors a fixed input range of a remote
//! spreadsheet, writes edits back, and shows a results range computed by
//! the spreadsheet itself.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
