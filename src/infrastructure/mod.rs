//! Infrastructure layer providing external service integrations.
//!
//! Range sources (the Sheets API and an offline CSV workbook),
//! configuration loading, file export and clipboard access.

pub mod source;
pub mod sheets;
pub mod workbook;
pub mod config;
pub mod persistence;
pub mod clipboard;

pub use source::*;
pub use sheets::*;
pub use workbook::*;
pub use config::*;
pub use persistence::*;
pub use clipboard::*;
