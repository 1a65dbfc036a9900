pub mod models;
pub mod sync;
pub mod layout;
pub mod errors;

pub use models::*;
pub use sync::*;
pub use layout::*;
pub use errors::*;
