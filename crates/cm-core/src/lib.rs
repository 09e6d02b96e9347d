#[macro_use]
mod log_macros;

pub mod alert;
pub mod error;
pub mod event;
pub mod record;

pub use record::{Common, Extended, Raw, Record};
