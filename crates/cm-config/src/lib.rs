pub mod alert;
pub mod cloudmark;
pub mod event;
pub mod logging;
pub mod pipeline;
pub mod types;
mod validate;

pub use alert::{AlertConfig, EmailAlertConfig, FileAlertConfig, SecurityMode};
pub use cloudmark::{AlertEntry, CloudmarkConfig, EventEntry};
pub use event::EventConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use pipeline::PipelineConfig;
pub use types::HumanDuration;
