pub mod error;
pub mod factory;
pub mod pipeline;
pub mod reader;
pub mod registry;
pub mod tracing_init;

pub use error::{RuntimeError, RuntimeReason, RuntimeResult};
pub use pipeline::{Pipeline, RunSummary};
pub use reader::RecordReader;
pub use registry::{AlertFactory, BuildCtx, EventFactory, PluginRegistry};
