//! Alert sinks: plugins that collect records and deliver them somewhere.

pub mod email;
pub mod file;
mod message;
mod session;
mod smtp;

#[cfg(test)]
mod testing;

pub use email::EmailAlert;
pub use file::FileAlert;
pub use message::AlertMessage;
pub use session::{Connection, Connector, Credentials, DeliverySession, SessionState, SmtpTarget};
pub use smtp::SmtpConnector;

use crate::record::Record;

/// A sink fed by the pipeline.
///
/// `write` is called once per record, in pipeline order, and must not fail
/// the run whatever the record looks like. `done` is called exactly once
/// after the last `write`; that is where a sink flushes or delivers. Sinks
/// report their own failures and never pass them back to the caller.
pub trait AlertPlugin: Send {
    /// Short identifier of the sink implementation, e.g. `"email"`.
    fn kind(&self) -> &str;
    fn write(&mut self, record: &Record);
    fn done(&mut self);
}

/// What happened during one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Furthest state reached before the session was closed.
    pub reached: SessionState,
    /// State after release. Always [`SessionState::Closed`].
    pub state: SessionState,
    pub error: Option<String>,
}

impl DeliveryReport {
    pub fn delivered(&self) -> bool {
        self.error.is_none()
    }
}
