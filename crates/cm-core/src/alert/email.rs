use chrono::Local;
use cm_config::{EmailAlertConfig, SecurityMode};
use lettre::message::Mailbox;
use orion_error::prelude::*;
use serde_json::Value;
use tracing::Span;

use super::message::AlertMessage;
use super::session::{Connector, Credentials, DeliverySession, SmtpTarget};
use super::smtp::SmtpConnector;
use super::{AlertPlugin, DeliveryReport};
use crate::error::{CoreReason, CoreResult};
use crate::record::Record;

pub const KIND: &str = "email";

/// Collects every written record and mails them as one message at `done`.
///
/// `write` only renders into a buffer. All network traffic happens in
/// `done`, through a [`DeliverySession`] that is closed on every path.
/// Delivery failures are logged and recorded in [`last_delivery`]; they are
/// never returned to the caller.
///
/// [`last_delivery`]: EmailAlert::last_delivery
pub struct EmailAlert {
    target: SmtpTarget,
    credentials: Option<Credentials>,
    subject: String,
    sender: Mailbox,
    recipients: Vec<Mailbox>,
    default_body: String,
    buffer: Vec<String>,
    connector: Box<dyn Connector>,
    finished: bool,
    last_delivery: Option<DeliveryReport>,
    span: Span,
}

impl EmailAlert {
    /// Build a sink that talks SMTP through lettre.
    pub fn from_config(config: &EmailAlertConfig) -> CoreResult<Self> {
        Self::with_connector(config, Box::new(SmtpConnector))
    }

    /// Build a sink with a caller-supplied connector.
    ///
    /// Rejects configurations that can never deliver: empty host, port 0, no
    /// recipients, unparsable mailboxes, or half a login.
    pub fn with_connector(
        config: &EmailAlertConfig,
        connector: Box<dyn Connector>,
    ) -> CoreResult<Self> {
        if config.host.trim().is_empty() {
            return config_err("host must not be empty");
        }
        if config.port == 0 {
            return config_err("port must be > 0");
        }
        if config.to.is_empty() {
            return config_err("at least one recipient is required");
        }
        let sender = parse_mailbox("sender", &config.sender)?;
        let recipients = config
            .to
            .iter()
            .enumerate()
            .map(|(i, addr)| parse_mailbox(&format!("to[{i}]"), addr))
            .collect::<CoreResult<Vec<_>>>()?;
        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => Some(Credentials::new(user, pass)),
            (None, None) => None,
            (Some(_), None) => return config_err("username given without password"),
            (None, Some(_)) => return config_err("password given without username"),
        };

        if credentials.is_some() && config.security == SecurityMode::Plain {
            cm_warn!(
                conf,
                host = %config.host,
                port = config.port,
                "email alert logs in over a plain connection; credentials travel unencrypted"
            );
        }

        Ok(Self {
            target: SmtpTarget {
                host: config.host.clone(),
                port: config.port,
                security: config.security,
                timeout: Some(config.timeout.as_duration()),
            },
            credentials,
            subject: config.subject.clone(),
            sender,
            recipients,
            default_body: config.body.clone(),
            buffer: Vec::new(),
            connector,
            finished: false,
            last_delivery: None,
            span: tracing::info_span!("alert", plugin = KIND),
        })
    }

    /// Replace the span this sink logs under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Outcome of the most recent `done`, if it ran.
    pub fn last_delivery(&self) -> Option<&DeliveryReport> {
        self.last_delivery.as_ref()
    }

    /// Number of fragments waiting for `done`.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn compose(&mut self) -> AlertMessage {
        let fragments = std::mem::take(&mut self.buffer);
        let body = if fragments.is_empty() {
            self.default_body.clone()
        } else {
            fragments.concat()
        };
        AlertMessage {
            date: Local::now(),
            subject: self.subject.clone(),
            from: self.sender.clone(),
            to: self.recipients.clone(),
            body,
        }
    }

    fn deliver(&self, session: &mut DeliverySession<'_>, message: &AlertMessage) -> CoreResult<()> {
        session.connect(&self.target)?;
        if let Some(creds) = &self.credentials {
            session.authenticate(creds)?;
        }
        session.transmit(message)
    }
}

impl AlertPlugin for EmailAlert {
    fn kind(&self) -> &str {
        KIND
    }

    fn write(&mut self, record: &Record) {
        let _guard = self.span.enter();
        self.buffer.extend(record.values().map(Value::to_string));
    }

    fn done(&mut self) {
        let span = self.span.clone();
        let _guard = span.enter();

        if self.finished {
            cm_warn!(pipe, "done called more than once; ignoring");
            return;
        }
        self.finished = true;

        let fragments = self.buffer.len();
        let message = self.compose();

        let (result, reached, state) = {
            let mut session = DeliverySession::new(self.connector.as_ref());
            let result = self.deliver(&mut session, &message);
            let reached = session.state();
            (result, reached, session.close())
        };

        let report = match result {
            Ok(()) => {
                cm_info!(
                    conn,
                    recipients = %message.to_header(),
                    fragments,
                    "alert email sent"
                );
                DeliveryReport {
                    reached,
                    state,
                    error: None,
                }
            }
            Err(e) => {
                cm_error!(
                    conn,
                    host = %self.target.host,
                    port = self.target.port,
                    reached = %reached,
                    error = %e,
                    "failed to send alert email"
                );
                DeliveryReport {
                    reached,
                    state,
                    error: Some(e.to_string()),
                }
            }
        };
        self.last_delivery = Some(report);
    }
}

fn parse_mailbox(field: &str, addr: &str) -> CoreResult<Mailbox> {
    addr.parse::<Mailbox>().map_err(|e| {
        StructError::from(CoreReason::Config)
            .with_detail(format!("email alert {field}: invalid address {addr:?}: {e}"))
    })
}

fn config_err<T>(detail: &str) -> CoreResult<T> {
    StructError::from(CoreReason::Config)
        .with_detail(format!("email alert: {detail}"))
        .err()
}
