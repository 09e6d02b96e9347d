use std::fmt;
use std::time::Duration;

use cm_config::SecurityMode;
use orion_error::prelude::*;

use super::message::AlertMessage;
use crate::error::{CoreReason, CoreResult};

/// Where and how a delivery session connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpTarget {
    pub host: String,
    pub port: u16,
    pub security: SecurityMode,
    pub timeout: Option<Duration>,
}

/// Login for the optional authentication step.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An open transport to a mail server.
pub trait Connection {
    fn login(&mut self, credentials: &Credentials) -> CoreResult<()>;
    fn send(&mut self, message: &AlertMessage) -> CoreResult<()>;
    fn quit(&mut self) -> CoreResult<()>;
}

/// Opens connections. The email sink owns one and calls it once per run.
pub trait Connector: Send {
    fn connect(&self, target: &SmtpTarget) -> CoreResult<Box<dyn Connection>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Connected,
    Authenticated,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unconnected => "unconnected",
            Self::Connected => "connected",
            Self::Authenticated => "authenticated",
            Self::Closed => "closed",
        })
    }
}

/// One connect → (login) → send → close cycle.
///
/// `close` runs on drop, so every exit path from the sink's `done` releases
/// the connection. Operations in the wrong state are rejected, never retried.
pub struct DeliverySession<'c> {
    connector: &'c dyn Connector,
    conn: Option<Box<dyn Connection>>,
    state: SessionState,
}

impl<'c> DeliverySession<'c> {
    pub fn new(connector: &'c dyn Connector) -> Self {
        Self {
            connector,
            conn: None,
            state: SessionState::Unconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// `Unconnected → Connected`.
    pub fn connect(&mut self, target: &SmtpTarget) -> CoreResult<()> {
        self.expect(&[SessionState::Unconnected], "connect")?;
        let connection = self.connector.connect(target)?;
        self.conn = Some(connection);
        self.state = SessionState::Connected;
        cm_debug!(conn, host = %target.host, port = target.port, security = %target.security, "smtp session connected");
        Ok(())
    }

    /// `Connected → Authenticated`.
    pub fn authenticate(&mut self, credentials: &Credentials) -> CoreResult<()> {
        self.expect(&[SessionState::Connected], "authenticate")?;
        self.connection("authenticate")?.login(credentials)?;
        self.state = SessionState::Authenticated;
        cm_debug!(conn, username = %credentials.username, "smtp session authenticated");
        Ok(())
    }

    /// Send one message. Allowed from `Connected` or `Authenticated`; the
    /// state does not change.
    pub fn transmit(&mut self, message: &AlertMessage) -> CoreResult<()> {
        self.expect(
            &[SessionState::Connected, SessionState::Authenticated],
            "transmit",
        )?;
        self.connection("transmit")?.send(message)
    }

    /// `* → Closed`. Idempotent. A failing QUIT is logged; the session is
    /// closed either way.
    pub fn close(&mut self) -> SessionState {
        if let Some(mut connection) = self.conn.take() {
            if let Err(e) = connection.quit() {
                cm_warn!(conn, error = %e, "smtp quit failed");
            }
        }
        if self.state != SessionState::Closed {
            cm_debug!(conn, from = %self.state, "smtp session closed");
        }
        self.state = SessionState::Closed;
        self.state
    }

    fn expect(&self, allowed: &[SessionState], op: &str) -> CoreResult<()> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        StructError::from(CoreReason::Delivery)
            .with_detail(format!("cannot {op} in state {}", self.state))
            .err()
    }

    fn connection(&mut self, op: &str) -> CoreResult<&mut (dyn Connection + 'static)> {
        let state = self.state;
        self.conn.as_deref_mut().ok_or_else(|| {
            StructError::from(CoreReason::Delivery)
                .with_detail(format!("cannot {op}: no connection in state {state}"))
        })
    }
}

impl Drop for DeliverySession<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
