use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::HumanDuration;

/// One `[alerts.<name>]` table, discriminated by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertConfig {
    Email(EmailAlertConfig),
    File(FileAlertConfig),
}

impl AlertConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::File(_) => "file",
        }
    }
}

/// How the SMTP connection is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// TLS from the first byte (SMTPS, usually port 465).
    Tls,
    /// Unencrypted connection. A configured login is sent in cleartext.
    Plain,
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tls => f.write_str("tls"),
            Self::Plain => f.write_str("plain"),
        }
    }
}

fn default_timeout() -> HumanDuration {
    HumanDuration::from(Duration::from_secs(30))
}

/// Settings for the email alert sink.
#[derive(Clone, Deserialize)]
pub struct EmailAlertConfig {
    pub host: String,
    pub port: u16,
    pub security: SecurityMode,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    pub subject: String,
    pub sender: String,
    pub to: Vec<String>,
    /// Body used when the run produced no records.
    #[serde(default)]
    pub body: String,
    /// Socket timeout for connect and every SMTP command.
    #[serde(default = "default_timeout")]
    pub timeout: HumanDuration,
}

impl EmailAlertConfig {
    /// Whether a login step will run after connecting.
    pub fn wants_auth(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }
}

impl fmt::Debug for EmailAlertConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailAlertConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("subject", &self.subject)
            .field("sender", &self.sender)
            .field("to", &self.to)
            .field("body", &self.body)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Settings for the JSON Lines file sink.
#[derive(Debug, Clone, Deserialize)]
pub struct FileAlertConfig {
    /// Output file. Relative paths resolve against the config file's directory.
    pub path: PathBuf,
}
