use cm_config::SecurityMode;
use lettre::transport::smtp::authentication::{Credentials as SmtpCredentials, Mechanism};
use lettre::transport::smtp::client::{SmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use orion_error::prelude::*;

use super::message::AlertMessage;
use super::session::{Connection, Connector, Credentials, SmtpTarget};
use crate::error::{CoreReason, CoreResult};

/// Opens real SMTP connections with lettre's blocking client.
///
/// `Tls` wraps the socket in TLS before the greeting (SMTPS). `Plain`
/// never negotiates encryption, not even when the server offers STARTTLS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmtpConnector;

impl Connector for SmtpConnector {
    fn connect(&self, target: &SmtpTarget) -> CoreResult<Box<dyn Connection>> {
        let tls = match target.security {
            SecurityMode::Tls => Some(TlsParameters::new(target.host.clone()).map_err(|e| {
                StructError::from(CoreReason::Delivery)
                    .with_detail(format!("tls setup for {}: {e}", target.host))
            })?),
            SecurityMode::Plain => None,
        };
        let inner = SmtpConnection::connect(
            (target.host.as_str(), target.port),
            target.timeout,
            &ClientId::default(),
            tls.as_ref(),
            None,
        )
        .map_err(|e| {
            StructError::from(CoreReason::Delivery)
                .with_detail(format!("connect {}:{}: {e}", target.host, target.port))
        })?;
        Ok(Box::new(SmtpSession { inner }))
    }
}

struct SmtpSession {
    inner: SmtpConnection,
}

impl Connection for SmtpSession {
    fn login(&mut self, credentials: &Credentials) -> CoreResult<()> {
        let creds = SmtpCredentials::new(
            credentials.username.clone(),
            credentials.password.clone(),
        );
        self.inner
            .auth(&[Mechanism::Plain, Mechanism::Login], &creds)
            .map_err(|e| {
                StructError::from(CoreReason::Delivery)
                    .with_detail(format!("login as {}: {e}", credentials.username))
            })?;
        Ok(())
    }

    fn send(&mut self, message: &AlertMessage) -> CoreResult<()> {
        let mime = message.to_mime()?;
        self.inner
            .send(mime.envelope(), &mime.formatted())
            .map_err(|e| {
                StructError::from(CoreReason::Delivery).with_detail(format!("send: {e}"))
            })?;
        Ok(())
    }

    fn quit(&mut self) -> CoreResult<()> {
        self.inner.quit().map_err(|e| {
            StructError::from(CoreReason::Delivery).with_detail(format!("quit: {e}"))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    use cm_config::EmailAlertConfig;
    use serde_json::json;

    use super::*;
    use crate::alert::testing::email_config;
    use crate::alert::{AlertPlugin, EmailAlert, SessionState};
    use crate::record::Record;

    /// Minimal SMTP server: accepts one connection, answers every command
    /// with success and returns the commands it saw. The message itself is
    /// collapsed into one `DATA` entry followed by its raw text.
    fn reply(out: &mut TcpStream, text: &str) {
        out.write_all(text.as_bytes()).unwrap();
        out.flush().unwrap();
    }

    fn serve_once(listener: TcpListener) -> thread::JoinHandle<Vec<String>> {
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut out = stream.try_clone().unwrap();
            let mut input = BufReader::new(stream);
            let mut seen = Vec::new();

            reply(&mut out, "220 fake.local ESMTP\r\n");
            let mut line = String::new();
            loop {
                line.clear();
                if input.read_line(&mut line).unwrap() == 0 {
                    break;
                }
                let cmd = line.trim_end().to_string();
                let verb = cmd.split_whitespace().next().unwrap_or("").to_ascii_uppercase();
                match verb.as_str() {
                    "EHLO" => reply(&mut out, "250-fake.local\r\n250 AUTH PLAIN LOGIN\r\n"),
                    "AUTH" => reply(&mut out, "235 2.7.0 accepted\r\n"),
                    "MAIL" | "RCPT" => reply(&mut out, "250 2.1.0 ok\r\n"),
                    "DATA" => {
                        reply(&mut out, "354 go ahead\r\n");
                        let mut text = String::new();
                        loop {
                            line.clear();
                            input.read_line(&mut line).unwrap();
                            if line.trim_end() == "." {
                                break;
                            }
                            text.push_str(&line);
                        }
                        seen.push(cmd);
                        seen.push(text);
                        reply(&mut out, "250 2.0.0 queued\r\n");
                        continue;
                    }
                    "QUIT" => {
                        seen.push(cmd);
                        reply(&mut out, "221 2.0.0 bye\r\n");
                        break;
                    }
                    _ => reply(&mut out, "250 ok\r\n"),
                }
                seen.push(cmd);
            }
            seen
        })
    }

    fn local_config(port: u16) -> EmailAlertConfig {
        EmailAlertConfig {
            host: "127.0.0.1".into(),
            port,
            security: SecurityMode::Plain,
            ..email_config()
        }
    }

    #[test]
    fn plain_session_transcript() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = serve_once(listener);

        let mut alert = EmailAlert::from_config(&local_config(port)).unwrap();
        alert.write(&Record::from_value(json!({"com": {"record_type": "x"}})).unwrap());
        alert.done();
        let seen = server.join().unwrap();

        let report = alert.last_delivery().unwrap();
        assert_eq!(report.reached, SessionState::Authenticated);
        assert_eq!(report.state, SessionState::Closed);
        assert_eq!(report.error, None);

        assert_eq!(seen.len(), 8, "{seen:?}");
        assert!(seen[0].starts_with("EHLO "), "{seen:?}");
        assert!(seen[1].starts_with("AUTH PLAIN"), "{seen:?}");
        assert!(seen[2].starts_with("MAIL FROM:<bot@example.com>"), "{seen:?}");
        assert!(seen[3].starts_with("RCPT TO:<ops@example.com>"), "{seen:?}");
        assert!(seen[4].starts_with("RCPT TO:<sec@example.com>"), "{seen:?}");
        assert_eq!(seen[5], "DATA");
        let message = &seen[6];
        assert!(message.contains("To: ops@example.com, sec@example.com"), "{message}");
        assert!(message.contains("Subject: Cloud findings"), "{message}");
        assert!(message.contains("multipart/mixed"), "{message}");
        assert_eq!(seen[7], "QUIT");
    }

    #[test]
    fn refused_connection_is_a_delivery_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut alert = EmailAlert::from_config(&local_config(port)).unwrap();
        alert.done();
        let report = alert.last_delivery().unwrap();
        assert_eq!(report.reached, SessionState::Unconnected);
        assert_eq!(report.state, SessionState::Closed);
        assert!(report.error.is_some());
    }
}
