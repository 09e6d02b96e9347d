use std::sync::{Arc, Mutex};

use cm_config::{EmailAlertConfig, HumanDuration, SecurityMode};
use orion_error::prelude::*;

use super::message::AlertMessage;
use super::session::{Connection, Connector, Credentials, SmtpTarget};
use crate::error::{CoreReason, CoreResult};

/// Calls observed by [`MockConnector`], in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect(String, u16),
    Login(String),
    Send(AlertMessage),
    Quit,
}

/// Which step the mock should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailAt {
    #[default]
    Nowhere,
    Connect,
    Login,
    Send,
    Quit,
}

#[derive(Clone, Default)]
pub struct MockConnector {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub fail_at: FailAt,
}

impl MockConnector {
    pub fn failing(fail_at: FailAt) -> Self {
        Self {
            fail_at,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<AlertMessage> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(m) => Some(m),
                _ => None,
            })
            .collect()
    }
}

fn fail<T>(step: &str) -> CoreResult<T> {
    StructError::from(CoreReason::Delivery)
        .with_detail(format!("mock {step} failure"))
        .err()
}

impl Connector for MockConnector {
    fn connect(&self, target: &SmtpTarget) -> CoreResult<Box<dyn Connection>> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Connect(target.host.clone(), target.port));
        if self.fail_at == FailAt::Connect {
            return fail("connect");
        }
        Ok(Box::new(MockConnection {
            calls: Arc::clone(&self.calls),
            fail_at: self.fail_at,
        }))
    }
}

struct MockConnection {
    calls: Arc<Mutex<Vec<Call>>>,
    fail_at: FailAt,
}

impl Connection for MockConnection {
    fn login(&mut self, credentials: &Credentials) -> CoreResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Login(credentials.username.clone()));
        if self.fail_at == FailAt::Login {
            return fail("login");
        }
        Ok(())
    }

    fn send(&mut self, message: &AlertMessage) -> CoreResult<()> {
        self.calls.lock().unwrap().push(Call::Send(message.clone()));
        if self.fail_at == FailAt::Send {
            return fail("send");
        }
        Ok(())
    }

    fn quit(&mut self) -> CoreResult<()> {
        self.calls.lock().unwrap().push(Call::Quit);
        if self.fail_at == FailAt::Quit {
            return fail("quit");
        }
        Ok(())
    }
}

pub fn email_config() -> EmailAlertConfig {
    EmailAlertConfig {
        host: "smtp.example.com".into(),
        port: 465,
        security: SecurityMode::Tls,
        username: Some("bot@example.com".into()),
        password: Some("secret".into()),
        subject: "Cloud findings".into(),
        sender: "bot@example.com".into(),
        to: vec!["ops@example.com".into(), "sec@example.com".into()],
        body: "No findings.".into(),
        timeout: HumanDuration::from(std::time::Duration::from_secs(5)),
    }
}
