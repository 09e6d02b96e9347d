use std::time::SystemTime;

use chrono::{DateTime, Local};
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::Message;
use orion_error::prelude::*;

use crate::error::{CoreReason, CoreResult};

/// A fully assembled alert email, independent of the wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertMessage {
    pub date: DateTime<Local>,
    pub subject: String,
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    pub body: String,
}

impl AlertMessage {
    /// The `To` header value: recipients joined with `", "`.
    pub fn to_header(&self) -> String {
        self.to
            .iter()
            .map(Mailbox::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Render as a MIME `multipart/mixed` message with one `text/plain` part
    /// and `Date`, `Subject`, `From`, `To` headers.
    pub fn to_mime(&self) -> CoreResult<Message> {
        let mut builder = Message::builder()
            .date(SystemTime::from(self.date))
            .subject(self.subject.clone())
            .from(self.from.clone());
        for rcpt in &self.to {
            builder = builder.to(rcpt.clone());
        }
        builder
            .multipart(MultiPart::mixed().singlepart(SinglePart::plain(self.body.clone())))
            .map_err(|e| {
                StructError::from(CoreReason::Delivery)
                    .with_detail(format!("build alert message: {e}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AlertMessage {
        AlertMessage {
            date: Local::now(),
            subject: "Cloud findings".into(),
            from: "bot@example.com".parse().unwrap(),
            to: vec![
                "ops@example.com".parse().unwrap(),
                "sec@example.com".parse().unwrap(),
            ],
            body: "hello".into(),
        }
    }

    #[test]
    fn to_header_is_comma_joined() {
        assert_eq!(sample().to_header(), "ops@example.com, sec@example.com");
    }

    #[test]
    fn mime_has_headers_and_body() {
        let msg = sample();
        let mime = msg.to_mime().unwrap();
        let text = String::from_utf8(mime.formatted()).unwrap();
        assert!(text.contains("Subject: Cloud findings"), "{text}");
        assert!(text.contains("From: bot@example.com"), "{text}");
        assert!(text.contains("To: ops@example.com, sec@example.com"), "{text}");
        assert!(text.contains("Date: "), "{text}");
        assert!(text.contains("multipart/mixed"), "{text}");
        assert!(text.contains("hello"), "{text}");

        let env = mime.envelope();
        assert_eq!(env.to().len(), 2);
    }
}
