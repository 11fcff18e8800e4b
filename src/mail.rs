//! Delivers contact-form submissions by email.

use crate::config::MailConfig;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// A contact-form submission.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

impl ContactMessage {
    /// The plain-text body of the email sent for this submission.
    pub fn body(&self) -> String {
        format!(
            "New email from:\n\n{}<{}>\n\n\n{}\n",
            self.name, self.email, self.message
        )
    }
}

pub enum Mailer {
    /// Sends through an SMTP relay.
    Smtp {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
        to: Mailbox,
        subject: String,
    },

    /// No relay is configured; messages are only logged.
    Log,
}

impl Mailer {
    pub fn from_config(config: Option<&MailConfig>) -> Result<Mailer> {
        let config = match config {
            Some(config) => config,
            None => return Ok(Mailer::Log),
        };
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Mailer::Smtp {
            transport,
            from: config.from.parse()?,
            to: config.to.parse()?,
            subject: config.subject.clone(),
        })
    }

    pub async fn send(&self, contact: &ContactMessage) -> Result<()> {
        match self {
            Mailer::Log => {
                info!(
                    name = %contact.name,
                    email = %contact.email,
                    message = %contact.message,
                    "contact message (mail not configured)"
                );
                Ok(())
            }
            Mailer::Smtp {
                transport,
                from,
                to,
                subject,
            } => {
                let message = Message::builder()
                    .from(from.clone())
                    .to(to.clone())
                    .subject(subject.as_str())
                    .header(header::ContentType::TEXT_PLAIN)
                    .body(contact.body())?;
                transport.send(message).await?;
                info!(email = %contact.email, "contact message sent");
                Ok(())
            }
        }
    }
}

/// The result of a fallible mail operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure configuring the mailer or sending a message.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a configured address can't be parsed.
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Returned when the message can't be assembled.
    #[error("building message: {0}")]
    Build(#[from] lettre::error::Error),

    /// Returned by the SMTP transport.
    #[error("smtp: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_body() {
        let contact = ContactMessage {
            name: "Ada".to_owned(),
            email: "ada@example.org".to_owned(),
            message: "Hello!".to_owned(),
        };
        assert_eq!(
            "New email from:\n\nAda<ada@example.org>\n\n\nHello!\n",
            contact.body()
        );
    }

    #[test]
    fn test_from_config_without_mail_logs() -> Result<()> {
        assert!(matches!(Mailer::from_config(None)?, Mailer::Log));
        Ok(())
    }

    #[test]
    fn test_from_config_bad_address() {
        let config = MailConfig {
            host: "smtp.example.org".to_owned(),
            username: "user".to_owned(),
            password: "secret".to_owned(),
            from: "not an address".to_owned(),
            to: "Site <site@example.org>".to_owned(),
            subject: "Contact".to_owned(),
        };
        assert!(matches!(
            Mailer::from_config(Some(&config)),
            Err(Error::Address(_))
        ));
    }
}
