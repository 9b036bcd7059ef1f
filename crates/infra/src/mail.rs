//! Outbound email.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    /// `"Display Name" <address>` or a bare address.
    pub from: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("failed to build email: {0}")]
    Build(String),

    #[error("failed to send email: {0}")]
    Transport(String),
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// TLS from the first byte (SMTPS).
    Implicit,
    /// Plain connect, then upgrade with `STARTTLS`.
    StartTls,
}

/// Port 465 is SMTPS; submission (587) and relay (25) ports upgrade in-band.
pub fn tls_mode(port: u16) -> TlsMode {
    match port {
        465 => TlsMode::Implicit,
        _ => TlsMode::StartTls,
    }
}

/// SMTP relay with credentials, secured per [`tls_mode`].
pub struct SmtpMailer {
    transport: SmtpTransport,
    tls: TlsMode,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let tls = tls_mode(config.port);
        let builder = match tls {
            TlsMode::Implicit => SmtpTransport::relay(&config.host),
            TlsMode::StartTls => SmtpTransport::starttls_relay(&config.host),
        }
        .map_err(|e| MailError::Transport(format!("invalid SMTP host: {e}")))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .build();
        tracing::debug!(host = %config.host, port = config.port, tls = ?tls, "smtp transport configured");
        Ok(Self { transport, tls })
    }

    pub fn tls_mode(&self) -> TlsMode {
        self.tls
    }
}

fn mailbox(raw: &str) -> Result<Mailbox, MailError> {
    raw.parse().map_err(|_| MailError::InvalidAddress(raw.to_string()))
}

fn build_message(email: &OutgoingEmail) -> Result<Message, MailError> {
    Message::builder()
        .from(mailbox(&email.from)?)
        .to(mailbox(&email.to)?)
        .subject(email.subject.clone())
        .body(email.text.clone())
        .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let message = build_message(&email)?;
        let transport = self.transport.clone();

        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?
            .map_err(|e| {
                tracing::error!(to = %email.to, error = %e, "smtp send failed");
                MailError::Transport(e.to_string())
            })?;

        tracing::info!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }
}

/// Development mailer: validates the message and logs it instead of sending.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        build_message(&email)?;
        tracing::info!(
            to = %email.to,
            from = %email.from,
            subject = %email.subject,
            body_len = email.text.len(),
            "SMTP not configured; email logged instead of sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(to: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            subject: "Invoice Reminder".to_string(),
            text: "Hi Acme,\nPlease pay.".to_string(),
            from: "\"Pixel Forge\" <billing@pixelforge.test>".to_string(),
        }
    }

    #[test]
    fn builds_message_with_display_name_sender() {
        let message = build_message(&email("client@acme.test")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Pixel Forge"));
        assert!(raw.contains("<billing@pixelforge.test>"));
        assert!(raw.contains("client@acme.test"));
        assert!(raw.contains("Subject: Invoice Reminder"));
    }

    #[test]
    fn only_smtps_port_uses_implicit_tls() {
        assert_eq!(tls_mode(465), TlsMode::Implicit);
        assert_eq!(tls_mode(587), TlsMode::StartTls);
        assert_eq!(tls_mode(25), TlsMode::StartTls);
    }

    #[test]
    fn submission_port_mailer_upgrades_with_starttls() {
        let config = SmtpConfig {
            host: "smtp.example.test".to_string(),
            port: 587,
            username: "billing".to_string(),
            password: "app-password".to_string(),
        };
        let mailer = SmtpMailer::new(&config).unwrap();
        assert_eq!(mailer.tls_mode(), TlsMode::StartTls);

        let mailer = SmtpMailer::new(&SmtpConfig { port: 465, ..config }).unwrap();
        assert_eq!(mailer.tls_mode(), TlsMode::Implicit);
    }

    #[tokio::test]
    async fn log_mailer_rejects_bad_recipient() {
        let err = LogMailer.send(email("not an address")).await.unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress(_)));
        LogMailer.send(email("client@acme.test")).await.unwrap();
    }
}
