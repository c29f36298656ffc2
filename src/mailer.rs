use std::sync::Arc;

use anyhow::Context;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// Outgoing-email collaborator. Configured from `SMTP_*` environment
/// variables; without `SMTP_SERVER` it degrades to logging so development
/// setups run without a relay.
#[derive(Clone)]
pub struct Mailer {
    inner: Option<Arc<Smtp>>,
}

struct Smtp {
    transport: SmtpTransport,
    from: Mailbox,
}

impl Mailer {
    pub fn from_env() -> anyhow::Result<Self> {
        let server = match std::env::var("SMTP_SERVER") {
            Ok(server) => server,
            Err(_) => {
                log::warn!("SMTP_SERVER not set, outgoing email is disabled");
                return Ok(Self { inner: None });
            }
        };
        let port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587);
        let username = std::env::var("SMTP_USERNAME").context("SMTP_USERNAME not found")?;
        let password = std::env::var("SMTP_PASSWORD").context("SMTP_PASSWORD not found")?;
        let from = std::env::var("SMTP_FROM")
            .context("SMTP_FROM not found")?
            .parse::<Mailbox>()
            .context("invalid SMTP_FROM")?;

        let transport = SmtpTransport::relay(&server)
            .context("SMTP relay")?
            .port(port)
            .credentials(Credentials::new(username, password))
            .build();

        Ok(Self {
            inner: Some(Arc::new(Smtp { transport, from })),
        })
    }

    /// Sends one plain-text message. Bulk callers count failures per
    /// recipient instead of aborting the batch.
    pub fn send(&self, subject: &str, body: &str, recipient: &str) -> anyhow::Result<()> {
        let smtp = match &self.inner {
            Some(smtp) => smtp,
            None => {
                log::info!("email disabled, dropping '{}' to {}", subject, recipient);
                return Ok(());
            }
        };

        let email = Message::builder()
            .from(smtp.from.clone())
            .to(recipient
                .parse::<Mailbox>()
                .context("invalid recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("failed to build email")?;

        smtp.transport.send(&email).context("failed to send email")?;
        Ok(())
    }
}
