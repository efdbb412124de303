use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::RouteSettings;
use crate::pipeline::{Configurable, PayloadNotifier, PayloadRecord, PipelineError};

/// Does nothing.
#[derive(Debug, Default)]
pub struct NilNotifier;

impl NilNotifier {
    pub const NAME: &'static str = "NilNotifier";
}

impl Configurable for NilNotifier {}

#[async_trait]
impl PayloadNotifier for NilNotifier {
    async fn notify(&self, _payload: Option<&PayloadRecord>) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// Mails every payload to a single recipient.
#[derive(Default)]
pub struct SmtpNotifier {
    from: Option<Mailbox>,
    to: Option<Mailbox>,
    subject: String,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    debug: bool,
}

impl SmtpNotifier {
    pub const NAME: &'static str = "SMTPNotifier";

    /// Build the message for `payload`. Fails if the notifier is not configured.
    pub fn message(&self, payload: &PayloadRecord) -> Result<Message, PipelineError> {
        let (Some(from), Some(to)) = (&self.from, &self.to) else {
            return Err(not_configured());
        };

        let body = format!("{payload}\n\nSincerely,\n\n{}\n", from.email);
        Message::builder()
            .from(from.clone())
            .to(to.clone())
            .subject(self.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| PipelineError::Smtp(e.to_string()))
    }
}

fn not_configured() -> PipelineError {
    PipelineError::InvalidSetting {
        field: "smtp_server",
        reason: "notifier is not configured".to_string(),
    }
}

fn mailbox(field: &'static str, value: &str) -> Result<Mailbox, PipelineError> {
    value.parse().map_err(|e: lettre::address::AddressError| PipelineError::InvalidSetting {
        field,
        reason: format!("{value:?}: {e}"),
    })
}

impl Configurable for SmtpNotifier {
    fn configure(&mut self, settings: &RouteSettings) -> Result<(), PipelineError> {
        let from = mailbox("smtp_from", &settings.smtp_from)?;
        let to = mailbox("smtp_to", &settings.smtp_to)?;

        let builder = if settings.smtp_use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_server)
                .map_err(|e| PipelineError::Smtp(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.smtp_server)
        };
        let credentials = Credentials::new(settings.smtp_from.clone(), settings.smtp_password.clone());

        self.transport = Some(builder.port(settings.smtp_port).credentials(credentials).build());
        self.subject = format!("Notification from {}", settings.name);
        self.from = Some(from);
        self.to = Some(to);
        self.debug = settings.debug;
        Ok(())
    }
}

#[async_trait]
impl PayloadNotifier for SmtpNotifier {
    async fn notify(&self, payload: Option<&PayloadRecord>) -> Result<(), PipelineError> {
        let payload = payload.ok_or(PipelineError::MissingPayload)?;
        let transport = self.transport.as_ref().ok_or_else(not_configured)?;
        let message = self.message(payload)?;

        transport
            .send(message)
            .await
            .map_err(|e| PipelineError::Smtp(e.to_string()))?;
        if self.debug {
            tracing::debug!(subject = %self.subject, "Notification sent");
        }
        Ok(())
    }
}
