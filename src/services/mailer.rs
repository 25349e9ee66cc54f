use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::Serialize;

use crate::{
    config::{MailSettings, SmtpTls},
    errors::MailError,
    render::{Notification, RenderedEmail, Renderer},
};

/// Delivers one rendered message to one recipient.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, to: &str, email: &RenderedEmail) -> Result<(), MailError>;
    fn name(&self) -> &str;
}

pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Address,
}

impl SmtpMailTransport {
    pub fn new(settings: &MailSettings) -> Result<Self, MailError> {
        let host = settings.smtp_host.as_deref().ok_or(MailError::NotConfigured)?;

        let from: Address = settings
            .from_address
            .trim()
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::Address {
                address: settings.from_address.clone(),
                reason: e.to_string(),
            })?;

        let mut builder = match settings.smtp_tls {
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host),
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host),
            SmtpTls::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)),
        }
        .map_err(|e| MailError::Transport(format!("SMTP transport error: {e}")))?;

        builder = builder.port(settings.smtp_port);

        if let (Some(user), Some(pass)) = (&settings.smtp_username, &settings.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn deliver(&self, to: &str, email: &RenderedEmail) -> Result<(), MailError> {
        let recipient: Mailbox = to.parse().map_err(|e: lettre::address::AddressError| MailError::Address {
            address: to.to_string(),
            reason: e.to_string(),
        })?;

        let message = Message::builder()
            .from(Mailbox::new(Some(email.sender_name.to_string()), self.from.clone()))
            .to(recipient)
            .subject(email.subject.as_str())
            .multipart(MultiPart::alternative_plain_html(
                email.text_body.clone(),
                email.html_body.clone(),
            ))
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

/// Stand-in used when SMTP is not configured: every delivery fails.
pub struct DisabledMailTransport;

#[async_trait]
impl MailTransport for DisabledMailTransport {
    async fn deliver(&self, _to: &str, _email: &RenderedEmail) -> Result<(), MailError> {
        Err(MailError::NotConfigured)
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// One message waiting in a dispatch batch.
#[derive(Debug, Clone)]
pub struct Outgoing {
    pub to: String,
    pub notification: Notification,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
    pub timed_out: bool,
}

/// Renders notifications and hands them to the transport.
#[derive(Clone)]
pub struct Mailer {
    renderer: Renderer,
    transport: Arc<dyn MailTransport>,
}

impl Mailer {
    pub fn new(renderer: Renderer, transport: Arc<dyn MailTransport>) -> Self {
        Self { renderer, transport }
    }

    pub async fn send(&self, to: &str, notification: &Notification) -> Result<(), MailError> {
        let email = self.renderer.render_notification(notification)?;
        self.transport.deliver(to, &email).await
    }

    /// Sends the whole batch concurrently and waits for it as one group.
    ///
    /// A failed send is logged and counted; it never cancels its siblings.
    /// When `deadline` expires the sends still pending are dropped and
    /// `sent` holds only the confirmed ones.
    pub async fn send_all(&self, batch: Vec<Outgoing>, deadline: Option<Duration>) -> DispatchSummary {
        let sent = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        let sends = join_all(batch.iter().map(|out| {
            let (sent, failed) = (&sent, &failed);
            async move {
                match self.send(&out.to, &out.notification).await {
                    Ok(()) => {
                        sent.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(
                            to = %out.to,
                            kind = out.notification.kind().id(),
                            transport = self.transport.name(),
                            error = %e,
                            "email send failed"
                        );
                    }
                }
            }
        }));

        let mut timed_out = false;
        match deadline {
            Some(limit) => {
                if tokio::time::timeout(limit, sends).await.is_err() {
                    timed_out = true;
                    tracing::warn!(?limit, "email dispatch deadline reached; some sends may not have completed");
                }
            }
            None => {
                sends.await;
            }
        }

        DispatchSummary {
            sent: sent.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
            timed_out,
        }
    }
}
