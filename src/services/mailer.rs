//! Outbound mail.
//!
//! Handlers never wait on delivery: messages go into a bounded queue drained
//! by one background task, and delivery failures are only logged.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::MailConfig;
use crate::db::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()>;
}

/// Writes mail to the log instead of an SMTP relay.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        info!(to = %message.to, subject = %message.subject, "Mail delivered");
        debug!(body = %message.body, "Mail body");
        Ok(())
    }
}

pub struct MailQueue {
    sender: Option<mpsc::Sender<MailMessage>>,
    config: MailConfig,
}

impl MailQueue {
    /// Spawn the delivery worker. Must be called inside a tokio runtime.
    #[must_use]
    pub fn start(mailer: Arc<dyn Mailer>, config: &MailConfig) -> Self {
        if !config.enabled {
            info!("Mail disabled, outgoing messages will be dropped");
            return Self {
                sender: None,
                config: config.clone(),
            };
        }

        let (sender, mut rx) = mpsc::channel::<MailMessage>(config.queue_capacity.max(1));

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match mailer.send(&message).await {
                    Ok(()) => {
                        metrics::counter!("mesa_mail_messages_total", "outcome" => "sent")
                            .increment(1);
                    }
                    Err(e) => {
                        metrics::counter!("mesa_mail_messages_total", "outcome" => "failed")
                            .increment(1);
                        error!(error = %e, to = %message.to, "Failed to send mail");
                    }
                }
            }
            debug!("Mail queue closed");
        });

        Self {
            sender: Some(sender),
            config: config.clone(),
        }
    }

    pub fn enqueue(&self, message: MailMessage) {
        let Some(sender) = &self.sender else {
            return;
        };

        if let Err(e) = sender.try_send(message) {
            metrics::counter!("mesa_mail_messages_total", "outcome" => "dropped").increment(1);
            match e {
                mpsc::error::TrySendError::Full(m) => {
                    warn!(to = %m.to, "Mail queue full, dropping message");
                }
                mpsc::error::TrySendError::Closed(m) => {
                    warn!(to = %m.to, "Mail queue closed, dropping message");
                }
            }
        }
    }

    pub fn send_welcome(&self, user: &User) {
        self.enqueue(welcome_message(&self.config, user));
    }

    pub fn send_password_reset(&self, user: &User, link: &str) {
        self.enqueue(reset_message(&self.config, user, link));
    }
}

#[must_use]
pub fn welcome_message(config: &MailConfig, user: &User) -> MailMessage {
    MailMessage {
        from: config.from_address.clone(),
        to: user.email.clone(),
        subject: config.welcome_subject.clone(),
        body: format!(
            "Hello {},\n\nYour account is ready. Find a table, or start your own.\n",
            user.username
        ),
    }
}

#[must_use]
pub fn reset_message(config: &MailConfig, user: &User, link: &str) -> MailMessage {
    MailMessage {
        from: config.from_address.clone(),
        to: user.email.clone(),
        subject: config.reset_subject.clone(),
        body: format!(
            "Hello {},\n\nSomeone asked to reset your password. Follow this link to choose a new one:\n\n{link}\n\nIf it was not you, ignore this message.\n",
            user.username
        ),
    }
}

/// Append the token to the caller-supplied reset page as `?token=`.
pub fn reset_link(reset_url: &str, token: &str) -> anyhow::Result<String> {
    let mut url = Url::parse(reset_url)
        .map_err(|e| anyhow::anyhow!("Invalid reset URL '{reset_url}': {e}"))?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url.into())
}
