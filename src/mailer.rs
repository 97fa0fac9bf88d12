use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, info};

use crate::config::MailConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, to: &str, token: &str) -> anyhow::Result<()>;
}

pub fn from_config(cfg: &MailConfig, public_base_url: &str) -> anyhow::Result<Arc<dyn Mailer>> {
    let links = VerificationLinks::new(public_base_url);
    let mailer: Arc<dyn Mailer> = match &cfg.host {
        Some(_) => Arc::new(SmtpMailer::new(cfg, links)?),
        None => {
            info!("EMAIL_HOST not set; verification links will only be logged");
            Arc::new(LogMailer { links })
        }
    };
    Ok(mailer)
}

#[derive(Debug, Clone)]
pub struct VerificationLinks {
    base_url: String,
}

impl VerificationLinks {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn link(&self, token: &str) -> String {
        format!("{}/verify-email?token={}", self.base_url, token)
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    links: VerificationLinks,
}

impl SmtpMailer {
    pub fn new(cfg: &MailConfig, links: VerificationLinks) -> anyhow::Result<Self> {
        let host = cfg.host.as_deref().context("EMAIL_HOST must be set for SMTP")?;

        let builder = if cfg.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .with_context(|| format!("smtp relay {host}"))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let mut builder = builder.port(cfg.port);

        if let (Some(user), Some(pass)) = (&cfg.username, &cfg.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let from = cfg
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("parse EMAIL_FROM {:?}", cfg.from))?;

        Ok(Self {
            transport: builder.build(),
            from,
            links,
        })
    }
}

fn verification_bodies(link: &str) -> (String, String) {
    let text = format!(
        "Hi! Thanks for signing up. Open the following link to verify your account: {link}"
    );
    let html = format!(
        r#"<h1>Welcome to Movie App!</h1>
<p>Thanks for signing up. Click the button below to verify your account.</p>
<a href="{link}" style="background-color: #007bff; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px;">Verify my account</a>
<br><br>
<p>If the button does not work, copy this link:</p>
<p>{link}</p>"#
    );
    (text, html)
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification(&self, to: &str, token: &str) -> anyhow::Result<()> {
        let link = self.links.link(token);
        let (text, html) = verification_bodies(&link);

        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse::<Mailbox>().with_context(|| format!("parse recipient {to:?}"))?)
            .subject("Welcome! Verify your Movie App account")
            .multipart(MultiPart::alternative_plain_html(text, html))
            .context("build verification email")?;

        let response = self
            .transport
            .send(message)
            .await
            .context("smtp send")?;
        debug!(to = %to, code = %response.code(), "verification email sent");
        Ok(())
    }
}

/// Stand-in when no SMTP relay is configured.
pub struct LogMailer {
    links: VerificationLinks,
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification(&self, to: &str, token: &str) -> anyhow::Result<()> {
        info!(to = %to, link = %self.links.link(token), "verification email (not sent)");
        Ok(())
    }
}
