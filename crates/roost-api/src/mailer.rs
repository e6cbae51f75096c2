use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info, warn};

/// A plain-text message ready for dispatch.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub reply_to_name: String,
    pub reply_to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()>;

    /// Check that the server accepts connections.
    async fn verify(&self) -> anyhow::Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Implicit TLS, usually port 465.
    Tls,
    /// STARTTLS upgrade, usually port 587.
    StartTls,
    /// Plaintext, local relays only.
    None,
}

impl FromStr for SmtpSecurity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tls" => Ok(Self::Tls),
            "starttls" => Ok(Self::StartTls),
            "none" => Ok(Self::None),
            other => Err(format!("unknown SMTP security mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub security: SmtpSecurity,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> anyhow::Result<Self> {
        let builder = match settings.security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?,
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            }
            SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host),
        };
        let mut builder = builder.port(settings.port);

        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: settings.from.parse::<Mailbox>()?,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        let reply_to = Mailbox::new(Some(mail.reply_to_name), mail.reply_to.parse::<Address>()?);
        let message = Message::builder()
            .from(self.from.clone())
            .reply_to(reply_to)
            .to(mail.to.parse::<Mailbox>()?)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)?;

        self.transport.send(message).await?;
        Ok(())
    }

    async fn verify(&self) -> anyhow::Result<bool> {
        Ok(self.transport.test_connection().await?)
    }
}

/// One-shot startup check. A failure is only logged; sends are still
/// attempted later.
pub async fn verify_on_startup(transport: Arc<dyn MailTransport>) {
    match transport.verify().await {
        Ok(true) => info!("SMTP server is ready to take messages"),
        Ok(false) => warn!("SMTP server refused the test connection"),
        Err(e) => error!("SMTP connection check failed: {:#}", e),
    }
}
