//! Contact-form relay with a per-sender cap held in process memory.
//!
//! Each sender may submit [`MAX_MESSAGES_PER_WINDOW`] messages per 24-hour
//! window. The map lives in this process only, so running several
//! instances multiplies the effective limit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{Json, extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use roost_types::api::{ContactRequest, ContactResponse};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::mailer::{MailTransport, OutgoingMail};
use crate::state::AppState;
use crate::validate;

pub const MAX_MESSAGES_PER_WINDOW: u32 = 2;

pub const RATE_LIMIT_MESSAGE: &str =
    "You can only send 2 messages every 24 hours. Please try again later.";

pub fn window() -> chrono::Duration {
    chrono::Duration::hours(24)
}

#[derive(Debug, Clone, Copy)]
struct RateEntry {
    count: u32,
    window_start: DateTime<Utc>,
}

/// Fixed-window counter keyed by sender.
pub struct RateLimiter {
    entries: Mutex<HashMap<String, RateEntry>>,
    max: u32,
    window: chrono::Duration,
}

impl RateLimiter {
    pub fn new(max: u32, window: chrono::Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max,
            window,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateEntry>> {
        // Entries are plain counters, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Consume one slot for `key` at `now`. Returns false when the window's
    /// budget is spent; a window older than the limit starts over.
    pub fn try_acquire(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut entries = self.lock();
        let entry = entries.entry(key.to_string()).or_insert(RateEntry {
            count: 0,
            window_start: now,
        });

        if now - entry.window_start > self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.max {
            return false;
        }

        entry.count += 1;
        true
    }

    /// Drop every entry whose window started more than one window ago.
    /// Returns how many were removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| now - e.window_start <= self.window);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct ContactRelay {
    limiter: RateLimiter,
    transport: Arc<dyn MailTransport>,
    recipient: String,
}

impl ContactRelay {
    pub fn new(transport: Arc<dyn MailTransport>, recipient: impl Into<String>) -> Self {
        Self {
            limiter: RateLimiter::new(MAX_MESSAGES_PER_WINDOW, window()),
            transport,
            recipient: recipient.into(),
        }
    }

    pub async fn submit(&self, req: &ContactRequest) -> ContactResponse {
        self.submit_at(req, Utc::now()).await
    }

    /// Rate-limit, then relay. Transport failures come back as data, and a
    /// failed attempt still uses up its slot.
    pub async fn submit_at(&self, req: &ContactRequest, now: DateTime<Utc>) -> ContactResponse {
        let sender = req.email.trim().to_lowercase();

        if !self.limiter.try_acquire(&sender, now) {
            warn!(%sender, "contact rate limit reached");
            return ContactResponse {
                success: false,
                message: RATE_LIMIT_MESSAGE.to_string(),
                error: None,
            };
        }

        let name = req.name.trim();
        let mail = OutgoingMail {
            to: self.recipient.clone(),
            reply_to_name: name.to_string(),
            reply_to: req.email.trim().to_string(),
            subject: format!("New contact message from {} <{}>", name, req.email.trim()),
            body: format!(
                "Name: {}\nEmail: {}\n\n{}",
                name,
                req.email.trim(),
                req.message.trim()
            ),
        };

        match self.transport.send(mail).await {
            Ok(()) => {
                info!(%sender, "contact message relayed");
                ContactResponse {
                    success: true,
                    message: "Message sent successfully".to_string(),
                    error: None,
                }
            }
            Err(e) => {
                error!(%sender, "contact relay failed: {:#}", e);
                ContactResponse {
                    success: false,
                    message: "Failed to send message".to_string(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        self.limiter.sweep(now)
    }
}

/// Background task that drops stale rate-limit entries on an interval.
pub async fn run_sweep_loop(relay: Arc<ContactRelay>, every: Duration) {
    let mut interval = tokio::time::interval(every);

    loop {
        interval.tick().await;

        let removed = relay.sweep_expired(Utc::now());
        if removed > 0 {
            info!("Contact sweep: dropped {} expired senders", removed);
        }
    }
}

fn validate_request(req: &ContactRequest) -> Result<(), ApiError> {
    validate::text("name", &req.name, 100)?;
    validate::email(&req.email)?;
    validate::text("message", &req.message, 5000)?;
    Ok(())
}

// -- Handlers --

/// Relay outcomes are always a 200 with a structured body.
pub async fn post_contact(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_request(&req)?;
    Ok(Json(state.contact.submit(&req).await))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    #[derive(Default)]
    struct FakeTransport {
        sent: Mutex<Vec<OutgoingMail>>,
        fail: AtomicBool,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl MailTransport for FakeTransport {
        async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("connection refused");
            }
            self.sent.lock().unwrap().push(mail);
            Ok(())
        }

        async fn verify(&self) -> anyhow::Result<bool> {
            Ok(true)
        }
    }

    fn request(email: &str) -> ContactRequest {
        ContactRequest {
            name: "Jane".into(),
            email: email.into(),
            message: "Is the flat still available?".into(),
        }
    }

    fn relay() -> (Arc<FakeTransport>, ContactRelay) {
        let transport = Arc::new(FakeTransport::default());
        let relay = ContactRelay::new(transport.clone(), "contact@roost.test");
        (transport, relay)
    }

    #[tokio::test]
    async fn two_messages_per_window() {
        let (transport, relay) = relay();
        let t0 = Utc::now();
        let req = request("jane@example.com");

        assert!(relay.submit_at(&req, t0).await.success);
        assert!(relay.submit_at(&req, t0 + chrono::Duration::hours(1)).await.success);

        let third = relay.submit_at(&req, t0 + chrono::Duration::hours(2)).await;
        assert!(!third.success);
        assert!(third.message.contains("2 messages every 24 hours"));
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 2);

        let later = relay
            .submit_at(&req, t0 + chrono::Duration::hours(24) + chrono::Duration::seconds(1))
            .await;
        assert!(later.success);
    }

    #[tokio::test]
    async fn senders_are_independent_and_normalized() {
        let (_, relay) = relay();
        let t0 = Utc::now();

        assert!(relay.submit_at(&request("Jane@Example.com"), t0).await.success);
        assert!(relay.submit_at(&request("jane@example.com "), t0).await.success);
        assert!(!relay.submit_at(&request("jane@example.com"), t0).await.success);

        assert!(relay.submit_at(&request("bob@example.com"), t0).await.success);
    }

    #[tokio::test]
    async fn failed_send_still_counts() {
        let (transport, relay) = relay();
        transport.fail.store(true, Ordering::SeqCst);
        let t0 = Utc::now();
        let req = request("jane@example.com");

        let first = relay.submit_at(&req, t0).await;
        assert!(!first.success);
        assert_eq!(first.message, "Failed to send message");
        assert_eq!(first.error.as_deref(), Some("connection refused"));

        transport.fail.store(false, Ordering::SeqCst);
        assert!(relay.submit_at(&req, t0).await.success);
        assert_eq!(relay.submit_at(&req, t0).await.message, RATE_LIMIT_MESSAGE);
    }

    #[tokio::test]
    async fn mail_carries_reply_to_and_subject() {
        let (transport, relay) = relay();
        relay.submit_at(&request("jane@example.com"), Utc::now()).await;

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "contact@roost.test");
        assert_eq!(sent[0].reply_to, "jane@example.com");
        assert!(sent[0].subject.contains("Jane"));
        assert!(sent[0].subject.contains("jane@example.com"));
        assert!(sent[0].body.contains("Is the flat still available?"));
    }

    #[test]
    fn sweep_drops_only_stale_entries() {
        let limiter = RateLimiter::new(2, window());
        let t0 = Utc::now();
        limiter.try_acquire("old@example.com", t0);
        limiter.try_acquire("new@example.com", t0 + chrono::Duration::hours(20));

        assert_eq!(limiter.sweep(t0 + chrono::Duration::hours(25)), 1);
        assert_eq!(limiter.len(), 1);
        assert_eq!(limiter.sweep(t0 + chrono::Duration::hours(50)), 1);
        assert!(limiter.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_loop_drops_stale_senders_each_interval() {
        let (_, relay) = relay();
        let relay = Arc::new(relay);
        let task = tokio::spawn(run_sweep_loop(relay.clone(), Duration::from_secs(3600)));

        // Let the immediate first tick pass before seeding.
        tokio::time::sleep(Duration::from_secs(1)).await;
        relay
            .submit_at(&request("old@example.com"), Utc::now() - chrono::Duration::hours(25))
            .await;
        relay.submit_at(&request("new@example.com"), Utc::now()).await;
        assert_eq!(relay.limiter.len(), 2);

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(relay.limiter.len(), 1);

        task.abort();
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(2, window());
        let t0 = Utc::now();
        assert!(limiter.try_acquire("a", t0));
        assert!(limiter.try_acquire("a", t0));
        assert!(!limiter.try_acquire("a", t0 + chrono::Duration::hours(24)));
        assert!(limiter.try_acquire("a", t0 + chrono::Duration::hours(25)));
    }

    #[test]
    fn rejects_blank_fields() {
        let mut req = request("jane@example.com");
        req.message = "   ".into();
        assert!(matches!(validate_request(&req), Err(ApiError::Validation(_))));

        let req = request("not-an-email");
        assert!(matches!(validate_request(&req), Err(ApiError::Validation(_))));
    }
}
