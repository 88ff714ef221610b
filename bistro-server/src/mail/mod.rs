//! Outbound mail queue
//!
//! Requests enqueue messages and return immediately; a background worker
//! hands them to a [`MailTransport`]. Delivery failures are logged and never
//! reach the request that queued the message.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::BoxError;

const QUEUE_CAPACITY: usize = 256;

/// A message waiting for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    /// Account notice carrying a generated password
    pub fn account_password(to: &str, password: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Your Bistro staff account".to_string(),
            body: format!(
                "An account has been created for {to}.\n\n\
                 Your temporary password is: {password}\n\n\
                 Please sign in and keep it somewhere safe."
            ),
        }
    }
}

/// Delivery backend
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, from: &str, message: &MailMessage) -> Result<(), BoxError>;
}

/// Writes messages to the log instead of sending them
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, from: &str, message: &MailMessage) -> Result<(), BoxError> {
        tracing::info!(
            from,
            to = %message.to,
            subject = %message.subject,
            "Mail delivered to log"
        );
        Ok(())
    }
}

/// Handle for enqueueing mail; cheap to clone
#[derive(Clone)]
pub struct MailQueue {
    tx: mpsc::Sender<MailMessage>,
}

impl MailQueue {
    /// Start the delivery worker on the current runtime
    pub fn start(from: String, transport: Arc<dyn MailTransport>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<MailMessage>(QUEUE_CAPACITY);

        let worker = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(e) = transport.send(&from, &message).await {
                    tracing::error!(to = %message.to, error = %e, "Mail delivery failed");
                }
            }
            tracing::debug!("Mail queue closed");
        });

        (Self { tx }, worker)
    }

    /// Queue a message without waiting for delivery
    pub fn enqueue(&self, message: MailMessage) {
        let to = message.to.clone();
        if let Err(e) = self.tx.try_send(message) {
            tracing::error!(to = %to, error = %e, "Failed to queue mail");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<(String, MailMessage)>>,
    }

    #[async_trait]
    impl MailTransport for Recording {
        async fn send(&self, from: &str, message: &MailMessage) -> Result<(), BoxError> {
            self.sent.lock().push((from.to_string(), message.clone()));
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl MailTransport for Failing {
        async fn send(&self, _from: &str, _message: &MailMessage) -> Result<(), BoxError> {
            Err("smtp down".into())
        }
    }

    #[tokio::test]
    async fn test_worker_delivers_in_order() {
        let transport = Arc::new(Recording::default());
        let (queue, worker) = MailQueue::start("noreply@bistro.test".to_string(), transport.clone());

        queue.enqueue(MailMessage::account_password("a@bistro.test", "pw1"));
        queue.enqueue(MailMessage::account_password("b@bistro.test", "pw2"));
        drop(queue);
        worker.await.unwrap();

        let sent = transport.sent.lock();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "noreply@bistro.test");
        assert_eq!(sent[0].1.to, "a@bistro.test");
        assert!(sent[1].1.body.contains("pw2"));
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_stop_worker() {
        let (queue, worker) = MailQueue::start("noreply@bistro.test".to_string(), Arc::new(Failing));
        queue.enqueue(MailMessage::account_password("a@bistro.test", "pw"));
        queue.enqueue(MailMessage::account_password("b@bistro.test", "pw"));
        drop(queue);
        worker.await.unwrap();
    }
}
