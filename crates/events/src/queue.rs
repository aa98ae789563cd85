//! Bounded fire-and-forget mail queue.
//!
//! Replaces per-send detached threads with a bounded `mpsc` channel drained
//! by a small fixed pool of worker tasks. Enqueuing returns before any
//! network I/O happens; worker-side failures are logged and discarded, never
//! surfacing to the enqueuing caller. The overflow policy is explicit rather
//! than implicit unbounded growth.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::delivery::{log_send_failure, MailTransport, OutgoingEmail};

/// Default queue capacity.
const DEFAULT_CAPACITY: usize = 64;

/// Default number of worker tasks.
const DEFAULT_WORKERS: usize = 2;

/// Returned by [`MailQueue::enqueue`] when the queue rejected the message.
#[derive(Debug, thiserror::Error)]
#[error("mail queue full, message dropped")]
pub struct QueueFull;

/// What to do when the queue is at capacity.
#[derive(Debug, Clone, Copy)]
pub enum OverflowPolicy {
    /// Reject the new message immediately (default).
    DropNewest,
    /// Wait for a slot up to the given duration, then reject.
    BlockWithTimeout(Duration),
}

// ---------------------------------------------------------------------------
// MailQueue
// ---------------------------------------------------------------------------

/// Handle to the background delivery pool.
pub struct MailQueue {
    tx: mpsc::Sender<OutgoingEmail>,
    policy: OverflowPolicy,
    cancel: CancellationToken,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl MailQueue {
    /// Spawn the worker pool and return the queue handle.
    ///
    /// `workers` is clamped to at least 1. Each worker pulls composed emails
    /// off the shared channel and sends them through `transport`.
    pub fn start(
        transport: Arc<dyn MailTransport>,
        capacity: usize,
        workers: usize,
        policy: OverflowPolicy,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let cancel = CancellationToken::new();

        let workers = (0..workers.max(1))
            .map(|worker_id| {
                let rx = Arc::clone(&rx);
                let transport = Arc::clone(&transport);
                let cancel = cancel.clone();
                tokio::spawn(worker_loop(worker_id, rx, transport, cancel))
            })
            .collect();

        Self {
            tx,
            policy,
            cancel,
            workers,
        }
    }

    /// Spawn with default capacity, worker count, and overflow policy.
    pub fn with_defaults(transport: Arc<dyn MailTransport>) -> Self {
        Self::start(
            transport,
            DEFAULT_CAPACITY,
            DEFAULT_WORKERS,
            OverflowPolicy::DropNewest,
        )
    }

    /// Hand a composed email to the pool.
    ///
    /// Returns as soon as the message is buffered; the SMTP round trip
    /// happens on a worker task. On overflow the configured policy applies
    /// and a rejected message is reported as [`QueueFull`].
    pub async fn enqueue(&self, email: OutgoingEmail) -> Result<(), QueueFull> {
        match self.policy {
            OverflowPolicy::DropNewest => self.tx.try_send(email).map_err(|e| {
                if let mpsc::error::TrySendError::Full(dropped) = &e {
                    tracing::warn!(
                        purpose = dropped.purpose,
                        subject = %dropped.subject,
                        "Mail queue full, dropping newest message"
                    );
                }
                QueueFull
            }),
            OverflowPolicy::BlockWithTimeout(limit) => {
                match tokio::time::timeout(limit, self.tx.send(email)).await {
                    Ok(Ok(())) => Ok(()),
                    _ => {
                        tracing::warn!("Mail queue full, send timed out");
                        Err(QueueFull)
                    }
                }
            }
        }
    }

    /// Stop the workers. In-flight sends are abandoned at the await point;
    /// buffered messages are dropped.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.workers {
            let _ = handle.await;
        }
    }
}

/// Worker task: pull emails off the shared channel until cancelled or the
/// channel closes.
async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<OutgoingEmail>>>,
    transport: Arc<dyn MailTransport>,
    cancel: CancellationToken,
) {
    loop {
        let email = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            received = async { rx.lock().await.recv().await } => match received {
                Some(email) => email,
                None => break,
            },
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(
                    worker_id,
                    purpose = email.purpose,
                    "Shutdown requested, abandoning in-flight send"
                );
                break;
            }
            result = transport.send(&email) => result,
        };

        match result {
            Ok(()) => {
                tracing::debug!(worker_id, purpose = email.purpose, "Queued email delivered");
            }
            Err(err) => {
                // Fire-and-forget: the original caller is long gone, so the
                // log line is the only trace of this failure.
                log_send_failure(email.purpose, &err);
            }
        }
    }
    tracing::debug!(worker_id, "Mail queue worker stopped");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::MailError;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    fn email(subject: &str) -> OutgoingEmail {
        OutgoingEmail {
            purpose: "new_task",
            subject: subject.to_string(),
            text_body: String::new(),
            html_body: String::new(),
            from: "noreply@taskforge.local".to_string(),
            reply_to: None,
            to: vec!["tasks@taskforge.local".to_string()],
        }
    }

    /// Transport that signals when a send starts and blocks until released.
    struct GatedTransport {
        started: Arc<Notify>,
        release: Arc<Notify>,
        sent: Arc<StdMutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl MailTransport for GatedTransport {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
            self.started.notify_one();
            self.release.notified().await;
            self.sent.lock().unwrap().push(email.subject.clone());
            if self.fail {
                Err(MailError::Build("simulated failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn gated(fail: bool) -> (Arc<GatedTransport>, Arc<Notify>, Arc<Notify>, Arc<StdMutex<Vec<String>>>) {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let transport = Arc::new(GatedTransport {
            started: Arc::clone(&started),
            release: Arc::clone(&release),
            sent: Arc::clone(&sent),
            fail,
        });
        (transport, started, release, sent)
    }

    #[tokio::test]
    async fn enqueue_returns_before_send_completes() {
        let (transport, started, release, sent) = gated(false);
        let queue = MailQueue::start(transport, 8, 1, OverflowPolicy::DropNewest);

        // enqueue returns although the transport has not been released yet.
        queue.enqueue(email("a")).await.expect("enqueue should succeed");
        assert!(sent.lock().unwrap().is_empty());

        // Worker picked it up but is still blocked inside the transport.
        tokio::time::timeout(Duration::from_secs(1), started.notified())
            .await
            .expect("worker should start the send");
        assert!(sent.lock().unwrap().is_empty());

        // Release and wait for completion.
        release.notify_one();
        tokio::time::timeout(Duration::from_secs(1), async {
            while sent.lock().unwrap().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("send should complete after release");

        queue.shutdown().await;
    }

    #[tokio::test]
    async fn worker_failure_never_reaches_caller() {
        let (transport, started, release, sent) = gated(true);
        let queue = MailQueue::start(transport, 8, 1, OverflowPolicy::DropNewest);

        queue.enqueue(email("doomed")).await.expect("enqueue should succeed");
        tokio::time::timeout(Duration::from_secs(1), started.notified())
            .await
            .expect("worker should start the send");
        release.notify_one();

        tokio::time::timeout(Duration::from_secs(1), async {
            while sent.lock().unwrap().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("failed send should still have been attempted");

        // The failure was swallowed; the queue stays usable.
        queue.enqueue(email("next")).await.expect("queue should remain usable");
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_interrupts_blocked_send() {
        let (transport, started, _release, sent) = gated(false);
        let queue = MailQueue::start(transport, 8, 1, OverflowPolicy::DropNewest);

        // Worker enters the transport and blocks there; release never fires.
        queue.enqueue(email("stuck")).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), started.notified())
            .await
            .expect("worker should start the send");

        tokio::time::timeout(Duration::from_secs(1), queue.shutdown())
            .await
            .expect("shutdown should not wait for the transport");
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn drop_newest_rejects_on_overflow() {
        let (transport, started, _release, _sent) = gated(false);
        let queue = MailQueue::start(transport, 1, 1, OverflowPolicy::DropNewest);

        // First message: taken by the worker, which blocks in the transport.
        queue.enqueue(email("in-flight")).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), started.notified())
            .await
            .expect("worker should start the send");

        // Second message fills the single buffer slot.
        queue.enqueue(email("buffered")).await.unwrap();

        // Third message overflows.
        assert!(queue.enqueue(email("rejected")).await.is_err());
    }

    #[tokio::test]
    async fn block_with_timeout_rejects_after_deadline() {
        let (transport, started, _release, _sent) = gated(false);
        let queue = MailQueue::start(
            transport,
            1,
            1,
            OverflowPolicy::BlockWithTimeout(Duration::from_millis(20)),
        );

        queue.enqueue(email("in-flight")).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), started.notified())
            .await
            .expect("worker should start the send");
        queue.enqueue(email("buffered")).await.unwrap();

        assert!(queue.enqueue(email("rejected")).await.is_err());
    }
}
