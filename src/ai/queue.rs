use std::collections::HashSet;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

/// Admission control for generation work: a bounded, priority-ordered
/// queue gating how many tasks run concurrently. Process-local; nothing
/// survives a restart.
pub struct AdmissionQueue {
    inner: Mutex<Inner>,
    max_concurrent: usize,
    max_queued: usize,
    task_timeout: Duration,
}

struct Inner {
    running: usize,
    /// Keys currently running or waiting; duplicates are rejected.
    in_flight: HashSet<String>,
    waiters: Vec<Waiter>,
    seq: u64,
    completed: u64,
    failed: u64,
    total_wait_ms: u64,
    waits: u64,
}

struct Waiter {
    key: String,
    priority: u32,
    seq: u64,
    enqueued_at: Instant,
    permit: oneshot::Sender<()>,
}

#[derive(Debug, PartialEq)]
pub enum AdmissionError {
    /// Queue at capacity; the caller should retry later.
    Full,
    /// The same task key is already running or queued.
    Duplicate,
    /// The task exceeded the execution timeout.
    Timeout,
    Failed(String),
}

impl std::fmt::Display for AdmissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdmissionError::Full => write!(f, "Queue is full. Please try again later."),
            AdmissionError::Duplicate => write!(f, "Task already in progress or queued."),
            AdmissionError::Timeout => write!(f, "Task timed out."),
            AdmissionError::Failed(msg) => write!(f, "{msg}"),
        }
    }
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct QueueStats {
    pub active_tasks: usize,
    pub queued_tasks: usize,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    pub average_wait_ms: u64,
}

impl AdmissionQueue {
    pub fn new(max_concurrent: usize, max_queued: usize, task_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                running: 0,
                in_flight: HashSet::new(),
                waiters: Vec::new(),
                seq: 0,
                completed: 0,
                failed: 0,
                total_wait_ms: 0,
                waits: 0,
            }),
            max_concurrent,
            max_queued,
            task_timeout,
        }
    }

    /// Run `task` once a slot is free, highest priority first. The timeout
    /// covers execution only; queue wait is unbounded (capacity bounds it
    /// in practice).
    pub async fn run<T, F>(&self, key: &str, priority: u32, task: F) -> Result<T, AdmissionError>
    where
        F: Future<Output = Result<T, String>>,
    {
        let permit_rx = {
            let mut inner = self.inner.lock().expect("admission queue poisoned");

            if inner.in_flight.contains(key) {
                return Err(AdmissionError::Duplicate);
            }
            if inner.waiters.len() >= self.max_queued {
                return Err(AdmissionError::Full);
            }

            inner.in_flight.insert(key.to_string());

            if inner.running < self.max_concurrent {
                inner.running += 1;
                None
            } else {
                let (tx, rx) = oneshot::channel();
                inner.seq += 1;
                let seq = inner.seq;
                inner.waiters.push(Waiter {
                    key: key.to_string(),
                    priority,
                    seq,
                    enqueued_at: Instant::now(),
                    permit: tx,
                });
                Some(rx)
            }
        };

        if let Some(rx) = permit_rx {
            // The sender is dropped only if the queue itself goes away.
            if rx.await.is_err() {
                self.release(key, false);
                return Err(AdmissionError::Failed("Queue shut down".to_string()));
            }
        }

        let result = tokio::time::timeout(self.task_timeout, task).await;

        let outcome = match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(msg)) => Err(AdmissionError::Failed(msg)),
            Err(_) => Err(AdmissionError::Timeout),
        };

        self.release(key, outcome.is_ok());
        outcome
    }

    /// Free a slot and wake the best waiter, if any.
    fn release(&self, key: &str, success: bool) {
        let mut inner = self.inner.lock().expect("admission queue poisoned");
        inner.in_flight.remove(key);
        if success {
            inner.completed += 1;
        } else {
            inner.failed += 1;
        }

        loop {
            // Highest priority wins; FIFO within equal priority.
            let next = inner
                .waiters
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.priority.cmp(&b.priority).then(b.seq.cmp(&a.seq)))
                .map(|(i, _)| i);

            match next {
                Some(i) => {
                    let waiter = inner.waiters.remove(i);
                    let waited = waiter.enqueued_at.elapsed().as_millis() as u64;
                    if waiter.permit.send(()).is_ok() {
                        inner.total_wait_ms += waited;
                        inner.waits += 1;
                        return;
                    }
                    // Caller gave up while waiting; drop its reservation
                    // and hand the slot to the next waiter.
                    inner.in_flight.remove(&waiter.key);
                }
                None => {
                    inner.running = inner.running.saturating_sub(1);
                    return;
                }
            }
        }
    }

    pub fn stats(&self) -> QueueStats {
        let inner = self.inner.lock().expect("admission queue poisoned");
        QueueStats {
            active_tasks: inner.running,
            queued_tasks: inner.waiters.len(),
            completed_tasks: inner.completed,
            failed_tasks: inner.failed,
            average_wait_ms: if inner.waits > 0 {
                inner.total_wait_ms / inner.waits
            } else {
                0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn runs_immediately_when_slots_free() {
        let queue = AdmissionQueue::new(2, 10, Duration::from_secs(5));
        let result = queue.run("a", 500, async { Ok::<_, String>(42) }).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(queue.stats().completed_tasks, 1);
    }

    #[tokio::test]
    async fn duplicate_keys_are_rejected() {
        let queue = Arc::new(AdmissionQueue::new(1, 10, Duration::from_secs(5)));

        let q = queue.clone();
        let blocker = tokio::spawn(async move {
            q.run("same", 500, async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<_, String>(())
            })
            .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        let result = queue.run("same", 500, async { Ok::<_, String>(()) }).await;
        assert_eq!(result.unwrap_err(), AdmissionError::Duplicate);
        blocker.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn higher_priority_admitted_first() {
        let queue = Arc::new(AdmissionQueue::new(1, 10, Duration::from_secs(5)));
        let order = Arc::new(Mutex::new(Vec::new()));

        let q = queue.clone();
        let blocker = tokio::spawn(async move {
            q.run("hold", 500, async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<_, String>(())
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut handles = Vec::new();
        for (key, priority) in [("low", 100u32), ("high", 900u32)] {
            let q = queue.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                q.run(key, priority, async {
                    order.lock().unwrap().push(key);
                    Ok::<_, String>(())
                })
                .await
            }));
            // Deterministic enqueue order.
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        blocker.await.unwrap().unwrap();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec!["high", "low"]);
    }

    #[tokio::test]
    async fn full_queue_rejects() {
        let queue = Arc::new(AdmissionQueue::new(1, 1, Duration::from_secs(5)));

        let q = queue.clone();
        let blocker = tokio::spawn(async move {
            q.run("running", 500, async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<_, String>(())
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let q = queue.clone();
        let queued = tokio::spawn(async move {
            q.run("queued", 500, async { Ok::<_, String>(()) }).await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let result = queue.run("extra", 500, async { Ok::<_, String>(()) }).await;
        assert_eq!(result.unwrap_err(), AdmissionError::Full);

        blocker.await.unwrap().unwrap();
        queued.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn slow_tasks_time_out() {
        let queue = AdmissionQueue::new(1, 10, Duration::from_millis(20));
        let result = queue
            .run("slow", 500, async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, String>(())
            })
            .await;
        assert_eq!(result.unwrap_err(), AdmissionError::Timeout);
        assert_eq!(queue.stats().failed_tasks, 1);
    }
}
