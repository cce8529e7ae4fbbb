//! Distributed mutex built on the shared cache's `add_if_absent`
//!
//! A scope is held while its lock key exists in the shared cache. The key is
//! written with a TTL so that a crashed holder cannot wedge the scope, and it
//! is deleted after the guarded operation on every exit path: `Ok`, `Err`
//! and panic.
//!
//! Scopes are independent. Two operations on `cleanup_1` serialize; an
//! operation on `cleanup_1` and one on `cleanup_2` may interleave.

use crate::keys::CacheKeys;
use crate::security::audit::{AuditEvent, AuditSink, LockOutcome};
use crate::traits::SharedCache;
use chrono::Utc;
use futures::FutureExt;
use noticeboard_core::{Error, LockConfig, Result};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Scoped, TTL-bounded mutual exclusion shared by every process using the
/// same cache namespace
#[derive(Clone)]
pub struct DistributedMutex {
    cache: Arc<dyn SharedCache>,
    keys: CacheKeys,
    config: LockConfig,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for DistributedMutex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedMutex")
            .field("keys", &self.keys)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DistributedMutex {
    pub fn new(
        cache: Arc<dyn SharedCache>,
        keys: CacheKeys,
        config: LockConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            cache,
            keys,
            config,
            audit,
        }
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Run `operation` while holding `scope`, using the configured lock TTL
    pub async fn run<T, F, Fut>(&self, scope: &str, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.with_lock(scope, self.config.ttl(), operation).await
    }

    /// Run `operation` while holding `scope`
    ///
    /// Returns `Error::LockContended` without running `operation` when the
    /// scope stays held for every attempt. Errors from `operation` are
    /// returned unchanged after the lock has been released.
    pub async fn with_lock<T, F, Fut>(
        &self,
        scope: &str,
        ttl: Duration,
        operation: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key = self.keys.lock(scope);
        self.acquire(scope, &key, ttl).await?;
        let held_since = Instant::now();

        let outcome = AssertUnwindSafe(operation()).catch_unwind().await;

        let lock_outcome = match &outcome {
            Ok(Ok(_)) => LockOutcome::Completed,
            _ => LockOutcome::Failed,
        };
        self.release(scope, &key, held_since, lock_outcome).await;

        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn acquire(&self, scope: &str, key: &str, ttl: Duration) -> Result<()> {
        let started = Instant::now();
        let attempts = self.config.max_attempts.max(1);

        for attempt in 1..=attempts {
            let stamp = Utc::now().to_rfc3339();
            let acquired = self.cache.add_if_absent(key, &stamp, ttl).await?;
            self.audit.record(AuditEvent::LockAttempt {
                scope: scope.to_string(),
                attempt,
                acquired,
            });

            if acquired {
                tracing::debug!(scope, attempt, "lock acquired");
                return Ok(());
            }

            if attempt < attempts {
                let delay = self.config.delay_after(attempt);
                tracing::debug!(scope, attempt, ?delay, "lock busy, backing off");
                sleep(delay).await;
            }
        }

        let waited = started.elapsed();
        tracing::warn!(scope, attempts, ?waited, "lock contended, giving up");
        self.audit.record(AuditEvent::LockContended {
            scope: scope.to_string(),
            attempts,
        });
        Err(Error::LockContended {
            scope: scope.to_string(),
            attempts,
            waited,
        })
    }

    async fn release(&self, scope: &str, key: &str, held_since: Instant, outcome: LockOutcome) {
        // A failed delete leaves the key to expire on its TTL
        if let Err(e) = self.cache.delete(key).await {
            tracing::warn!(scope, error = %e, "failed to release lock, waiting for TTL");
        }
        self.audit.record(AuditEvent::LockReleased {
            scope: scope.to_string(),
            held_ms: held_since.elapsed().as_millis() as u64,
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryCache;
    use crate::security::audit::MemoryAuditSink;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn mutex_with(
        cache: Arc<MemoryCache>,
        audit: Arc<MemoryAuditSink>,
        max_attempts: usize,
    ) -> DistributedMutex {
        DistributedMutex::new(
            cache,
            CacheKeys::new("test"),
            LockConfig {
                ttl_secs: 5,
                max_attempts,
                base_delay_ms: 10,
            },
            audit,
        )
    }

    #[tokio::test]
    async fn test_releases_after_success() {
        let cache = Arc::new(MemoryCache::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let mutex = mutex_with(cache.clone(), audit.clone(), 3);

        let value = mutex
            .run("scope", || async {
                assert!(cache.contains("test:lock:scope"));
                Ok(42)
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert!(!cache.contains("test:lock:scope"));
        let events = audit.events();
        assert!(matches!(
            events.last(),
            Some(AuditEvent::LockReleased {
                outcome: LockOutcome::Completed,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_releases_after_error_and_propagates_it() {
        let cache = Arc::new(MemoryCache::new());
        let mutex = mutex_with(cache.clone(), Arc::new(MemoryAuditSink::new()), 3);

        let result: Result<()> = mutex
            .run("scope", || async { Err(Error::store("set", "k", "disk full")) })
            .await;

        assert!(matches!(result, Err(Error::Store { .. })));
        assert!(!cache.contains("test:lock:scope"));
    }

    fn always() -> bool {
        true
    }

    #[tokio::test]
    async fn test_releases_after_panic() {
        let cache = Arc::new(MemoryCache::new());
        let mutex = mutex_with(cache.clone(), Arc::new(MemoryAuditSink::new()), 3);

        let task = {
            let mutex = mutex.clone();
            tokio::spawn(async move {
                mutex
                    .run("scope", || async {
                        if always() {
                            panic!("boom");
                        }
                        Ok(())
                    })
                    .await
            })
        };

        assert!(task.await.unwrap_err().is_panic());
        assert!(!cache.contains("test:lock:scope"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_contended_scope_times_out_without_running() {
        let cache = Arc::new(MemoryCache::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let mutex = mutex_with(cache.clone(), audit.clone(), 3);
        cache
            .add_if_absent("test:lock:busy", "other-process", Duration::from_secs(60))
            .await
            .unwrap();

        let ran = AtomicBool::new(false);
        let started = tokio::time::Instant::now();
        let result = mutex
            .run("busy", || async {
                ran.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;

        match result {
            Err(Error::LockContended {
                scope, attempts, ..
            }) => {
                assert_eq!(scope, "busy");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected contention, got {other:?}"),
        }
        assert!(!ran.load(Ordering::SeqCst));
        // Backoff is linear: 10ms after the first attempt, 20ms after the second
        assert_eq!(started.elapsed(), Duration::from_millis(30));
        // The foreign holder keeps its lock
        assert!(cache.contains("test:lock:busy"));

        let attempts = audit
            .events()
            .iter()
            .filter(|e| matches!(e, AuditEvent::LockAttempt { acquired: false, .. }))
            .count();
        assert_eq!(attempts, 3);
        assert!(matches!(
            audit.events().last(),
            Some(AuditEvent::LockContended { attempts: 3, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquires_once_holder_releases() {
        let cache = Arc::new(MemoryCache::new());
        let mutex = mutex_with(cache.clone(), Arc::new(MemoryAuditSink::new()), 3);
        cache
            .add_if_absent("test:lock:scope", "other", Duration::from_secs(60))
            .await
            .unwrap();

        let releaser = {
            let cache = cache.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                cache.delete("test:lock:scope").await.unwrap();
            })
        };

        let result = mutex.run("scope", || async { Ok("done") }).await;
        releaser.await.unwrap();
        assert_eq!(result.unwrap(), "done");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_scope_never_overlaps() {
        let cache = Arc::new(MemoryCache::new());
        let mutex = DistributedMutex::new(
            cache,
            CacheKeys::new("test"),
            LockConfig {
                ttl_secs: 5,
                max_attempts: 200,
                base_delay_ms: 1,
            },
            Arc::new(MemoryAuditSink::new()),
        );
        let inside = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let mutex = mutex.clone();
            let inside = inside.clone();
            let overlaps = overlaps.clone();
            tasks.push(tokio::spawn(async move {
                mutex
                    .run("shared", || async {
                        if inside.fetch_add(1, Ordering::SeqCst) > 0 {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        inside.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_different_scopes_may_overlap() {
        let cache = Arc::new(MemoryCache::new());
        let mutex = mutex_with(cache, Arc::new(MemoryAuditSink::new()), 1);
        let barrier = Arc::new(tokio::sync::Barrier::new(2));

        let run = |scope: &'static str| {
            let mutex = mutex.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                mutex
                    .run(scope, || async {
                        // Both holders must be inside at once to pass the barrier
                        barrier.wait().await;
                        Ok(())
                    })
                    .await
            })
        };
        let first = run("cleanup_1");
        let second = run("cleanup_2");

        tokio::time::timeout(Duration::from_secs(5), async {
            first.await.unwrap().unwrap();
            second.await.unwrap().unwrap();
        })
        .await
        .expect("independent scopes should not block each other");
    }
}
