//! Out-of-band liveness sampling.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use modelgate_core::LlmError;
use tokio::task::JoinHandle;

use crate::registry::HealthRegistry;

/// A caller-supplied liveness probe for one provider.
///
/// Closures get a blanket implementation:
///
/// ```rust
/// use modelgate_core::LlmError;
///
/// let probe = |provider: String| async move {
///     if provider == "primary" {
///         Ok(())
///     } else {
///         Err(LlmError::network("unreachable"))
///     }
/// };
/// ```
pub trait HealthProbe: Send + Sync {
    /// Checks the named provider; `Ok(())` means alive.
    fn probe(&self, provider: String) -> impl Future<Output = Result<(), LlmError>> + Send;
}

impl<F, Fut> HealthProbe for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), LlmError>> + Send,
{
    fn probe(&self, provider: String) -> impl Future<Output = Result<(), LlmError>> + Send {
        self(provider)
    }
}

/// Periodically probes every provider tracked by a [`HealthRegistry`].
///
/// Each cycle runs all probes concurrently, each bounded by the probe
/// timeout (default 10 seconds), and feeds the outcomes into the registry.
pub struct HealthChecker<P> {
    registry: Arc<HealthRegistry>,
    probe: Arc<P>,
    interval: Duration,
    probe_timeout: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<P> HealthChecker<P>
where
    P: HealthProbe + Send + Sync + 'static,
{
    pub fn new(registry: Arc<HealthRegistry>, probe: P, interval: Duration) -> Self {
        Self {
            registry,
            probe: Arc::new(probe),
            interval,
            probe_timeout: Duration::from_secs(10),
            task: Mutex::new(None),
        }
    }

    /// Overrides the per-probe timeout.
    ///
    /// Default: 10 seconds
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Spawns the background probe loop. Calling `start` again replaces a
    /// running loop.
    pub fn start(&self) {
        let registry = Arc::clone(&self.registry);
        let probe = Arc::clone(&self.probe);
        let interval = self.interval;
        let probe_timeout = self.probe_timeout;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let names = registry.names();
                let checks = names.into_iter().map(|name| {
                    let registry = Arc::clone(&registry);
                    let probe = Arc::clone(&probe);
                    async move {
                        let started = Instant::now();
                        let outcome =
                            tokio::time::timeout(probe_timeout, probe.probe(name.clone())).await;
                        match outcome {
                            Ok(Ok(())) => registry.report_success(&name, started.elapsed()),
                            Ok(Err(error)) => registry.report_failure(&name, error.message()),
                            Err(_) => registry.report_failure(&name, "health probe timed out"),
                        }
                    }
                });
                futures::future::join_all(checks).await;
            }
        });

        if let Some(previous) = self.task.lock().unwrap().replace(handle) {
            previous.abort();
        }
    }

    /// Stops the background loop.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }
}

impl<P> Drop for HealthChecker<P> {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }
}
