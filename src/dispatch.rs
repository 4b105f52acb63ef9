//! The dispatch engine: a composite provider that retries every operation
//! across the registry on failure.

use std::{
    fmt,
    future::Future,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use crate::{
    policy::FailoverPolicy,
    registry::{EntryId, ProviderEntry, ProviderRegistry},
};

/// Composite wrapper over an ordered set of interchangeable providers.
///
/// A `Failover` owns a [`ProviderRegistry`] and a [`FailoverPolicy`] and
/// nothing else. Every operation routed through it is attempted against the
/// currently active provider; on a retryable failure the active provider is
/// rotated (identity-guarded, so concurrent failures of the same provider
/// rotate once) and the *same* operation is re-run against the next entry,
/// until it succeeds, the retry budget is exhausted, or the policy rejects
/// the error. The caller always observes either the successful value or the
/// last real provider error, never a synthetic failover error.
///
/// Three entry points cover the call shapes:
///
/// * [`call`](Self::call) for asynchronous operations; latency is measured
///   from just before invocation until the returned future settles.
/// * [`call_sync`](Self::call_sync) for synchronous operations; measured the
///   same way, and no future is ever constructed.
/// * [`read`](Self::read) for plain property reads; failures rotate
///   providers exactly like call failures, but a read records no latency.
///
/// To present the provider's own interface to downstream code, implement the
/// capability trait on a thin wrapper that delegates each method through
/// [`call`](Self::call):
///
/// ```rust
/// use provider_failover::{Failover, FailoverBuilder};
///
/// struct Endpoint {
///     healthy: bool,
/// }
///
/// impl Endpoint {
///     async fn fetch(&self) -> Result<String, String> {
///         if self.healthy { Ok("data".into()) } else { Err("unreachable".into()) }
///     }
/// }
///
/// struct Client {
///     inner: Failover<Endpoint, String>,
/// }
///
/// impl Client {
///     async fn fetch(&self) -> Result<String, String> {
///         self.inner.call(|endpoint| async move { endpoint.fetch().await }).await
///     }
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client {
///     inner: FailoverBuilder::new()
///         .register(Endpoint { healthy: false })
///         .register(Endpoint { healthy: true })
///         .build()?,
/// };
///
/// // The first endpoint fails, the call transparently lands on the second.
/// assert_eq!(client.fetch().await?, "data");
/// # Ok(()) }
/// ```
pub struct Failover<P, E> {
    registry: Arc<ProviderRegistry<P>>,
    policy: FailoverPolicy<E>,
    min_delay: Duration,
}

impl<P, E> Failover<P, E> {
    pub(crate) fn new(
        registry: Arc<ProviderRegistry<P>>,
        policy: FailoverPolicy<E>,
        min_delay: Duration,
    ) -> Self {
        Self { registry, policy, min_delay }
    }

    /// Start building a composite. Equivalent to [`FailoverBuilder::new`].
    ///
    /// [`FailoverBuilder::new`]: crate::FailoverBuilder::new
    #[must_use]
    pub fn builder() -> crate::FailoverBuilder<P, E> {
        crate::FailoverBuilder::new()
    }

    /// Register an additional provider at the end of the rotation order.
    ///
    /// Intended usage is to register everything before building, but the
    /// registry is append-only and nothing forbids adding a provider later.
    pub fn register(&self, provider: impl Into<Arc<P>>) -> EntryId {
        self.registry.register(provider)
    }

    /// The underlying registry, for observability (active entry, recorded
    /// latencies).
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry<P> {
        &self.registry
    }

    /// The policy this composite dispatches with.
    #[must_use]
    pub fn policy(&self) -> &FailoverPolicy<E> {
        &self.policy
    }

    /// Run an asynchronous operation with failover.
    ///
    /// `operation` receives a handle to the active provider and is re-invoked
    /// with each replacement provider after a retryable failure, so it must
    /// capture its arguments rather than consume them. The engine never
    /// blocks: it awaits the returned future and finalizes the latency
    /// measurement when that future settles, success or failure.
    ///
    /// # Errors
    ///
    /// Propagates the last provider error verbatim once the retry budget is
    /// exhausted, or immediately if the policy classifies the error as
    /// non-retryable.
    pub async fn call<T, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: Fn(Arc<P>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Debug,
    {
        let mut budget = self.policy.max_retries();
        let mut target = self.registry.current_entry();
        loop {
            let started = Instant::now();
            let result = operation(Arc::clone(&target.provider)).await;
            self.registry.record_latency(&target.id, started.elapsed());

            let error = match result {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            target = match self.handle_failure(&target, &error, &mut budget) {
                Some(next) => next,
                None => return Err(error),
            };
            if !self.min_delay.is_zero() {
                tokio::time::sleep(self.min_delay).await;
            }
        }
    }

    /// Run a synchronous operation with failover.
    ///
    /// Identical retry semantics to [`call`](Self::call); the failure branch
    /// is shared. A synchronous failure is handled on the spot and no future
    /// is ever constructed.
    ///
    /// # Errors
    ///
    /// Same contract as [`call`](Self::call).
    pub fn call_sync<T, F>(&self, operation: F) -> Result<T, E>
    where
        F: Fn(&P) -> Result<T, E>,
        E: fmt::Debug,
    {
        self.run_sync(operation, true)
    }

    /// Read a value off the active provider with failover.
    ///
    /// A successful read returns the value from the currently active provider
    /// with no retry and no recorded latency: a plain data read is assumed
    /// side-effect-free and provider-agnostic once it succeeds. A failing
    /// accessor rotates providers exactly like a failing call.
    ///
    /// # Errors
    ///
    /// Same contract as [`call`](Self::call).
    pub fn read<T, F>(&self, accessor: F) -> Result<T, E>
    where
        F: Fn(&P) -> Result<T, E>,
        E: fmt::Debug,
    {
        self.run_sync(accessor, false)
    }

    fn run_sync<T, F>(&self, operation: F, timed: bool) -> Result<T, E>
    where
        F: Fn(&P) -> Result<T, E>,
        E: fmt::Debug,
    {
        let mut budget = self.policy.max_retries();
        let mut target = self.registry.current_entry();
        loop {
            let started = Instant::now();
            let result = operation(&target.provider);
            if timed {
                self.registry.record_latency(&target.id, started.elapsed());
            }

            let error = match result {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            target = match self.handle_failure(&target, &error, &mut budget) {
                Some(next) => next,
                None => return Err(error),
            };
            if !self.min_delay.is_zero() {
                thread::sleep(self.min_delay);
            }
        }
    }

    /// The unified failure branch: decide between rotation and propagation.
    ///
    /// Returns the next entry to attempt, or `None` when the error must be
    /// propagated. A policy-rejected error consumes no budget; it
    /// short-circuits before the decrement.
    fn handle_failure(
        &self,
        target: &ProviderEntry<P>,
        error: &E,
        budget: &mut usize,
    ) -> Option<ProviderEntry<P>>
    where
        E: fmt::Debug,
    {
        if *budget == 0 {
            error!(
                provider = %target.id,
                error = ?error,
                "Retry budget exhausted, propagating last provider error"
            );
            return None;
        }
        if !self.policy.should_retry(error) {
            debug!(provider = %target.id, error = ?error, "Policy rejected retry, propagating");
            return None;
        }
        *budget -= 1;
        info!(provider = %target.id, remaining = *budget, "Provider attempt failed, rotating");
        Some(self.registry.advance_if_still_active(&target.id))
    }
}

impl<P, E> Clone for Failover<P, E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            policy: self.policy.clone(),
            min_delay: self.min_delay,
        }
    }
}

impl<P, E> fmt::Debug for Failover<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failover")
            .field("registry", &self.registry)
            .field("policy", &self.policy)
            .field("min_delay", &self.min_delay)
            .finish()
    }
}
