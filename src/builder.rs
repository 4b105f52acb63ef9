//! Builder for the failover composite.

use std::{sync::Arc, time::Duration};

use crate::{
    dispatch::Failover,
    error::FailoverError,
    policy::FailoverPolicy,
    registry::ProviderRegistry,
};

/// Default pacing between failover rotations: none, rotate immediately.
pub const DEFAULT_MIN_DELAY: Duration = Duration::ZERO;

/// Builder for a [`Failover`] composite.
///
/// Providers are attempted in registration order; the first one registered is
/// the initially active provider. Configuration is the retry budget
/// ([`retries`](Self::retries), default
/// [`DEFAULT_MAX_RETRIES`](crate::DEFAULT_MAX_RETRIES)), the retryability
/// predicate ([`should_retry_on`](Self::should_retry_on), default: every
/// error is retryable) and optional rotation pacing
/// ([`min_delay`](Self::min_delay), default none).
pub struct FailoverBuilder<P, E> {
    providers: Vec<Arc<P>>,
    policy: FailoverPolicy<E>,
    min_delay: Duration,
}

impl<P, E> FailoverBuilder<P, E> {
    /// Create a builder with default policy and no providers.
    #[must_use]
    pub fn new() -> Self {
        Self { providers: Vec::new(), policy: FailoverPolicy::default(), min_delay: DEFAULT_MIN_DELAY }
    }

    /// Register a provider at the end of the rotation order.
    ///
    /// Accepts either an owned provider or an existing `Arc<P>` handle; the
    /// instance is shared with the composite, not copied.
    #[must_use]
    pub fn register(mut self, provider: impl Into<Arc<P>>) -> Self {
        self.providers.push(provider.into());
        self
    }

    /// Set the number of additional attempts beyond the first.
    #[must_use]
    pub fn retries(mut self, max_retries: usize) -> Self {
        self.policy = self.policy.with_max_retries(max_retries);
        self
    }

    /// Set the predicate deciding which errors are retryable.
    #[must_use]
    pub fn should_retry_on(mut self, predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        self.policy = self.policy.should_retry_on(predicate);
        self
    }

    /// Replace the whole policy at once.
    #[must_use]
    pub fn policy(mut self, policy: FailoverPolicy<E>) -> Self {
        self.policy = policy;
        self
    }

    /// Set a minimum delay between failover rotations.
    ///
    /// The default is no delay: a replacement provider is attempted
    /// immediately. Asynchronous calls sleep on the runtime, synchronous
    /// calls block the thread.
    #[must_use]
    pub fn min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    /// Build the composite.
    ///
    /// # Errors
    ///
    /// Returns [`FailoverError::EmptyRegistry`] if no provider was
    /// registered.
    pub fn build(self) -> Result<Failover<P, E>, FailoverError> {
        debug!(
            provider_count = self.providers.len(),
            max_retries = self.policy.max_retries(),
            min_delay_ms = self.min_delay.as_millis(),
            "Building failover composite"
        );

        let mut providers = self.providers.into_iter();
        let Some(first) = providers.next() else {
            return Err(FailoverError::EmptyRegistry);
        };

        let registry = ProviderRegistry::new(first);
        for provider in providers {
            registry.register(provider);
        }

        info!(provider_count = registry.len(), "Failover composite initialized");
        Ok(Failover::new(Arc::new(registry), self.policy, self.min_delay))
    }
}

impl<P, E> Default for FailoverBuilder<P, E> {
    fn default() -> Self {
        Self::new()
    }
}
