//! Retry policy: how many additional attempts a call gets and which errors
//! are worth one.

use std::{fmt, sync::Arc};

/// Default number of additional attempts beyond the first.
pub const DEFAULT_MAX_RETRIES: usize = 3;

type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Failure-classification policy for the dispatch engine.
///
/// `max_retries` bounds *additional* attempts beyond the first, so a single
/// logical call makes at most `1 + max_retries` attempts. The predicate
/// decides whether a given error is retryable at all; an error it rejects is
/// propagated immediately, regardless of remaining budget.
///
/// The default policy retries every error up to [`DEFAULT_MAX_RETRIES`]
/// times. Narrow it with [`should_retry_on`](Self::should_retry_on), for
/// example to stop retrying failures that are not transient:
///
/// ```rust
/// use provider_failover::FailoverPolicy;
///
/// enum SignError {
///     Unreachable,
///     InsufficientFunds,
/// }
///
/// let policy = FailoverPolicy::new(2)
///     .should_retry_on(|error: &SignError| !matches!(error, SignError::InsufficientFunds));
///
/// assert!(policy.should_retry(&SignError::Unreachable));
/// assert!(!policy.should_retry(&SignError::InsufficientFunds));
/// ```
pub struct FailoverPolicy<E> {
    max_retries: usize,
    should_retry: RetryPredicate<E>,
}

impl<E> FailoverPolicy<E> {
    /// Policy retrying every error up to `max_retries` additional attempts.
    #[must_use]
    pub fn new(max_retries: usize) -> Self {
        Self { max_retries, should_retry: Arc::new(|_| true) }
    }

    /// Return the same policy with a different retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Replace the retryability predicate.
    #[must_use]
    pub fn should_retry_on(mut self, predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        self.should_retry = Arc::new(predicate);
        self
    }

    /// Maximum number of additional attempts beyond the first.
    #[must_use]
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Whether `error` warrants another attempt on the next provider.
    pub fn should_retry(&self, error: &E) -> bool {
        (self.should_retry)(error)
    }
}

impl<E> Default for FailoverPolicy<E> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl<E> Clone for FailoverPolicy<E> {
    fn clone(&self) -> Self {
        Self { max_retries: self.max_retries, should_retry: Arc::clone(&self.should_retry) }
    }
}

impl<E> fmt::Debug for FailoverPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailoverPolicy")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}
