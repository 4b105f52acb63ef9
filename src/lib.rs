//! Transparent failover across interchangeable providers.
//!
//! Given an ordered set of providers that expose the same capability
//! surface, this crate produces a single composite object, [`Failover`],
//! through which every operation is automatically retried across providers
//! on failure. The consumer writes code against one object and never learns
//! which underlying provider served a given call.
//!
//! # How it works
//!
//! Providers live in an append-only registry together with a single active
//! index. An operation routed through the composite runs against the active
//! provider; when it fails with an error the [`FailoverPolicy`] classifies
//! as retryable, the active index advances by one position (wrapping around)
//! and the same operation re-runs against the next provider, up to
//! `1 + max_retries` total attempts. Advancement is identity-guarded: two
//! overlapping failures of the same provider rotate the index once, not
//! twice, so a healthy provider is never skipped unfairly.
//!
//! Errors are never wrapped. The caller sees either the successful value or
//! the last real provider error, so error handling written against the
//! original provider's error taxonomy keeps working. The duration of every
//! completed attempt is recorded per provider entry as observability
//! metadata; it never influences provider selection.
//!
//! There are no health checks, no quorum, no deduplication of concurrent
//! identical calls, and no timeouts: a call that never settles holds its
//! retry budget indefinitely.
//!
//! # Examples
//!
//! ```rust
//! use provider_failover::FailoverBuilder;
//!
//! struct Endpoint {
//!     healthy: bool,
//! }
//!
//! impl Endpoint {
//!     async fn fetch(&self) -> Result<String, String> {
//!         if self.healthy { Ok("data".into()) } else { Err("unreachable".into()) }
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let failover = FailoverBuilder::new()
//!     .register(Endpoint { healthy: false })
//!     .register(Endpoint { healthy: true })
//!     .retries(3)
//!     .build()?;
//!
//! // The first endpoint fails; the call transparently lands on the second.
//! let data = failover.call(|endpoint| async move { endpoint.fetch().await }).await?;
//! assert_eq!(data, "data");
//! # Ok(()) }
//! ```
//!
//! A custom policy can keep certain failures from being retried at all, for
//! example errors that a different provider would only reproduce:
//!
//! ```rust
//! use provider_failover::FailoverPolicy;
//!
//! #[derive(Debug)]
//! enum WalletError {
//!     Unreachable,
//!     InsufficientFunds,
//! }
//!
//! let policy = FailoverPolicy::new(2)
//!     .should_retry_on(|e: &WalletError| !matches!(e, WalletError::InsufficientFunds));
//! ```

#[macro_use]
mod logging;

mod builder;
mod dispatch;
mod error;
mod policy;
mod registry;

pub use builder::{DEFAULT_MIN_DELAY, FailoverBuilder};
pub use dispatch::Failover;
pub use error::FailoverError;
pub use policy::{DEFAULT_MAX_RETRIES, FailoverPolicy};
pub use registry::{EntryId, ProviderEntry, ProviderRegistry};
