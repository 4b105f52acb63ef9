use thiserror::Error;

/// Errors manufactured by the failover engine itself.
///
/// This is deliberately small: provider call failures are propagated verbatim
/// as the caller's own error type and are never wrapped in a synthetic
/// failover error. The only failure the engine can originate is a
/// misconfiguration at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailoverError {
    /// The composite was built without a single registered provider.
    ///
    /// Dispatch requires a non-empty registry, so this is surfaced
    /// immediately by [`FailoverBuilder::build`](crate::FailoverBuilder::build)
    /// and never at call time.
    #[error("no providers registered")]
    EmptyRegistry,
}
