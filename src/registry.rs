//! Ordered provider registry with an identity-guarded active index.
//!
//! The registry is the only shared mutable state in the crate: an append-only
//! sequence of [`ProviderEntry`] values plus the index of the provider that
//! should serve the next call. Rotation happens exclusively through
//! [`ProviderRegistry::advance_if_still_active`], which compares entry
//! identities so that two overlapping failures against the same provider
//! advance the index once, not twice.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use uuid::Uuid;

/// Opaque unique identifier for a registered provider entry.
///
/// Uniqueness relies on random generation; no collision detection is
/// performed beyond that.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntryId(String);

impl EntryId {
    fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered provider together with its bookkeeping metadata.
///
/// The wrapped provider is shared, never copied: entries hold an [`Arc`] to
/// the instance the caller registered. `last_latency` is overwritten after
/// every completed attempt against this entry, successful or failed. It is
/// recorded purely for observability and is never consulted when selecting a
/// provider.
pub struct ProviderEntry<P> {
    /// Unique identity of this entry within its registry.
    pub id: EntryId,
    /// The wrapped provider instance.
    pub provider: Arc<P>,
    /// Duration of the most recent completed attempt against this entry.
    pub last_latency: Duration,
}

impl<P> Clone for ProviderEntry<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            provider: Arc::clone(&self.provider),
            last_latency: self.last_latency,
        }
    }
}

impl<P> fmt::Debug for ProviderEntry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("id", &self.id)
            .field("last_latency", &self.last_latency)
            .finish_non_exhaustive()
    }
}

struct Inner<P> {
    entries: Vec<ProviderEntry<P>>,
    active: usize,
}

/// Ordered, append-only sequence of providers plus the active index.
///
/// A registry always holds at least one provider: construction takes the
/// first one, so [`current_entry`](Self::current_entry) is infallible and the
/// modulo-advanced active index is always in bounds. Entries are never
/// removed.
///
/// All methods take `&self`; the interior mutex is the explicit
/// synchronization required to keep the read-then-conditionally-write
/// rotation rule atomic under preemptive scheduling. No lock is held across
/// an `.await` point anywhere in the crate.
pub struct ProviderRegistry<P> {
    inner: Mutex<Inner<P>>,
}

impl<P> ProviderRegistry<P> {
    /// Create a registry with its first provider, which becomes the active
    /// entry.
    ///
    /// Accepts either an owned provider or an existing `Arc<P>` handle.
    pub fn new(first: impl Into<Arc<P>>) -> Self {
        let registry = Self { inner: Mutex::new(Inner { entries: Vec::new(), active: 0 }) };
        registry.register(first);
        registry
    }

    /// Append a provider and return the identifier of its new entry.
    ///
    /// Registration never fails and never changes the active index.
    pub fn register(&self, provider: impl Into<Arc<P>>) -> EntryId {
        let entry = ProviderEntry {
            id: EntryId::generate(),
            provider: provider.into(),
            last_latency: Duration::ZERO,
        };
        let id = entry.id.clone();
        let mut inner = self.lock();
        inner.entries.push(entry);
        debug!(entry = %id, position = inner.entries.len() - 1, "Provider registered");
        id
    }

    /// Snapshot of the entry at the active index.
    #[must_use]
    pub fn current_entry(&self) -> ProviderEntry<P> {
        let inner = self.lock();
        inner.entries[inner.active].clone()
    }

    /// Rotate the active index past `failed`, unless a concurrent failure
    /// already did.
    ///
    /// If the entry at the active index still carries the identity of
    /// `failed`, the index advances by one position modulo the sequence
    /// length. Otherwise another call observed the same failed provider
    /// first and the index is left untouched. Either way the new current
    /// entry is returned. The identity comparison is what keeps two
    /// overlapping failures of the same provider from skipping a healthy
    /// one.
    pub fn advance_if_still_active(&self, failed: &EntryId) -> ProviderEntry<P> {
        let mut inner = self.lock();
        if inner.entries[inner.active].id == *failed {
            inner.active = (inner.active + 1) % inner.entries.len();
            info!(
                failed = %failed,
                next = %inner.entries[inner.active].id,
                "Active provider rotated"
            );
        }
        inner.entries[inner.active].clone()
    }

    /// Overwrite the recorded latency for the entry with this identifier.
    ///
    /// Unknown identifiers are ignored. The stored value is metadata for
    /// potential future ranking; dispatch never reads it.
    pub fn record_latency(&self, id: &EntryId, latency: Duration) {
        let mut inner = self.lock();
        if let Some(entry) = inner.entries.iter_mut().find(|entry| entry.id == *id) {
            entry.last_latency = latency;
            trace!(entry = %id, latency_us = latency.as_micros(), "Latency recorded");
        }
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Always `false`: a registry holds at least one provider by
    /// construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Identity of the entry at the active index.
    #[must_use]
    pub fn active_id(&self) -> EntryId {
        let inner = self.lock();
        inner.entries[inner.active].id.clone()
    }

    /// Recorded latency for the entry with this identifier, if registered.
    #[must_use]
    pub fn latency_of(&self, id: &EntryId) -> Option<Duration> {
        let inner = self.lock();
        inner.entries.iter().find(|entry| entry.id == *id).map(|entry| entry.last_latency)
    }

    /// Snapshot of all entries in registration order.
    #[must_use]
    pub fn entries(&self) -> Vec<ProviderEntry<P>> {
        self.lock().entries.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<P>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P> fmt::Debug for ProviderRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("ProviderRegistry")
            .field("len", &inner.entries.len())
            .field("active", &inner.active)
            .finish()
    }
}
