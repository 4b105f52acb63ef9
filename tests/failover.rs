//! End-to-end behavior of the failover composite against stub providers.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use provider_failover::{Failover, FailoverBuilder, FailoverError};

/// A provider that either answers with its sound or fails, counting every
/// attempt made against it.
struct Speaker {
    sound: &'static str,
    broken: bool,
    calls: AtomicUsize,
}

impl Speaker {
    fn new(sound: &'static str) -> Self {
        Self { sound, broken: false, calls: AtomicUsize::new(0) }
    }

    fn broken(sound: &'static str) -> Self {
        Self { sound, broken: true, calls: AtomicUsize::new(0) }
    }

    async fn speak(&self) -> Result<&'static str, SpeakError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken { Err(SpeakError { from: self.sound }) } else { Ok(self.sound) }
    }

    fn attempts(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SpeakError {
    from: &'static str,
}

impl fmt::Display for SpeakError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is unavailable", self.from)
    }
}

impl std::error::Error for SpeakError {}

fn speakers(failover: &Failover<Speaker, SpeakError>) -> Vec<Arc<Speaker>> {
    failover.registry().entries().into_iter().map(|entry| entry.provider).collect()
}

async fn speak_through(failover: &Failover<Speaker, SpeakError>) -> Result<&'static str, SpeakError> {
    failover.call(|speaker| async move { speaker.speak().await }).await
}

#[tokio::test]
async fn healthy_first_provider_serves_every_call() -> anyhow::Result<()> {
    let failover = FailoverBuilder::new()
        .register(Speaker::new("meow"))
        .register(Speaker::new("woof"))
        .build()?;

    assert_eq!(speak_through(&failover).await?, "meow");
    assert_eq!(speak_through(&failover).await?, "meow");

    let speakers = speakers(&failover);
    assert_eq!(speakers[0].attempts(), 2);
    assert_eq!(speakers[1].attempts(), 0, "no rotation without a failure");
    Ok(())
}

#[tokio::test]
async fn one_retry_reaches_the_second_provider_only() -> anyhow::Result<()> {
    // [A: boom, B: woof, C: meow] with retries = 1: attempt A, fail, spend
    // the single retry on B and succeed. C is never consulted.
    let failover = FailoverBuilder::new()
        .register(Speaker::broken("boom"))
        .register(Speaker::new("woof"))
        .register(Speaker::new("meow"))
        .retries(1)
        .build()?;

    assert_eq!(speak_through(&failover).await?, "woof");

    let speakers = speakers(&failover);
    assert_eq!(speakers[0].attempts() + speakers[1].attempts() + speakers[2].attempts(), 2);
    assert_eq!(speakers[2].attempts(), 0);
    Ok(())
}

#[tokio::test]
async fn budget_shorter_than_failure_run_surfaces_last_attempted_error() -> anyhow::Result<()> {
    // Same shape, but B is broken too: total attempts = 1 + retries = 2, so
    // the call terminates with B's error even though C would have answered.
    let failover = FailoverBuilder::new()
        .register(Speaker::broken("boom"))
        .register(Speaker::broken("woof"))
        .register(Speaker::new("meow"))
        .retries(1)
        .build()?;

    let error = speak_through(&failover).await.unwrap_err();
    assert_eq!(error, SpeakError { from: "woof" });

    let speakers = speakers(&failover);
    assert_eq!(speakers[0].attempts(), 1);
    assert_eq!(speakers[1].attempts(), 1);
    assert_eq!(speakers[2].attempts(), 0);
    Ok(())
}

#[tokio::test]
async fn consecutive_calls_start_from_the_rotated_provider() -> anyhow::Result<()> {
    let failover = FailoverBuilder::new()
        .register(Speaker::broken("boom"))
        .register(Speaker::new("woof"))
        .build()?;

    assert_eq!(speak_through(&failover).await?, "woof");
    // The rotation is remembered: the next call starts on the provider that
    // answered, without touching the broken one again.
    assert_eq!(speak_through(&failover).await?, "woof");

    let speakers = speakers(&failover);
    assert_eq!(speakers[0].attempts(), 1);
    assert_eq!(speakers[1].attempts(), 2);
    Ok(())
}

#[tokio::test]
async fn policy_veto_propagates_immediately() -> anyhow::Result<()> {
    let failover = FailoverBuilder::new()
        .register(Speaker::broken("boom"))
        .register(Speaker::new("woof"))
        .retries(5)
        .should_retry_on(|error: &SpeakError| error.from != "boom")
        .build()?;

    let error = speak_through(&failover).await.unwrap_err();
    assert_eq!(error, SpeakError { from: "boom" });

    let speakers = speakers(&failover);
    assert_eq!(speakers[0].attempts(), 1, "a vetoed error consumes no retry budget");
    assert_eq!(speakers[1].attempts(), 0);
    Ok(())
}

#[tokio::test]
async fn all_providers_broken_attempts_are_exactly_one_plus_retries() -> anyhow::Result<()> {
    let failover = FailoverBuilder::new()
        .register(Speaker::broken("boom"))
        .register(Speaker::broken("crash"))
        .retries(4)
        .build()?;

    let error = speak_through(&failover).await.unwrap_err();
    // Five attempts walk boom, crash, boom, crash, boom.
    assert_eq!(error, SpeakError { from: "boom" });

    let speakers = speakers(&failover);
    assert_eq!(speakers[0].attempts(), 3);
    assert_eq!(speakers[1].attempts(), 2);
    Ok(())
}

#[tokio::test]
async fn property_reads_fail_over_like_calls() -> anyhow::Result<()> {
    let failover = FailoverBuilder::new()
        .register(Speaker::broken("boom"))
        .register(Speaker::new("meow"))
        .build()?;

    let sound = failover.read(|speaker| {
        if speaker.broken { Err(SpeakError { from: speaker.sound }) } else { Ok(speaker.sound) }
    })?;
    assert_eq!(sound, "meow");

    // Reads record no latency; both entries keep their zeroed metadata.
    for entry in failover.registry().entries() {
        assert_eq!(failover.registry().latency_of(&entry.id), Some(std::time::Duration::ZERO));
    }
    Ok(())
}

#[tokio::test]
async fn empty_registration_fails_at_construction() {
    let result = FailoverBuilder::<Speaker, SpeakError>::new().build();
    assert!(matches!(result, Err(FailoverError::EmptyRegistry)));
}

/// A thin façade giving downstream code the provider's own interface while
/// every method transparently fails over.
struct SpeakingClient {
    inner: Failover<Speaker, SpeakError>,
}

impl SpeakingClient {
    async fn speak(&self) -> Result<&'static str, SpeakError> {
        self.inner.call(|speaker| async move { speaker.speak().await }).await
    }

    fn sound_name(&self) -> Result<&'static str, SpeakError> {
        self.inner.read(|speaker| Ok(speaker.sound))
    }
}

#[tokio::test]
async fn delegating_facade_hides_the_rotation() -> anyhow::Result<()> {
    let client = SpeakingClient {
        inner: FailoverBuilder::new()
            .register(Speaker::broken("boom"))
            .register(Speaker::new("woof"))
            .build()?,
    };

    assert_eq!(client.speak().await?, "woof");
    assert_eq!(client.sound_name()?, "woof");
    Ok(())
}
