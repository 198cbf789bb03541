//! Per-call context carried from the host into every control-plane call.
//!
//! A [`Context`] is derived for each incoming host RPC. It holds:
//!
//! - the deadline the host attached to the call (`grpc-timeout` metadata), and
//! - the provider-wide stop signal, flipped by the host's `Stop` RPC.
//!
//! Transport calls forward the remaining time as their own gRPC timeout and
//! are abandoned when either the deadline passes or the provider is stopped.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::ProviderError;

/// Metadata key the host uses to send its deadline.
pub const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// The deadline and cancellation scope of one host call.
#[derive(Clone, Debug, Default)]
pub struct Context {
    deadline: Option<Instant>,
    stop: Option<watch::Receiver<bool>>,
}

impl Context {
    /// A context with no deadline that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context from incoming request metadata and the stop signal.
    pub fn from_metadata(
        metadata: &tonic::metadata::MetadataMap,
        stop: watch::Receiver<bool>,
    ) -> Self {
        let ctx = Self::background().with_stop(stop);
        match metadata
            .get(GRPC_TIMEOUT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_grpc_timeout)
        {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }

    /// Narrow the deadline to at most `timeout` from now.
    ///
    /// An existing earlier deadline is kept.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    /// Attach the provider stop signal.
    pub fn with_stop(mut self, stop: watch::Receiver<bool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// The absolute deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Whether the provider has been asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.stop.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Resolves once the provider is asked to stop.
    ///
    /// Never resolves for a context without a stop signal, or when the
    /// signal's sender is dropped without stopping.
    pub async fn cancelled(&self) {
        let Some(stop) = &self.stop else {
            return std::future::pending().await;
        };
        let mut stop = stop.clone();
        loop {
            if *stop.borrow_and_update() {
                return;
            }
            if stop.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }

    /// Drive `fut` to completion unless the deadline passes or the provider
    /// is stopped first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        if self.is_cancelled() {
            return Err(cancelled_error());
        }

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancelled() => Err(cancelled_error()),
            _ = expired => Err(ProviderError::DeadlineExceeded(
                "host deadline elapsed before the control plane answered".to_string(),
            )),
            result = fut => result,
        }
    }
}

fn cancelled_error() -> ProviderError {
    ProviderError::Cancelled("provider is stopping".to_string())
}

/// Parse a `grpc-timeout` header value such as `"30S"` or `"1500m"`.
///
/// The value is at most eight ASCII digits followed by a unit: `H`ours,
/// `M`inutes, `S`econds, `m`illiseconds, `u`microseconds or `n`anoseconds.
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;
    let duration = match unit {
        "H" => Duration::from_secs(amount * 60 * 60),
        "M" => Duration::from_secs(amount * 60),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(duration)
}
