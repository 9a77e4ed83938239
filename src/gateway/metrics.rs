//! Counters for the session lifecycle events a gateway drives.

// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for the session lifecycle events a gateway drives.
#[derive(Debug, Default)]
pub struct SessionMetrics {
	refresh_attempts: AtomicU64,
	refresh_successes: AtomicU64,
	refresh_failures: AtomicU64,
	rotations: AtomicU64,
	session_resets: AtomicU64,
}
impl SessionMetrics {
	/// Returns the total number of refresh exchanges started.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh exchanges that produced a new session (including
	/// coalesced waiters that reused a peer's result).
	pub fn refresh_successes(&self) -> u64 {
		self.refresh_successes.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh exchanges that failed.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of silent access-token rotations applied from response headers.
	pub fn rotations(&self) -> u64 {
		self.rotations.load(Ordering::Relaxed)
	}

	/// Returns the number of forced session resets (corrupt snapshots and terminal
	/// authentication failures); voluntary logout is not counted.
	pub fn session_resets(&self) -> u64 {
		self.session_resets.load(Ordering::Relaxed)
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_success(&self) {
		self.refresh_successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rotation(&self) {
		self.rotations.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_session_reset(&self) {
		self.session_resets.fetch_add(1, Ordering::Relaxed);
	}
}
