//! Proactive renewal timer that fires shortly before the cached credential expires.

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::task::JoinHandle;
// self
use crate::_prelude::*;

/// Seconds shaved off the advertised lifetime so the timer fires before expiry.
pub const RENEWAL_MARGIN_SECS: i64 = 60;
/// Floor applied to the computed delay so very short lifetimes still get one tick.
pub const MIN_RENEWAL_DELAY_SECS: i64 = 5;
/// Re-arm window used after a successful timer-driven renewal.
///
/// The renewed grant's actual lifetime is not re-read at that point; the timer falls
/// back to this fixed window instead.
pub const RENEWAL_FALLBACK_SECS: i64 = 900;

/// Computes the one-shot delay for a token valid for `expires_in` seconds.
pub fn renewal_delay(expires_in: i64) -> StdDuration {
	let secs = (expires_in - RENEWAL_MARGIN_SECS).max(MIN_RENEWAL_DELAY_SECS);

	StdDuration::from_secs(secs as u64)
}

/// One-shot background timer owning at most one pending renewal task.
///
/// Arming cancels any previously armed task, so duplicate future renewals cannot
/// stack up; disarming on sign-out and teardown keeps a timer from outliving its
/// owner.
#[derive(Debug, Default)]
pub struct RenewalTimer {
	handle: Mutex<Option<JoinHandle<()>>>,
	armed_for: Mutex<Option<StdDuration>>,
}
impl RenewalTimer {
	/// Arms the timer: after `delay`, `task` is built and awaited on a background task.
	///
	/// Must be called from within a tokio runtime.
	pub fn arm<F, Fut>(&self, delay: StdDuration, task: F)
	where
		F: 'static + Send + FnOnce() -> Fut,
		Fut: 'static + Send + Future<Output = ()>,
	{
		self.disarm();

		let handle = tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			task().await;
		});

		*self.handle.lock() = Some(handle);
		*self.armed_for.lock() = Some(delay);
	}

	/// Cancels the pending task, if any. An aborted task performs zero work when its
	/// original fire time arrives.
	pub fn disarm(&self) {
		if let Some(handle) = self.handle.lock().take() {
			handle.abort();
		}

		*self.armed_for.lock() = None;
	}

	/// Returns `true` while a renewal task is pending.
	pub fn is_armed(&self) -> bool {
		self.handle.lock().as_ref().is_some_and(|handle| !handle.is_finished())
	}

	/// Delay the timer was last armed with, while it remains armed.
	pub fn armed_for(&self) -> Option<StdDuration> {
		*self.armed_for.lock()
	}
}
impl Drop for RenewalTimer {
	fn drop(&mut self) {
		self.disarm();
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;

	#[test]
	fn delay_applies_margin_and_floor() {
		assert_eq!(renewal_delay(900), StdDuration::from_secs(840));
		assert_eq!(renewal_delay(3_600), StdDuration::from_secs(3_540));
		assert_eq!(renewal_delay(30), StdDuration::from_secs(5));
		assert_eq!(renewal_delay(-10), StdDuration::from_secs(5));
	}

	#[tokio::test(start_paused = true)]
	async fn armed_timer_fires_once() {
		let timer = RenewalTimer::default();
		let fired = Arc::new(AtomicUsize::new(0));
		let counter = fired.clone();

		timer.arm(StdDuration::from_secs(5), move || async move {
			counter.fetch_add(1, Ordering::SeqCst);
		});

		assert!(timer.is_armed());
		assert_eq!(timer.armed_for(), Some(StdDuration::from_secs(5)));

		tokio::time::sleep(StdDuration::from_secs(10)).await;

		assert_eq!(fired.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn disarmed_timer_never_mutates_anything() {
		let timer = RenewalTimer::default();
		let fired = Arc::new(AtomicUsize::new(0));
		let counter = fired.clone();

		timer.arm(StdDuration::from_secs(5), move || async move {
			counter.fetch_add(1, Ordering::SeqCst);
		});
		timer.disarm();

		assert!(!timer.is_armed());
		assert!(timer.armed_for().is_none());

		tokio::time::sleep(StdDuration::from_secs(10)).await;

		assert_eq!(fired.load(Ordering::SeqCst), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn rearming_cancels_the_previous_timer() {
		let timer = RenewalTimer::default();
		let fired = Arc::new(AtomicUsize::new(0));
		let first = fired.clone();
		let second = fired.clone();

		timer.arm(StdDuration::from_secs(5), move || async move {
			first.fetch_add(10, Ordering::SeqCst);
		});
		timer.arm(StdDuration::from_secs(7), move || async move {
			second.fetch_add(1, Ordering::SeqCst);
		});

		tokio::time::sleep(StdDuration::from_secs(20)).await;

		assert_eq!(fired.load(Ordering::SeqCst), 1);
	}
}
