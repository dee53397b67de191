use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

/// A counter that can be cloned into a progress callback while the owner keeps incrementing it.
#[derive(Clone, Debug)]
pub struct ProgressCounter {
	current: Arc<AtomicU64>,
	total: u64,
}

impl ProgressCounter {
	pub fn new(total: u64) -> Self {
		Self {
			current: Arc::new(AtomicU64::new(0)),
			total,
		}
	}
	pub fn total(&self) -> u64 {
		self.total
	}
	pub fn get(&self) -> u64 {
		self.current.load(Ordering::Relaxed)
	}
	pub fn inc(&self, amount: u64) {
		self.current.fetch_add(amount, Ordering::Relaxed);
	}
}

#[test]
fn test_progress_counter() {
	let counter = ProgressCounter::new(10);
	let clone = counter.clone();
	counter.inc(3);
	assert_eq!(clone.get(), 3);
	assert_eq!(clone.total(), 10);
}
