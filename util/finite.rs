use num_traits::Float;
use std::{
	cmp::{Ord, Ordering},
	hash::{Hash, Hasher},
};
use thiserror::Error;

/// A float that is known to be finite, so it can implement `Eq` and `Ord`.
#[derive(Clone, Copy, Debug)]
pub struct Finite<T>(T)
where
	T: Float;

#[derive(Debug, Error)]
#[error("not finite")]
pub struct NotFiniteError;

impl<T> Finite<T>
where
	T: Float,
{
	pub fn new(value: T) -> Result<Self, NotFiniteError> {
		if value.is_finite() {
			Ok(Self(value))
		} else {
			Err(NotFiniteError)
		}
	}

	pub fn get(self) -> T {
		self.0
	}
}

impl<T> std::ops::Deref for Finite<T>
where
	T: Float,
{
	type Target = T;
	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl<T> std::fmt::Display for Finite<T>
where
	T: Float + std::fmt::Display,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl<T> PartialEq for Finite<T>
where
	T: Float,
{
	#[inline]
	fn eq(&self, other: &Self) -> bool {
		self.0.eq(&other.0)
	}
}

impl<T> Eq for Finite<T> where T: Float {}

impl<T> PartialOrd for Finite<T>
where
	T: Float,
{
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		self.0.partial_cmp(&other.0)
	}
}

impl<T> Ord for Finite<T>
where
	T: Float,
{
	fn cmp(&self, other: &Self) -> Ordering {
		self.0.partial_cmp(&other.0).unwrap()
	}
}

impl Hash for Finite<f64> {
	#[inline]
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.to_bits().hash(state);
	}
}

#[test]
fn test_finite() {
	assert!(Finite::new(0.5f64).is_ok());
	assert!(Finite::new(f64::INFINITY).is_err());
	assert!(Finite::new(f64::NAN).is_err());
	let a = Finite::new(0.25f64).unwrap();
	let b = Finite::new(0.75f64).unwrap();
	assert!(a < b);
	assert_eq!(a.get(), 0.25);
}
