//! One-time-use token mint for replay protection.

// std
use std::{
	collections::HashSet,
	sync::{Mutex, PoisonError},
};
// self
use crate::{_prelude::*, token::Secret};

/// Issues opaque one-time tokens and guarantees each is consumable at most
/// once.
///
/// The check-and-remove in [`Mint::consume`] is a single critical section:
/// two concurrent consumes of the same token result in exactly one success,
/// the other observing [`Error::NonceNotValid`].
pub struct Mint {
	active: Mutex<HashSet<Secret>>,
}
impl Mint {
	/// Create a mint with no outstanding tokens.
	pub fn new() -> Self {
		Self { active: Mutex::new(HashSet::new()) }
	}

	/// Issue a fresh token and record it as active.
	pub fn create(&self) -> Secret {
		let token = Secret::random();
		let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);

		active.insert(token.clone());

		token
	}

	/// Consume a previously issued token, removing it from the active set.
	///
	/// Fails with [`Error::NonceNotValid`] when the token was never issued or
	/// has already been consumed.
	pub fn consume(&self, proposal: &Secret) -> Result<()> {
		let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);

		if active.remove(proposal) { Ok(()) } else { Err(Error::NonceNotValid) }
	}
}
impl Default for Mint {
	fn default() -> Self {
		Self::new()
	}
}
