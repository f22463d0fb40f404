// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deferred invocation of a callback with arguments bound just before dispatch.

use std::fmt;

use capital_factory_core::{FactoryError, Result};
use tracing::debug;

type Target<A, R> = Box<dyn FnMut(A) -> R + Send>;

/// Holds a target callable and the arguments it will receive when handled.
///
/// Arguments are bound at dispatch time, not at construction. Each bind
/// replaces the previous one and each [`handle`](Self::handle) consumes the
/// bound arguments, so one bind fires at most once.
pub struct CallbackHandler<A, R> {
	target: Option<Target<A, R>>,
	arguments: Option<A>,
}

impl<A, R> CallbackHandler<A, R> {
	pub fn new<F>(target: F) -> Self
	where
		F: FnMut(A) -> R + Send + 'static,
	{
		Self {
			target: Some(Box::new(target)),
			arguments: None,
		}
	}

	/// A handler with no target. Dispatching it fails until one is set.
	pub fn empty() -> Self {
		Self {
			target: None,
			arguments: None,
		}
	}

	pub fn set_target<F>(&mut self, target: F) -> &mut Self
	where
		F: FnMut(A) -> R + Send + 'static,
	{
		self.target = Some(Box::new(target));
		self
	}

	pub fn has_target(&self) -> bool {
		self.target.is_some()
	}

	pub fn has_arguments(&self) -> bool {
		self.arguments.is_some()
	}

	pub fn arguments(&self) -> Option<&A> {
		self.arguments.as_ref()
	}

	/// Bind the arguments for the next dispatch, replacing any bound before.
	pub fn bind_arguments(&mut self, arguments: A) -> &mut Self {
		self.arguments = Some(arguments);
		self
	}

	/// Drop the bound arguments without dispatching, returning them.
	pub fn unbind_arguments(&mut self) -> Option<A> {
		self.arguments.take()
	}

	/// Invoke the target with the bound arguments and return its result.
	pub fn handle(&mut self) -> Result<R> {
		let target = self.target.as_mut().ok_or(FactoryError::MissingTarget)?;
		let arguments = self
			.arguments
			.take()
			.ok_or(FactoryError::ArgumentsNotBound)?;

		debug!("dispatching callback handler");
		Ok(target(arguments))
	}
}

impl<A, R> Default for CallbackHandler<A, R> {
	fn default() -> Self {
		Self::empty()
	}
}

impl<A, R> fmt::Debug for CallbackHandler<A, R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CallbackHandler")
			.field("has_target", &self.has_target())
			.field("has_arguments", &self.has_arguments())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;

	#[test]
	fn handle_passes_bound_arguments_to_target() {
		let mut handler = CallbackHandler::new(|(a, b): (i32, &'static str)| format!("{a}-{b}"));
		let result = handler.bind_arguments((7, "seven")).handle().unwrap();
		assert_eq!(result, "7-seven");
	}

	#[test]
	fn rebinding_replaces_previous_arguments() {
		let mut handler = CallbackHandler::new(|n: u32| n * 2);
		handler.bind_arguments(1);
		handler.bind_arguments(21);
		assert_eq!(handler.arguments(), Some(&21));
		assert_eq!(handler.handle().unwrap(), 42);
	}

	#[test]
	fn handle_fires_once_per_bind() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let mut handler = CallbackHandler::new(move |_: ()| {
			counter.fetch_add(1, Ordering::SeqCst);
		});

		handler.bind_arguments(()).handle().unwrap();
		assert!(!handler.has_arguments());
		assert_eq!(handler.handle(), Err(FactoryError::ArgumentsNotBound));
		assert_eq!(calls.load(Ordering::SeqCst), 1);

		handler.bind_arguments(()).handle().unwrap();
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn handle_without_target_fails() {
		let mut handler: CallbackHandler<u8, u8> = CallbackHandler::empty();
		handler.bind_arguments(1);

		assert_eq!(handler.handle(), Err(FactoryError::MissingTarget));
		// Arguments stay bound so a target can still be attached.
		assert!(handler.has_arguments());

		handler.set_target(|n| n + 1);
		assert_eq!(handler.handle(), Ok(2));
	}

	#[test]
	fn unbind_returns_arguments() {
		let mut handler = CallbackHandler::new(|s: String| s.len());
		handler.bind_arguments("abc".to_string());
		assert_eq!(handler.unbind_arguments(), Some("abc".to_string()));
		assert_eq!(handler.handle(), Err(FactoryError::ArgumentsNotBound));
	}

	#[test]
	fn debug_reports_state_only() {
		let mut handler = CallbackHandler::new(|n: i32| n);
		handler.bind_arguments(5);
		assert_eq!(
			format!("{:?}", handler),
			"CallbackHandler { has_target: true, has_arguments: true }"
		);
	}
}
