// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use capital_factory_core::{
	ActionMode, ArgumentBag, ControlArgs, InterfaceMode, MessageMap, Result, RuleSet,
};

/// A concrete create-or-update job run by a [`ModelFactory`](crate::ModelFactory).
///
/// `rules` and `messages` feed validation and default to empty, which always
/// passes. `the_job` performs the create or update; returning `Err` routes
/// the error, unchanged, to the failure handler.
pub trait FactoryJob {
	/// Opaque model handle the job creates or updates.
	type Model;
	/// Error raised by the action.
	type Error: fmt::Display + fmt::Debug;

	fn rules(&self) -> RuleSet {
		RuleSet::new()
	}

	fn messages(&self) -> MessageMap {
		MessageMap::new()
	}

	fn the_job(&mut self, data: &mut JobData<Self::Model>) -> std::result::Result<(), Self::Error>;
}

/// Inputs and model handle available to a running job.
///
/// Argument bags are read-only here; only the model may change while the job
/// runs.
#[derive(Debug, Clone)]
pub struct JobData<M> {
	pub(crate) interface: InterfaceMode,
	pub(crate) model: Option<M>,
	pub(crate) args: ArgumentBag,
	pub(crate) additional_args: ControlArgs,
}

impl<M> Default for JobData<M> {
	fn default() -> Self {
		Self {
			interface: InterfaceMode::default(),
			model: None,
			args: ArgumentBag::new(),
			additional_args: ControlArgs::new(),
		}
	}
}

impl<M> JobData<M> {
	pub fn interface(&self) -> InterfaceMode {
		self.interface
	}

	pub fn args(&self) -> &ArgumentBag {
		&self.args
	}

	pub fn additional_args(&self) -> &ControlArgs {
		&self.additional_args
	}

	/// Shorthand for the `action` control argument.
	pub fn action(&self) -> Result<ActionMode> {
		self.additional_args.action()
	}

	pub fn model(&self) -> Option<&M> {
		self.model.as_ref()
	}

	pub fn model_mut(&mut self) -> Option<&mut M> {
		self.model.as_mut()
	}

	pub fn set_model(&mut self, model: M) {
		self.model = Some(model);
	}

	pub fn take_model(&mut self) -> Option<M> {
		self.model.take()
	}

	/// The current model, created with `init` if none was supplied.
	pub fn model_or_insert_with(&mut self, init: impl FnOnce() -> M) -> &mut M {
		self.model.get_or_insert_with(init)
	}
}
