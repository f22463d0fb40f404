// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Validate-then-execute orchestration with success/failure dispatch.

use std::fmt;
use std::sync::Arc;

use capital_factory_core::{
	ArgumentBag, ControlArgs, ErrorBag, FactoryError, InterfaceMode, Result, ValidationError,
	Validator,
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::callback::CallbackHandler;
use crate::config::FactoryConfig;
use crate::job::{FactoryJob, JobData};

/// Handler dispatched with the resolved factory when the job succeeds.
pub type SuccessHandler<J, R> = CallbackHandler<FactoryContext<J>, R>;

/// Handler dispatched with the resolved factory and the reason it failed.
pub type FailureHandler<J, R> =
	CallbackHandler<(FactoryContext<J>, FailureCause<<J as FactoryJob>::Error>), R>;

/// Why a factory took its failure branch. Exactly one cause per run.
#[derive(Debug)]
pub enum FailureCause<E> {
	/// Arguments did not pass validation; the action never ran.
	Validation(ValidationError),
	/// The action returned this error.
	Action(E),
}

impl<E> FailureCause<E> {
	pub fn is_validation(&self) -> bool {
		matches!(self, FailureCause::Validation(_))
	}

	pub fn is_action(&self) -> bool {
		matches!(self, FailureCause::Action(_))
	}

	pub fn validation_errors(&self) -> Option<&ErrorBag> {
		match self {
			FailureCause::Validation(err) => Some(err.errors()),
			FailureCause::Action(_) => None,
		}
	}

	pub fn action_error(&self) -> Option<&E> {
		match self {
			FailureCause::Action(err) => Some(err),
			FailureCause::Validation(_) => None,
		}
	}

	pub fn into_action_error(self) -> Option<E> {
		match self {
			FailureCause::Action(err) => Some(err),
			FailureCause::Validation(_) => None,
		}
	}
}

impl<E: fmt::Display> fmt::Display for FailureCause<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FailureCause::Validation(err) => err.fmt(f),
			FailureCause::Action(err) => write!(f, "action failed: {err}"),
		}
	}
}

/// How a factory run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	Succeeded,
	ValidationFailed,
	ActionFailed,
}

impl Outcome {
	pub fn as_str(&self) -> &'static str {
		match self {
			Outcome::Succeeded => "success",
			Outcome::ValidationFailed => "validation_failed",
			Outcome::ActionFailed => "action_failed",
		}
	}
}

/// Lifecycle of a factory. `Pending` until [`ModelFactory::run`] resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
	Pending,
	Resolved(Outcome),
}

/// Everything a factory holds except its handlers.
///
/// This is what handlers receive as the factory: after a run it carries the
/// job, the model as the job left it, the arguments and the last validation
/// errors.
pub struct FactoryContext<J: FactoryJob> {
	job: J,
	data: JobData<J::Model>,
	validator: Arc<dyn Validator>,
	validate: bool,
	errors: Option<ErrorBag>,
	state: RunState,
}

impl<J: FactoryJob> FactoryContext<J> {
	fn new(job: J, validator: Arc<dyn Validator>) -> Self {
		Self {
			job,
			data: JobData::default(),
			validator,
			validate: true,
			errors: None,
			state: RunState::Pending,
		}
	}

	pub fn job(&self) -> &J {
		&self.job
	}

	pub fn job_mut(&mut self) -> &mut J {
		&mut self.job
	}

	pub fn into_job(self) -> J {
		self.job
	}

	pub fn interface(&self) -> InterfaceMode {
		self.data.interface
	}

	pub fn model(&self) -> Option<&J::Model> {
		self.data.model()
	}

	pub fn model_mut(&mut self) -> Option<&mut J::Model> {
		self.data.model_mut()
	}

	pub fn take_model(&mut self) -> Option<J::Model> {
		self.data.take_model()
	}

	pub fn args(&self) -> &ArgumentBag {
		&self.data.args
	}

	pub fn additional_args(&self) -> &ControlArgs {
		&self.data.additional_args
	}

	pub fn data(&self) -> &JobData<J::Model> {
		&self.data
	}

	pub fn validation_enabled(&self) -> bool {
		self.validate
	}

	pub fn state(&self) -> RunState {
		self.state
	}

	/// Check the primary arguments against the job's rules and messages.
	///
	/// Replaces any errors stored by an earlier call. Returns whether the
	/// arguments passed.
	#[instrument(skip(self), fields(args = self.data.args.len()))]
	pub fn validate(&mut self) -> bool {
		let rules = self.job.rules();
		let messages = self.job.messages();
		let outcome = self.validator.check(&self.data.args, &rules, &messages);
		let passed = outcome.passed();

		if !passed {
			debug!(
				failed_fields = outcome.errors().len(),
				fields = ?outcome.errors().keys().collect::<Vec<_>>(),
				"validation failed"
			);
		}

		self.errors = Some(outcome.into_errors());
		passed
	}

	/// Errors from the last [`validate`](Self::validate) call. `None` if
	/// validation never ran; empty if it passed.
	pub fn errors(&self) -> Option<&ErrorBag> {
		self.errors.as_ref()
	}

	/// Whether the last validation produced no errors. `true` when
	/// validation has not run yet.
	pub fn is_valid(&self) -> bool {
		self.errors.as_ref().map_or(true, ErrorBag::is_empty)
	}

	fn perform(&mut self) -> std::result::Result<(), J::Error> {
		self.job.the_job(&mut self.data)
	}
}

impl<J> fmt::Debug for FactoryContext<J>
where
	J: FactoryJob + fmt::Debug,
	J::Model: fmt::Debug,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FactoryContext")
			.field("job", &self.job)
			.field("data", &self.data)
			.field("validate", &self.validate)
			.field("errors", &self.errors)
			.field("state", &self.state)
			.finish_non_exhaustive()
	}
}

/// Runs a [`FactoryJob`]: validate, act, then dispatch one handler.
///
/// Configured with a consuming builder and resolved once by [`run`](Self::run):
///
/// ```ignore
/// let response = ModelFactory::new(CreateUser::default(), validator)
///     .set_args(request_args)
///     .add_arg("role", "member")
///     .set_success_handler(CallbackHandler::new(|factory| redirect(factory)))
///     .set_failure_handler(CallbackHandler::new(|(factory, cause)| render(factory, cause)))
///     .run()?;
/// ```
pub struct ModelFactory<J: FactoryJob, R> {
	context: FactoryContext<J>,
	success_handler: Option<SuccessHandler<J, R>>,
	failure_handler: Option<FailureHandler<J, R>>,
}

impl<J: FactoryJob, R> ModelFactory<J, R> {
	pub fn new(job: J, validator: Arc<dyn Validator>) -> Self {
		Self {
			context: FactoryContext::new(job, validator),
			success_handler: None,
			failure_handler: None,
		}
	}

	/// Like [`new`](Self::new), taking interface and validation defaults from
	/// `config`.
	pub fn from_config(job: J, validator: Arc<dyn Validator>, config: &FactoryConfig) -> Self {
		let mut factory = Self::new(job, validator).set_interface(config.interface);
		factory.context.validate = config.validate;
		factory
	}

	pub fn set_interface(mut self, interface: InterfaceMode) -> Self {
		self.context.data.interface = interface;
		self
	}

	/// Supply an existing model instead of letting the job create one.
	pub fn set_model(mut self, model: J::Model) -> Self {
		self.context.data.set_model(model);
		self
	}

	/// Union `args` into the primary arguments. Keys already present win.
	pub fn set_args<I, K>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = (K, Value)>,
		K: Into<String>,
	{
		self.context.data.args.union(args);
		debug!(args = self.context.data.args.len(), "set factory args");
		self
	}

	/// Set one primary argument, overwriting any existing value.
	pub fn add_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		let key = key.into();
		debug!(key = %key, "add factory arg");
		self.context.data.args.put(key, value);
		self
	}

	/// Merge `args` into the control arguments. Incoming keys win.
	pub fn set_additional_args<I, K>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = (K, Value)>,
		K: Into<String>,
	{
		self.context.data.additional_args.merge(args);
		self
	}

	/// Set one control argument, overwriting any existing value.
	pub fn add_additional_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.context.data.additional_args.put(key, value);
		self
	}

	pub fn set_success_handler(mut self, handler: SuccessHandler<J, R>) -> Self {
		self.success_handler = Some(handler);
		self
	}

	pub fn set_failure_handler(mut self, handler: FailureHandler<J, R>) -> Self {
		self.failure_handler = Some(handler);
		self
	}

	pub fn disable_validation(mut self) -> Self {
		self.context.validate = false;
		self
	}

	pub fn success_handler(&self) -> Option<&SuccessHandler<J, R>> {
		self.success_handler.as_ref()
	}

	pub fn failure_handler(&self) -> Option<&FailureHandler<J, R>> {
		self.failure_handler.as_ref()
	}

	pub fn context(&self) -> &FactoryContext<J> {
		&self.context
	}

	pub fn context_mut(&mut self) -> &mut FactoryContext<J> {
		&mut self.context
	}

	pub fn job(&self) -> &J {
		self.context.job()
	}

	pub fn interface(&self) -> InterfaceMode {
		self.context.interface()
	}

	pub fn model(&self) -> Option<&J::Model> {
		self.context.model()
	}

	pub fn model_mut(&mut self) -> Option<&mut J::Model> {
		self.context.model_mut()
	}

	pub fn args(&self) -> &ArgumentBag {
		self.context.args()
	}

	pub fn additional_args(&self) -> &ControlArgs {
		self.context.additional_args()
	}

	pub fn validation_enabled(&self) -> bool {
		self.context.validation_enabled()
	}

	pub fn validate(&mut self) -> bool {
		self.context.validate()
	}

	pub fn errors(&self) -> Option<&ErrorBag> {
		self.context.errors()
	}

	pub fn is_valid(&self) -> bool {
		self.context.is_valid()
	}

	/// Validate, run the job and dispatch the matching handler.
	///
	/// Returns the dispatched handler's result. `Err` is reserved for
	/// misconfiguration: a missing handler or a handler without a target.
	/// Validation failures and job errors reach the failure handler instead.
	#[instrument(
		skip_all,
		fields(job = std::any::type_name::<J>(), interface = %self.context.interface())
	)]
	pub fn run(self) -> Result<R> {
		let Self {
			mut context,
			success_handler,
			failure_handler,
		} = self;

		let mut success = success_handler.ok_or_else(|| {
			warn!("factory run without a success handler");
			FactoryError::MissingSuccessHandler
		})?;
		let mut failure = failure_handler.ok_or_else(|| {
			warn!("factory run without a failure handler");
			FactoryError::MissingFailureHandler
		})?;
		if !success.has_target() || !failure.has_target() {
			warn!(
				success_target = success.has_target(),
				failure_target = failure.has_target(),
				"factory handler has no target"
			);
			return Err(FactoryError::MissingTarget);
		}

		if context.validate && !context.validate() {
			let errors = context.errors.clone().unwrap_or_default();
			context.state = RunState::Resolved(Outcome::ValidationFailed);
			info!(
				outcome = Outcome::ValidationFailed.as_str(),
				failed_fields = errors.len(),
				"factory resolved"
			);
			let cause = FailureCause::Validation(ValidationError::new(errors));
			return failure.bind_arguments((context, cause)).handle();
		}

		match context.perform() {
			Ok(()) => {
				context.state = RunState::Resolved(Outcome::Succeeded);
				info!(outcome = Outcome::Succeeded.as_str(), "factory resolved");
				success.bind_arguments(context).handle()
			}
			Err(error) => {
				context.state = RunState::Resolved(Outcome::ActionFailed);
				warn!(error = %error, "factory job failed");
				info!(outcome = Outcome::ActionFailed.as_str(), "factory resolved");
				failure
					.bind_arguments((context, FailureCause::Action(error)))
					.handle()
			}
		}
	}
}

impl<J, R> fmt::Debug for ModelFactory<J, R>
where
	J: FactoryJob + fmt::Debug,
	J::Model: fmt::Debug,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModelFactory")
			.field("context", &self.context)
			.field("success_handler", &self.success_handler)
			.field("failure_handler", &self.failure_handler)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use capital_factory_core::{MessageMap, Rule, RuleSet, RuleValidator, ValidationOutcome};
	use proptest::prelude::*;
	use serde_json::json;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Debug, Default)]
	struct Profile {
		name: String,
	}

	#[derive(Debug, Default)]
	struct SaveProfile {
		require_name: bool,
		fail_with: Option<String>,
		calls: usize,
	}

	impl FactoryJob for SaveProfile {
		type Model = Profile;
		type Error = String;

		fn rules(&self) -> RuleSet {
			if self.require_name {
				RuleSet::new().field("name", [Rule::Required])
			} else {
				RuleSet::new()
			}
		}

		fn the_job(&mut self, data: &mut JobData<Profile>) -> std::result::Result<(), String> {
			self.calls += 1;
			if let Some(err) = &self.fail_with {
				return Err(err.clone());
			}
			let name = data
				.args()
				.get("name")
				.and_then(Value::as_str)
				.unwrap_or_default()
				.to_string();
			data.model_or_insert_with(Profile::default).name = name;
			Ok(())
		}
	}

	fn factory(job: SaveProfile) -> ModelFactory<SaveProfile, &'static str> {
		ModelFactory::new(job, Arc::new(RuleValidator))
			.set_success_handler(CallbackHandler::new(|_| "success"))
			.set_failure_handler(CallbackHandler::new(|_| "failure"))
	}

	#[test]
	fn new_factory_defaults() {
		let factory = factory(SaveProfile::default());
		assert_eq!(factory.interface(), InterfaceMode::Web);
		assert!(factory.validation_enabled());
		assert!(factory.args().is_empty());
		assert_eq!(factory.additional_args().get("action"), Some(&json!("new")));
		assert!(factory.model().is_none());
		assert_eq!(factory.context().state(), RunState::Pending);
	}

	#[test]
	fn is_valid_before_validation_is_true() {
		let factory = factory(SaveProfile::default());
		assert!(factory.errors().is_none());
		assert!(factory.is_valid());
	}

	#[test]
	fn validate_stores_and_replaces_errors() {
		let mut factory = factory(SaveProfile {
			require_name: true,
			..Default::default()
		});

		assert!(!factory.validate());
		assert!(!factory.is_valid());
		assert!(factory.errors().unwrap().has("name"));

		factory = factory.add_arg("name", "Ada");
		assert!(factory.validate());
		assert!(factory.is_valid());
		assert!(factory.errors().unwrap().is_empty());
	}

	#[test]
	fn set_args_keeps_existing_keys_and_add_arg_overwrites() {
		let factory = factory(SaveProfile::default())
			.set_args([("name", json!("first"))])
			.set_args([("name", json!("second")), ("email", json!("a@b.c"))]);
		assert_eq!(factory.args().get("name"), Some(&json!("first")));
		assert_eq!(factory.args().get("email"), Some(&json!("a@b.c")));

		let factory = factory.add_arg("name", "third");
		assert_eq!(factory.args().get("name"), Some(&json!("third")));
	}

	#[test]
	fn additional_args_merge_and_overwrite() {
		let factory = factory(SaveProfile::default())
			.set_additional_args([("action", json!("edit")), ("id", json!(7))])
			.add_additional_arg("id", 8);
		assert!(factory.additional_args().is_edit());
		assert_eq!(factory.additional_args().id(), Some(&json!(8)));
	}

	#[test]
	fn from_config_applies_defaults() {
		let config = FactoryConfig {
			interface: InterfaceMode::Api,
			validate: false,
		};
		let factory: ModelFactory<SaveProfile, ()> =
			ModelFactory::from_config(SaveProfile::default(), Arc::new(RuleValidator), &config);
		assert_eq!(factory.interface(), InterfaceMode::Api);
		assert!(!factory.validation_enabled());
	}

	#[test]
	fn set_model_is_passed_to_job() {
		let result = factory(SaveProfile::default())
			.set_model(Profile {
				name: "old".to_string(),
			})
			.add_arg("name", "new")
			.set_success_handler(CallbackHandler::new(|ctx: FactoryContext<SaveProfile>| {
				assert_eq!(ctx.model().unwrap().name, "new");
				"updated"
			}))
			.run()
			.unwrap();
		assert_eq!(result, "updated");
	}

	#[test]
	fn run_requires_both_handlers() {
		let bare: ModelFactory<SaveProfile, ()> =
			ModelFactory::new(SaveProfile::default(), Arc::new(RuleValidator));
		assert_eq!(bare.run().unwrap_err(), FactoryError::MissingSuccessHandler);

		let only_success: ModelFactory<SaveProfile, ()> =
			ModelFactory::new(SaveProfile::default(), Arc::new(RuleValidator))
				.set_success_handler(CallbackHandler::new(|_| ()));
		assert_eq!(only_success.run().unwrap_err(), FactoryError::MissingFailureHandler);
	}

	#[test]
	fn run_rejects_handler_without_target_before_acting() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let validator = move |_: &ArgumentBag, _: &RuleSet, _: &MessageMap| {
			counter.fetch_add(1, Ordering::SeqCst);
			ValidationOutcome::passed_outcome()
		};

		let result = ModelFactory::new(SaveProfile::default(), Arc::new(validator))
			.set_success_handler(CallbackHandler::empty())
			.set_failure_handler(CallbackHandler::new(|_| ()))
			.run();

		assert_eq!(result.unwrap_err(), FactoryError::MissingTarget);
		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn run_records_resolved_state() {
		let state = factory(SaveProfile::default())
			.set_success_handler(CallbackHandler::new(|ctx: FactoryContext<SaveProfile>| {
				match ctx.state() {
					RunState::Resolved(Outcome::Succeeded) => "success",
					_ => "unexpected",
				}
			}))
			.run()
			.unwrap();
		assert_eq!(state, "success");
	}

	#[test]
	fn failure_cause_accessors() {
		let mut errors = ErrorBag::new();
		errors.add("name", "required");
		let validation: FailureCause<String> =
			FailureCause::Validation(ValidationError::new(errors));
		assert!(validation.is_validation());
		assert!(validation.validation_errors().unwrap().has("name"));
		assert!(validation.action_error().is_none());

		let action: FailureCause<String> = FailureCause::Action("db down".to_string());
		assert!(action.is_action());
		assert_eq!(action.to_string(), "action failed: db down");
		assert_eq!(action.into_action_error(), Some("db down".to_string()));
	}

	proptest! {
		/// The job runs exactly once per run, whatever the arguments.
		#[test]
		fn job_runs_once_without_rules(
			args in prop::collection::btree_map("[a-z]{1,6}", "[a-z]{0,6}", 0..8),
		) {
			let result = factory(SaveProfile::default())
				.set_args(args.into_iter().map(|(k, v)| (k, json!(v))))
				.set_success_handler(CallbackHandler::new(|ctx: FactoryContext<SaveProfile>| {
					if ctx.job().calls == 1 { "success" } else { "wrong call count" }
				}))
				.run()
				.unwrap();
			prop_assert_eq!(result, "success");
		}
	}
}
