// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Create-or-update model factories.
//!
//! A [`ModelFactory`] collects arguments, validates them against the rules of
//! its [`FactoryJob`], runs the job, and dispatches exactly one of two
//! [`CallbackHandler`]s: the success handler with the resolved factory, or the
//! failure handler with the factory and a [`FailureCause`].

pub mod callback;
pub mod config;
pub mod factory;
pub mod job;

pub use callback::CallbackHandler;
pub use config::{ConfigError, FactoryConfig, INTERFACE_ENV, VALIDATE_ENV};
pub use factory::{
	FactoryContext, FailureCause, FailureHandler, ModelFactory, Outcome, RunState, SuccessHandler,
};
pub use job::{FactoryJob, JobData};

// Re-export core types so factories only need this crate
pub use capital_factory_core::{
	ActionMode, ArgumentBag, ControlArgs, ErrorBag, FactoryError, InterfaceMode, MessageMap, Result,
	Rule, RuleSet, RuleValidator, ValidationError, ValidationOutcome, Validator,
};
