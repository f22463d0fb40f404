// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types shared by Capital model factories.
//!
//! This crate provides:
//! - [`ArgumentBag`] and [`ControlArgs`]: the key/value inputs of a factory
//! - [`InterfaceMode`]: whether a factory serves a web page or an API
//! - [`Validator`]: the contract for checking arguments against a [`RuleSet`]
//! - [`RuleValidator`]: a validator for pipe-separated declarative rules
//! - [`ErrorBag`] and [`ValidationError`]: field-keyed validation messages

pub mod args;
pub mod error;
pub mod errors;
pub mod interface;
pub mod rules;
pub mod validation;

pub use args::{ActionMode, ArgumentBag, ControlArgs, ACTION_KEY, ID_KEY};
pub use error::{FactoryError, Result};
pub use errors::ErrorBag;
pub use interface::InterfaceMode;
pub use rules::{Rule, RuleSet, RuleValidator};
pub use validation::{MessageMap, ValidationError, ValidationOutcome, Validator};
