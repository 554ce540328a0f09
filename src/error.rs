//! The error types that stop a run, or stop a single operation.
//!
//! Conditions that can be recovered from locally are not errors in this sense. They are logged
//! through the [`report`](crate::report) module and processing continues.

use thiserror::Error;

/// Construction-order bugs. These should not be caught routinely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    #[error("duplicate {kind} name `{name}`")]
    DuplicateName { kind: &'static str, name: String },
    #[error("cannot register {kind} `{name}` because the {kind} registry is sealed")]
    Sealed { kind: &'static str, name: String },
}

/// A piece of structure that the document or a coefficient table is required to have is absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("{at}missing required field `{key}`")]
    MissingField { at: String, key: String },
    #[error("{at}field `{key}` is a block, expected a value")]
    NotALeaf { at: String, key: String },
    #[error("{at}field `{key}` is a value, expected a block")]
    NotABlock { at: String, key: String },
    #[error("title `{title}` has liege `{liege}`, which is not a known title")]
    MissingTitle { title: String, liege: String },
    #[error("settlement `{settlement}` has type `{kind}`, which is not in the settlement type table")]
    MissingSettlementType { settlement: String, kind: String },
}

/// Everything that can abort a conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Invariant(#[from] InvariantError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}
