// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
#![allow(clippy::pattern_type_mismatch)]

use crate::lexer::Span;
use crate::phase::ProcessingPhase;

use core::fmt;

use serde::Serialize;

/// Broad classification of build failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ErrorKind {
    ArgumentSyntax,
    Structure,
    SubstatementIndexing,
    Inference,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("invalid argument '{argument}' of '{keyword}': {reason}")]
    InvalidArgument {
        keyword: String,
        argument: String,
        reason: String,
    },

    #[error("'{keyword}' requires an argument")]
    MissingArgument { keyword: String },

    #[error("'{keyword}' does not take an argument")]
    UnexpectedArgument { keyword: String },

    #[error("unknown statement '{keyword}'")]
    UnknownStatement { keyword: String },

    #[error("'{keyword}' is not allowed in '{parent}'")]
    UnexpectedSubstatement { keyword: String, parent: String },

    #[error("'{parent}' requires at least {min} '{keyword}'")]
    MissingSubstatement {
        keyword: String,
        parent: String,
        min: u32,
    },

    #[error("'{keyword}' may appear at most {max} time(s) in '{parent}'")]
    TooManySubstatements {
        keyword: String,
        parent: String,
        max: u32,
    },

    #[error("{namespace} '{name}' is already defined")]
    DuplicateDefinition { namespace: String, name: String },

    #[error("source '{source_id}' is defined more than once")]
    DuplicateSource { source_id: String },

    #[error("'{keyword}' cannot be copied into a new location")]
    IllegalCopy { keyword: String },

    #[error("grouping '{grouping}' is used recursively")]
    GroupingCycle { grouping: String },

    #[error("'{keyword}' '{target}' cannot be the target of augment")]
    InvalidAugmentTarget { target: String, keyword: String },

    #[error("invalid deviation of '{target}': {message}")]
    InvalidDeviation { target: String, message: String },

    #[error("'{keyword}' cannot be refined in '{target}'")]
    InvalidRefine { keyword: String, target: String },

    #[error("'{name}' has config true but its parent has config false")]
    InvalidConfig { name: String },

    #[error("key '{key}' does not name a leaf of list '{list}'")]
    InvalidKey { key: String, list: String },

    #[error("type '{name}': {message}")]
    InvalidType { name: String, message: String },

    #[error("submodule '{submodule}' does not belong to module '{module}'")]
    IncludeMismatch { submodule: String, module: String },

    #[error("duplicate {index} tree entry '{name}' in '{parent}'")]
    DuplicateIndexEntry {
        index: &'static str,
        name: String,
        parent: String,
    },

    #[error("Imported module {name} was not found")]
    ModuleNotFound { name: String },

    #[error("Included submodule {name} was not found")]
    SubmoduleNotFound { name: String },

    #[error("Module {name} of belongs-to was not found")]
    BelongsToNotFound { name: String },

    #[error("{what} '{name}' not found")]
    UnresolvedReference { what: &'static str, name: String },

    #[error("Deviation target '{target}' not found")]
    DeviationTargetNotFound { target: String },

    #[error("Augment target '{target}' not found")]
    AugmentTargetNotFound { target: String },

    #[error("Refine target '{target}' not found")]
    RefineTargetNotFound { target: String },
}

impl SourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SourceError::InvalidArgument { .. }
            | SourceError::MissingArgument { .. }
            | SourceError::UnexpectedArgument { .. } => ErrorKind::ArgumentSyntax,
            SourceError::DuplicateIndexEntry { .. } => ErrorKind::SubstatementIndexing,
            SourceError::ModuleNotFound { .. }
            | SourceError::SubmoduleNotFound { .. }
            | SourceError::BelongsToNotFound { .. }
            | SourceError::UnresolvedReference { .. }
            | SourceError::DeviationTargetNotFound { .. }
            | SourceError::AugmentTargetNotFound { .. }
            | SourceError::RefineTargetNotFound { .. } => ErrorKind::Inference,
            _ => ErrorKind::Structure,
        }
    }

    pub fn at(self, span: &Span) -> SpannedError {
        SpannedError::from(self).with_span(span)
    }
}

/// A [`SourceError`] together with the statement it was raised for.
#[derive(Debug, Clone)]
pub struct SpannedError {
    pub error: SourceError,
    pub span: Option<Span>,
}

impl SpannedError {
    pub fn new(error: SourceError) -> Self {
        Self { error, span: None }
    }

    pub fn with_span(mut self, span: &Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span.clone());
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// Message without location information.
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

impl fmt::Display for SpannedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(span) = &self.span {
            let msg = format!("{}", self.error);
            write!(f, "{}", span.message("error", &msg))
        } else {
            write!(f, "{}", self.error)
        }
    }
}

impl From<SourceError> for SpannedError {
    fn from(error: SourceError) -> Self {
        Self::new(error)
    }
}

impl core::error::Error for SpannedError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub type Result<T> = ::core::result::Result<T, SpannedError>;

/// Failure of a whole build. No partial model is produced.
#[derive(Debug, Clone)]
pub struct BuildError {
    pub phase: ProcessingPhase,
    pub errors: Vec<SpannedError>,
}

impl BuildError {
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "build failed in phase {} with {} error(s)",
            self.phase,
            self.errors.len()
        )?;
        for e in &self.errors {
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl core::error::Error for BuildError {}

/// A legal but discouraged construct. Processing continues.
#[derive(Debug, Clone)]
pub struct Warning {
    pub span: Span,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.span.message("warning", &self.message))
    }
}
