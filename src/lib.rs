// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

extern crate alloc;

#[cfg(feature = "arc")]
use alloc::sync::Arc as Rc;
#[cfg(not(feature = "arc"))]
use alloc::rc::Rc;

mod argument;
mod ast;
mod config;
mod context;
mod declared;
mod effective;
mod error;
mod if_feature;
mod inference;
mod lexer;
mod lookup;
mod namespace;
mod parser;
mod phase;
mod qname;
mod reactor;
mod scheduler;
mod statement;
mod support;

pub use argument::{
    Argument, DeviateKind, OrderedBy, PrefixedName, SchemaNodeIdentifier, Status, YangVersion,
};
pub use ast::{NodeRef, Ref};
pub use config::{FeatureSet, ReactorConfig};
pub use context::CopyType;
pub use declared::DeclaredStatement;
pub use effective::{EffectiveFlags, EffectiveModel, EffectiveStatement, StatementId, StatementOrigin};
pub use error::{BuildError, ErrorKind, SourceError, SpannedError, Warning};
pub use if_feature::IfFeatureExpr;
pub use phase::ProcessingPhase;
pub use qname::{QName, QNameModule, Revision, SourceIdentifier};
pub use reactor::Reactor;
pub use statement::StatementKind;

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::ast::*;
    pub use crate::context::{BuildContext, ContextId, CopyType, Support};
    pub use crate::inference::*;
    pub use crate::lexer::*;
    pub use crate::namespace::*;
    pub use crate::parser::*;
}

#[cfg(test)]
mod tests;
