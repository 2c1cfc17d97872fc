// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod augment;
pub mod definitions;
pub mod deviation;
pub mod features;
pub mod linkage;
pub mod types;
pub mod uses;
pub mod validator;

use crate::argument::*;
use crate::context::{BuildContext, ContextId};
use crate::effective::builder::{self, BuildHook};
use crate::error::{Result, SourceError, SpannedError};
use crate::statement::StatementKind;

use alloc::collections::BTreeMap;

use lazy_static::lazy_static;

pub use validator::Cardinality;

/// How a statement behaves when its parent is instantiated elsewhere by
/// `uses`, `augment`, `refine` or `deviate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPolicy {
    /// Copied verbatim; argument and completed callbacks are reused.
    ContextIndependent,
    /// Cannot be copied.
    Reject,
    /// Copied and processed again in the new location.
    Rerun,
}

#[derive(Debug, Clone, Copy)]
pub enum ArgumentSpec {
    None,
    Required(ArgumentParser),
    Optional(ArgumentParser),
}

pub type Hook = fn(&mut BuildContext, ContextId) -> Result<()>;

/// Behaviour of one statement kind.
pub struct StatementSupport {
    pub kind: StatementKind,
    pub argument: ArgumentSpec,
    pub substatements: Vec<(StatementKind, Cardinality)>,
    pub copy_policy: CopyPolicy,
    /// Argument is needed while linking sources.
    pub linkage: bool,
    pub on_linkage: Option<Hook>,
    pub on_declared: Option<Hook>,
    pub on_full_declaration: Option<Hook>,
    pub on_effective_model: Option<Hook>,
    /// Completes the effective statement after its substatements are built.
    pub on_build: Option<BuildHook>,
}

impl StatementSupport {
    pub fn new(kind: StatementKind, argument: ArgumentSpec, copy_policy: CopyPolicy) -> Self {
        Self {
            kind,
            argument,
            substatements: validator::rules(kind),
            copy_policy,
            linkage: false,
            on_linkage: None,
            on_declared: None,
            on_full_declaration: None,
            on_effective_model: None,
            on_build: None,
        }
    }

    pub fn hook(&self, phase: crate::phase::ProcessingPhase) -> Option<Hook> {
        use crate::phase::ProcessingPhase::*;
        match phase {
            SourceLinkage => self.on_linkage,
            StatementDefinition => self.on_declared,
            FullDeclaration => self.on_full_declaration,
            EffectiveModel => self.on_effective_model,
        }
    }
}

pub(crate) fn error_at(ctx: &BuildContext, id: ContextId, error: SourceError) -> SpannedError {
    error.at(ctx.ctx(id).span())
}

/// Raw argument of the first declared child of `kind`.
pub(crate) fn child_argument(ctx: &BuildContext, id: ContextId, kind: StatementKind) -> Option<String> {
    ctx.ctx(id)
        .declared()
        .iter()
        .map(|c| ctx.ctx(*c))
        .find(|c| c.kind() == kind)
        .and_then(|c| c.raw_argument().map(str::to_string))
}

fn insert(m: &mut BTreeMap<StatementKind, StatementSupport>, support: StatementSupport) {
    m.insert(support.kind, support);
}

/// Statements without callbacks.
fn register_simple(m: &mut BTreeMap<StatementKind, StatementSupport>) {
    use ArgumentSpec::*;
    use CopyPolicy::*;
    use StatementKind as K;

    let simple: &[(StatementKind, ArgumentSpec, CopyPolicy)] = &[
        (K::Organization, Required(parse_string), Reject),
        (K::Contact, Required(parse_string), Reject),
        (K::Description, Required(parse_string), ContextIndependent),
        (K::Reference, Required(parse_string), ContextIndependent),
        (K::Units, Required(parse_string), ContextIndependent),
        (K::Default, Required(parse_string), ContextIndependent),
        (K::Presence, Required(parse_string), ContextIndependent),
        (K::Must, Required(parse_string), ContextIndependent),
        (K::When, Required(parse_string), ContextIndependent),
        (K::Config, Required(parse_boolean), ContextIndependent),
        (K::Mandatory, Required(parse_boolean), ContextIndependent),
        (K::MinElements, Required(parse_uint), ContextIndependent),
        (K::MaxElements, Required(parse_max_elements), ContextIndependent),
        (K::OrderedBy, Required(parse_ordered_by), ContextIndependent),
        (K::Status, Required(parse_status), ContextIndependent),
        (K::Key, Required(parse_key), ContextIndependent),
        (K::Unique, Required(parse_string), ContextIndependent),
        (K::Enum, Required(parse_string), ContextIndependent),
        (K::Bit, Required(parse_identifier), ContextIndependent),
        (K::Value, Required(parse_integer), ContextIndependent),
        (K::Position, Required(parse_uint), ContextIndependent),
        (K::Range, Required(parse_string), ContextIndependent),
        (K::Length, Required(parse_string), ContextIndependent),
        (K::Pattern, Required(parse_string), ContextIndependent),
        (K::Modifier, Required(parse_modifier), ContextIndependent),
        (K::Path, Required(parse_string), ContextIndependent),
        (K::RequireInstance, Required(parse_boolean), ContextIndependent),
        (K::FractionDigits, Required(parse_fraction_digits), ContextIndependent),
        (K::ErrorMessage, Required(parse_string), ContextIndependent),
        (K::ErrorAppTag, Required(parse_string), ContextIndependent),
        (K::Argument, Required(parse_identifier), ContextIndependent),
        (K::YinElement, Required(parse_boolean), ContextIndependent),
    ];
    for (kind, argument, policy) in simple.iter().copied() {
        insert(m, StatementSupport::new(kind, argument, policy));
    }

    for kind in [
        K::Container,
        K::Leaf,
        K::LeafList,
        K::Choice,
        K::Case,
        K::Anydata,
        K::Anyxml,
        K::Rpc,
        K::Action,
        K::Notification,
    ] {
        insert(
            m,
            StatementSupport::new(kind, Required(parse_identifier), Rerun),
        );
    }
    let mut list = StatementSupport::new(K::List, Required(parse_identifier), Rerun);
    list.on_build = Some(builder::finish_list);
    insert(m, list);
    for kind in [K::Input, K::Output] {
        insert(m, StatementSupport::new(kind, ArgumentSpec::None, Rerun));
    }
}

lazy_static! {
    pub static ref SUPPORTS: BTreeMap<StatementKind, StatementSupport> = {
        let mut m = BTreeMap::new();

        register_simple(&mut m);
        linkage::register(&mut m);
        definitions::register(&mut m);
        features::register(&mut m);
        types::register(&mut m);
        uses::register(&mut m);
        augment::register(&mut m);
        deviation::register(&mut m);

        m
    };
}

pub fn lookup(kind: StatementKind) -> Option<&'static StatementSupport> {
    SUPPORTS.get(&kind)
}

pub fn copy_policy(kind: StatementKind) -> CopyPolicy {
    lookup(kind)
        .map(|s| s.copy_policy)
        .unwrap_or(CopyPolicy::ContextIndependent)
}
