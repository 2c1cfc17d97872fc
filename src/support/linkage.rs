// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `module`, `submodule`, `import`, `include` and `belongs-to`.

use super::{child_argument, error_at, insert, ArgumentSpec, CopyPolicy, StatementSupport};
use crate::argument::*;
use crate::context::{BuildContext, ContextId};
use crate::error::{Result, SourceError, SpannedError};
use crate::inference::{InferenceAction, Prerequisite, Requirement};
use crate::phase::ProcessingPhase;
use crate::qname::{QNameModule, Revision, SourceIdentifier};
use crate::statement::StatementKind;

use alloc::collections::BTreeMap;

use log::debug;

pub fn register(m: &mut BTreeMap<StatementKind, StatementSupport>) {
    use ArgumentSpec::Required;
    use CopyPolicy::Reject;
    use StatementKind as K;

    let mut add = |kind, argument, hook: Option<super::Hook>| {
        let mut s = StatementSupport::new(kind, argument, Reject);
        s.linkage = true;
        s.on_linkage = hook;
        insert(m, s);
    };
    add(K::Module, Required(parse_identifier), Some(on_module));
    add(K::Submodule, Required(parse_identifier), Some(on_submodule));
    add(K::Import, Required(parse_identifier), Some(on_import));
    add(K::Include, Required(parse_identifier), Some(on_include));
    add(K::BelongsTo, Required(parse_identifier), Some(on_belongs_to));
    add(K::Prefix, Required(parse_identifier), None);
    add(K::Namespace, Required(parse_string), None);
    add(K::YangVersion, Required(parse_yang_version), None);
    add(K::Revision, Required(parse_revision), None);
    add(K::RevisionDate, Required(parse_revision), None);
}

fn source_id(ctx: &BuildContext, root: ContextId) -> SourceIdentifier {
    ctx.sources[ctx.ctx(root).lexical_source].id.clone()
}

fn duplicate(ctx: &BuildContext, id: ContextId, namespace: &str, name: String) -> SpannedError {
    error_at(
        ctx,
        id,
        SourceError::DuplicateDefinition {
            namespace: namespace.to_string(),
            name,
        },
    )
}

fn on_module(ctx: &mut BuildContext, id: ContextId) -> Result<()> {
    let source = ctx.ctx(id).lexical_source;
    let sid = source_id(ctx, id);
    let namespace = child_argument(ctx, id, StatementKind::Namespace).unwrap_or_default();
    let prefix = child_argument(ctx, id, StatementKind::Prefix).unwrap_or_default();

    if ctx.namespaces.modules.insert(sid.clone(), id).is_err() {
        return Err(duplicate(ctx, id, "Module", sid.to_string()));
    }
    let module = QNameModule::new(namespace, sid.revision.clone());
    if ctx.namespaces.module_namespaces.insert(module.clone(), id).is_err() {
        return Err(duplicate(ctx, id, "Module namespace", module.to_string()));
    }
    let s = &mut ctx.sources[source];
    s.module_source = Some(source);
    s.qname_module = Some(module);
    if ctx.namespaces.prefixes_mut(source).insert(prefix.clone(), source).is_err() {
        return Err(duplicate(ctx, id, "Prefix", prefix));
    }
    debug!("linked module {sid}");
    Ok(())
}

fn on_submodule(ctx: &mut BuildContext, id: ContextId) -> Result<()> {
    let sid = source_id(ctx, id);
    if ctx.namespaces.submodules.insert(sid.clone(), id).is_err() {
        return Err(duplicate(ctx, id, "Submodule", sid.to_string()));
    }
    Ok(())
}

fn revision_date(ctx: &BuildContext, id: ContextId) -> Option<Revision> {
    child_argument(ctx, id, StatementKind::RevisionDate).and_then(|r| Revision::parse(&r).ok())
}

/// Name of the module the statements of `source` belong to.
fn owning_module_name(ctx: &BuildContext, source: usize) -> Option<String> {
    let s = &ctx.sources[source];
    if s.is_submodule {
        s.raw.find("belongs-to").and_then(|b| b.argument.clone())
    } else {
        Some(s.id.name.clone())
    }
}

fn on_import(ctx: &mut BuildContext, id: ContextId) -> Result<()> {
    let name = ctx.ctx(id).raw_argument().unwrap_or_default().to_string();
    let prefix = child_argument(ctx, id, StatementKind::Prefix).unwrap_or_default();
    let revision = revision_date(ctx, id);
    ctx.register_action(
        id,
        vec![Prerequisite::new(
            Requirement::Module {
                name: name.clone(),
                revision,
            },
            ProcessingPhase::SourceLinkage,
        )],
        Box::new(BindPrefix {
            name,
            prefix,
            missing: |name| SourceError::ModuleNotFound { name },
            set_module: false,
        }),
    );
    Ok(())
}

fn on_belongs_to(ctx: &mut BuildContext, id: ContextId) -> Result<()> {
    let name = ctx.ctx(id).raw_argument().unwrap_or_default().to_string();
    let prefix = child_argument(ctx, id, StatementKind::Prefix).unwrap_or_default();
    ctx.register_action(
        id,
        vec![Prerequisite::new(
            Requirement::Module {
                name: name.clone(),
                revision: None,
            },
            ProcessingPhase::SourceLinkage,
        )],
        Box::new(BindPrefix {
            name,
            prefix,
            missing: |name| SourceError::BelongsToNotFound { name },
            set_module: true,
        }),
    );
    Ok(())
}

/// Binds a prefix to an imported module, or attaches a submodule to the
/// module it belongs to.
struct BindPrefix {
    name: String,
    prefix: String,
    missing: fn(String) -> SourceError,
    set_module: bool,
}

impl InferenceAction for BindPrefix {
    fn name(&self) -> &'static str {
        if self.set_module {
            "belongs-to"
        } else {
            "import"
        }
    }

    fn apply(self: Box<Self>, ctx: &mut BuildContext, owner: ContextId, resolved: &[ContextId]) -> Result<()> {
        let source = ctx.ctx(owner).lexical_source;
        let Some(target) = resolved.first().and_then(|r| ctx.source_of_root(*r)) else {
            return Err(error_at(ctx, owner, (self.missing)(self.name)));
        };
        if self.set_module {
            let module = ctx.sources[target].qname_module.clone();
            let s = &mut ctx.sources[source];
            s.module_source = Some(target);
            s.qname_module = module;
        }
        if ctx
            .namespaces
            .prefixes_mut(source)
            .insert(self.prefix.clone(), target)
            .is_err()
        {
            return Err(duplicate(ctx, owner, "Prefix", self.prefix));
        }
        debug!("bound prefix {} to {}", self.prefix, ctx.sources[target].id);
        Ok(())
    }

    fn prerequisite_failed(
        self: Box<Self>,
        ctx: &BuildContext,
        owner: ContextId,
        _unmet: &[&Prerequisite],
    ) -> SpannedError {
        error_at(ctx, owner, (self.missing)(self.name))
    }
}

fn on_include(ctx: &mut BuildContext, id: ContextId) -> Result<()> {
    let name = ctx.ctx(id).raw_argument().unwrap_or_default().to_string();
    let revision = revision_date(ctx, id);
    ctx.register_action(
        id,
        vec![Prerequisite::new(
            Requirement::Submodule {
                name: name.clone(),
                revision,
            },
            ProcessingPhase::SourceLinkage,
        )],
        Box::new(Include { name }),
    );
    Ok(())
}

struct Include {
    name: String,
}

impl InferenceAction for Include {
    fn name(&self) -> &'static str {
        "include"
    }

    fn apply(self: Box<Self>, ctx: &mut BuildContext, owner: ContextId, resolved: &[ContextId]) -> Result<()> {
        let source = ctx.ctx(owner).lexical_source;
        let Some(sub) = resolved.first().and_then(|r| ctx.source_of_root(*r)) else {
            return Err(error_at(ctx, owner, SourceError::SubmoduleNotFound { name: self.name }));
        };
        let module = owning_module_name(ctx, source).unwrap_or_default();
        let belongs_to = owning_module_name(ctx, sub).unwrap_or_default();
        if module != belongs_to {
            return Err(error_at(
                ctx,
                owner,
                SourceError::IncludeMismatch {
                    submodule: self.name,
                    module,
                },
            ));
        }
        ctx.sources[source].includes.push(sub);
        Ok(())
    }

    fn prerequisite_failed(
        self: Box<Self>,
        ctx: &BuildContext,
        owner: ContextId,
        _unmet: &[&Prerequisite],
    ) -> SpannedError {
        error_at(ctx, owner, SourceError::SubmoduleNotFound { name: self.name })
    }
}
