// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;

use serde::Serialize;

/// Processing phases, in the order every context passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ProcessingPhase {
    /// Module and submodule identity, imports, includes and belongs-to.
    SourceLinkage,
    /// Arguments are parsed, substatements validated and definitions published.
    StatementDefinition,
    /// `uses` expansion, `refine` and `augment`.
    FullDeclaration,
    /// Feature support, deviations and effective statement construction.
    EffectiveModel,
}

impl ProcessingPhase {
    pub const ALL: [ProcessingPhase; 4] = [
        ProcessingPhase::SourceLinkage,
        ProcessingPhase::StatementDefinition,
        ProcessingPhase::FullDeclaration,
        ProcessingPhase::EffectiveModel,
    ];

    pub fn next(&self) -> Option<ProcessingPhase> {
        match self {
            ProcessingPhase::SourceLinkage => Some(ProcessingPhase::StatementDefinition),
            ProcessingPhase::StatementDefinition => Some(ProcessingPhase::FullDeclaration),
            ProcessingPhase::FullDeclaration => Some(ProcessingPhase::EffectiveModel),
            ProcessingPhase::EffectiveModel => None,
        }
    }
}

impl fmt::Display for ProcessingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProcessingPhase::SourceLinkage => "source-linkage",
            ProcessingPhase::StatementDefinition => "statement-definition",
            ProcessingPhase::FullDeclaration => "full-declaration",
            ProcessingPhase::EffectiveModel => "effective-model",
        })
    }
}
