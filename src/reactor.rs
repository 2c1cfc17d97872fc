// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::config::ReactorConfig;
use crate::context::{source_identifier, BuildContext};
use crate::effective::builder::EffectiveBuilder;
use crate::effective::EffectiveModel;
use crate::error::{BuildError, SourceError};
use crate::lexer::*;
use crate::parser::*;
use crate::phase::ProcessingPhase;
use crate::qname::SourceIdentifier;
use crate::scheduler::PhaseScheduler;

#[cfg(feature = "std")]
use std::path::Path;

use anyhow::Result;
use log::info;

/// Processes a set of YANG sources into an [`EffectiveModel`].
#[derive(Clone)]
pub struct Reactor {
    config: ReactorConfig,
    sources: Vec<(Ref<RawStatement>, bool)>,
}

/// Create a default reactor.
impl Default for Reactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Reactor {
    pub fn new() -> Self {
        Self {
            config: ReactorConfig::default(),
            sources: vec![],
        }
    }

    pub fn with_config(config: ReactorConfig) -> Self {
        Self {
            config,
            sources: vec![],
        }
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ReactorConfig) {
        self.config = config;
    }

    fn parse(source: &Source) -> Result<Ref<RawStatement>> {
        let mut parser = Parser::new(source)?;
        parser.parse()
    }

    /// Add a module or submodule. `path` is used in diagnostics only.
    pub fn add_source(&mut self, path: String, yang: String) -> Result<()> {
        let source = Source::from_contents(path, yang)?;
        self.sources.push((Self::parse(&source)?, false));
        Ok(())
    }

    #[cfg(feature = "std")]
    pub fn add_source_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let source = Source::from_file(path)?;
        self.sources.push((Self::parse(&source)?, false));
        Ok(())
    }

    /// Add a source that contributes definitions but whose module is not
    /// part of the resulting model.
    pub fn add_library_source(&mut self, path: String, yang: String) -> Result<()> {
        let source = Source::from_contents(path, yang)?;
        self.sources.push((Self::parse(&source)?, true));
        Ok(())
    }

    #[cfg(feature = "std")]
    pub fn add_library_source_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let source = Source::from_file(path)?;
        self.sources.push((Self::parse(&source)?, true));
        Ok(())
    }

    pub fn source_identifiers(&self) -> Vec<SourceIdentifier> {
        self.sources
            .iter()
            .map(|(raw, _)| source_identifier(raw))
            .collect()
    }

    /// Run every phase over the added sources. The result does not depend on
    /// the order in which sources were added.
    pub fn build(&self) -> core::result::Result<EffectiveModel, BuildError> {
        let mut sources: Vec<(SourceIdentifier, Ref<RawStatement>, bool)> = self
            .sources
            .iter()
            .map(|(raw, library)| (source_identifier(raw), raw.clone(), *library))
            .collect();
        sources.sort_by(|a, b| a.0.cmp(&b.0));

        let duplicates: Vec<_> = sources
            .windows(2)
            .filter(|w| w[0].0 == w[1].0)
            .map(|w| {
                SourceError::DuplicateSource {
                    source_id: w[1].0.to_string(),
                }
                .at(&w[1].1.span)
            })
            .collect();
        if !duplicates.is_empty() {
            return Err(BuildError {
                phase: ProcessingPhase::SourceLinkage,
                errors: duplicates,
            });
        }

        info!("building {} source(s)", sources.len());
        let mut ctx = BuildContext::new(self.config.clone());
        for (_, raw, library) in sources {
            ctx.add_source(raw, library);
        }

        let mut scheduler = PhaseScheduler::new();
        scheduler.run(&mut ctx)?;
        EffectiveBuilder::new(&mut ctx).build()
    }
}
