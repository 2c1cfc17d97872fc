// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Features the caller declares as supported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSet {
    /// Every defined feature is supported.
    #[default]
    All,
    /// Supported feature names, keyed by module namespace.
    #[serde(untagged)]
    Only(BTreeMap<String, BTreeSet<String>>),
}

impl FeatureSet {
    pub fn supports(&self, namespace: &str, feature: &str) -> bool {
        match self {
            FeatureSet::All => true,
            FeatureSet::Only(map) => map.get(namespace).is_some_and(|s| s.contains(feature)),
        }
    }
}

/// Caller supplied build configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorConfig {
    pub supported_features: FeatureSet,
    /// Target module namespace to the namespaces of modules allowed to
    /// deviate it. When absent every deviation is applied.
    pub deviation_permissions: Option<BTreeMap<String, BTreeSet<String>>>,
}

impl ReactorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.supported_features = features;
        self
    }

    pub fn may_deviate(&self, target_namespace: &str, deviating_namespace: &str) -> bool {
        match &self.deviation_permissions {
            None => true,
            Some(map) => map
                .get(target_namespace)
                .is_some_and(|s| s.contains(deviating_namespace)),
        }
    }
}
