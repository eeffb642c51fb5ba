//! Module instances
//!
//! A module instance is a reference to an immutable catalog template plus the
//! mutable engineering state of one fitted module.

use crate::catalog::{Blueprint, Feature, ModuleTemplate, Special};

/// One stored modification value.
///
/// `value` is in hundredths of a percent: 10000 is +100%, -1850 is -18.5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureDelta {
    pub feature: &'static Feature,
    pub value: i32,
}

impl FeatureDelta {
    pub fn key(&self) -> &'static str {
        &self.feature.key
    }

    /// Value as a fractional multiplier (0.185 for +18.5%)
    pub fn as_fraction(&self) -> f64 {
        f64::from(self.value) / 10_000.0
    }
}

/// Blueprint identity, grade and experimental effect of a module
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedBlueprint {
    pub blueprint: &'static Blueprint,
    pub grade: u8,
    pub special: Option<&'static Special>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInstance {
    pub template: &'static ModuleTemplate,
    pub blueprint: Option<AppliedBlueprint>,
    /// Per-feature deltas in display order.
    ///
    /// Normally produced by a blueprint roll, but shared codes can carry
    /// deltas on a module without a blueprint.
    pub modifications: Vec<FeatureDelta>,
}

impl ModuleInstance {
    pub fn new(template: &'static ModuleTemplate) -> Self {
        Self {
            template,
            blueprint: None,
            modifications: Vec::new(),
        }
    }

    pub fn is_engineered(&self) -> bool {
        self.blueprint.is_some() || !self.modifications.is_empty()
    }

    pub fn modification(&self, key: &str) -> Option<i32> {
        self.modifications
            .iter()
            .find(|d| d.feature.key == key)
            .map(|d| d.value)
    }

    /// Set a delta, keeping the position of an existing entry
    pub fn set_modification(&mut self, feature: &'static Feature, value: i32) {
        match self
            .modifications
            .iter_mut()
            .find(|d| d.feature.key == feature.key)
        {
            Some(delta) => delta.value = value,
            None => self.modifications.push(FeatureDelta { feature, value }),
        }
    }
}
