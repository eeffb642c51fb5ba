//! Modification engine
//!
//! A blueprint grade gives each of its features a `[low, high]` range of
//! fractional multipliers. A roll quality in `[0, 1]` picks a point in that
//! range; the result is stored as an integer in hundredths of a percent
//! (see [`FeatureDelta`]).
//!
//! Only one special effect is active per module. Its deltas are kept apart
//! from the blueprint deltas and overlaid by [`effective_deltas`].

use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{catalog, Feature, FeatureRange, Grade, ModuleTemplate};
use crate::module::{AppliedBlueprint, FeatureDelta, ModuleInstance};

/// Stored units per unit fraction
pub const VALUE_SCALE: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineeringError {
    #[error("Unknown blueprint: {0}")]
    InvalidBlueprint(String),

    #[error("Blueprint {blueprint} cannot be applied to {group} modules")]
    IneligibleBlueprint { blueprint: String, group: String },

    #[error("Blueprint {blueprint} has no grade {grade}")]
    InvalidGrade { blueprint: String, grade: u8 },

    #[error("Unknown special effect: {0}")]
    UnknownSpecial(String),

    #[error("Special effect {special} cannot be applied to {group} modules")]
    IneligibleSpecial { special: String, group: String },

    #[error("Module has no blueprint")]
    NoBlueprint,

    #[error("Feature {feature} is not part of {blueprint} grade {grade}")]
    FeatureNotInGrade {
        feature: String,
        blueprint: String,
        grade: u8,
    },

    #[error("Quality {0} is outside 0..=1")]
    InvalidQuality(f64),
}

/// Named roll positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Roll {
    Worst,
    Fifty,
    Best,
}

impl Roll {
    pub fn percent(self) -> u8 {
        match self {
            Self::Worst => 0,
            Self::Fifty => 50,
            Self::Best => 100,
        }
    }
}

/// Engineering attached to a module by an import source
#[derive(Debug, Clone, PartialEq)]
pub struct Engineering {
    pub blueprint: String,
    pub grade: u8,
    pub quality: f64,
    pub special: Option<String>,
}

/// Interpolate a feature range at `quality`, in stored units
pub fn feature_value(range: &FeatureRange, quality: f64) -> i32 {
    (((range.high - range.low) * quality + range.low) * VALUE_SCALE).round() as i32
}

fn feature_def(key: &str) -> &'static Feature {
    catalog()
        .feature(key)
        .unwrap_or_else(|| unreachable!("catalog load checks feature {key}"))
}

fn check_quality(quality: f64) -> Result<(), EngineeringError> {
    if (0.0..=1.0).contains(&quality) {
        Ok(())
    } else {
        Err(EngineeringError::InvalidQuality(quality))
    }
}

/// Grade table row of the module's active blueprint
fn active_grade(module: &ModuleInstance) -> Result<&'static Grade, EngineeringError> {
    let applied = module.blueprint.ok_or(EngineeringError::NoBlueprint)?;
    assert!(
        applied.blueprint.applies_to(&module.template.grp),
        "blueprint {} attached to {} module",
        applied.blueprint.fdname,
        module.template.grp
    );
    applied
        .blueprint
        .grade(applied.grade)
        .ok_or_else(|| EngineeringError::InvalidGrade {
            blueprint: applied.blueprint.fdname.clone(),
            grade: applied.grade,
        })
}

/// Set one feature of the active grade to its value at `quality`.
///
/// Returns the stored value.
pub fn apply_modification(
    module: &mut ModuleInstance,
    feature: &str,
    quality: f64,
) -> Result<i32, EngineeringError> {
    check_quality(quality)?;
    let grade = active_grade(module)?;
    let range = grade
        .features
        .iter()
        .find(|r| r.feature == feature)
        .ok_or_else(|| {
            let applied = module.blueprint.as_ref();
            EngineeringError::FeatureNotInGrade {
                feature: feature.to_string(),
                blueprint: applied.map(|a| a.blueprint.fdname.clone()).unwrap_or_default(),
                grade: applied.map_or(0, |a| a.grade),
            }
        })?;

    let value = feature_value(range, quality);
    debug!(
        module = %module.template.symbol,
        feature,
        low = range.low,
        high = range.high,
        quality,
        value,
        "applied modification"
    );
    module.set_modification(feature_def(&range.feature), value);
    Ok(value)
}

/// Attach a blueprint grade without rolling it.
///
/// Any previous blueprint, special effect and modifications are discarded.
pub fn set_blueprint(
    module: &mut ModuleInstance,
    fdname: &str,
    grade: u8,
) -> Result<(), EngineeringError> {
    let blueprint = catalog()
        .blueprint(fdname)
        .ok_or_else(|| EngineeringError::InvalidBlueprint(fdname.to_string()))?;
    if !blueprint.applies_to(&module.template.grp) {
        return Err(EngineeringError::IneligibleBlueprint {
            blueprint: blueprint.fdname.clone(),
            group: module.template.grp.clone(),
        });
    }
    if blueprint.grade(grade).is_none() {
        return Err(EngineeringError::InvalidGrade {
            blueprint: blueprint.fdname.clone(),
            grade,
        });
    }

    module.blueprint = Some(AppliedBlueprint {
        blueprint,
        grade,
        special: None,
    });
    module.modifications.clear();
    Ok(())
}

/// Attach a blueprint grade and roll it to its best values
pub fn select_blueprint(
    module: &mut ModuleInstance,
    fdname: &str,
    grade: u8,
) -> Result<(), EngineeringError> {
    set_blueprint(module, fdname, grade)?;
    roll(module, Roll::Best)
}

/// Set every feature of the active grade to its value at `percent / 100`
pub fn roll_to(module: &mut ModuleInstance, percent: u8) -> Result<(), EngineeringError> {
    let quality = f64::from(percent.min(100)) / 100.0;
    let grade = active_grade(module)?;
    for range in &grade.features {
        apply_modification(module, &range.feature, quality)?;
    }
    Ok(())
}

pub fn roll(module: &mut ModuleInstance, roll: Roll) -> Result<(), EngineeringError> {
    roll_to(module, roll.percent())
}

/// Roll each feature of the active grade independently.
///
/// Returns the realized overall quality: the mean of the per-feature draws.
pub fn roll_random<R: Rng + ?Sized>(
    module: &mut ModuleInstance,
    rng: &mut R,
) -> Result<f64, EngineeringError> {
    let grade = active_grade(module)?;
    let mut total = 0.0;
    for range in &grade.features {
        let quality: f64 = rng.gen_range(0.0..=1.0);
        apply_modification(module, &range.feature, quality)?;
        total += quality;
    }
    if grade.features.is_empty() {
        return Ok(0.0);
    }
    Ok(total / grade.features.len() as f64)
}

/// Recover the overall roll quality from stored deltas.
///
/// Fixed features (`low == high`) carry no information and are ignored.
/// Returns `None` when there is no blueprint or nothing to measure.
pub fn blueprint_quality(module: &ModuleInstance) -> Option<f64> {
    let grade = active_grade(module).ok()?;
    let qualities: Vec<f64> = grade
        .features
        .iter()
        .filter(|r| (r.high - r.low).abs() > f64::EPSILON)
        .filter_map(|r| {
            let value = f64::from(module.modification(&r.feature)?) / VALUE_SCALE;
            Some((value - r.low) / (r.high - r.low))
        })
        .collect();
    if qualities.is_empty() {
        return None;
    }
    Some(qualities.iter().sum::<f64>() / qualities.len() as f64)
}

/// Remove per-feature deltas, keeping the blueprint
pub fn clear_modifications(module: &mut ModuleInstance) {
    module.modifications.clear();
}

/// Remove the blueprint, its special effect and all deltas
pub fn clear_blueprint(module: &mut ModuleInstance) {
    module.blueprint = None;
    module.modifications.clear();
}

/// Replace the module's special effect; `None` removes it
pub fn set_special(module: &mut ModuleInstance, edname: Option<&str>) -> Result<(), EngineeringError> {
    let Some(edname) = edname else {
        if let Some(applied) = module.blueprint.as_mut() {
            applied.special = None;
        }
        return Ok(());
    };

    let group = module.template.grp.clone();
    let applied = module.blueprint.as_mut().ok_or(EngineeringError::NoBlueprint)?;
    let special = catalog()
        .special(edname)
        .ok_or_else(|| EngineeringError::UnknownSpecial(edname.to_string()))?;
    if !special.applies_to(&group) {
        return Err(EngineeringError::IneligibleSpecial {
            special: special.edname.clone(),
            group,
        });
    }
    applied.special = Some(special);
    Ok(())
}

/// Blueprint deltas with the special effect overlaid.
///
/// Special features add to an existing delta or are appended in the
/// special's own order. Sums saturate, since decoded deltas are unchecked.
pub fn effective_deltas(module: &ModuleInstance) -> Vec<FeatureDelta> {
    let mut deltas = module.modifications.clone();
    let Some(special) = module.blueprint.and_then(|a| a.special) else {
        return deltas;
    };
    for (key, fraction) in &special.features {
        let value = (fraction * VALUE_SCALE).round() as i32;
        match deltas.iter_mut().find(|d| d.feature.key == *key) {
            Some(delta) => delta.value = delta.value.saturating_add(value),
            None => deltas.push(FeatureDelta {
                feature: feature_def(key),
                value,
            }),
        }
    }
    deltas
}

/// Telemetry reports one plasma slug effect; the catalog splits it by weapon.
fn resolve_special_alias<'a>(edname: &'a str, template: &ModuleTemplate) -> &'a str {
    if edname.eq_ignore_ascii_case("special_plasma_slug") {
        if template.symbol.to_ascii_lowercase().contains("plasmaaccelerator") {
            "special_plasma_slug_pa"
        } else {
            "special_plasma_slug_cooled"
        }
    } else {
        edname
    }
}

/// Apply imported engineering: blueprint, grade, every feature at one
/// quality, then the special effect.
pub fn engineer(module: &mut ModuleInstance, engineering: &Engineering) -> Result<(), EngineeringError> {
    check_quality(engineering.quality)?;
    set_blueprint(module, &engineering.blueprint, engineering.grade)?;
    let grade = active_grade(module)?;
    for range in &grade.features {
        apply_modification(module, &range.feature, engineering.quality)?;
    }
    if let Some(special) = engineering.special.as_deref() {
        let special = resolve_special_alias(special, module.template);
        set_special(module, Some(special))?;
    }
    Ok(())
}
