//! Full application backups
//!
//! ```json
//! {
//!   "builds": { "<ship id>": { "<build name>": "<code>" } },
//!   "comparisons": { "<name>": { "builds": [{ "shipId": "", "buildName": "" }] } },
//!   "discounts": [<ship>, <module>],
//!   "insurance": "standard"
//! }
//! ```
//!
//! Backups pass through unchanged once validated; the store owns them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::{ImportError, Probe};
use crate::catalog::catalog;

/// Insurance level applied to build costs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Insurance {
    Standard,
    Alpha,
    Beta,
}

impl Insurance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Alpha => "alpha",
            Self::Beta => "beta",
        }
    }
}

impl FromStr for Insurance {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "alpha" => Ok(Self::Alpha),
            "beta" => Ok(Self::Beta),
            other => Err(ImportError::Domain(format!("Invalid insurance type: {other}"))),
        }
    }
}

impl fmt::Display for Insurance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonEntry {
    pub ship_id: String,
    pub build_name: String,
}

/// A saved side-by-side comparison of builds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub builds: Vec<ComparisonEntry>,
    /// Display settings (facets, sort order) kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Every stored build, comparison and preference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ship id to build name to build code
    pub builds: BTreeMap<String, BTreeMap<String, String>>,
    pub comparisons: BTreeMap<String, Comparison>,
    pub ship_discount: Option<f64>,
    pub module_discount: Option<f64>,
    pub insurance: Option<Insurance>,
}

impl Snapshot {
    pub fn build_count(&self) -> usize {
        self.builds.values().map(BTreeMap::len).sum()
    }
}

fn schema(message: impl Into<String>) -> ImportError {
    ImportError::Schema(message.into())
}

// ============================================================================
// Validation
// ============================================================================
//
// Checks run in a fixed order and stop at the first failure. Within a
// check, entries are visited in document order:
//
// 1. builds is an object
// 2. every ship id exists
// 3. every build name and code is a non-empty string
// 4. every comparison entry references an existing build
// 5. discounts is [ship, module]
// 6. insurance is a known level

fn check_builds(builds: &Value) -> Result<&Map<String, Value>, ImportError> {
    builds
        .as_object()
        .ok_or_else(|| schema("builds must be an object!"))
}

fn check_ship_ids(builds: &Map<String, Value>) -> Result<(), ImportError> {
    for ship_id in builds.keys() {
        if catalog().ship(ship_id).is_none() {
            return Err(ImportError::Domain(format!("\"{ship_id}\" is not a valid Ship Id!")));
        }
    }
    Ok(())
}

fn check_build_entries(
    builds: &Map<String, Value>,
) -> Result<BTreeMap<String, BTreeMap<String, String>>, ImportError> {
    let mut out = BTreeMap::new();
    for (ship_id, entries) in builds {
        let ship_name = catalog().ship(ship_id).map_or(ship_id.as_str(), |s| s.name.as_str());
        let entries = entries
            .as_object()
            .ok_or_else(|| schema(format!("{ship_id} builds must be an object!")))?;

        let mut ship_builds = BTreeMap::new();
        for (name, code) in entries {
            if name.is_empty() {
                return Err(schema(format!(
                    "{ship_name} build \"{name}\" must be a string at least 1 character long!"
                )));
            }
            match code.as_str() {
                Some(code) if !code.is_empty() => {
                    ship_builds.insert(name.clone(), code.to_string());
                }
                _ => {
                    return Err(schema(format!("{ship_name} build \"{name}\" is not valid!")));
                }
            }
        }
        out.insert(ship_id.clone(), ship_builds);
    }
    Ok(out)
}

fn check_comparisons(
    comparisons: Option<&Value>,
    builds: &BTreeMap<String, BTreeMap<String, String>>,
) -> Result<BTreeMap<String, Comparison>, ImportError> {
    let Some(comparisons) = comparisons.filter(|v| !v.is_null()) else {
        return Ok(BTreeMap::new());
    };
    let comparisons = comparisons
        .as_object()
        .ok_or_else(|| schema("comparisons must be an object!"))?;

    let mut out = BTreeMap::new();
    for (name, value) in comparisons {
        let comparison: Comparison = serde_json::from_value(value.clone())
            .map_err(|_| schema(format!("Comparison \"{name}\" is not valid!")))?;
        for entry in &comparison.builds {
            let exists = builds
                .get(&entry.ship_id)
                .is_some_and(|b| b.contains_key(&entry.build_name));
            if !exists {
                return Err(ImportError::Domain(format!(
                    "{} build \"{}\" data is missing!",
                    entry.ship_id, entry.build_name
                )));
            }
        }
        out.insert(name.clone(), comparison);
    }
    Ok(out)
}

fn check_discounts(discounts: Option<&Value>) -> Result<Option<(f64, f64)>, ImportError> {
    let Some(discounts) = discounts.filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    match discounts.as_array().map(Vec::as_slice) {
        Some([ship, module]) => match (ship.as_f64(), module.as_f64()) {
            (Some(ship), Some(module)) => Ok(Some((ship, module))),
            _ => Err(schema("discounts must be an array of two numbers!")),
        },
        _ => Err(schema("discounts must be an array of two numbers!")),
    }
}

fn check_insurance(insurance: Option<&Value>) -> Result<Option<Insurance>, ImportError> {
    match insurance {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(level)) => level.parse().map(Some),
        Some(other) => Err(ImportError::Domain(format!("Invalid insurance type: {other}"))),
    }
}

fn validate(map: &Map<String, Value>, builds: &Value) -> Result<Snapshot, ImportError> {
    let builds = check_builds(builds)?;
    check_ship_ids(builds)?;
    let builds = check_build_entries(builds)?;
    let comparisons = check_comparisons(map.get("comparisons"), &builds)?;
    let discounts = check_discounts(map.get("discounts"))?;
    let insurance = check_insurance(map.get("insurance"))?;

    Ok(Snapshot {
        builds,
        comparisons,
        ship_discount: discounts.map(|d| d.0),
        module_discount: discounts.map(|d| d.1),
        insurance,
    })
}

/// Claims any object with a `builds` field
pub(super) fn probe(map: &Map<String, Value>) -> Probe<Snapshot> {
    match map.get("builds") {
        Some(builds) => validate(map, builds).into(),
        None => Probe::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backup() -> Value {
        json!({
            "builds": {
                "anaconda": { "Explorer": "A0code" },
                "asp": { "Miner": "A0miner" },
                "imperial_clipper": { "Dream": "A0dream" }
            },
            "comparisons": {
                "Haulers": {
                    "builds": [
                        { "shipId": "asp", "buildName": "Miner" },
                        { "shipId": "anaconda", "buildName": "Explorer" }
                    ],
                    "facets": [1, 2, 3],
                    "sort": "cost"
                }
            },
            "discounts": [0.9, 0.85],
            "insurance": "Beta"
        })
    }

    fn run(value: Value) -> Result<Snapshot, ImportError> {
        match probe(value.as_object().unwrap()) {
            Probe::Match(s) => Ok(s),
            Probe::Reject(e) => Err(e),
            Probe::Skip => panic!("backup was skipped"),
        }
    }

    #[test]
    fn test_first_unknown_ship_in_document_order() {
        let value: Value = serde_json::from_str(
            r#"{ "builds": { "zeppelin": { "A": "A0a" }, "airship": { "B": "A0b" } } }"#,
        )
        .unwrap();
        assert_eq!(run(value).unwrap_err().message(), "\"zeppelin\" is not a valid Ship Id!");
    }

    #[test]
    fn test_valid_backup() {
        let snapshot = run(backup()).unwrap();
        assert_eq!(snapshot.build_count(), 3);
        assert_eq!(snapshot.builds["asp"]["Miner"], "A0miner");
        assert_eq!(snapshot.ship_discount, Some(0.9));
        assert_eq!(snapshot.module_discount, Some(0.85));
        assert_eq!(snapshot.insurance, Some(Insurance::Beta));

        let haulers = &snapshot.comparisons["Haulers"];
        assert_eq!(haulers.builds.len(), 2);
        assert_eq!(haulers.extra["sort"], "cost");
    }

    #[test]
    fn test_old_backup_has_only_builds() {
        let snapshot = run(json!({ "builds": { "asp": { "Miner": "A0miner" } } })).unwrap();
        assert!(snapshot.comparisons.is_empty());
        assert_eq!(snapshot.insurance, None);
        assert_eq!(snapshot.ship_discount, None);
    }

    #[test]
    fn test_unknown_ship() {
        let text = backup().to_string().replacen("anaconda", "invalid_ship", 1);
        let err = run(serde_json::from_str(&text).unwrap()).unwrap_err();
        assert_eq!(err.message(), "\"invalid_ship\" is not a valid Ship Id!");
    }

    #[test]
    fn test_empty_build_name() {
        let text = backup().to_string().replace("Dream", "");
        let err = run(serde_json::from_str(&text).unwrap()).unwrap_err();
        assert_eq!(
            err.message(),
            "Imperial Clipper build \"\" must be a string at least 1 character long!"
        );
    }

    #[test]
    fn test_missing_comparison_build() {
        let mut value = backup();
        value["builds"].as_object_mut().unwrap().remove("asp");
        let err = run(value).unwrap_err();
        assert_eq!(err.message(), "asp build \"Miner\" data is missing!");
    }

    #[test]
    fn test_ship_ids_checked_before_names() {
        let value = json!({ "builds": { "asp": { "": "A0" }, "zz_unknown": {} } });
        let err = run(value).unwrap_err();
        assert_eq!(err.message(), "\"zz_unknown\" is not a valid Ship Id!");
    }

    #[test]
    fn test_invalid_insurance() {
        let mut value = backup();
        value["insurance"] = json!("Platinum");
        assert_eq!(run(value).unwrap_err().message(), "Invalid insurance type: platinum");
    }

    #[test]
    fn test_invalid_discounts() {
        let mut value = backup();
        value["discounts"] = json!([0.9]);
        assert!(matches!(run(value), Err(ImportError::Schema(_))));
    }

    #[test]
    fn test_non_object_is_skipped() {
        let value = json!({ "Ship": "Asp" });
        assert!(matches!(probe(value.as_object().unwrap()), Probe::Skip));
    }
}
