//! Build import pipeline
//!
//! Pasted text is classified into one of the supported source formats,
//! validated field by field and turned into either a ready-to-share single
//! build or a snapshot of many builds for the store.
//!
//! JSON objects are offered to each format in a fixed order. A format
//! either claims the input, skips it, or rejects it with the first
//! violation it finds; a rejection is final.

mod backup;
mod detailed;
mod journal;
mod text;

pub use backup::{Comparison, ComparisonEntry, Insurance, Snapshot};
pub use detailed::DetailedBuild;
pub use journal::Loadout;

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::build::BuildError;
use crate::code::DecodeError;
use crate::engineering::EngineeringError;

const NOT_AN_OBJECT: &str = "Must be an object or array!";

/// User-facing import failure.
///
/// Every variant carries the message shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// Text is neither structured data nor a legacy build
    #[error("{0}")]
    Parse(String),

    /// Right shape family, wrong or missing fields
    #[error("{0}")]
    Schema(String),

    /// Value outside the catalog (unknown ship, module, blueprint)
    #[error("{0}")]
    Domain(String),

    /// Module cannot occupy the targeted slot
    #[error("{0}")]
    Compatibility(String),

    /// Build code could not be encoded or decoded
    #[error("{0}")]
    Codec(String),
}

impl ImportError {
    pub fn message(&self) -> &str {
        match self {
            Self::Parse(m)
            | Self::Schema(m)
            | Self::Domain(m)
            | Self::Compatibility(m)
            | Self::Codec(m) => m,
        }
    }

    /// Same category, different message
    pub fn with_message(self, message: impl Into<String>) -> Self {
        let message = message.into();
        match self {
            Self::Parse(_) => Self::Parse(message),
            Self::Schema(_) => Self::Schema(message),
            Self::Domain(_) => Self::Domain(message),
            Self::Compatibility(_) => Self::Compatibility(message),
            Self::Codec(_) => Self::Codec(message),
        }
    }
}

impl From<EngineeringError> for ImportError {
    fn from(err: EngineeringError) -> Self {
        Self::Domain(err.to_string())
    }
}

impl From<BuildError> for ImportError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::UnknownHull(_)
            | BuildError::UnknownModule(_)
            | BuildError::UnknownBulkheads(_) => Self::Domain(err.to_string()),
            BuildError::Engineering(e) => e.into(),
            BuildError::Encode(_) => Self::Codec(err.to_string()),
            BuildError::IncompatibleModule { .. }
            | BuildError::NoSuchSlot(_)
            | BuildError::EmptySlot(_)
            | BuildError::RequiredSlot(_)
            | BuildError::InvalidPriority(_) => Self::Compatibility(err.to_string()),
        }
    }
}

impl From<DecodeError> for ImportError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Build(e) => e.into(),
            DecodeError::Engineering(e) => e.into(),
            other => Self::Codec(other.to_string()),
        }
    }
}

/// Supported source formats, in the order JSON objects are probed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SourceFormat {
    Backup,
    DetailedExportV3,
    DetailedExportV4,
    DetailedExportArray,
    JournalLoadout,
    LegacyText,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Backup => "backup",
            Self::DetailedExportV3 => "detailed export (v3)",
            Self::DetailedExportV4 => "detailed export (v4)",
            Self::DetailedExportArray => "detailed export array",
            Self::JournalLoadout => "journal loadout",
            Self::LegacyText => "legacy text",
        };
        f.write_str(name)
    }
}

/// Outcome of offering input to one format
#[derive(Debug)]
pub enum Probe<T> {
    /// The format claims the input
    Match(T),
    /// Not this format; try the next one
    Skip,
    /// This format, but invalid
    Reject(ImportError),
}

impl<T> Probe<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Probe<U> {
        match self {
            Self::Match(value) => Probe::Match(f(value)),
            Self::Skip => Probe::Skip,
            Self::Reject(err) => Probe::Reject(err),
        }
    }
}

impl<T> From<Result<T, ImportError>> for Probe<T> {
    fn from(result: Result<T, ImportError>) -> Self {
        match result {
            Ok(value) => Self::Match(value),
            Err(err) => Self::Reject(err),
        }
    }
}

/// A build ready to open: the outfitting page path is derived from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleBuild {
    pub name: String,
    pub ship_id: String,
    pub code: String,
}

impl SingleBuild {
    /// `/outfit/<ship>?code=<code>&bn=<name>` with both values percent-encoded
    pub fn navigation_path(&self) -> String {
        format!(
            "/outfit/{}?code={}&bn={}",
            self.ship_id,
            urlencoding::encode(&self.code),
            urlencoding::encode(&self.name)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportResult {
    ValidationError(ImportError),
    SingleBuild(SingleBuild),
    Snapshot(Snapshot),
}

impl ImportResult {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::ValidationError(_))
    }

    /// `(valid, message)`; the message is present only when invalid
    pub fn status(&self) -> (bool, Option<&str>) {
        match self {
            Self::ValidationError(err) => (false, Some(err.message())),
            _ => (true, None),
        }
    }

    pub fn navigation_path(&self) -> Option<String> {
        match self {
            Self::SingleBuild(build) => Some(build.navigation_path()),
            _ => None,
        }
    }
}

/// Input that a format has claimed and validated
enum Classified {
    Backup(Snapshot),
    Detailed(SourceFormat, Box<DetailedBuild>),
    Journal(Box<Loadout>),
}

const OBJECT_FORMATS: [fn(&Map<String, Value>) -> Probe<Classified>; 3] = [
    |map| backup::probe(map).map(Classified::Backup),
    |map| detailed::probe(map).map(|(format, build)| Classified::Detailed(format, Box::new(build))),
    |map| journal::probe(map).map(|loadout| Classified::Journal(Box::new(loadout))),
];

impl Classified {
    fn format(&self) -> SourceFormat {
        match self {
            Self::Backup(_) => SourceFormat::Backup,
            Self::Detailed(format, _) => *format,
            Self::Journal(_) => SourceFormat::JournalLoadout,
        }
    }

    fn into_result(self) -> Result<ImportResult, ImportError> {
        match self {
            Self::Backup(snapshot) => Ok(ImportResult::Snapshot(snapshot)),
            Self::Detailed(format, build) => detailed::reconstruct(&build, format).map(ImportResult::SingleBuild),
            Self::Journal(loadout) => journal::reconstruct(&loadout).map(ImportResult::SingleBuild),
        }
    }
}

fn classify_object(map: &Map<String, Value>) -> Result<Classified, ImportError> {
    for probe in OBJECT_FORMATS {
        match probe(map) {
            Probe::Match(classified) => return Ok(classified),
            Probe::Skip => continue,
            Probe::Reject(err) => return Err(err),
        }
    }
    Err(ImportError::Schema("No builds found!".to_string()))
}

/// Classify and import `text`, reporting which format it was read as
pub fn import_with_format(text: &str) -> Result<(SourceFormat, ImportResult), ImportError> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            if text::is_candidate(text) {
                debug!("classified as legacy text");
                let build = text::import(text)?;
                return Ok((SourceFormat::LegacyText, ImportResult::SingleBuild(build)));
            }
            debug!(error = %err, "input is neither JSON nor legacy text");
            return Err(ImportError::Parse(NOT_AN_OBJECT.to_string()));
        }
    };

    match &value {
        Value::Array(items) => {
            debug!(count = items.len(), "classified as detailed export array");
            let snapshot = detailed::import_array(items)?;
            Ok((SourceFormat::DetailedExportArray, ImportResult::Snapshot(snapshot)))
        }
        Value::Object(map) => {
            let classified = classify_object(map)?;
            let format = classified.format();
            debug!(%format, "classified import");
            Ok((format, classified.into_result()?))
        }
        _ => Err(ImportError::Parse(NOT_AN_OBJECT.to_string())),
    }
}

/// Detect the format of `text` without keeping the import
pub fn classify(text: &str) -> Result<SourceFormat, ImportError> {
    import_with_format(text).map(|(format, _)| format)
}

/// Import pasted build data. Never fails: errors become
/// [`ImportResult::ValidationError`].
pub fn import(text: &str) -> ImportResult {
    match import_with_format(text) {
        Ok((_, result)) => result,
        Err(err) => ImportResult::ValidationError(err),
    }
}
