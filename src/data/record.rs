//! Collection kinds and the typed record shapes stored for each of them.
//!
//! Every field is optional on the stored record: spreadsheet rows are appended
//! without field-level validation, so a stored row may lack any column. Manual
//! entries are checked against [`Kind::required_fields`] before they get here.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    #[serde(rename = "CPI")]
    Cpi,
    Population,
    Agriculture,
}

const CPI_FIELDS: &[&str] = &["state", "lga", "month", "year", "value", "description"];
const CPI_REQUIRED: &[&str] = &["state", "lga", "month", "year", "value"];
const POPULATION_FIELDS: &[&str] = &["state", "lga", "year", "ageGroup", "gender", "population"];
const AGRICULTURE_FIELDS: &[&str] = &["state", "lga", "year", "crop", "value"];

impl Kind {
    /// Fixed kind order; locks and imports always walk kinds in this order.
    pub const ALL: [Kind; 3] = [Kind::Cpi, Kind::Population, Kind::Agriculture];

    /// Workbook sheet name that feeds this collection. Matched case-sensitively.
    pub fn sheet_name(self) -> &'static str {
        match self {
            Self::Cpi => "CPI",
            Self::Population => "Population",
            Self::Agriculture => "Agriculture",
        }
    }

    pub fn label(self) -> &'static str {
        self.sheet_name()
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Cpi => "cpi",
            Self::Population => "population",
            Self::Agriculture => "agriculture",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Cpi => "cpi.json",
            Self::Population => "population.json",
            Self::Agriculture => "agriculture.json",
        }
    }

    /// All fields of the record, in column order.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Cpi => CPI_FIELDS,
            Self::Population => POPULATION_FIELDS,
            Self::Agriculture => AGRICULTURE_FIELDS,
        }
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Cpi => CPI_REQUIRED,
            Self::Population => POPULATION_FIELDS,
            Self::Agriculture => AGRICULTURE_FIELDS,
        }
    }

    pub fn from_sheet_name(name: &str) -> Option<Kind> {
        Self::ALL.into_iter().find(|kind| kind.sheet_name() == name)
    }

    pub fn from_slug(slug: &str) -> Option<Kind> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug().eq_ignore_ascii_case(slug.trim()))
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Cpi => 0,
            Self::Population => 1,
            Self::Agriculture => 2,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single cell value, stored as given: numbers stay numbers, text stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl FieldValue {
    /// Empty text. Numbers, booleans and whitespace are never blank.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }

    /// Converts a JSON scalar. Null, arrays and objects have no field value.
    pub fn from_json(value: &serde_json::Value) -> Option<FieldValue> {
        match value {
            serde_json::Value::String(text) => Some(Self::Text(text.clone())),
            serde_json::Value::Bool(flag) => Some(Self::Bool(*flag)),
            serde_json::Value::Number(number) => number
                .as_i64()
                .map(Self::Int)
                .or_else(|| number.as_f64().map(Self::Float)),
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => None,
        }
    }

    /// Whole floats collapse to integers so a spreadsheet `2023.0` reads back as `2023`.
    pub fn from_f64(value: f64) -> FieldValue {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
            Self::Int(value as i64)
        } else {
            Self::Float(value)
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Field name to value, as produced by both manual entry and sheet rows.
pub type Fields = BTreeMap<String, FieldValue>;

/// True when the field is absent or holds blank text.
pub fn is_blank(fields: &Fields, name: &str) -> bool {
    fields.get(name).map_or(true, FieldValue::is_blank)
}

/// A record type stored in one named collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: Kind;

    /// Builds a record from the kind's known fields; unknown names are dropped.
    fn from_fields(fields: &Fields) -> Self;

    /// Field values in [`Kind::fields`] order.
    fn values(&self) -> Vec<Option<&FieldValue>>;
}

fn take(fields: &Fields, name: &str) -> Option<FieldValue> {
    fields.get(name).cloned()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CpiRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lga: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<FieldValue>,
}

impl Record for CpiRecord {
    const KIND: Kind = Kind::Cpi;

    fn from_fields(fields: &Fields) -> Self {
        Self {
            state: take(fields, "state"),
            lga: take(fields, "lga"),
            month: take(fields, "month"),
            year: take(fields, "year"),
            value: take(fields, "value"),
            description: take(fields, "description"),
        }
    }

    fn values(&self) -> Vec<Option<&FieldValue>> {
        vec![
            self.state.as_ref(),
            self.lga.as_ref(),
            self.month.as_ref(),
            self.year.as_ref(),
            self.value.as_ref(),
            self.description.as_ref(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lga: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<FieldValue>,
}

impl Record for PopulationRecord {
    const KIND: Kind = Kind::Population;

    fn from_fields(fields: &Fields) -> Self {
        Self {
            state: take(fields, "state"),
            lga: take(fields, "lga"),
            year: take(fields, "year"),
            age_group: take(fields, "ageGroup"),
            gender: take(fields, "gender"),
            population: take(fields, "population"),
        }
    }

    fn values(&self) -> Vec<Option<&FieldValue>> {
        vec![
            self.state.as_ref(),
            self.lga.as_ref(),
            self.year.as_ref(),
            self.age_group.as_ref(),
            self.gender.as_ref(),
            self.population.as_ref(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgricultureRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lga: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
}

impl Record for AgricultureRecord {
    const KIND: Kind = Kind::Agriculture;

    fn from_fields(fields: &Fields) -> Self {
        Self {
            state: take(fields, "state"),
            lga: take(fields, "lga"),
            year: take(fields, "year"),
            crop: take(fields, "crop"),
            value: take(fields, "value"),
        }
    }

    fn values(&self) -> Vec<Option<&FieldValue>> {
        vec![
            self.state.as_ref(),
            self.lga.as_ref(),
            self.year.as_ref(),
            self.crop.as_ref(),
            self.value.as_ref(),
        ]
    }
}
