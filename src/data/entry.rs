//! Manual single-record submission with required-field validation.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::data::record::{is_blank, FieldValue, Fields, Kind, Record};
use crate::data::store::{RecordStore, StoreError};

/// A required field was missing or blank. The message names the kind only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("All required fields must be filled for {kind}.")]
pub struct ValidationError {
    pub kind: Kind,
    pub missing: Vec<&'static str>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Keeps JSON scalars; null, arrays and objects are treated as absent.
pub fn fields_from_json(body: &Map<String, Value>) -> Fields {
    body.iter()
        .filter_map(|(name, value)| Some((name.clone(), FieldValue::from_json(value)?)))
        .collect()
}

pub fn validate(kind: Kind, fields: &Fields) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = kind
        .required_fields()
        .iter()
        .copied()
        .filter(|name| is_blank(fields, name))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { kind, missing })
    }
}

/// Validates `fields`, then appends one record built from them. Nothing is
/// written when validation fails.
pub fn submit_record<R: Record>(store: &RecordStore, fields: &Fields) -> Result<R, SubmitError> {
    validate(R::KIND, fields)?;
    let record = R::from_fields(fields);
    store.append(std::slice::from_ref(&record))?;
    Ok(record)
}
