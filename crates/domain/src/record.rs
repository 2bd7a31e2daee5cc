use std::collections::BTreeMap;

use appdeck_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field that carries the mandatory record identifier.
pub const RECORD_ID_FIELD: &str = "id";

/// One untyped data store row with a mandatory string `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Creates a record from field values, overriding any `id` field with `id`.
    pub fn new(id: impl Into<String>, mut fields: Map<String, Value>) -> AppResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(AppError::Validation(
                "record id must not be empty".to_owned(),
            ));
        }

        fields.insert(RECORD_ID_FIELD.to_owned(), Value::String(id));
        Ok(Self { fields })
    }

    /// Creates a record from a JSON object that already carries an `id`.
    pub fn from_value(value: Value) -> AppResult<Self> {
        match value {
            Value::Object(fields) => Self::try_from(fields),
            _ => Err(AppError::Validation(
                "record must be a JSON object".to_owned(),
            )),
        }
    }

    /// Returns the record identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.fields
            .get(RECORD_ID_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Returns one field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns all field values including `id`.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns the record as a JSON object value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl TryFrom<Map<String, Value>> for Record {
    type Error = AppError;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        match fields.get(RECORD_ID_FIELD) {
            Some(Value::String(id)) if !id.trim().is_empty() => Ok(Self { fields }),
            Some(_) => Err(AppError::Validation(
                "record id must be a non-empty string".to_owned(),
            )),
            None => Err(AppError::Validation("record requires an id".to_owned())),
        }
    }
}

impl From<Record> for Map<String, Value> {
    fn from(record: Record) -> Self {
        record.fields
    }
}

/// Serializable copy of every table held for one app instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataStoreSnapshot(BTreeMap<String, Vec<Record>>);

impl DataStoreSnapshot {
    /// Creates a snapshot from table contents.
    #[must_use]
    pub fn new(tables: BTreeMap<String, Vec<Record>>) -> Self {
        Self(tables)
    }

    /// Returns the records of one table, empty when absent.
    #[must_use]
    pub fn table(&self, table: &str) -> &[Record] {
        self.0.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns all tables keyed by name.
    #[must_use]
    pub fn tables(&self) -> &BTreeMap<String, Vec<Record>> {
        &self.0
    }

    /// Consumes the snapshot into its tables.
    #[must_use]
    pub fn into_tables(self) -> BTreeMap<String, Vec<Record>> {
        self.0
    }
}
