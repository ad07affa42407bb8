/// Collection document codec
///
/// A namespace is persisted as one JSON object:
///
/// ```json
/// { "ids": ["wf-1", "wf-2"], "wf-1": ["wf-1", "Title"], "wf-2": ["wf-2", "Other"] }
/// ```
///
/// `ids` fixes membership and order; every other field is the row stored
/// under that id. Rows are kept as raw JSON until read so that one malformed
/// row never prevents the rest of the collection from loading.

use crate::store::error::{RowDecodeError, StoreError, StoreResult};
use serde_json::{Map, Value};

/// Field holding the ordered id index
pub const IDS_FIELD: &str = "ids";

/// Value used for a namespace slot that was never written
pub const EMPTY_DOCUMENT: &str = "{}";

/// One entity's column values, in insertion order
///
/// The first value is the entity's natural id when the row is inserted
/// through the keyed path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(Vec<String>);

impl Row {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    pub fn natural_id(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn get(&self, column: usize) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn into_values(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn push(&mut self, value: String) {
        self.0.push(value);
    }

    fn to_json(&self) -> Value {
        Value::Array(self.0.iter().cloned().map(Value::String).collect())
    }

    fn from_json(id: &str, value: &Value) -> Result<Self, RowDecodeError> {
        let malformed = |reason: String| RowDecodeError {
            id: id.to_string(),
            reason,
        };

        let items = value
            .as_array()
            .ok_or_else(|| malformed(format!("expected array, found {}", kind(value))))?;

        items
            .iter()
            .enumerate()
            .map(|(column, item)| {
                scalar_to_string(item)
                    .ok_or_else(|| malformed(format!("column {} is {}", column, kind(item))))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Row)
    }
}

impl From<Vec<String>> for Row {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl From<Vec<&str>> for Row {
    fn from(values: Vec<&str>) -> Self {
        Self(values.into_iter().map(str::to_string).collect())
    }
}

/// Decoded form of one namespace slot
#[derive(Debug, Clone, Default)]
pub struct CollectionDocument {
    ids: Vec<String>,
    rows: Map<String, Value>,
}

impl CollectionDocument {
    /// Parse a slot value
    ///
    /// Fails only on structural problems: invalid JSON, a non-object root,
    /// or an `ids` field that is not an array of scalars. A missing `ids`
    /// field is an empty collection.
    pub fn decode(namespace: &str, raw: &str) -> StoreResult<Self> {
        let root: Value = serde_json::from_str(raw)
            .map_err(|e| StoreError::decode(namespace, e.to_string()))?;

        let mut fields = match root {
            Value::Object(fields) => fields,
            other => {
                return Err(StoreError::decode(
                    namespace,
                    format!("expected object, found {}", kind(&other)),
                ));
            }
        };

        let mut ids: Vec<String> = Vec::new();
        match fields.remove(IDS_FIELD) {
            None => {}
            Some(Value::Array(items)) => {
                for item in &items {
                    let id = scalar_to_string(item).ok_or_else(|| {
                        StoreError::decode(namespace, format!("id entry is {}", kind(item)))
                    })?;
                    if ids.iter().any(|existing| same_id(existing, &id)) {
                        tracing::warn!("Namespace '{}' lists id '{}' twice, keeping first", namespace, id);
                        continue;
                    }
                    ids.push(id);
                }
            }
            Some(other) => {
                return Err(StoreError::decode(
                    namespace,
                    format!("'{}' is {}, expected array", IDS_FIELD, kind(&other)),
                ));
            }
        }

        Ok(Self { ids, rows: fields })
    }

    /// Serialise for the substrate
    ///
    /// Only rows whose id is indexed are written, and only indexed ids that
    /// have a row, so a written document is always symmetric.
    pub fn encode(&self, namespace: &str) -> String {
        let mut out = Map::new();
        let mut ids = Vec::with_capacity(self.ids.len());

        for id in &self.ids {
            match self.rows.get(id) {
                Some(row) => {
                    ids.push(Value::String(id.clone()));
                    out.insert(id.clone(), row.clone());
                }
                None => tracing::warn!("Dropping id '{}' without a row from '{}'", id, namespace),
            }
        }

        let orphans = self.rows.len() - out.len();
        if orphans > 0 {
            tracing::warn!("Dropping {} orphan row field(s) from '{}'", orphans, namespace);
        }

        out.insert(IDS_FIELD.to_string(), Value::Array(ids));
        Value::Object(out).to_string()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Index position of `id`, compared case-insensitively
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|existing| same_id(existing, id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Decode the row stored for `id`
    ///
    /// `None` when the id is not indexed.
    pub fn row(&self, id: &str) -> Option<Result<Row, RowDecodeError>> {
        let stored = &self.ids[self.position(id)?];
        Some(self.decode_row(stored))
    }

    /// Every indexed row in stored order, decoded independently
    pub fn rows(&self) -> impl Iterator<Item = (&str, Result<Row, RowDecodeError>)> + '_ {
        self.ids.iter().map(move |id| (id.as_str(), self.decode_row(id)))
    }

    /// Store `row` under `id`, appending `id` to the index if absent
    ///
    /// An id already indexed under a different case keeps its stored spelling.
    pub fn upsert(&mut self, id: &str, row: &Row) {
        let key = match self.position(id) {
            Some(pos) => self.ids[pos].clone(),
            None => {
                self.ids.push(id.to_string());
                id.to_string()
            }
        };
        self.rows.insert(key, row.to_json());
    }

    /// Remove `id` from the index together with its row field
    pub fn remove(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(pos) => {
                let stored = self.ids.remove(pos);
                self.rows.remove(&stored);
                true
            }
            None => false,
        }
    }

    /// Drop every id and row, returning how many ids were indexed
    pub fn clear(&mut self) -> usize {
        let removed = self.ids.len();
        self.ids.clear();
        self.rows.clear();
        removed
    }

    fn decode_row(&self, id: &str) -> Result<Row, RowDecodeError> {
        match self.rows.get(id) {
            Some(value) => Row::from_json(id, value),
            None => Err(RowDecodeError {
                id: id.to_string(),
                reason: "row field is missing".to_string(),
            }),
        }
    }
}

/// Ids are compared without regard to case
pub fn same_id(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
