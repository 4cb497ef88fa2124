//! Canonical operations
//!
//! The dialect-independent result of a translation, shaped after the
//! document-store driver calls it stands for.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Map;

/// JSON-equivalent document model (key order is preserved)
pub type Document = serde_json::Value;

/// Update modifiers recognised in an update literal
pub const MODIFIERS: &[&str] = &[
    "$set",
    "$unset",
    "$inc",
    "$mul",
    "$min",
    "$max",
    "$rename",
    "$push",
    "$pull",
    "$pullAll",
    "$addToSet",
    "$pop",
    "$currentDate",
    "$setOnInsert",
];

/// Check whether a key is a recognised update modifier
pub fn is_modifier(key: &str) -> bool {
    MODIFIERS.contains(&key)
}

/// The four CRUD kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Insert,
    Read,
    Update,
    Delete,
}

impl OperationKind {
    /// Name of the driver call in the serialized operation
    pub fn operation_name(&self) -> &'static str {
        match self {
            OperationKind::Insert => "insert",
            OperationKind::Read => "find",
            OperationKind::Update => "updateMany",
            OperationKind::Delete => "deleteMany",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Insert => "insert",
            OperationKind::Read => "read",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        };
        write!(f, "{}", name)
    }
}

/// Field path to condition mapping; top-level keys are ANDed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Map<String, Document>);

impl Filter {
    /// Create an empty (match-all) filter
    pub fn new() -> Self {
        Filter(Map::new())
    }

    /// Wrap an already-built filter document
    pub fn from_map(map: Map<String, Document>) -> Self {
        Filter(map)
    }

    /// Add a condition; a later condition on the same field replaces the
    /// earlier one and the replaced condition is returned
    pub fn insert<S: Into<String>>(&mut self, field: S, condition: Document) -> Option<Document> {
        self.0.insert(field.into(), condition)
    }

    pub fn get(&self, field: &str) -> Option<&Document> {
        self.0.get(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Document)> {
        self.0.iter()
    }

    pub fn into_document(self) -> Document {
        Document::Object(self.0)
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Modifier name to field/value mapping
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSpec(Map<String, Document>);

impl UpdateSpec {
    /// `{"$set": {field: value}}`
    pub fn set_field<S: Into<String>>(field: S, value: Document) -> Self {
        let mut fields = Map::new();
        fields.insert(field.into(), value);
        Self::set_document(Document::Object(fields))
    }

    /// `{"$set": value}` for a whole replacement value
    pub fn set_document(value: Document) -> Self {
        let mut spec = Map::new();
        spec.insert("$set".to_string(), value);
        UpdateSpec(spec)
    }

    /// Use an update literal verbatim when it already names a modifier,
    /// otherwise wrap the whole literal under `$set`
    pub fn from_literal(literal: Document) -> Self {
        match literal {
            Document::Object(map) if map.keys().any(|k| is_modifier(k)) => UpdateSpec(map),
            other => Self::set_document(other),
        }
    }

    pub fn into_document(self) -> Document {
        Document::Object(self.0)
    }
}

impl Serialize for UpdateSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Sort direction of one ordering key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// Ordered field to direction mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSpec {
    keys: Vec<(String, SortDirection)>,
}

impl OrderSpec {
    pub fn new() -> Self {
        OrderSpec { keys: Vec::new() }
    }

    /// Add a key; a repeated field keeps its first position but takes the
    /// later direction
    pub fn push<S: Into<String>>(&mut self, field: S, direction: SortDirection) {
        let field = field.into();
        match self.keys.iter_mut().find(|(existing, _)| *existing == field) {
            Some(entry) => entry.1 = direction,
            None => self.keys.push((field, direction)),
        }
    }

    pub fn direction(&self, field: &str) -> Option<SortDirection> {
        self.keys
            .iter()
            .find(|(existing, _)| existing == field)
            .map(|(_, direction)| *direction)
    }

    pub fn keys(&self) -> &[(String, SortDirection)] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Serialize for OrderSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.keys.len()))?;
        for (field, direction) in &self.keys {
            map.serialize_entry(field, &direction.as_i32())?;
        }
        map.end()
    }
}

/// Ordered field inclusion/exclusion mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionSpec {
    fields: Vec<(String, bool)>,
}

impl ProjectionSpec {
    pub fn new() -> Self {
        ProjectionSpec { fields: Vec::new() }
    }

    /// Build a projection from explicitly referenced fields: each one is
    /// included, and the identifier field is excluded unless referenced
    pub fn including<I, S>(fields: I, id_field: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut projection = ProjectionSpec::new();
        for field in fields {
            projection.set(field, true);
        }
        if !projection.is_empty() && projection.get(id_field).is_none() {
            projection.set(id_field, false);
        }
        projection
    }

    pub fn set<S: Into<String>>(&mut self, field: S, included: bool) {
        let field = field.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == field) {
            Some(entry) => entry.1 = included,
            None => self.fields.push((field, included)),
        }
    }

    pub fn get(&self, field: &str) -> Option<bool> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == field)
            .map(|(_, included)| *included)
    }

    pub fn fields(&self) -> &[(String, bool)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for ProjectionSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, included) in &self.fields {
            map.serialize_entry(field, &i32::from(*included))?;
        }
        map.end()
    }
}

/// A canonical operation, one variant per CRUD kind
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Insert {
        collection: String,
        document: Document,
    },
    Find {
        collection: String,
        filter: Filter,
        sort: Option<OrderSpec>,
        projection: Option<ProjectionSpec>,
        limit: Option<u64>,
    },
    Update {
        collection: String,
        filter: Filter,
        update: UpdateSpec,
    },
    Delete {
        collection: String,
        filter: Filter,
    },
}

impl Operation {
    /// Get the target collection
    pub fn collection(&self) -> &str {
        match self {
            Operation::Insert { collection, .. }
            | Operation::Find { collection, .. }
            | Operation::Update { collection, .. }
            | Operation::Delete { collection, .. } => collection,
        }
    }

    /// Get the CRUD kind
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Insert { .. } => OperationKind::Insert,
            Operation::Find { .. } => OperationKind::Read,
            Operation::Update { .. } => OperationKind::Update,
            Operation::Delete { .. } => OperationKind::Delete,
        }
    }

    /// Get the filter, for the kinds that carry one
    pub fn filter(&self) -> Option<&Filter> {
        match self {
            Operation::Insert { .. } => None,
            Operation::Find { filter, .. }
            | Operation::Update { filter, .. }
            | Operation::Delete { filter, .. } => Some(filter),
        }
    }

    /// Serialize into the canonical operation document
    pub fn to_document(&self) -> Document {
        serde_json::to_value(self).unwrap_or(Document::Null)
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("collection", self.collection())?;
        map.serialize_entry("operation", self.kind().operation_name())?;

        match self {
            Operation::Insert { document, .. } => {
                map.serialize_entry("document", document)?;
            }
            Operation::Find { filter, sort, projection, limit, .. } => {
                map.serialize_entry("filter", filter)?;
                if let Some(sort) = sort {
                    map.serialize_entry("sort", sort)?;
                }
                if let Some(projection) = projection {
                    map.serialize_entry("projection", projection)?;
                }
                if let Some(limit) = limit {
                    map.serialize_entry("limit", limit)?;
                }
            }
            Operation::Update { filter, update, .. } => {
                map.serialize_entry("filter", filter)?;
                map.serialize_entry("update", update)?;
            }
            Operation::Delete { filter, .. } => {
                map.serialize_entry("filter", filter)?;
            }
        }

        map.end()
    }
}
