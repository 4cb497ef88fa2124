//! Operation builder
//!
//! Statement parsers collect the pieces of an operation here and `build`
//! checks that a collection was found before assembling the result.

use crate::core::errors::{Result, TranslateError};
use crate::core::operation::{Document, Filter, Operation, OperationKind, OrderSpec, ProjectionSpec, UpdateSpec};

#[derive(Debug, Clone)]
pub struct OperationBuilder {
    kind: OperationKind,
    collection: Option<String>,
    document: Option<Document>,
    filter: Filter,
    update: Option<UpdateSpec>,
    sort: Option<OrderSpec>,
    projection: Option<ProjectionSpec>,
    limit: Option<u64>,
}

impl OperationBuilder {
    pub fn new(kind: OperationKind) -> Self {
        OperationBuilder {
            kind,
            collection: None,
            document: None,
            filter: Filter::new(),
            update: None,
            sort: None,
            projection: None,
            limit: None,
        }
    }

    pub fn collection<S: Into<String>>(mut self, collection: S) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Use `collection` when one is given, else keep what is already set
    pub fn collection_or(mut self, collection: Option<String>) -> Self {
        if collection.is_some() {
            self.collection = collection;
        }
        self
    }

    pub fn document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn update(mut self, update: UpdateSpec) -> Self {
        self.update = Some(update);
        self
    }

    pub fn sort(mut self, sort: OrderSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn projection(mut self, projection: ProjectionSpec) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Assemble the operation.
    ///
    /// Fails with `MissingCollection` when no collection was set. Empty
    /// sort and projection specs are dropped.
    pub fn build(self) -> Result<Operation> {
        let collection = match self.collection {
            Some(c) if !c.is_empty() => c,
            _ => return Err(TranslateError::MissingCollection(self.kind.to_string())),
        };

        let operation = match self.kind {
            OperationKind::Insert => Operation::Insert {
                collection,
                document: self.document.ok_or_else(|| {
                    TranslateError::MalformedLiteral("insert without a document".to_string())
                })?,
            },
            OperationKind::Read => Operation::Find {
                collection,
                filter: self.filter,
                sort: self.sort.filter(|s| !s.is_empty()),
                projection: self.projection.filter(|p| !p.is_empty()),
                limit: self.limit,
            },
            OperationKind::Update => Operation::Update {
                collection,
                filter: self.filter,
                update: self.update.ok_or_else(|| {
                    TranslateError::MalformedLiteral("update without a replacement".to_string())
                })?,
            },
            OperationKind::Delete => Operation::Delete {
                collection,
                filter: self.filter,
            },
        };

        Ok(operation)
    }
}
