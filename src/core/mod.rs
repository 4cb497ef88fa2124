pub mod path;
pub mod value;
pub mod operation;
pub mod errors;
pub mod config;


pub use path::{PathExpression, PathError, ID_FIELD};
pub use value::LiteralValue;
pub use operation::{Document, Filter, Operation, OperationKind, OrderSpec, ProjectionSpec, SortDirection, UpdateSpec};
pub use errors::{Result, TranslateError};
pub use config::TranslatorConfig;
