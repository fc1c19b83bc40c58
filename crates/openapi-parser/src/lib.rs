//! # openapi-parser
//!
//! OpenAPI 3.x parser for API Explorer.
//! Loads documents into endpoints plus a component registry, and derives
//! display data from their schemas:
//! - [`SchemaResolver`] dereferences `$ref`s and merges `allOf`
//! - [`ExampleSynthesizer`] builds example payloads
//! - [`FieldIntrospector`] flattens object schemas into field lists

mod types;
mod parser;
mod operations;
mod resolver;
mod example;
mod fields;
mod error;

pub use types::*;
pub use parser::OpenApiParser;
pub use operations::OperationExtractor;
pub use resolver::{SchemaResolver, MAX_RESOLVE_DEPTH};
pub use example::{ExampleSynthesizer, MAX_EXAMPLE_DEPTH};
pub use fields::{FieldDescriptor, FieldIntrospector};
pub use error::{ParseError, ParseResult};
