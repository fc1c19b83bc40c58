//! Type definitions for parsed OpenAPI documents

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// Prefix of references into `components.schemas`
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Prefix of Swagger 2 style references, accepted for older documents
pub const DEFINITIONS_REF_PREFIX: &str = "#/definitions/";

/// Prefix of references into `components.parameters`
pub const PARAMETER_REF_PREFIX: &str = "#/components/parameters/";

/// Primitive and structural JSON Schema types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::Null => "null",
        }
    }

    /// Map a type keyword to a variant; unknown names yield `None`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(SchemaType::String),
            "number" => Some(SchemaType::Number),
            "integer" => Some(SchemaType::Integer),
            "boolean" => Some(SchemaType::Boolean),
            "object" => Some(SchemaType::Object),
            "array" => Some(SchemaType::Array),
            "null" => Some(SchemaType::Null),
            _ => None,
        }
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One OpenAPI schema fragment.
///
/// The keywords the explorer understands are typed fields; every other
/// keyword (`nullable`, `default`, `additionalProperties`, `x-*` ...) is kept
/// verbatim in [`Schema::extensions`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Pointer to a named schema in the component registry
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Declared type. OpenAPI 3.1 type arrays collapse to their first non-null entry.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_schema_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_type: Option<SchemaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Format hint (`date-time`, `email`, `uuid`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(
        default,
        deserialize_with = "deserialize_string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub required: Vec<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,
    /// Keywords without a typed field
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl Schema {
    /// Shorthand for a bare `{"type": ...}` node
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    /// Shorthand for a `{"$ref": ...}` node
    pub fn reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    /// Build a schema from an arbitrary JSON value, falling back to an empty node
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// True for `type: object`, or an untyped node that declares properties
    pub fn is_object(&self) -> bool {
        match self.schema_type {
            Some(SchemaType::Object) => true,
            None => !self.properties.is_empty(),
            _ => false,
        }
    }

    /// True for `type: array`, or an untyped node that declares items
    pub fn is_array(&self) -> bool {
        match self.schema_type {
            Some(SchemaType::Array) => true,
            None => self.items.is_some(),
            _ => false,
        }
    }

    /// The effective type name, inferring `object`/`array` from shape
    pub fn type_name(&self) -> Option<&'static str> {
        match self.schema_type {
            Some(t) => Some(t.as_str()),
            None if self.is_object() => Some("object"),
            None if self.is_array() => Some("array"),
            None => None,
        }
    }

    /// Whether a property is listed in `required`
    pub fn requires(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}

fn deserialize_schema_type<'de, D>(deserializer: D) -> Result<Option<SchemaType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(name)) => SchemaType::from_name(&name),
        Some(Value::Array(names)) => {
            let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
            names
                .iter()
                .find(|n| **n != "null")
                .or_else(|| names.first())
                .and_then(|n| SchemaType::from_name(n))
        }
        _ => None,
    })
}

// Some generators emit `required: true` on property schemas; treat anything
// other than a list of names as "nothing required".
fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    })
}

/// Named, reusable schemas from `components.schemas`.
///
/// Populated once per document load and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentRegistry {
    schemas: IndexMap<String, Schema>,
}

impl ComponentRegistry {
    pub fn new(schemas: IndexMap<String, Schema>) -> Self {
        Self { schemas }
    }

    /// Get a schema by its component name
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Look up the target of a `$ref` string
    pub fn lookup(&self, reference: &str) -> Option<&Schema> {
        reference
            .strip_prefix(SCHEMA_REF_PREFIX)
            .or_else(|| reference.strip_prefix(DEFINITIONS_REF_PREFIX))
            .and_then(|name| self.schemas.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Schema)> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl FromIterator<(String, Schema)> for ComponentRegistry {
    fn from_iter<I: IntoIterator<Item = (String, Schema)>>(iter: I) -> Self {
        Self {
            schemas: iter.into_iter().collect(),
        }
    }
}

/// HTTP methods supported by OpenAPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Methods whose test requests carry a JSON body
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "TRACE" => Ok(HttpMethod::Trace),
            other => Err(format!("unknown HTTP method: {}", other)),
        }
    }
}

/// Parameter location in HTTP request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A parameter for an endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Where the parameter is located
    pub location: ParameterLocation,
    /// Whether the parameter is required
    pub required: bool,
    /// Parameter description
    pub description: Option<String>,
    /// Schema for the parameter value
    pub schema: Option<Schema>,
    /// Example value
    pub example: Option<Value>,
    /// Whether the parameter is deprecated
    pub deprecated: bool,
}

impl Parameter {
    /// Declared type of the parameter, `string` when the schema is silent
    pub fn type_name(&self) -> &str {
        self.schema
            .as_ref()
            .and_then(Schema::type_name)
            .unwrap_or("string")
    }

    /// Example from the parameter itself, else from its schema
    pub fn example(&self) -> Option<&Value> {
        self.example
            .as_ref()
            .or_else(|| self.schema.as_ref().and_then(|s| s.example.as_ref()))
    }
}

/// Request body of an endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    /// Whether the body is required
    pub required: bool,
    /// Content type (e.g., "application/json")
    pub content_type: String,
    /// Schema of the body
    pub schema: Option<Schema>,
    /// Media-level example
    pub example: Option<Value>,
    /// Description
    pub description: Option<String>,
}

/// Documented response for one status code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSpec {
    /// HTTP status code (or `default`)
    pub status_code: String,
    /// Description
    pub description: Option<String>,
    /// Content type
    pub content_type: Option<String>,
    /// Schema of the response body
    pub schema: Option<Schema>,
    /// Media-level example
    pub example: Option<Value>,
}

/// A single endpoint extracted from the document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    /// Operation ID (from the document or generated)
    pub id: String,
    /// HTTP method
    pub method: HttpMethod,
    /// URL path template (e.g., "/pedido/pedidoweb/{numeroPedido}")
    pub path: String,
    /// Short summary
    pub summary: Option<String>,
    /// Full description
    pub description: Option<String>,
    /// Tags for grouping
    pub tags: Vec<String>,
    /// Whether the endpoint is deprecated
    pub deprecated: bool,
    /// Parameters (path, query, header, cookie)
    pub parameters: Vec<Parameter>,
    /// Request body
    pub request_body: Option<RequestBody>,
    /// Responses in document order
    pub responses: Vec<ResponseSpec>,
}

impl Endpoint {
    /// Group the endpoint is listed under
    pub fn tag(&self) -> &str {
        self.tags.first().map(String::as_str).unwrap_or("Other")
    }

    /// `METHOD /path`
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(move |p| p.location == location)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn response(&self, status_code: &str) -> Option<&ResponseSpec> {
        self.responses.iter().find(|r| r.status_code == status_code)
    }
}

/// Server information from the document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server URL
    pub url: String,
    /// Server description
    pub description: Option<String>,
}

/// Parsed OpenAPI document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiDocument {
    /// OpenAPI version string
    pub openapi: String,
    /// API title
    pub title: String,
    /// API description
    pub description: Option<String>,
    /// API version
    pub version: String,
    /// Server URLs
    pub servers: Vec<ServerInfo>,
    /// All extracted endpoints
    pub endpoints: Vec<Endpoint>,
    /// Component schemas referenced by `$ref`
    pub components: ComponentRegistry,
}

impl ApiDocument {
    /// URL of the first declared server
    pub fn default_server_url(&self) -> Option<&str> {
        self.servers.first().map(|s| s.url.as_str())
    }
}

// --- Raw OpenAPI 3.x structures for parsing ---

/// Raw OpenAPI document structure
#[derive(Debug, Clone, Deserialize)]
pub struct RawOpenApiSpec {
    pub openapi: String,
    pub info: RawInfo,
    #[serde(default)]
    pub servers: Vec<RawServer>,
    #[serde(default)]
    pub paths: IndexMap<String, RawPathItem>,
    #[serde(default)]
    pub components: Option<RawComponents>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawInfo {
    pub title: String,
    pub description: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawServer {
    pub url: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPathItem {
    pub get: Option<RawOperation>,
    pub post: Option<RawOperation>,
    pub put: Option<RawOperation>,
    pub patch: Option<RawOperation>,
    pub delete: Option<RawOperation>,
    pub head: Option<RawOperation>,
    pub options: Option<RawOperation>,
    pub trace: Option<RawOperation>,
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOperation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
    pub request_body: Option<RawRequestBody>,
    #[serde(default)]
    pub responses: IndexMap<String, RawResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawParameter {
    /// Parameter name (absent when $ref is used)
    #[serde(default)]
    pub name: String,
    /// Parameter location (absent when $ref is used)
    #[serde(rename = "in", default)]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    pub description: Option<String>,
    pub schema: Option<Schema>,
    pub example: Option<Value>,
    #[serde(default)]
    pub deprecated: bool,
    /// Reference to a parameter in components/parameters
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRequestBody {
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub content: IndexMap<String, RawMediaType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMediaType {
    pub schema: Option<Schema>,
    pub example: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawResponse {
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<IndexMap<String, RawMediaType>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawComponents {
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,
    #[serde(default)]
    pub parameters: IndexMap<String, RawParameter>,
}
