//! Synthetic example payloads for request-body editors

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::resolver::SchemaResolver;
use crate::types::{ComponentRegistry, Schema, SchemaType};

/// Depth past which synthesis yields `null`
pub const MAX_EXAMPLE_DEPTH: usize = 10;

const PLACEHOLDER_STRING: &str = "string";
const PLACEHOLDER_EMAIL: &str = "user@example.com";

/// Produces one representative JSON value for a schema.
///
/// Explicit `example`s always win. Otherwise the value is generated from the
/// schema shape: enums pick their first member, formats pick a matching
/// literal, numbers sit on their lower bound, `oneOf`/`anyOf` use the first
/// alternative only.
#[derive(Debug, Clone, Copy)]
pub struct ExampleSynthesizer<'a> {
    resolver: SchemaResolver<'a>,
    max_depth: usize,
    /// Fixed clock for `date-time`/`date` values; `None` reads the system clock
    now: Option<DateTime<Utc>>,
}

impl<'a> ExampleSynthesizer<'a> {
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        Self::with_resolver(SchemaResolver::new(registry))
    }

    pub fn with_resolver(resolver: SchemaResolver<'a>) -> Self {
        Self {
            resolver,
            max_depth: MAX_EXAMPLE_DEPTH,
            now: None,
        }
    }

    /// Pin the timestamp used for date formats
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Synthesize an example for a schema
    pub fn synthesize(&self, schema: &Schema) -> Value {
        self.synthesize_at(schema, 0)
    }

    /// Synthesize an example for an optional schema; absence yields `null`
    pub fn synthesize_opt(&self, schema: Option<&Schema>) -> Value {
        schema.map_or(Value::Null, |s| self.synthesize(s))
    }

    /// Synthesize starting from an explicit recursion depth
    pub fn synthesize_at(&self, schema: &Schema, depth: usize) -> Value {
        if depth > self.max_depth {
            return Value::Null;
        }

        let node = self.resolver.dereference(schema);

        // An example written next to a $ref beats the target's own
        if let Some(example) = schema.example.as_ref().or(node.example.as_ref()) {
            return example.clone();
        }

        if !node.all_of.is_empty() {
            return self.merge_all_of(node, depth);
        }

        if let Some(first) = node.one_of.first().or_else(|| node.any_of.first()) {
            return self.synthesize_at(first, depth + 1);
        }

        if node.is_object() {
            if node.properties.is_empty() {
                return Value::Null;
            }
            return Value::Object(self.synthesize_properties(node, depth));
        }

        if node.is_array() {
            return match &node.items {
                Some(items) => Value::Array(vec![self.synthesize_at(items, depth + 1)]),
                None => Value::Array(Vec::new()),
            };
        }

        match node.schema_type {
            Some(SchemaType::String) => self.string_example(node),
            None if !node.enum_values.is_empty() => self.string_example(node),
            Some(SchemaType::Number) | Some(SchemaType::Integer) => numeric_example(node),
            Some(SchemaType::Boolean) => Value::Bool(false),
            _ => Value::Null,
        }
    }

    fn synthesize_properties(&self, node: &Schema, depth: usize) -> Map<String, Value> {
        node.properties
            .iter()
            .map(|(name, prop)| (name.clone(), self.synthesize_at(prop, depth + 1)))
            .collect()
    }

    fn merge_all_of(&self, node: &Schema, depth: usize) -> Value {
        let mut merged = self.synthesize_properties(node, depth);
        for branch in &node.all_of {
            // Non-object branches have nothing to contribute to the merge
            if let Value::Object(fields) = self.synthesize_at(branch, depth + 1) {
                merged.extend(fields);
            }
        }
        Value::Object(merged)
    }

    fn string_example(&self, node: &Schema) -> Value {
        if let Some(first) = node.enum_values.first() {
            return first.clone();
        }

        match node.format.as_deref() {
            Some("date-time") => {
                return Value::String(self.now().to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Some("date") => return Value::String(self.now().format("%Y-%m-%d").to_string()),
            Some("email") => return Value::String(PLACEHOLDER_EMAIL.to_string()),
            Some("uuid") => return Value::String(Uuid::nil().to_string()),
            _ => {}
        }

        match node.max_length {
            Some(max) => Value::String(
                PLACEHOLDER_STRING
                    .chars()
                    .take(usize::try_from(max).unwrap_or(usize::MAX))
                    .collect(),
            ),
            None => Value::String(PLACEHOLDER_STRING.to_string()),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

/// `minimum` when set, else the smaller of 0 and `maximum`, else 0
fn numeric_example(node: &Schema) -> Value {
    if let Some(minimum) = &node.minimum {
        return Value::Number(minimum.clone());
    }
    if let Some(maximum) = &node.maximum {
        if maximum.as_f64().is_some_and(|max| max < 0.0) {
            return Value::Number(maximum.clone());
        }
    }
    Value::from(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn synth(value: Value) -> Value {
        let registry = ComponentRegistry::default();
        ExampleSynthesizer::new(&registry).synthesize(&Schema::from_value(value))
    }

    #[test]
    fn test_string_enum_picks_first() {
        assert_eq!(synth(json!({"type": "string", "enum": ["x", "y"]})), json!("x"));
    }

    #[test]
    fn test_integer_bounds() {
        assert_eq!(synth(json!({"type": "integer", "minimum": 5})), json!(5));
        assert_eq!(synth(json!({"type": "integer"})), json!(0));
        assert_eq!(synth(json!({"type": "integer", "maximum": -3})), json!(-3));
        assert_eq!(synth(json!({"type": "integer", "maximum": 40})), json!(0));
        assert_eq!(synth(json!({"type": "number", "minimum": 1.5})), json!(1.5));
    }

    #[test]
    fn test_array_of_booleans() {
        assert_eq!(
            synth(json!({"type": "array", "items": {"type": "boolean"}})),
            json!([false])
        );
        assert_eq!(synth(json!({"type": "array"})), json!([]));
    }

    #[test]
    fn test_explicit_example_wins() {
        assert_eq!(
            synth(json!({"type": "string", "format": "email", "example": "ana@comlink.com.br"})),
            json!("ana@comlink.com.br")
        );
        assert_eq!(
            synth(json!({"type": "object", "properties": {"a": {"type": "string"}}, "example": {"a": "b"}})),
            json!({"a": "b"})
        );
    }

    #[test]
    fn test_string_formats() {
        let registry = ComponentRegistry::default();
        let now = Utc.with_ymd_and_hms(2025, 8, 25, 13, 9, 1).unwrap();
        let synthesizer = ExampleSynthesizer::new(&registry).at(now);

        let date_time = Schema::from_value(json!({"type": "string", "format": "date-time"}));
        assert_eq!(synthesizer.synthesize(&date_time), json!("2025-08-25T13:09:01.000Z"));

        let date = Schema::from_value(json!({"type": "string", "format": "date"}));
        assert_eq!(synthesizer.synthesize(&date), json!("2025-08-25"));

        assert_eq!(
            synth(json!({"type": "string", "format": "email"})),
            json!("user@example.com")
        );
        assert_eq!(
            synth(json!({"type": "string", "format": "uuid"})),
            json!("00000000-0000-0000-0000-000000000000")
        );
    }

    #[test]
    fn test_plain_strings() {
        assert_eq!(synth(json!({"type": "string"})), json!("string"));
        assert_eq!(synth(json!({"type": "string", "maxLength": 3})), json!("str"));
        assert_eq!(synth(json!({"type": "string", "maxLength": 40})), json!("string"));
        // No format: never a timestamp
        assert_eq!(synth(json!({"type": "string", "format": "byte"})), json!("string"));
    }

    #[test]
    fn test_object_with_properties() {
        assert_eq!(
            synth(json!({
                "type": "object",
                "properties": {
                    "ID": {"type": "number"},
                    "Nome": {"type": "string"},
                    "Ativo": {"type": "boolean"}
                }
            })),
            json!({"ID": 0, "Nome": "string", "Ativo": false})
        );
    }

    #[test]
    fn test_unclassifiable_nodes_are_null() {
        assert_eq!(synth(json!({})), Value::Null);
        assert_eq!(synth(json!({"type": "object"})), Value::Null);
        assert_eq!(synth(json!({"type": "null"})), Value::Null);
    }

    #[test]
    fn test_absent_schema_is_null() {
        let registry = ComponentRegistry::default();
        assert_eq!(ExampleSynthesizer::new(&registry).synthesize_opt(None), Value::Null);
    }

    #[test]
    fn test_all_of_merges_objects() {
        assert_eq!(
            synth(json!({
                "allOf": [
                    {"type": "object", "properties": {"a": {"type": "string"}}},
                    {"type": "string"},
                    {"type": "object", "properties": {"b": {"type": "integer", "minimum": 2}}}
                ]
            })),
            json!({"a": "string", "b": 2})
        );
    }

    #[test]
    fn test_one_of_uses_first_alternative() {
        assert_eq!(
            synth(json!({"oneOf": [{"type": "integer", "minimum": 7}, {"type": "string"}]})),
            json!(7)
        );
        assert_eq!(
            synth(json!({"anyOf": [{"type": "boolean"}, {"type": "string"}]})),
            json!(false)
        );
    }

    #[test]
    fn test_refs_are_followed() {
        let registry: ComponentRegistry = serde_json::from_value(json!({
            "Parcela": {
                "type": "object",
                "properties": {
                    "DiaParcela": {"type": "integer"},
                    "PercentualParcela": {"type": "number", "example": 100}
                }
            }
        }))
        .unwrap();

        let schema = Schema::from_value(json!({
            "type": "array",
            "items": {"$ref": "#/components/schemas/Parcela"}
        }));

        assert_eq!(
            ExampleSynthesizer::new(&registry).synthesize(&schema),
            json!([{"DiaParcela": 0, "PercentualParcela": 100}])
        );
    }

    #[test]
    fn test_recursion_stops_at_ceiling() {
        let registry: ComponentRegistry = serde_json::from_value(json!({
            "Node": {
                "type": "object",
                "properties": {
                    "child": {"$ref": "#/components/schemas/Node"}
                }
            }
        }))
        .unwrap();

        let value = ExampleSynthesizer::new(&registry)
            .synthesize(&Schema::reference("#/components/schemas/Node"));

        let mut objects = 0;
        let mut current = &value;
        while let Some(fields) = current.as_object() {
            objects += 1;
            current = &fields["child"];
        }

        assert_eq!(objects, MAX_EXAMPLE_DEPTH + 1);
        assert_eq!(*current, Value::Null);
    }
}
