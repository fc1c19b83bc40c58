//! Flattened field listings for documentation and forms

use serde::Serialize;
use serde_json::{Number, Value};

use crate::resolver::SchemaResolver;
use crate::types::{ComponentRegistry, Schema};

/// One property of an object schema, flattened for display.
///
/// Nested properties are named with dotted paths (`Cabecalho.CNPJ`), and
/// properties of array elements with an index (`Itens[0].Quantidade`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub description: Option<String>,
    pub required: bool,
    pub example: Option<Value>,
    pub format: Option<String>,
    pub is_nested: bool,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub pattern: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
}

/// Walks an object schema and lists its fields in property order
#[derive(Debug, Clone, Copy)]
pub struct FieldIntrospector<'a> {
    resolver: SchemaResolver<'a>,
}

impl<'a> FieldIntrospector<'a> {
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        Self::with_resolver(SchemaResolver::new(registry))
    }

    pub fn with_resolver(resolver: SchemaResolver<'a>) -> Self {
        Self { resolver }
    }

    /// List the fields of a schema. Anything that is not an object with
    /// properties yields an empty list.
    pub fn fields(&self, schema: &Schema) -> Vec<FieldDescriptor> {
        self.fields_with_prefix(schema, "")
    }

    /// List the fields of a schema with every name qualified by `prefix`
    pub fn fields_with_prefix(&self, schema: &Schema, prefix: &str) -> Vec<FieldDescriptor> {
        let mut fields = Vec::new();
        let (root, depth) = self.expand(schema, 0);
        self.collect(&root, prefix, depth, &mut fields);
        fields
    }

    /// `parent` has already been expanded at `depth`. Every property costs one
    /// level and every `$ref` hop another, the same budget `resolve` spends, so
    /// the listing covers exactly the fields of the resolved schema.
    fn collect(&self, parent: &Schema, prefix: &str, depth: usize, out: &mut Vec<FieldDescriptor>) {
        if !parent.is_object() || parent.properties.is_empty() {
            return;
        }

        for (key, raw) in &parent.properties {
            let (prop, prop_depth) = self.expand(raw, depth + 1);
            let name = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };

            // Past the ceiling a `$ref` stays unexpanded; describe its target
            let shown = self.resolver.dereference(&prop);
            out.push(FieldDescriptor {
                name: name.clone(),
                field_type: shown.type_name().unwrap_or("string").to_string(),
                description: raw.description.clone().or_else(|| shown.description.clone()),
                required: parent.requires(key),
                example: raw.example.clone().or_else(|| shown.example.clone()),
                format: shown.format.clone(),
                is_nested: !prefix.is_empty(),
                min_length: shown.min_length,
                max_length: shown.max_length,
                minimum: shown.minimum.clone(),
                maximum: shown.maximum.clone(),
                pattern: shown.pattern.clone(),
                enum_values: shown.enum_values.clone(),
            });

            if prop.is_object() && !prop.properties.is_empty() {
                self.collect(&prop, &name, prop_depth, out);
            } else if prop.is_array() {
                // One representative element; arrays of arrays are not expanded
                if let Some(items) = &prop.items {
                    let (item, item_depth) = self.expand(items, prop_depth + 1);
                    if item.is_object() && !item.properties.is_empty() {
                        self.collect(&item, &format!("{}[0]", name), item_depth, out);
                    }
                }
            }
        }
    }

    /// Follow `$ref`s, merge `allOf` and reduce `oneOf`/`anyOf` to the first
    /// alternative. Returns the node with the depth it was reached at; past
    /// the ceiling the node comes back as written.
    fn expand(&self, schema: &Schema, mut depth: usize) -> (Schema, usize) {
        let max_depth = self.resolver.max_depth();
        let registry = self.resolver.registry();

        let mut node = schema;
        while depth <= max_depth {
            let Some(target) = node.reference.as_deref().and_then(|r| registry.lookup(r)) else {
                break;
            };
            node = target;
            depth += 1;
        }
        if depth > max_depth {
            return (node.clone(), depth);
        }

        let merged = self.resolver.resolve_shallow_at(node, depth);
        if merged.type_name().is_some() {
            return (merged, depth);
        }

        match merged.one_of.first().or_else(|| merged.any_of.first()) {
            Some(first) => {
                let (mut alternative, depth) = self.expand(first, depth + 1);
                if alternative.description.is_none() {
                    alternative.description = merged.description;
                }
                (alternative, depth)
            }
            None => (merged, depth),
        }
    }
}
