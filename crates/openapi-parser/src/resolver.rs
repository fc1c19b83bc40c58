//! `$ref` and `allOf` resolution for OpenAPI schemas

use crate::types::{ComponentRegistry, Schema, SchemaType};
use tracing::{debug, trace};

/// Depth past which resolution gives up and returns the node as-is
pub const MAX_RESOLVE_DEPTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Descent {
    /// Resolve nested properties and items as well
    Deep,
    /// Stop after dereferencing and merging `allOf` at this node
    Shallow,
}

/// Resolves `$ref` references and flattens `allOf` compositions.
///
/// Resolution is a pure function of the node, the registry and the current
/// depth. Reference cycles are not detected; the depth ceiling bounds them,
/// so output past the ceiling may still carry unresolved `$ref`s.
#[derive(Debug, Clone, Copy)]
pub struct SchemaResolver<'a> {
    /// Component schemas from the OpenAPI document
    registry: &'a ComponentRegistry,
    /// Maximum recursion depth to prevent infinite loops
    max_depth: usize,
}

impl<'a> SchemaResolver<'a> {
    /// Create a new resolver over the given component registry
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        Self {
            registry,
            max_depth: MAX_RESOLVE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn registry(&self) -> &'a ComponentRegistry {
        self.registry
    }

    /// Fully resolve a schema: dereference, merge `allOf`, and recurse into
    /// object properties and array items.
    pub fn resolve(&self, schema: &Schema) -> Schema {
        self.resolve_node(schema, 0, Descent::Deep)
    }

    /// Resolve an optional schema, propagating absence
    pub fn resolve_opt(&self, schema: Option<&Schema>) -> Option<Schema> {
        schema.map(|s| self.resolve(s))
    }

    /// Dereference and merge `allOf` at this node only; nested properties and
    /// items are left as written.
    pub fn resolve_shallow(&self, schema: &Schema) -> Schema {
        self.resolve_node(schema, 0, Descent::Shallow)
    }

    /// Shallow resolution for a node met `depth` levels into an enclosing
    /// walk, so `allOf` branches share that walk's depth budget
    pub fn resolve_shallow_at(&self, schema: &Schema, depth: usize) -> Schema {
        self.resolve_node(schema, depth, Descent::Shallow)
    }

    /// Follow a `$ref` chain to its target without copying anything
    pub fn dereference<'s>(&self, schema: &'s Schema) -> &'s Schema
    where
        'a: 's,
    {
        let registry: &'a ComponentRegistry = self.registry;
        let mut current = schema;
        let mut hops = 0;
        while let Some(reference) = &current.reference {
            if hops >= self.max_depth {
                debug!("Giving up on $ref chain at {} after {} hops", reference, hops);
                break;
            }
            match registry.lookup(reference) {
                Some(target) => current = target,
                None => break,
            }
            hops += 1;
        }
        current
    }

    fn resolve_node(&self, schema: &Schema, depth: usize, descent: Descent) -> Schema {
        if depth > self.max_depth {
            trace!("Resolution depth {} exceeded, returning node unresolved", depth);
            return schema.clone();
        }

        if let Some(reference) = &schema.reference {
            return match self.registry.lookup(reference) {
                Some(target) => self.resolve_node(target, depth + 1, descent),
                None => {
                    debug!("Unresolvable $ref: {}", reference);
                    schema.clone()
                }
            };
        }

        if !schema.all_of.is_empty() {
            return self.merge_all_of(schema, depth, descent);
        }

        if descent == Descent::Shallow {
            return schema.clone();
        }

        if schema.is_object() && !schema.properties.is_empty() {
            let mut resolved = schema.clone();
            for prop in resolved.properties.values_mut() {
                *prop = self.resolve_node(prop, depth + 1, descent);
            }
            return resolved;
        }

        if schema.is_array() {
            if let Some(items) = &schema.items {
                let mut resolved = schema.clone();
                resolved.items = Some(Box::new(self.resolve_node(items, depth + 1, descent)));
                return resolved;
            }
        }

        schema.clone()
    }

    fn merge_all_of(&self, schema: &Schema, depth: usize, descent: Descent) -> Schema {
        let mut base = schema.clone();
        let branches = std::mem::take(&mut base.all_of);

        let mut merged = self.resolve_node(&base, depth, descent);
        for branch in &branches {
            let resolved = self.resolve_node(branch, depth + 1, descent);
            absorb(&mut merged, resolved);
        }

        if merged.schema_type.is_none() && !merged.properties.is_empty() {
            merged.schema_type = Some(SchemaType::Object);
        }
        merged
    }
}

/// Shallow-merge `branch` into `target`: later scalars win, `properties`
/// are unioned with later entries winning, `required` is unioned.
fn absorb(target: &mut Schema, branch: Schema) {
    let Schema {
        reference: _,
        schema_type,
        title,
        description,
        format,
        properties,
        items,
        required,
        enum_values,
        example,
        minimum,
        maximum,
        min_length,
        max_length,
        pattern,
        all_of,
        one_of,
        any_of,
        extensions,
    } = branch;

    fn take<T>(slot: &mut Option<T>, value: Option<T>) {
        if value.is_some() {
            *slot = value;
        }
    }

    take(&mut target.schema_type, schema_type);
    take(&mut target.title, title);
    take(&mut target.description, description);
    take(&mut target.format, format);
    take(&mut target.items, items);
    take(&mut target.example, example);
    take(&mut target.minimum, minimum);
    take(&mut target.maximum, maximum);
    take(&mut target.min_length, min_length);
    take(&mut target.max_length, max_length);
    take(&mut target.pattern, pattern);

    for (name, prop) in properties {
        target.properties.insert(name, prop);
    }
    for name in required {
        if !target.required.contains(&name) {
            target.required.push(name);
        }
    }
    if !enum_values.is_empty() {
        target.enum_values = enum_values;
    }
    // Only reachable past the depth ceiling, where branches stay unmerged
    if !all_of.is_empty() {
        target.all_of = all_of;
    }
    if !one_of.is_empty() {
        target.one_of = one_of;
    }
    if !any_of.is_empty() {
        target.any_of = any_of;
    }
    target.extensions.extend(extensions);
}
