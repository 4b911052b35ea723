//! `Catalog`: the owned schema + operator registry.
//!
//! Grounded on the teacher's `schema/registry.rs` (`SchemaRegistry` shape),
//! adapted per SPEC_FULL.md §4.D/§9 to be an ordinary caller-owned struct
//! rather than a global — it carries no bundled User/Group schemas; callers
//! register their own. Operator registration is grounded on
//! `registry.py`'s `register_unary_operator`/`register_binary_operator`.

use crate::error::{ScimError, ScimResult};
use crate::filter::registry::{BinaryOperator, UnaryOperator};
use crate::schema::attr::ConverterFn;
use crate::schema::schema::{Extension, ResourceSchema, Schema};
use std::collections::HashMap;

/// The process-wide registries of spec.md §5/§6, modeled as an ordinary
/// owned struct: the caller constructs one, registers schemas/operators
/// before use, and passes it by reference thereafter. No internal locking —
/// per spec.md §9, this crate chooses "quiescence before first use" via
/// ordinary `&mut` ownership rather than a mutable global.
pub struct Catalog {
    schemas: HashMap<String, ResourceSchema>,
    message_schemas: HashMap<String, Schema>,
    extensions: HashMap<String, Extension>,
    unary_operators: HashMap<String, Box<dyn UnaryOperator>>,
    binary_operators: HashMap<String, Box<dyn BinaryOperator>>,
    global_serializers: HashMap<&'static str, ConverterFn>,
    global_deserializers: HashMap<&'static str, ConverterFn>,
}

impl Catalog {
    pub fn register_resource_schema(&mut self, schema: ResourceSchema) -> ScimResult<()> {
        let uri = schema.schema.uri().to_string();
        if self.schemas.contains_key(&uri.to_ascii_lowercase()) {
            return Err(ScimError::DuplicateSchema(uri));
        }
        log::debug!(target: "scim::catalog", "registering resource schema {uri}");
        self.schemas.insert(uri.to_ascii_lowercase(), schema);
        Ok(())
    }

    pub fn get_resource_schema(&self, uri: &str) -> Option<&ResourceSchema> {
        self.schemas.get(&uri.to_ascii_lowercase())
    }

    /// All registered resource schemas, used to resolve a `SCIMReference`
    /// attribute's allowed resource-type names to their endpoints.
    pub fn resource_schemas(&self) -> impl Iterator<Item = &ResourceSchema> {
        self.schemas.values()
    }

    /// Registers a non-resource message schema (e.g. `PatchOp`, `ListResponse`,
    /// or a `SearchRequest` body) that has no endpoint or plural name of its
    /// own.
    pub fn register_message_schema(&mut self, schema: Schema) -> ScimResult<()> {
        let uri = schema.uri().to_string();
        if self.message_schemas.contains_key(&uri.to_ascii_lowercase()) {
            return Err(ScimError::DuplicateSchema(uri));
        }
        log::debug!(target: "scim::catalog", "registering message schema {uri}");
        self.message_schemas.insert(uri.to_ascii_lowercase(), schema);
        Ok(())
    }

    pub fn get_message_schema(&self, uri: &str) -> Option<&Schema> {
        self.message_schemas.get(&uri.to_ascii_lowercase())
    }

    pub fn register_extension(&mut self, extension: Extension) -> ScimResult<()> {
        let uri = extension.uri().to_string();
        if self.extensions.contains_key(&uri.to_ascii_lowercase()) {
            return Err(ScimError::DuplicateSchema(uri));
        }
        self.extensions.insert(uri.to_ascii_lowercase(), extension);
        Ok(())
    }

    pub fn get_extension(&self, uri: &str) -> Option<&Extension> {
        self.extensions.get(&uri.to_ascii_lowercase())
    }

    /// Attach a registered extension to a registered resource schema by URI,
    /// failing if either is unregistered or the extension is already
    /// attached elsewhere.
    pub fn attach_extension(
        &mut self,
        resource_uri: &str,
        extension_uri: &str,
        required: bool,
    ) -> ScimResult<()> {
        let extension = self
            .extensions
            .get(&extension_uri.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| ScimError::DuplicateSchema(extension_uri.to_string()))?;
        let schema = self
            .schemas
            .get_mut(&resource_uri.to_ascii_lowercase())
            .ok_or_else(|| ScimError::DuplicateSchema(resource_uri.to_string()))?;
        schema.extend(&extension, required);
        log::debug!(target: "scim::catalog", "attached extension {extension_uri} to {resource_uri}");
        Ok(())
    }

    pub fn register_unary_operator(
        &mut self,
        keyword: &str,
        op: Box<dyn UnaryOperator>,
    ) -> ScimResult<()> {
        let key = keyword.to_ascii_lowercase();
        if self.unary_operators.contains_key(&key) {
            return Err(ScimError::DuplicateOperator(keyword.to_string()));
        }
        self.unary_operators.insert(key, op);
        Ok(())
    }

    pub fn register_binary_operator(
        &mut self,
        keyword: &str,
        op: Box<dyn BinaryOperator>,
    ) -> ScimResult<()> {
        let key = keyword.to_ascii_lowercase();
        if self.binary_operators.contains_key(&key) {
            return Err(ScimError::DuplicateOperator(keyword.to_string()));
        }
        self.binary_operators.insert(key, op);
        Ok(())
    }

    pub fn unary_operator(&self, keyword: &str) -> Option<&dyn UnaryOperator> {
        self.unary_operators.get(&keyword.to_ascii_lowercase()).map(|b| b.as_ref())
    }

    pub fn binary_operator(&self, keyword: &str) -> Option<&dyn BinaryOperator> {
        self.binary_operators.get(&keyword.to_ascii_lowercase()).map(|b| b.as_ref())
    }

    /// Set the global (de)serializer for `scim_type`, once. A per-attribute
    /// hook always wins over the global one.
    pub fn set_global_serializer(&mut self, scim_type: &'static str, f: ConverterFn) {
        self.global_serializers.insert(scim_type, f);
    }

    pub fn set_global_deserializer(&mut self, scim_type: &'static str, f: ConverterFn) {
        self.global_deserializers.insert(scim_type, f);
    }

    pub fn global_serializer(&self, scim_type: &str) -> Option<ConverterFn> {
        self.global_serializers.get(scim_type).copied()
    }

    pub fn global_deserializer(&self, scim_type: &str) -> Option<ConverterFn> {
        self.global_deserializers.get(scim_type).copied()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let mut catalog = Self {
            schemas: HashMap::new(),
            message_schemas: HashMap::new(),
            extensions: HashMap::new(),
            unary_operators: HashMap::new(),
            binary_operators: HashMap::new(),
            global_serializers: HashMap::new(),
            global_deserializers: HashMap::new(),
        };
        crate::filter::registry::register_builtins(&mut catalog);
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema::ResourceSchema;

    fn sample_schema(uri: &str) -> ResourceSchema {
        ResourceSchema::new(uri, "User", "Users", "/Users")
    }

    #[test]
    fn duplicate_schema_registration_fails() {
        let mut catalog = Catalog::default();
        catalog.register_resource_schema(sample_schema("urn:x:User")).unwrap();
        let err = catalog.register_resource_schema(sample_schema("urn:x:User"));
        assert!(err.is_err());
    }

    #[test]
    fn builtin_operators_preregistered() {
        let catalog = Catalog::default();
        assert!(catalog.unary_operator("pr").is_some());
        assert!(catalog.binary_operator("eq").is_some());
        assert!(catalog.binary_operator("EQ").is_some());
    }

    #[test]
    fn message_schema_registers_independently_of_resource_schemas() {
        let mut catalog = Catalog::default();
        catalog
            .register_message_schema(crate::patch::patch_op_schema())
            .unwrap();
        assert!(catalog.get_message_schema(crate::patch::op::SCHEMA_URI).is_some());
    }
}
