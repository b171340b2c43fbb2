//! Pool construction
//!
//! Two passes over the file definitions: the first registers every message and
//! enum under its fully-qualified name, the second resolves field type
//! references (protobuf scoping, innermost scope first) and parses declared
//! defaults into typed values.

use tracing::debug;

use super::{
    DefaultValue, DescriptorPool, EnumDescriptor, EnumId, EnumValueDescriptor, FieldDescriptor,
    FieldType, FileDescriptor, MessageDescriptor, MessageId, ScalarKind, TypeRef,
};
use crate::error::{CompatError, Result};
use crate::source::document::{EnumDef, FieldDef, FileDef, MessageDef};

/// Fully-qualified child name within `scope`
fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}

impl DescriptorPool {
    /// Build a pool from file definitions
    pub fn build(files: &[FileDef]) -> Result<Self> {
        let mut pool = DescriptorPool::default();
        let mut pending: Vec<(MessageId, &MessageDef)> = Vec::new();

        for file in files {
            let mut messages = Vec::with_capacity(file.messages.len());
            for message in &file.messages {
                messages.push(pool.register_message(&file.package, message, &mut pending)?);
            }
            let mut enums = Vec::with_capacity(file.enums.len());
            for e in &file.enums {
                enums.push(pool.register_enum(&file.package, e)?);
            }
            pool.files.push(FileDescriptor {
                name: file.name.clone(),
                package: file.package.clone(),
                messages,
                enums,
            });
        }

        for (id, def) in pending {
            let scope = pool.message(id).full_name.clone();
            let fields = def
                .fields
                .iter()
                .map(|f| pool.resolve_field(&scope, f))
                .collect::<Result<Vec<_>>>()?;
            pool.messages[id.0].fields = fields;
        }

        debug!(
            files = pool.files.len(),
            messages = pool.messages.len(),
            enums = pool.enums.len(),
            "Built descriptor pool"
        );

        Ok(pool)
    }

    fn register_message<'d>(
        &mut self,
        scope: &str,
        def: &'d MessageDef,
        pending: &mut Vec<(MessageId, &'d MessageDef)>,
    ) -> Result<MessageId> {
        let full_name = qualify(scope, &def.name);
        if self.messages_by_name.contains_key(&full_name) || self.enums_by_name.contains_key(&full_name) {
            return Err(CompatError::DuplicateType(full_name));
        }

        let id = MessageId(self.messages.len());
        self.messages.push(MessageDescriptor {
            name: def.name.clone(),
            full_name: full_name.clone(),
            fields: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
        });
        self.messages_by_name.insert(full_name.clone(), id);
        pending.push((id, def));

        let mut nested_messages = Vec::with_capacity(def.messages.len());
        for nested in &def.messages {
            nested_messages.push(self.register_message(&full_name, nested, pending)?);
        }
        let mut nested_enums = Vec::with_capacity(def.enums.len());
        for nested in &def.enums {
            nested_enums.push(self.register_enum(&full_name, nested)?);
        }

        let message = &mut self.messages[id.0];
        message.nested_messages = nested_messages;
        message.nested_enums = nested_enums;
        Ok(id)
    }

    fn register_enum(&mut self, scope: &str, def: &EnumDef) -> Result<EnumId> {
        let full_name = qualify(scope, &def.name);
        if self.messages_by_name.contains_key(&full_name) || self.enums_by_name.contains_key(&full_name) {
            return Err(CompatError::DuplicateType(full_name));
        }

        let id = EnumId(self.enums.len());
        self.enums.push(EnumDescriptor {
            name: def.name.clone(),
            full_name: full_name.clone(),
            values: def
                .values
                .iter()
                .map(|v| EnumValueDescriptor {
                    name: v.name.clone(),
                    number: v.number,
                })
                .collect(),
        });
        self.enums_by_name.insert(full_name, id);
        Ok(id)
    }

    /// Resolve `type_name` as seen from inside message `scope`
    fn resolve_type(&self, scope: &str, type_name: &str) -> Option<TypeRef> {
        if let Some(absolute) = type_name.strip_prefix('.') {
            return self.lookup_type(absolute);
        }

        let mut scope = scope;
        loop {
            if let Some(found) = self.lookup_type(&qualify(scope, type_name)) {
                return Some(found);
            }
            if scope.is_empty() {
                return None;
            }
            scope = match scope.rfind('.') {
                Some(idx) => &scope[..idx],
                None => "",
            };
        }
    }

    fn lookup_type(&self, full_name: &str) -> Option<TypeRef> {
        self.messages_by_name
            .get(full_name)
            .map(|id| TypeRef::Message(*id))
            .or_else(|| self.enums_by_name.get(full_name).map(|id| TypeRef::Enum(*id)))
    }

    fn resolve_field(&self, scope: &str, def: &FieldDef) -> Result<FieldDescriptor> {
        let full_name = qualify(scope, &def.name);

        let type_ref = match &def.type_name {
            Some(type_name) => Some(self.resolve_type(scope, type_name).ok_or_else(|| {
                CompatError::UnresolvedType {
                    field: full_name.clone(),
                    type_name: type_name.clone(),
                }
            })?),
            None => None,
        };

        let field_type = match (def.field_type, type_ref) {
            (Some(FieldType::Enum), Some(TypeRef::Enum(_))) => FieldType::Enum,
            (Some(t @ (FieldType::Message | FieldType::Group)), Some(TypeRef::Message(_))) => t,
            (None, Some(TypeRef::Message(_))) => FieldType::Message,
            (None, Some(TypeRef::Enum(_))) => FieldType::Enum,
            (Some(t), None) if !t.is_reference() => t,
            (Some(t), None) => {
                return Err(CompatError::InvalidField {
                    field: full_name,
                    reason: format!("type {} requires a type_name", t),
                })
            }
            (Some(t), Some(_)) => {
                return Err(CompatError::InvalidField {
                    field: full_name,
                    reason: format!("type_name does not name a {}", t),
                })
            }
            (None, None) => {
                return Err(CompatError::InvalidField {
                    field: full_name,
                    reason: "missing type".to_string(),
                })
            }
        };

        let default = match &def.default {
            Some(text) => Some(self.parse_default(&full_name, field_type, type_ref, text)?),
            None => None,
        };

        Ok(FieldDescriptor {
            name: def.name.clone(),
            full_name,
            number: def.number,
            label: def.label,
            field_type,
            type_ref,
            default,
        })
    }

    fn parse_default(
        &self,
        field: &str,
        field_type: FieldType,
        type_ref: Option<TypeRef>,
        text: &str,
    ) -> Result<DefaultValue> {
        let invalid = |reason: &str| CompatError::invalid_default(field, text, reason);

        let value = match field_type.scalar_kind() {
            ScalarKind::Int32 => DefaultValue::Int32(text.parse().map_err(|_| invalid("expected int32"))?),
            ScalarKind::Int64 => DefaultValue::Int64(text.parse().map_err(|_| invalid("expected int64"))?),
            ScalarKind::Uint32 => DefaultValue::Uint32(text.parse().map_err(|_| invalid("expected uint32"))?),
            ScalarKind::Uint64 => DefaultValue::Uint64(text.parse().map_err(|_| invalid("expected uint64"))?),
            ScalarKind::Float => DefaultValue::Float(parse_float(text).ok_or_else(|| invalid("expected float"))? as f32),
            ScalarKind::Double => DefaultValue::Double(parse_float(text).ok_or_else(|| invalid("expected double"))?),
            ScalarKind::Bool => match text {
                "true" => DefaultValue::Bool(true),
                "false" => DefaultValue::Bool(false),
                _ => return Err(invalid("expected true or false")),
            },
            ScalarKind::String => DefaultValue::String(text.to_string()),
            ScalarKind::Enum => {
                let Some(TypeRef::Enum(id)) = type_ref else {
                    return Err(invalid("enum type is unresolved"));
                };
                let value = self
                    .enum_type(id)
                    .find_value_by_name(text)
                    .ok_or_else(|| invalid("unknown enum value"))?;
                DefaultValue::Enum {
                    name: value.name.clone(),
                    number: value.number,
                }
            }
            ScalarKind::Message => return Err(invalid("message fields cannot declare a default")),
        };

        Ok(value)
    }
}

/// Protobuf spells infinities and NaN as words
fn parse_float(text: &str) -> Option<f64> {
    match text {
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        "nan" => Some(f64::NAN),
        _ => text.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::document::SchemaDocument;

    fn build(json: &str) -> Result<DescriptorPool> {
        let doc: SchemaDocument = serde_json::from_str(json).unwrap();
        DescriptorPool::build(&doc.into_files())
    }

    #[test]
    fn test_nested_names_are_qualified() {
        let pool = build(
            r#"{ "package": "acme", "messages": [ { "name": "Outer",
                "messages": [ { "name": "Inner" } ],
                "enums": [ { "name": "Kind", "values": [ { "name": "A", "number": 0 } ] } ]
            } ] }"#,
        )
        .unwrap();
        assert!(pool.find_message_by_name("acme.Outer.Inner").is_some());
        assert!(pool.find_enum_by_name(".acme.Outer.Kind").is_some());
        assert_eq!(pool.files()[0].messages.len(), 1);
    }

    #[test]
    fn test_search_suggests_similar_names() {
        let pool = build(
            r#"{ "package": "acme", "messages": [ { "name": "UserProfile" }, { "name": "Order" } ],
                "enums": [ { "name": "UserRole" } ] }"#,
        )
        .unwrap();
        let hits = pool.search("acme.UsrProfile", 5);
        assert_eq!(hits.first(), Some(&"acme.UserProfile"));
        assert!(!hits.contains(&"acme.Order"));
    }

    #[test]
    fn test_relative_type_resolves_innermost_first() {
        let pool = build(
            r#"{ "package": "acme", "messages": [
                { "name": "Node" },
                { "name": "Tree", "messages": [ { "name": "Node" } ], "fields": [
                    { "name": "inner", "number": 1, "type_name": "Node" },
                    { "name": "outer", "number": 2, "type_name": ".acme.Node" }
                ] }
            ] }"#,
        )
        .unwrap();
        let tree = pool.find_message_by_name("acme.Tree").unwrap();
        let inner = tree.find_field_by_name("inner").unwrap().message_type().unwrap();
        let outer = tree.find_field_by_name("outer").unwrap().message_type().unwrap();
        assert_eq!(pool.message(inner).full_name, "acme.Tree.Node");
        assert_eq!(pool.message(outer).full_name, "acme.Node");
    }

    #[test]
    fn test_self_reference_resolves() {
        let pool = build(
            r#"{ "messages": [ { "name": "List", "fields": [
                { "name": "next", "number": 1, "type": "message", "type_name": "List" }
            ] } ] }"#,
        )
        .unwrap();
        let id = pool.find_message_id("List").unwrap();
        assert_eq!(pool.message(id).fields[0].message_type(), Some(id));
    }

    #[test]
    fn test_enum_default_resolves_to_number() {
        let pool = build(
            r#"{ "enums": [ { "name": "Color", "values": [
                    { "name": "RED", "number": 0 }, { "name": "BLUE", "number": 4 } ] } ],
                "messages": [ { "name": "M", "fields": [
                    { "name": "c", "number": 1, "type": "enum", "type_name": "Color", "default": "BLUE" }
                ] } ] }"#,
        )
        .unwrap();
        let field = &pool.find_message_by_name("M").unwrap().fields[0];
        assert_eq!(
            field.default,
            Some(DefaultValue::Enum { name: "BLUE".to_string(), number: 4 })
        );
    }

    #[test]
    fn test_float_defaults_accept_words() {
        let pool = build(
            r#"{ "messages": [ { "name": "M", "fields": [
                { "name": "a", "number": 1, "type": "double", "default": "-inf" },
                { "name": "b", "number": 2, "type": "float", "default": "1.5" }
            ] } ] }"#,
        )
        .unwrap();
        let m = pool.find_message_by_name("M").unwrap();
        assert_eq!(m.fields[0].default, Some(DefaultValue::Double(f64::NEG_INFINITY)));
        assert_eq!(m.fields[1].default, Some(DefaultValue::Float(1.5)));
    }

    #[test]
    fn test_unresolved_type_is_an_error() {
        let err = build(
            r#"{ "messages": [ { "name": "M", "fields": [
                { "name": "x", "number": 1, "type": "message", "type_name": "Missing" }
            ] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, CompatError::UnresolvedType { .. }));
    }

    #[test]
    fn test_duplicate_type_is_an_error() {
        let err = build(r#"{ "messages": [ { "name": "M" } ], "enums": [ { "name": "M" } ] }"#)
            .unwrap_err();
        assert!(matches!(err, CompatError::DuplicateType(name) if name == "M"));
    }

    #[test]
    fn test_bad_default_is_an_error() {
        let err = build(
            r#"{ "messages": [ { "name": "M", "fields": [
                { "name": "x", "number": 1, "type": "uint32", "default": "-1" }
            ] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, CompatError::InvalidDefault { .. }));
    }

    #[test]
    fn test_kind_mismatch_is_an_error() {
        let err = build(
            r#"{ "enums": [ { "name": "E" } ], "messages": [ { "name": "M", "fields": [
                { "name": "x", "number": 1, "type": "message", "type_name": "E" }
            ] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, CompatError::InvalidField { .. }));
    }
}
