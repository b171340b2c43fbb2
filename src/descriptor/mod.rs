//! Descriptor Graph
//!
//! In-memory representation of one schema version: files, messages, fields,
//! enums and enum values. Messages and enums live in a [`DescriptorPool`] arena
//! and reference each other through [`MessageId`] / [`EnumId`] handles, so a
//! message whose field refers back to itself is just an index, never an
//! ownership cycle.
//!
//! The pool is immutable once built (see [`builder`]) and is only ever read by
//! the comparator.

pub mod builder;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Handle to a message inside a [`DescriptorPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub(crate) usize);

/// Handle to an enum inside a [`DescriptorPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumId(pub(crate) usize);

/// Field cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    #[default]
    Optional,
    Required,
    Repeated,
}

impl Label {
    pub fn name(&self) -> &'static str {
        match self {
            Label::Optional => "optional",
            Label::Required => "required",
            Label::Repeated => "repeated",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared field type, one per protobuf wire-level type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Group,
    Message,
    Bytes,
    Uint32,
    Enum,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
}

impl FieldType {
    /// Lowercase protobuf spelling (`int32`, `message`, ...)
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Int64 => "int64",
            FieldType::Uint64 => "uint64",
            FieldType::Int32 => "int32",
            FieldType::Fixed64 => "fixed64",
            FieldType::Fixed32 => "fixed32",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Group => "group",
            FieldType::Message => "message",
            FieldType::Bytes => "bytes",
            FieldType::Uint32 => "uint32",
            FieldType::Enum => "enum",
            FieldType::Sfixed32 => "sfixed32",
            FieldType::Sfixed64 => "sfixed64",
            FieldType::Sint32 => "sint32",
            FieldType::Sint64 => "sint64",
        }
    }

    /// In-memory representation shared by several wire types
    pub fn scalar_kind(&self) -> ScalarKind {
        match self {
            FieldType::Int32 | FieldType::Sint32 | FieldType::Sfixed32 => ScalarKind::Int32,
            FieldType::Int64 | FieldType::Sint64 | FieldType::Sfixed64 => ScalarKind::Int64,
            FieldType::Uint32 | FieldType::Fixed32 => ScalarKind::Uint32,
            FieldType::Uint64 | FieldType::Fixed64 => ScalarKind::Uint64,
            FieldType::Double => ScalarKind::Double,
            FieldType::Float => ScalarKind::Float,
            FieldType::Bool => ScalarKind::Bool,
            FieldType::String | FieldType::Bytes => ScalarKind::String,
            FieldType::Enum => ScalarKind::Enum,
            FieldType::Message | FieldType::Group => ScalarKind::Message,
        }
    }

    /// Whether the type refers to another message or enum
    pub fn is_reference(&self) -> bool {
        matches!(self, FieldType::Message | FieldType::Group | FieldType::Enum)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scalar kind of a field's value, used to type default values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Double,
    Float,
    Bool,
    Enum,
    String,
    Message,
}

/// Explicitly declared default value, typed per [`ScalarKind`]
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Float(f32),
    Double(f64),
    Bool(bool),
    String(String),
    /// Enum default, resolved to the value's tag
    Enum { name: String, number: i32 },
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Int32(v) => write!(f, "{}", v),
            DefaultValue::Int64(v) => write!(f, "{}", v),
            DefaultValue::Uint32(v) => write!(f, "{}", v),
            DefaultValue::Uint64(v) => write!(f, "{}", v),
            DefaultValue::Float(v) => write!(f, "{}", v),
            DefaultValue::Double(v) => write!(f, "{}", v),
            DefaultValue::Bool(v) => write!(f, "{}", v),
            DefaultValue::String(v) => f.write_str(v),
            DefaultValue::Enum { name, .. } => f.write_str(name),
        }
    }
}

/// Resolved target of a message-, group- or enum-typed field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Message(MessageId),
    Enum(EnumId),
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub full_name: String,
    pub number: i32,
    pub label: Label,
    pub field_type: FieldType,
    pub type_ref: Option<TypeRef>,
    pub default: Option<DefaultValue>,
}

impl FieldDescriptor {
    pub fn scalar_kind(&self) -> ScalarKind {
        self.field_type.scalar_kind()
    }

    pub fn has_default_value(&self) -> bool {
        self.default.is_some()
    }

    pub fn message_type(&self) -> Option<MessageId> {
        match self.type_ref {
            Some(TypeRef::Message(id)) => Some(id),
            _ => None,
        }
    }

    pub fn enum_type(&self) -> Option<EnumId> {
        match self.type_ref {
            Some(TypeRef::Enum(id)) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} {} {}",
            self.number, self.full_name, self.field_type, self.label
        )?;
        if let Some(default) = &self.default {
            write!(f, " ({})", default)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MessageDescriptor {
    pub name: String,
    pub full_name: String,
    pub fields: Vec<FieldDescriptor>,
    pub nested_messages: Vec<MessageId>,
    pub nested_enums: Vec<EnumId>,
}

impl MessageDescriptor {
    /// First field declared with `name`
    pub fn find_field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// First field declared with tag `number`
    pub fn find_field_by_number(&self, number: i32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub number: i32,
}

#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    pub name: String,
    pub full_name: String,
    pub values: Vec<EnumValueDescriptor>,
}

impl EnumDescriptor {
    pub fn find_value_by_name(&self, name: &str) -> Option<&EnumValueDescriptor> {
        self.values.iter().find(|v| v.name == name)
    }

    /// First value with tag `number`; aliases share a tag
    pub fn find_value_by_number(&self, number: i32) -> Option<&EnumValueDescriptor> {
        self.values.iter().find(|v| v.number == number)
    }
}

/// One schema file: its package and top-level types
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub name: String,
    pub package: String,
    pub messages: Vec<MessageId>,
    pub enums: Vec<EnumId>,
}

/// Arena holding every message and enum of one or more files
#[derive(Debug, Clone, Default)]
pub struct DescriptorPool {
    pub(crate) files: Vec<FileDescriptor>,
    pub(crate) messages: Vec<MessageDescriptor>,
    pub(crate) enums: Vec<EnumDescriptor>,
    pub(crate) messages_by_name: HashMap<String, MessageId>,
    pub(crate) enums_by_name: HashMap<String, EnumId>,
}

impl DescriptorPool {
    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub fn file_by_name(&self, name: &str) -> Option<&FileDescriptor> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn message(&self, id: MessageId) -> &MessageDescriptor {
        &self.messages[id.0]
    }

    pub fn enum_type(&self, id: EnumId) -> &EnumDescriptor {
        &self.enums[id.0]
    }

    /// Look up a message by fully-qualified name (a leading `.` is ignored)
    pub fn find_message_by_name(&self, full_name: &str) -> Option<&MessageDescriptor> {
        self.find_message_id(full_name).map(|id| self.message(id))
    }

    /// Look up an enum by fully-qualified name (a leading `.` is ignored)
    pub fn find_enum_by_name(&self, full_name: &str) -> Option<&EnumDescriptor> {
        self.find_enum_id(full_name).map(|id| self.enum_type(id))
    }

    pub fn find_message_id(&self, full_name: &str) -> Option<MessageId> {
        let full_name = full_name.strip_prefix('.').unwrap_or(full_name);
        self.messages_by_name.get(full_name).copied()
    }

    pub fn find_enum_id(&self, full_name: &str) -> Option<EnumId> {
        let full_name = full_name.strip_prefix('.').unwrap_or(full_name);
        self.enums_by_name.get(full_name).copied()
    }

    /// Top-level messages of `file`, in declaration order
    pub fn file_messages<'p>(
        &'p self,
        file: &'p FileDescriptor,
    ) -> impl Iterator<Item = &'p MessageDescriptor> + 'p {
        file.messages.iter().map(move |id| self.message(*id))
    }

    /// Top-level enums of `file`, in declaration order
    pub fn file_enums<'p>(
        &'p self,
        file: &'p FileDescriptor,
    ) -> impl Iterator<Item = &'p EnumDescriptor> + 'p {
        file.enums.iter().map(move |id| self.enum_type(*id))
    }

    /// Top-level message of `file` with local name `name`
    pub fn find_file_message_id(&self, file: &FileDescriptor, name: &str) -> Option<MessageId> {
        file.messages
            .iter()
            .copied()
            .find(|id| self.message(*id).name == name)
    }

    /// Top-level enum of `file` with local name `name`
    pub fn find_file_enum_id(&self, file: &FileDescriptor, name: &str) -> Option<EnumId> {
        file.enums
            .iter()
            .copied()
            .find(|id| self.enum_type(*id).name == name)
    }

    /// Every fully-qualified message and enum name, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .messages
            .iter()
            .map(|m| m.full_name.as_str())
            .chain(self.enums.iter().map(|e| e.full_name.as_str()))
            .collect();
        names.sort_unstable();
        names
    }

    /// Type names resembling `query`, best match first
    pub fn search(&self, query: &str, limit: usize) -> Vec<&str> {
        use fuzzy_matcher::skim::SkimMatcherV2;
        use fuzzy_matcher::FuzzyMatcher;

        let matcher = SkimMatcherV2::default();
        let query = query.trim_start_matches('.');
        let mut results: Vec<(i64, &str)> = self
            .type_names()
            .into_iter()
            .filter_map(|name| matcher.fuzzy_match(name, query).map(|score| (score, name)))
            .collect();

        results.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        results.into_iter().take(limit).map(|(_, name)| name).collect()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn enum_count(&self) -> usize {
        self.enums.len()
    }
}
