//! JSON schema documents
//!
//! A document describes one file or a set of files in a shape close to
//! protobuf's `FileDescriptorProto`, e.g.:
//!
//! ```json
//! {
//!   "name": "user.proto",
//!   "package": "acme",
//!   "messages": [
//!     { "name": "User", "fields": [
//!       { "name": "id", "number": 1, "type": "int64" },
//!       { "name": "role", "number": 2, "type": "enum", "type_name": "Role", "default": "MEMBER" }
//!     ] }
//!   ],
//!   "enums": [
//!     { "name": "Role", "values": [ { "name": "MEMBER", "number": 0 } ] }
//!   ]
//! }
//! ```
//!
//! Binary descriptor sets are converted into the same definitions, so both
//! formats go through one resolver.

use serde::{Deserialize, Serialize};

use crate::descriptor::{FieldType, Label};

/// Either a single file or an explicit list of files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaDocument {
    Set { files: Vec<FileDef> },
    Single(FileDef),
}

impl SchemaDocument {
    pub fn into_files(self) -> Vec<FileDef> {
        match self {
            SchemaDocument::Set { files } => files,
            SchemaDocument::Single(file) => vec![file],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub messages: Vec<MessageDef>,
    #[serde(default)]
    pub enums: Vec<EnumDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub messages: Vec<MessageDef>,
    #[serde(default)]
    pub enums: Vec<EnumDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub number: i32,
    #[serde(default)]
    pub label: Label,
    /// May be omitted when `type_name` names a message or enum
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Protobuf text form of the default (`42`, `inf`, `true`, `RED`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    #[serde(default)]
    pub values: Vec<EnumValueDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumValueDef {
    pub name: String,
    pub number: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_file_document() {
        let doc: SchemaDocument = serde_json::from_str(
            r#"{ "package": "p", "messages": [ { "name": "M", "fields": [
                { "name": "a", "number": 1, "type": "sfixed32", "label": "repeated" }
            ] } ] }"#,
        )
        .unwrap();
        let files = doc.into_files();
        assert_eq!(files.len(), 1);
        let field = &files[0].messages[0].fields[0];
        assert_eq!(field.field_type, Some(FieldType::Sfixed32));
        assert_eq!(field.label, Label::Repeated);
    }

    #[test]
    fn test_file_set_document() {
        let doc: SchemaDocument = serde_json::from_str(
            r#"{ "files": [ { "name": "dep.proto" }, { "name": "main.proto" } ] }"#,
        )
        .unwrap();
        let names: Vec<_> = doc.into_files().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["dep.proto", "main.proto"]);
    }
}
