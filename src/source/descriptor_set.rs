//! Binary descriptor sets
//!
//! Decodes `protoc --descriptor_set_out` output and converts it into the
//! document definitions consumed by [`DescriptorPool::build`].
//!
//! [`DescriptorPool::build`]: crate::descriptor::DescriptorPool::build

use prost::Message;
use prost_types::field_descriptor_proto::{Label as ProtoLabel, Type as ProtoType};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    FileDescriptorSet,
};

use super::document::{EnumDef, EnumValueDef, FieldDef, FileDef, MessageDef};
use crate::descriptor::{FieldType, Label};
use crate::error::Result;

/// Decode bytes as a `FileDescriptorSet`, falling back to a single
/// `FileDescriptorProto`
pub fn decode(bytes: &[u8]) -> Result<Vec<FileDef>> {
    if let Ok(set) = FileDescriptorSet::decode(bytes) {
        if !set.file.is_empty() {
            return Ok(set.file.iter().map(convert_file).collect());
        }
    }

    let file = FileDescriptorProto::decode(bytes)?;
    Ok(vec![convert_file(&file)])
}

fn convert_file(file: &FileDescriptorProto) -> FileDef {
    FileDef {
        name: file.name().to_string(),
        package: file.package().to_string(),
        messages: file.message_type.iter().map(convert_message).collect(),
        enums: file.enum_type.iter().map(convert_enum).collect(),
    }
}

fn convert_message(message: &DescriptorProto) -> MessageDef {
    MessageDef {
        name: message.name().to_string(),
        fields: message.field.iter().map(convert_field).collect(),
        messages: message.nested_type.iter().map(convert_message).collect(),
        enums: message.enum_type.iter().map(convert_enum).collect(),
    }
}

fn convert_field(field: &FieldDescriptorProto) -> FieldDef {
    FieldDef {
        name: field.name().to_string(),
        number: field.number(),
        label: match field.label() {
            ProtoLabel::Optional => Label::Optional,
            ProtoLabel::Required => Label::Required,
            ProtoLabel::Repeated => Label::Repeated,
        },
        // An unset type is left to the resolver, which infers it from type_name
        field_type: field.r#type.map(|_| convert_type(field.r#type())),
        type_name: field.type_name.clone(),
        default: field.default_value.clone(),
    }
}

fn convert_type(t: ProtoType) -> FieldType {
    match t {
        ProtoType::Double => FieldType::Double,
        ProtoType::Float => FieldType::Float,
        ProtoType::Int64 => FieldType::Int64,
        ProtoType::Uint64 => FieldType::Uint64,
        ProtoType::Int32 => FieldType::Int32,
        ProtoType::Fixed64 => FieldType::Fixed64,
        ProtoType::Fixed32 => FieldType::Fixed32,
        ProtoType::Bool => FieldType::Bool,
        ProtoType::String => FieldType::String,
        ProtoType::Group => FieldType::Group,
        ProtoType::Message => FieldType::Message,
        ProtoType::Bytes => FieldType::Bytes,
        ProtoType::Uint32 => FieldType::Uint32,
        ProtoType::Enum => FieldType::Enum,
        ProtoType::Sfixed32 => FieldType::Sfixed32,
        ProtoType::Sfixed64 => FieldType::Sfixed64,
        ProtoType::Sint32 => FieldType::Sint32,
        ProtoType::Sint64 => FieldType::Sint64,
    }
}

fn convert_enum(e: &EnumDescriptorProto) -> EnumDef {
    EnumDef {
        name: e.name().to_string(),
        values: e
            .value
            .iter()
            .map(|v| EnumValueDef {
                name: v.name().to_string(),
                number: v.number(),
            })
            .collect(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use prost_types::EnumValueDescriptorProto;

    pub(crate) fn sample_set() -> FileDescriptorSet {
        let field = |name: &str, number: i32, t: ProtoType, type_name: Option<&str>| FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            label: Some(ProtoLabel::Optional as i32),
            r#type: Some(t as i32),
            type_name: type_name.map(str::to_string),
            ..Default::default()
        };

        FileDescriptorSet {
            file: vec![FileDescriptorProto {
                name: Some("shop.proto".to_string()),
                package: Some("shop".to_string()),
                message_type: vec![DescriptorProto {
                    name: Some("Order".to_string()),
                    field: vec![
                        field("id", 1, ProtoType::Int64, None),
                        field("status", 2, ProtoType::Enum, Some(".shop.Status")),
                        field("parent", 3, ProtoType::Message, Some(".shop.Order")),
                    ],
                    ..Default::default()
                }],
                enum_type: vec![EnumDescriptorProto {
                    name: Some("Status".to_string()),
                    value: vec![EnumValueDescriptorProto {
                        name: Some("OPEN".to_string()),
                        number: Some(0),
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_decode_descriptor_set() {
        let bytes = sample_set().encode_to_vec();
        let files = decode(&bytes).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].package, "shop");
        let order = &files[0].messages[0];
        assert_eq!(order.fields[1].field_type, Some(FieldType::Enum));
        assert_eq!(order.fields[2].type_name.as_deref(), Some(".shop.Order"));
        assert_eq!(files[0].enums[0].values[0].name, "OPEN");
    }

    #[test]
    fn test_decode_single_file_fallback() {
        let file = FileDescriptorProto {
            name: Some("empty.proto".to_string()),
            ..Default::default()
        };
        let files = decode(&file.encode_to_vec()).unwrap();
        assert_eq!(files[0].name, "empty.proto");
    }
}
