//! Element matching
//!
//! Pairs a field or enum value on one side with its counterpart on the other.
//! By-name matching answers "is the source-level schema compatible"; by-number
//! matching answers "is the wire encoding compatible". Message and enum types
//! have no numeric identity and are always matched by name.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::descriptor::{EnumDescriptor, EnumValueDescriptor, FieldDescriptor, MessageDescriptor};

/// Matching policy, chosen once per comparison run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    #[default]
    ByName,
    ByNumber,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::ByName => f.write_str("by-name"),
            MatchMode::ByNumber => f.write_str("by-number"),
        }
    }
}

/// A named, numbered member of a message or enum
pub trait Element {
    fn name(&self) -> &str;
    fn number(&self) -> i32;
}

impl Element for FieldDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn number(&self) -> i32 {
        self.number
    }
}

impl Element for EnumValueDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn number(&self) -> i32 {
        self.number
    }
}

/// Something holding [`Element`]s that can be looked up by name or tag
pub trait Container {
    type Element: Element;

    fn elements(&self) -> &[Self::Element];
    fn find_by_name(&self, name: &str) -> Option<&Self::Element>;
    fn find_by_number(&self, number: i32) -> Option<&Self::Element>;
}

impl Container for MessageDescriptor {
    type Element = FieldDescriptor;

    fn elements(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn find_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.find_field_by_name(name)
    }

    fn find_by_number(&self, number: i32) -> Option<&FieldDescriptor> {
        self.find_field_by_number(number)
    }
}

impl Container for EnumDescriptor {
    type Element = EnumValueDescriptor;

    fn elements(&self) -> &[EnumValueDescriptor] {
        &self.values
    }

    fn find_by_name(&self, name: &str) -> Option<&EnumValueDescriptor> {
        self.find_value_by_name(name)
    }

    fn find_by_number(&self, number: i32) -> Option<&EnumValueDescriptor> {
        self.find_value_by_number(number)
    }
}

impl MatchMode {
    /// Counterpart of `element` inside `other`, if any
    pub fn counterpart<'c, C: Container>(
        &self,
        element: &C::Element,
        other: &'c C,
    ) -> Option<&'c C::Element> {
        match self {
            MatchMode::ByName => other.find_by_name(element.name()),
            MatchMode::ByNumber => other.find_by_number(element.number()),
        }
    }

    /// Identifier used for added/removed labels under this mode
    pub fn label<E: Element>(&self, element: &E) -> String {
        match self {
            MatchMode::ByName => element.name().to_string(),
            MatchMode::ByNumber => element.number().to_string(),
        }
    }

    /// Elements of `from` with no counterpart in `to`, in declaration order
    pub fn unmatched<'f, C: Container>(&self, from: &'f C, to: &C) -> Vec<&'f C::Element> {
        from.elements()
            .iter()
            .filter(|e| self.counterpart(*e, to).is_none())
            .collect()
    }
}
