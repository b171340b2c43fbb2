//! Recursive schema comparison
//!
//! Walks two descriptor pools in lock-step and records every structural
//! difference in a [`DiffTree`].
//!
//! Message and enum comparisons are memoized by [`PairKey`]: the first visit
//! creates the section, registers it, hoists it under the root and only then
//! recurses into fields. Any later visit, including one arriving through a
//! reference cycle while the section is still being filled, finds the
//! registered section and just appends a provenance note. Each type pair is
//! therefore expanded exactly once and the recursion terminates on cyclic
//! graphs.
//!
//! Field and enum value comparisons are cheap and belong to exactly one
//! parent, so they are never memoized.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::defaults;
use crate::descriptor::{
    DescriptorPool, EnumId, FieldDescriptor, FieldType, FileDescriptor, MessageId, TypeRef,
};
use crate::diff::{DiffTree, ItemKind, PairKey, SectionId, SectionKind};
use crate::matcher::MatchMode;
use crate::source::Source;

/// What a run compares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Every top-level message and enum of the two primary files
    All,
    /// One message or enum, possibly named differently on each side
    Named { a: String, b: String },
}

impl Target {
    /// `.` selects everything, anything else names a type on both sides
    pub fn parse(name_a: &str, name_b: Option<&str>) -> Self {
        if name_a == "." {
            Target::All
        } else {
            Target::Named {
                a: name_a.to_string(),
                b: name_b.unwrap_or(name_a).to_string(),
            }
        }
    }
}

/// Compare two loaded sources and return the trimmed tree
pub fn compare_sources(a: &Source, b: &Source, target: &Target, mode: MatchMode) -> DiffTree {
    let mut comparator = Comparator::new(a.pool(), b.pool(), mode);
    match target {
        Target::All => comparator.compare_files(a.file(), b.file()),
        Target::Named { a: name_a, b: name_b } => {
            comparator.compare_by_name(name_a, name_b);
        }
    }
    comparator.finish()
}

/// State of one comparison run: the tree being built and its memo map
pub struct Comparator<'p> {
    a: &'p DescriptorPool,
    b: &'p DescriptorPool,
    mode: MatchMode,
    tree: DiffTree,
    compared: HashMap<PairKey, SectionId>,
}

impl<'p> Comparator<'p> {
    pub fn new(a: &'p DescriptorPool, b: &'p DescriptorPool, mode: MatchMode) -> Self {
        Self {
            a,
            b,
            mode,
            tree: DiffTree::new(),
            compared: HashMap::new(),
        }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// The tree built so far, untrimmed
    pub fn tree(&self) -> &DiffTree {
        &self.tree
    }

    /// Trim and hand over the finished tree
    pub fn finish(mut self) -> DiffTree {
        self.tree.trim();
        debug!(
            compared_types = self.compared.len(),
            items = self.tree.summary().total(),
            "Comparison finished"
        );
        self.tree
    }

    /// Compare top-level messages and enums of two files, matched by name
    pub fn compare_files(&mut self, file_a: &FileDescriptor, file_b: &FileDescriptor) {
        let (pool_a, pool_b) = (self.a, self.b);
        let root = self.tree.root();

        for &id_a in &file_a.messages {
            let msg_a = pool_a.message(id_a);
            match pool_b.find_file_message_id(file_b, &msg_a.name) {
                Some(id_b) => {
                    self.compare_message(id_a, id_b, None);
                }
                None => self.tree.add_item(root, ItemKind::FileMessageRemoved, &msg_a.full_name, ""),
            }
        }

        for msg_b in pool_b.file_messages(file_b) {
            if pool_a.find_file_message_id(file_a, &msg_b.name).is_none() {
                self.tree.add_item(root, ItemKind::FileMessageAdded, "", &msg_b.full_name);
            }
        }

        for &id_a in &file_a.enums {
            let enum_a = pool_a.enum_type(id_a);
            match pool_b.find_file_enum_id(file_b, &enum_a.name) {
                Some(id_b) => {
                    self.compare_enum(id_a, id_b, None);
                }
                None => self.tree.add_item(root, ItemKind::FileEnumRemoved, &enum_a.full_name, ""),
            }
        }

        for enum_b in pool_b.file_enums(file_b) {
            if pool_a.find_file_enum_id(file_a, &enum_b.name).is_none() {
                self.tree.add_item(root, ItemKind::FileEnumAdded, "", &enum_b.full_name);
            }
        }
    }

    /// Compare one type named `name_a` on side A against `name_b` on side B.
    ///
    /// Returns `None`, after recording a name-missing item on the root, when
    /// the names do not both resolve to messages or both to enums.
    pub fn compare_by_name(&mut self, name_a: &str, name_b: &str) -> Option<SectionId> {
        let (pool_a, pool_b) = (self.a, self.b);

        if let (Some(a), Some(b)) = (pool_a.find_message_id(name_a), pool_b.find_message_id(name_b)) {
            return Some(self.compare_message(a, b, None));
        }
        if let (Some(a), Some(b)) = (pool_a.find_enum_id(name_a), pool_b.find_enum_id(name_b)) {
            return Some(self.compare_enum(a, b, None));
        }

        debug!(name_a, name_b, "Requested type did not resolve on both sides");
        let root = self.tree.root();
        self.tree.add_item(root, ItemKind::NameMissing, name_a, name_b);
        None
    }

    /// Canonical section for a type pair, created and hoisted on first use
    fn canonical_section(
        &mut self,
        kind: SectionKind,
        a: &str,
        b: &str,
        note: Option<&str>,
    ) -> (SectionId, bool) {
        let key = PairKey::new(kind, a, b);
        let (id, fresh) = match self.compared.get(&key).copied() {
            Some(id) => {
                debug!(key = %key, "Reusing comparison");
                (id, false)
            }
            None => {
                let root = self.tree.root();
                let id = self.tree.add_section(root, kind, a, b);
                // Registered before recursing so cycles land on this section
                self.compared.insert(key, id);
                (id, true)
            }
        };

        if let Some(note) = note {
            self.tree.add_note(id, note);
        }
        (id, fresh)
    }

    pub fn compare_enum(&mut self, a: EnumId, b: EnumId, note: Option<&str>) -> SectionId {
        let (pool_a, pool_b) = (self.a, self.b);
        let (enum_a, enum_b) = (pool_a.enum_type(a), pool_b.enum_type(b));
        let (section, fresh) =
            self.canonical_section(SectionKind::Enum, &enum_a.full_name, &enum_b.full_name, note);
        if !fresh {
            return section;
        }
        debug!(a = %enum_a.full_name, b = %enum_b.full_name, "Comparing enums");

        for value_a in &enum_a.values {
            match self.mode.counterpart(value_a, enum_b) {
                Some(value_b) => {
                    let child =
                        self.tree
                            .add_section(section, SectionKind::EnumValue, &value_a.name, &value_b.name);
                    if value_a.number != value_b.number {
                        self.tree.add_item(
                            child,
                            ItemKind::EnumValueIdChanged,
                            value_a.number.to_string(),
                            value_b.number.to_string(),
                        );
                    }
                    if value_a.name != value_b.name {
                        self.tree
                            .add_item(child, ItemKind::EnumValueNameChanged, &value_a.name, &value_b.name);
                    }
                }
                None => {
                    self.tree
                        .add_item(section, ItemKind::EnumValueRemoved, self.mode.label(value_a), "");
                }
            }
        }

        for value_b in self.mode.unmatched(enum_b, enum_a) {
            self.tree
                .add_item(section, ItemKind::EnumValueAdded, "", self.mode.label(value_b));
        }

        section
    }

    pub fn compare_message(&mut self, a: MessageId, b: MessageId, note: Option<&str>) -> SectionId {
        let (pool_a, pool_b) = (self.a, self.b);
        let (msg_a, msg_b) = (pool_a.message(a), pool_b.message(b));
        let (section, fresh) =
            self.canonical_section(SectionKind::Message, &msg_a.full_name, &msg_b.full_name, note);
        if !fresh {
            return section;
        }
        debug!(a = %msg_a.full_name, b = %msg_b.full_name, "Comparing messages");

        for field_a in &msg_a.fields {
            match self.mode.counterpart(field_a, msg_b) {
                Some(field_b) => {
                    let child = self.compare_field(field_a, field_b);
                    self.tree.attach(section, child);
                }
                None => {
                    self.tree
                        .add_item(section, ItemKind::MessageFieldRemoved, self.mode.label(field_a), "");
                }
            }
        }

        for field_b in self.mode.unmatched(msg_b, msg_a) {
            self.tree
                .add_item(section, ItemKind::MessageFieldAdded, "", self.mode.label(field_b));
        }

        section
    }

    /// Always a fresh section, attached by the caller once complete.
    ///
    /// Staying detached matters on cycles: the referenced type's section may
    /// be the parent message itself, and trimming it must not drop this
    /// section while it is still being filled.
    fn compare_field(&mut self, a: &'p FieldDescriptor, b: &'p FieldDescriptor) -> SectionId {
        trace!(a = %a, b = %b, "Comparing fields");
        let section = self
            .tree
            .detached_section(SectionKind::Field, &a.full_name, &b.full_name);

        if a.name != b.name {
            self.tree
                .add_item(section, ItemKind::MessageFieldNameChanged, &a.name, &b.name);
        }
        if a.number != b.number {
            self.tree.add_item(
                section,
                ItemKind::MessageFieldIdChanged,
                a.number.to_string(),
                b.number.to_string(),
            );
        }
        if a.label != b.label {
            self.tree
                .add_item(section, ItemKind::MessageFieldLabelChanged, a.label.name(), b.label.name());
        }

        if a.field_type != b.field_type {
            self.tree.add_item(
                section,
                ItemKind::MessageFieldTypeChanged,
                type_label(self.a, a),
                type_label(self.b, b),
            );
        } else {
            let note = provenance(a, b);
            let referenced = match (a.type_ref, b.type_ref) {
                (Some(TypeRef::Enum(ea)), Some(TypeRef::Enum(eb))) => {
                    Some(self.compare_enum(ea, eb, Some(&note)))
                }
                (Some(TypeRef::Message(ma)), Some(TypeRef::Message(mb))) => {
                    Some(self.compare_message(ma, mb, Some(&note)))
                }
                _ => None,
            };

            if let Some(referenced) = referenced {
                if !self.tree.trim_section(referenced) {
                    let target = self.tree.section(referenced);
                    let (name_a, name_b) = (target.a.clone(), target.b.clone());
                    self.tree
                        .add_item(section, ItemKind::MessageFieldTypeChanged, name_a, name_b);
                }
            }
        }

        if a.scalar_kind() == b.scalar_kind() && !defaults::equivalent(a, b) {
            self.tree.add_item(
                section,
                ItemKind::MessageFieldDefaultValueChanged,
                default_label(a),
                default_label(b),
            );
        }

        section
    }
}

/// Scalar type name, or the referenced type's full name
fn type_label(pool: &DescriptorPool, field: &FieldDescriptor) -> String {
    match (field.field_type, field.type_ref) {
        (FieldType::Enum, Some(TypeRef::Enum(id))) => pool.enum_type(id).full_name.clone(),
        (_, Some(TypeRef::Message(id))) => pool.message(id).full_name.clone(),
        (t, _) => t.name().to_string(),
    }
}

fn default_label(field: &FieldDescriptor) -> String {
    field
        .default
        .as_ref()
        .map(|d| d.to_string())
        .unwrap_or_default()
}

fn provenance(a: &FieldDescriptor, b: &FieldDescriptor) -> String {
    if a.full_name == b.full_name {
        format!("required by {}", a.full_name)
    } else {
        format!("required by {} -> {}", a.full_name, b.full_name)
    }
}
