//! Diff Tree
//!
//! The hierarchical result of a comparison run. Sections are stored in an
//! arena and addressed by [`SectionId`], which lets the comparator keep a
//! stable handle to a hoisted message/enum section while it is still being
//! filled, and lets any number of fields refer to that one section.
//!
//! ```text
//! /                                   (root)
//! ├── * Message removed: acme.Old ->  (file-level items)
//! ├── Comparing messages: acme.User -> acme.User
//! │   ├── * Field removed: nickname ->
//! │   └── Comparing message fields: acme.User.role -> acme.User.role
//! │       └── * Type changed: acme.Role -> acme.Role
//! └── Comparing enums: acme.Role -> acme.Role
//!     └── * Value added:  -> OWNER
//! ```

use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of comparison a [`Section`] represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    #[serde(rename = "/")]
    Root,
    #[serde(rename = "message_comparison")]
    Message,
    #[serde(rename = "message_field_comparison")]
    Field,
    #[serde(rename = "enum_comparison")]
    Enum,
    #[serde(rename = "enum_value_comparison")]
    EnumValue,
}

/// Kind of a single finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    EnumValueIdChanged,
    EnumValueNameChanged,
    EnumValueAdded,
    EnumValueRemoved,
    MessageFieldNameChanged,
    MessageFieldIdChanged,
    MessageFieldLabelChanged,
    MessageFieldTypeChanged,
    MessageFieldDefaultValueChanged,
    MessageFieldAdded,
    MessageFieldRemoved,
    FileMessageAdded,
    FileMessageRemoved,
    FileEnumAdded,
    FileEnumRemoved,
    NameMissing,
}

impl ItemKind {
    pub fn description(&self) -> &'static str {
        match self {
            ItemKind::EnumValueIdChanged => "Value ID changed",
            ItemKind::EnumValueNameChanged => "Value name changed",
            ItemKind::EnumValueAdded => "Value added",
            ItemKind::EnumValueRemoved => "Value removed",
            ItemKind::MessageFieldNameChanged => "Name changed",
            ItemKind::MessageFieldIdChanged => "ID changed",
            ItemKind::MessageFieldLabelChanged => "Label changed",
            ItemKind::MessageFieldTypeChanged => "Type changed",
            ItemKind::MessageFieldDefaultValueChanged => "Default value changed",
            ItemKind::MessageFieldAdded => "Field added",
            ItemKind::MessageFieldRemoved => "Field removed",
            ItemKind::FileMessageAdded => "Message added",
            ItemKind::FileMessageRemoved => "Message removed",
            ItemKind::FileEnumAdded => "Enum added",
            ItemKind::FileEnumRemoved => "Enum removed",
            ItemKind::NameMissing => "Name missing",
        }
    }

    /// The kind reported for the same change with sides swapped
    pub fn mirrored(&self) -> ItemKind {
        match self {
            ItemKind::EnumValueAdded => ItemKind::EnumValueRemoved,
            ItemKind::EnumValueRemoved => ItemKind::EnumValueAdded,
            ItemKind::MessageFieldAdded => ItemKind::MessageFieldRemoved,
            ItemKind::MessageFieldRemoved => ItemKind::MessageFieldAdded,
            ItemKind::FileMessageAdded => ItemKind::FileMessageRemoved,
            ItemKind::FileMessageRemoved => ItemKind::FileMessageAdded,
            ItemKind::FileEnumAdded => ItemKind::FileEnumRemoved,
            ItemKind::FileEnumRemoved => ItemKind::FileEnumAdded,
            other => *other,
        }
    }
}

/// A leaf change record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub a: String,
    pub b: String,
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.kind.description(), self.a, self.b)
    }
}

/// Handle to a section inside a [`DiffTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionId(usize);

/// Comparison of element `a` (side A) against element `b` (side B)
#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    pub a: String,
    pub b: String,
    pub items: Vec<Item>,
    pub children: Vec<SectionId>,
    /// Provenance notes ("required by ...")
    pub notes: Vec<String>,
}

impl Section {
    fn new(kind: SectionKind, a: String, b: String) -> Self {
        Self {
            kind,
            a,
            b,
            items: Vec::new(),
            children: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// No items and no child sections; notes do not count
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.children.is_empty()
    }

    pub fn description(&self) -> String {
        match self.kind {
            SectionKind::Root => "/".to_string(),
            SectionKind::Message => format!("Comparing messages: {} -> {}", self.a, self.b),
            SectionKind::Field => format!("Comparing message fields: {} -> {}", self.a, self.b),
            SectionKind::Enum => format!("Comparing enums: {} -> {}", self.a, self.b),
            SectionKind::EnumValue => format!("Comparing enum values: {} -> {}", self.a, self.b),
        }
    }
}

/// Memoization key of a type-level comparison
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    kind: SectionKind,
    a: String,
    b: String,
}

impl PairKey {
    pub fn new(kind: SectionKind, a: &str, b: &str) -> Self {
        Self {
            kind,
            a: a.to_string(),
            b: b.to_string(),
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.a, self.b)
    }
}

/// Arena-backed tree of sections rooted at [`DiffTree::root`]
#[derive(Debug, Clone)]
pub struct DiffTree {
    sections: Vec<Section>,
}

impl Default for DiffTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffTree {
    pub fn new() -> Self {
        Self {
            sections: vec![Section::new(SectionKind::Root, String::new(), String::new())],
        }
    }

    pub fn root(&self) -> SectionId {
        SectionId(0)
    }

    pub fn section(&self, id: SectionId) -> &Section {
        &self.sections[id.0]
    }

    /// Child sections of `id`, in creation order
    pub fn children(&self, id: SectionId) -> impl Iterator<Item = (SectionId, &Section)> + '_ {
        self.sections[id.0]
            .children
            .iter()
            .map(move |child| (*child, &self.sections[child.0]))
    }

    /// Append a new child section under `parent`
    pub fn add_section(
        &mut self,
        parent: SectionId,
        kind: SectionKind,
        a: impl Into<String>,
        b: impl Into<String>,
    ) -> SectionId {
        let id = self.detached_section(kind, a, b);
        self.attach(parent, id);
        id
    }

    /// Create a section that is not yet part of the tree; see [`DiffTree::attach`]
    pub fn detached_section(&mut self, kind: SectionKind, a: impl Into<String>, b: impl Into<String>) -> SectionId {
        let id = SectionId(self.sections.len());
        self.sections.push(Section::new(kind, a.into(), b.into()));
        id
    }

    pub fn attach(&mut self, parent: SectionId, child: SectionId) {
        self.sections[parent.0].children.push(child);
    }

    pub fn add_item(&mut self, id: SectionId, kind: ItemKind, a: impl Into<String>, b: impl Into<String>) {
        self.sections[id.0].items.push(Item {
            kind,
            a: a.into(),
            b: b.into(),
        });
    }

    pub fn add_note(&mut self, id: SectionId, note: impl Into<String>) {
        self.sections[id.0].notes.push(note.into());
    }

    /// Trim the subtree below `id` and report whether `id` itself is empty
    pub fn trim_section(&mut self, id: SectionId) -> bool {
        let children = std::mem::take(&mut self.sections[id.0].children);
        let kept: Vec<SectionId> = children
            .into_iter()
            .filter(|child| !self.trim_section(*child))
            .collect();
        let section = &mut self.sections[id.0];
        section.children = kept;
        section.is_empty()
    }

    /// Drop every non-root section with no items and no (trimmed) children
    pub fn trim(&mut self) {
        let root = self.root();
        self.trim_section(root);
    }

    /// True when the root holds nothing, i.e. "no differences"
    pub fn is_empty(&self) -> bool {
        self.section(self.root()).is_empty()
    }

    /// Items reachable from the root, depth first, each with its section
    pub fn items(&self) -> Vec<(&Section, &Item)> {
        let mut out = Vec::new();
        self.collect_items(self.root(), &mut out);
        out
    }

    fn collect_items<'t>(&'t self, id: SectionId, out: &mut Vec<(&'t Section, &'t Item)>) {
        let section = self.section(id);
        out.extend(section.items.iter().map(|item| (section, item)));
        for child in &section.children {
            self.collect_items(*child, out);
        }
    }

    /// Count of reachable items per kind
    pub fn summary(&self) -> DiffSummary {
        let mut counts = BTreeMap::new();
        for (_, item) in self.items() {
            *counts.entry(item.kind).or_insert(0) += 1;
        }
        DiffSummary { counts }
    }
}

/// Per-kind item counts of a tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub counts: BTreeMap<ItemKind, usize>,
}

impl DiffSummary {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn count(&self, kind: ItemKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn has_missing_names(&self) -> bool {
        self.count(ItemKind::NameMissing) > 0
    }
}

/// Serializes one section and its subtree as nested JSON
struct SectionNode<'t> {
    tree: &'t DiffTree,
    id: SectionId,
}

impl Serialize for SectionNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let section = self.tree.section(self.id);
        let sections: Vec<SectionNode<'_>> = section
            .children
            .iter()
            .map(|child| SectionNode {
                tree: self.tree,
                id: *child,
            })
            .collect();

        let len = if section.notes.is_empty() { 5 } else { 6 };
        let mut state = serializer.serialize_struct("Section", len)?;
        state.serialize_field("type", &section.kind)?;
        state.serialize_field("a", &section.a)?;
        state.serialize_field("b", &section.b)?;
        state.serialize_field("items", &section.items)?;
        state.serialize_field("sections", &sections)?;
        if section.notes.is_empty() {
            state.skip_field("notes")?;
        } else {
            state.serialize_field("notes", &section.notes)?;
        }
        state.end()
    }
}

impl Serialize for DiffTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SectionNode {
            tree: self,
            id: self.root(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DiffTree {
        let mut tree = DiffTree::new();
        let root = tree.root();
        let msg = tree.add_section(root, SectionKind::Message, "M", "M");
        let field = tree.add_section(msg, SectionKind::Field, "M.a", "M.a");
        tree.add_item(field, ItemKind::MessageFieldIdChanged, "1", "2");
        let quiet = tree.add_section(msg, SectionKind::Field, "M.b", "M.b");
        tree.add_section(quiet, SectionKind::EnumValue, "X", "X");
        let noted = tree.add_section(root, SectionKind::Enum, "E", "E");
        tree.add_note(noted, "required by M.e");
        tree
    }

    #[test]
    fn test_trim_removes_empty_sections_post_order() {
        let mut tree = sample();
        tree.trim();

        let root = tree.section(tree.root());
        assert_eq!(root.children.len(), 1);
        let (msg_id, msg) = tree.children(tree.root()).next().unwrap();
        assert_eq!(msg.kind, SectionKind::Message);
        assert_eq!(msg.children.len(), 1);
        let (_, field) = tree.children(msg_id).next().unwrap();
        assert_eq!(field.a, "M.a");
    }

    #[test]
    fn test_trim_is_idempotent() {
        let mut once = sample();
        once.trim();
        let mut twice = once.clone();
        twice.trim();
        assert_eq!(
            serde_json::to_value(&once).unwrap(),
            serde_json::to_value(&twice).unwrap()
        );
    }

    #[test]
    fn test_root_survives_trim() {
        let mut tree = DiffTree::new();
        tree.add_section(tree.root(), SectionKind::Message, "M", "M");
        tree.trim();
        assert!(tree.is_empty());
        assert_eq!(tree.section(tree.root()).kind, SectionKind::Root);
    }

    #[test]
    fn test_summary_counts_reachable_items() {
        let mut tree = sample();
        tree.add_item(tree.root(), ItemKind::FileMessageAdded, "", "N");
        tree.trim();
        let summary = tree.summary();
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.count(ItemKind::MessageFieldIdChanged), 1);
        assert!(!summary.has_missing_names());
    }

    #[test]
    fn test_json_shape() {
        let mut tree = DiffTree::new();
        let e = tree.add_section(tree.root(), SectionKind::Enum, "E", "E2");
        tree.add_item(e, ItemKind::EnumValueAdded, "", "B");
        tree.add_note(e, "required by M.e");

        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["type"], "/");
        assert!(json.get("notes").is_none());
        let section = &json["sections"][0];
        assert_eq!(section["type"], "enum_comparison");
        assert_eq!(section["b"], "E2");
        assert_eq!(section["items"][0]["type"], "enum_value_added");
        assert_eq!(section["notes"][0], "required by M.e");
    }

    #[test]
    fn test_item_display_and_mirror() {
        let item = Item {
            kind: ItemKind::MessageFieldRemoved,
            a: "name".to_string(),
            b: String::new(),
        };
        assert_eq!(item.to_string(), "Field removed: name -> ");
        assert_eq!(item.kind.mirrored(), ItemKind::MessageFieldAdded);
        assert_eq!(ItemKind::NameMissing.mirrored(), ItemKind::NameMissing);
    }

    #[test]
    fn test_pair_key_distinguishes_kinds() {
        let m = PairKey::new(SectionKind::Message, "a.X", "b.X");
        let e = PairKey::new(SectionKind::Enum, "a.X", "b.X");
        assert_ne!(m, e);
        assert_eq!(m.to_string(), "a.X:b.X");
    }
}
