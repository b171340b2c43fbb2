//! Report rendering
//!
//! Text output is one line per section and item, indented by depth:
//!
//! ```text
//! /
//!   Comparing messages: acme.User -> acme.User
//!     * Field removed: nickname ->
//! ```

use std::fmt::Write;

use crate::config::OutputFormat;
use crate::diff::{DiffTree, SectionId};
use crate::error::Result;

/// Text rendering options
#[derive(Debug, Clone, Copy)]
pub struct TextOptions {
    /// Spaces per nesting level
    pub indent: usize,
    /// Print "required by" notes below their section
    pub show_notes: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            show_notes: false,
        }
    }
}

/// Render a tree in the requested format
pub fn render(tree: &DiffTree, format: OutputFormat, options: TextOptions) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(tree, options)),
        OutputFormat::Json => render_json(tree),
    }
}

pub fn render_text(tree: &DiffTree, options: TextOptions) -> String {
    let mut out = String::new();
    write_section(tree, tree.root(), 0, options, &mut out);
    out
}

pub fn render_json(tree: &DiffTree) -> Result<String> {
    Ok(serde_json::to_string_pretty(tree)?)
}

fn write_section(tree: &DiffTree, id: SectionId, depth: usize, options: TextOptions, out: &mut String) {
    let section = tree.section(id);
    let pad = " ".repeat(depth * options.indent);
    let inner = " ".repeat((depth + 1) * options.indent);

    // Writing into a String cannot fail
    let _ = writeln!(out, "{}{}", pad, section.description());
    if options.show_notes {
        for note in &section.notes {
            let _ = writeln!(out, "{}- {}", inner, note);
        }
    }
    for item in &section.items {
        let _ = writeln!(out, "{}* {}", inner, item);
    }
    for child in &section.children {
        write_section(tree, *child, depth + 1, options, out);
    }
}

/// One-line tally, e.g. `3 differences (2 Field added, 1 Type changed)`
pub fn render_summary(tree: &DiffTree) -> String {
    let summary = tree.summary();
    if summary.total() == 0 {
        return "No differences".to_string();
    }

    let parts: Vec<String> = summary
        .counts
        .iter()
        .map(|(kind, count)| format!("{} {}", count, kind.description()))
        .collect();
    let noun = if summary.total() == 1 { "difference" } else { "differences" };
    format!("{} {} ({})", summary.total(), noun, parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{ItemKind, SectionKind};

    fn sample() -> DiffTree {
        let mut tree = DiffTree::new();
        let root = tree.root();
        tree.add_item(root, ItemKind::FileMessageAdded, "", "acme.Team");
        let msg = tree.add_section(root, SectionKind::Message, "acme.User", "acme.User");
        tree.add_note(msg, "required by acme.Team.owner");
        tree.add_item(msg, ItemKind::MessageFieldRemoved, "nickname", "");
        let field = tree.add_section(msg, SectionKind::Field, "acme.User.id", "acme.User.id");
        tree.add_item(field, ItemKind::MessageFieldIdChanged, "1", "2");
        tree
    }

    #[test]
    fn test_text_layout() {
        let text = render_text(&sample(), TextOptions::default());
        let expected = [
            "/",
            "  * Message added:  -> acme.Team",
            "  Comparing messages: acme.User -> acme.User",
            "    * Field removed: nickname -> ",
            "    Comparing message fields: acme.User.id -> acme.User.id",
            "      * ID changed: 1 -> 2",
        ];
        assert_eq!(text.lines().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_text_notes_and_indent() {
        let options = TextOptions {
            indent: 4,
            show_notes: true,
        };
        let text = render_text(&sample(), options);
        assert!(text.contains("\n    Comparing messages: acme.User -> acme.User\n        - required by acme.Team.owner\n"));
    }

    #[test]
    fn test_empty_tree_renders_root_only() {
        assert_eq!(render_text(&DiffTree::new(), TextOptions::default()), "/\n");
    }

    #[test]
    fn test_json_round_trips_through_value() {
        let json = render(&sample(), OutputFormat::Json, TextOptions::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["items"][0]["type"], "file_message_added");
        assert_eq!(value["sections"][0]["sections"][0]["items"][0]["b"], "2");
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(render_summary(&DiffTree::new()), "No differences");
        assert_eq!(
            render_summary(&sample()),
            "3 differences (1 ID changed, 1 Field removed, 1 Message added)"
        );
    }
}
