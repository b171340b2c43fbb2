//! Protobuf Schema Compatibility
//!
//! Compares two versions of a protobuf schema and reports every structural
//! difference between them: added or removed messages, enums, fields and
//! enum values, and changed names, tags, labels, types and default values.
//!
//! ## Features
//!
//! - **Two matching modes**: pair fields and enum values by name (source
//!   compatibility) or by tag number (wire compatibility)
//! - **Cycle safe**: recursive and mutually recursive messages are compared
//!   once per type pair
//! - **Shared types reported once**: a message or enum used by many fields
//!   gets a single section annotated with every field that required it
//! - **Two input formats**: JSON schema documents and binary
//!   `FileDescriptorSet`s produced by `protoc`
//!
//! ## Architecture
//!
//! ```text
//! source/      load JSON or descriptor sets into a DescriptorPool
//! descriptor/  resolved messages, enums and fields
//! matcher      by-name / by-number pairing
//! defaults     default value equivalence
//! comparator   recursive walk producing a DiffTree
//! diff         the DiffTree, trimming and summaries
//! render       text and JSON reports
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use proto_compat::{compare_sources, MatchMode, Source, Target};
//!
//! let a = Source::open("v1", "api.json")?;
//! let b = Source::open("v2", "api.json")?;
//! let tree = compare_sources(&a, &b, &Target::parse("acme.User", None), MatchMode::ByNumber);
//! println!("{}", proto_compat::render_summary(&tree));
//! # Ok::<(), proto_compat::CompatError>(())
//! ```

pub mod comparator;
pub mod config;
pub mod defaults;
pub mod descriptor;
pub mod diff;
pub mod error;
pub mod matcher;
pub mod render;
pub mod source;

pub use comparator::{compare_sources, Comparator, Target};
pub use config::{CompatConfig, OutputFormat};
pub use descriptor::{DescriptorPool, FieldDescriptor, MessageDescriptor, EnumDescriptor};
pub use diff::{DiffSummary, DiffTree, Item, ItemKind, Section, SectionKind};
pub use error::{CompatError, Result};
pub use matcher::MatchMode;
pub use render::{render, render_json, render_summary, render_text, TextOptions};
pub use source::{SchemaDocument, Source};
