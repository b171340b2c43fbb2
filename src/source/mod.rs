//! Schema Loading
//!
//! A [`Source`] is one loaded schema version: a [`DescriptorPool`] holding every
//! file that was read, plus the primary file whose top-level types are
//! compared in whole-file mode.
//!
//! Supported inputs:
//! - `.json`: a [`SchemaDocument`]
//! - `.pb`, `.desc`, `.binpb`, `.protoset`: a binary `FileDescriptorSet`
//!   (as written by `protoc --include_imports --descriptor_set_out`)

pub mod descriptor_set;
pub mod document;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::descriptor::{DescriptorPool, FileDescriptor};
use crate::error::{CompatError, Result};
pub use document::{FileDef, SchemaDocument};

/// Input format of a schema file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Document,
    DescriptorSet,
}

impl SourceFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(SourceFormat::Document),
            "pb" | "desc" | "binpb" | "protoset" => Some(SourceFormat::DescriptorSet),
            _ => None,
        }
    }
}

/// One loaded schema version
#[derive(Debug, Clone)]
pub struct Source {
    pool: DescriptorPool,
    primary: usize,
    path: PathBuf,
}

impl Source {
    /// Load `file` relative to `root_dir`
    pub fn open(root_dir: impl AsRef<Path>, file: &str) -> Result<Self> {
        let path = root_dir.as_ref().join(file);
        let format = SourceFormat::from_path(&path)
            .ok_or_else(|| CompatError::UnsupportedFormat(path.display().to_string()))?;

        let files = match format {
            SourceFormat::Document => {
                let content = fs::read_to_string(&path)?;
                let doc: SchemaDocument = serde_json::from_str(&content)?;
                doc.into_files()
            }
            SourceFormat::DescriptorSet => {
                let bytes = fs::read(&path)?;
                descriptor_set::decode(&bytes)?
            }
        };

        let source = Self::from_files(files, file, path)?;
        info!(
            path = %source.path.display(),
            file = %source.file().name,
            messages = source.pool.message_count(),
            enums = source.pool.enum_count(),
            "Loaded schema"
        );
        Ok(source)
    }

    /// Build from an in-memory document; `primary` selects the compared file
    pub fn from_document(doc: SchemaDocument, primary: &str) -> Result<Self> {
        Self::from_files(doc.into_files(), primary, PathBuf::from(primary))
    }

    fn from_files(mut files: Vec<FileDef>, primary: &str, path: PathBuf) -> Result<Self> {
        if files.is_empty() {
            return Err(CompatError::FileNotFound {
                file: primary.to_string(),
                source_path: path.display().to_string(),
            });
        }

        // A single unnamed file takes the name it was loaded under
        if files.len() == 1 && files[0].name.is_empty() {
            files[0].name = primary.to_string();
        }

        let primary_index = select_primary(&files, primary);
        let pool = DescriptorPool::build(&files)?;

        Ok(Self {
            pool,
            primary: primary_index,
            path,
        })
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// The primary file
    pub fn file(&self) -> &FileDescriptor {
        &self.pool.files()[self.primary]
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Exact name match, then same file stem (`api.pb` selects `api.proto`), then
/// the last file, which protoc writes after all of its imports
fn select_primary(files: &[FileDef], requested: &str) -> usize {
    if let Some(idx) = files.iter().position(|f| f.name == requested) {
        return idx;
    }

    let stem = |name: &str| {
        Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
    };
    let requested_stem = stem(requested);
    if requested_stem.is_some() {
        if let Some(idx) = files.iter().rposition(|f| stem(&f.name) == requested_stem) {
            return idx;
        }
    }

    files.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;
    use std::io::Write;

    fn file(name: &str) -> FileDef {
        FileDef {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_select_primary() {
        let files = vec![file("dep.proto"), file("api.proto"), file("other.proto")];
        assert_eq!(select_primary(&files, "api.proto"), 1);
        assert_eq!(select_primary(&files, "api.pb"), 1);
        assert_eq!(select_primary(&files, "bundle.pb"), 2);
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(SourceFormat::from_path(Path::new("a.json")), Some(SourceFormat::Document));
        assert_eq!(SourceFormat::from_path(Path::new("a.binpb")), Some(SourceFormat::DescriptorSet));
        assert_eq!(SourceFormat::from_path(Path::new("a.proto")), None);
    }

    #[test]
    fn test_open_json_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = fs::File::create(dir.path().join("a.json")).unwrap();
        write!(
            f,
            r#"{{ "package": "p", "messages": [ {{ "name": "M", "fields": [
                {{ "name": "x", "number": 1, "type": "int32" }} ] }} ] }}"#
        )
        .unwrap();

        let source = Source::open(dir.path(), "a.json").unwrap();
        assert_eq!(source.file().name, "a.json");
        assert!(source.pool().find_message_by_name("p.M").is_some());
    }

    #[test]
    fn test_open_descriptor_set() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = descriptor_set::tests::sample_set().encode_to_vec();
        fs::write(dir.path().join("shop.pb"), bytes).unwrap();

        let source = Source::open(dir.path(), "shop.pb").unwrap();
        assert_eq!(source.file().name, "shop.proto");
        let order = source.pool().find_message_by_name("shop.Order").unwrap();
        assert_eq!(order.fields.len(), 3);
    }

    #[test]
    fn test_open_unsupported_extension() {
        let err = Source::open(".", "schema.proto").unwrap_err();
        assert!(matches!(err, CompatError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Source::open(dir.path(), "missing.json").unwrap_err();
        assert!(matches!(err, CompatError::Io(_)));
    }
}
