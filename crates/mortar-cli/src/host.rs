//! Filesystem host: stylesheet files on disk as pipeline inputs.

use crate::error::{CliError, Result};
use mortar_bundler::{FragmentError, InputFile, OutputStylesheet};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

/// A stylesheet on disk, addressed relative to the project root.
#[derive(Debug)]
pub struct FsFile {
    path: PathBuf,
    path_in_bundle: String,
    url: String,
    errors: Mutex<Vec<FragmentError>>,
    outputs: Mutex<Vec<OutputStylesheet>>,
}

impl FsFile {
    pub fn new(root: &Path, path: PathBuf) -> Self {
        let path_in_bundle = bundle_path(root, &path);
        Self {
            url: format!("/{path_in_bundle}"),
            path_in_bundle,
            path,
            errors: Mutex::new(Vec::new()),
            outputs: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn take_errors(&self) -> Vec<FragmentError> {
        std::mem::take(&mut *self.errors.lock())
    }

    pub fn take_outputs(&self) -> Vec<OutputStylesheet> {
        std::mem::take(&mut *self.outputs.lock())
    }
}

impl InputFile for FsFile {
    fn path_in_bundle(&self) -> &str {
        &self.path_in_bundle
    }

    fn source_url(&self) -> Option<&str> {
        Some(&self.url)
    }

    fn contents(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }

    /// A `<file>.map` next to the stylesheet, when present.
    fn source_map(&self) -> Option<String> {
        let mut map = self.path.clone().into_os_string();
        map.push(".map");
        std::fs::read_to_string(map).ok()
    }

    fn error(&self, error: FragmentError) {
        self.errors.lock().push(error);
    }

    fn add_stylesheet(&self, stylesheet: OutputStylesheet) {
        self.outputs.lock().push(stylesheet);
    }
}

/// `path` relative to `root` with `/` separators, or as given when outside it.
fn bundle_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_stylesheet(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "css")
}

/// Expands `inputs` into stylesheet files, in argument order. Directories
/// contribute their `.css` files recursively, sorted by file name.
pub fn collect_inputs(root: &Path, inputs: &[PathBuf]) -> Result<Vec<Arc<FsFile>>> {
    let mut files = Vec::new();
    for input in inputs {
        let input = if input.is_absolute() {
            input.clone()
        } else {
            root.join(input)
        };
        if input.is_dir() {
            for entry in WalkDir::new(&input).sort_by_file_name() {
                let entry = entry.map_err(|e| CliError::Read {
                    path: e.path().map(Path::to_path_buf).unwrap_or_else(|| input.clone()),
                    source: e.into(),
                })?;
                if entry.file_type().is_file() && is_stylesheet(entry.path()) {
                    files.push(Arc::new(FsFile::new(root, entry.into_path())));
                }
            }
        } else if input.is_file() {
            files.push(Arc::new(FsFile::new(root, input)));
        } else {
            return Err(CliError::Read {
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
                path: input,
            });
        }
    }
    debug!(count = files.len(), "collected stylesheets");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn directories_expand_in_file_name_order() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("client/nested")).unwrap();
        fs::write(root.join("client/b.css"), "b{}").unwrap();
        fs::write(root.join("client/a.css"), "a{}").unwrap();
        fs::write(root.join("client/nested/c.css"), "c{}").unwrap();
        fs::write(root.join("client/readme.md"), "#").unwrap();
        fs::write(root.join("first.css"), "x{}").unwrap();

        let files = collect_inputs(root, &[PathBuf::from("first.css"), PathBuf::from("client")]).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path_in_bundle()).collect();
        assert_eq!(
            paths,
            vec!["first.css", "client/a.css", "client/b.css", "client/nested/c.css"]
        );
        assert_eq!(files[1].source_url(), Some("/client/a.css"));
    }

    #[test]
    fn missing_input_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = collect_inputs(temp.path(), &[PathBuf::from("nope.css")]).unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
    }

    #[test]
    fn sibling_map_is_the_upstream_map() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.css"), "a{}").unwrap();
        fs::write(temp.path().join("a.css.map"), "{\"version\":3}").unwrap();
        let file = FsFile::new(temp.path(), temp.path().join("a.css"));
        assert_eq!(file.source_map().as_deref(), Some("{\"version\":3}"));
        assert_eq!(file.contents().unwrap(), "a{}");
    }
}
