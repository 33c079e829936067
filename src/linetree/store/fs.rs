use super::DocumentStore;
use crate::error::Result;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Documents on disk. Relative paths resolve against `root`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl DocumentStore for FileStore {
    fn read(&self, path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(self.resolve(path)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, path: &Path, content: &str) -> Result<()> {
        let target = self.resolve(path);
        let dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let name = target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp_path = dir.join(format!(".{}-{}.tmp", name, Uuid::new_v4()));
        fs::write(&tmp_path, content)?;
        if let Err(err) = fs::rename(&tmp_path, &target) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }
}
