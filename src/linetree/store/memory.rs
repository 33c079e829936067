use super::DocumentStore;
use crate::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// In-memory storage for testing and development.
/// Does NOT persist data.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    files: HashMap<PathBuf, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl DocumentStore for InMemoryStore {
    fn read(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.files.get(path).cloned())
    }

    fn write(&mut self, path: &Path, content: &str) -> Result<()> {
        self.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;

    pub const BOOKSTORE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bookstore id="root">
    <book id="book1" category="COOKING">
        <title id="title1" lang="en">Everyday Italian</title>
        <price id="price1">30.00</price>
    </book>
    <book id="book2" category="CHILDREN">
        <title id="title2" lang="en">Harry Potter</title>
    </book>
</bookstore>
"#;

    pub struct StoreFixture {
        pub store: InMemoryStore,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
            }
        }

        pub fn with_text(mut self, path: &str, content: &str) -> Self {
            self.store.write(Path::new(path), content).unwrap();
            self
        }

        pub fn with_bookstore(self, path: &str) -> Self {
            self.with_text(path, BOOKSTORE)
        }

        pub fn with_logged_bookstore(self, path: &str) -> Self {
            self.with_text(path, &format!("# log\n{}", BOOKSTORE))
        }
    }
}
