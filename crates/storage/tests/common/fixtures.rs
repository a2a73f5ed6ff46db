use scout_core::config::{ContentConfig, ContentMode};
use std::path::Path;
use tempfile::TempDir;

/// Temporary scripts/bin tree.
pub struct ContentTree {
    pub dir: TempDir,
}

impl ContentTree {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("scripts")).unwrap();
        std::fs::create_dir_all(dir.path().join("bin")).unwrap();
        Self { dir }
    }

    /// Write `data` at `key` (e.g. "scripts/linux/a.sh"), creating parents.
    pub fn write(&self, key: &str, data: &[u8]) {
        let path = self.dir.path().join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, data).unwrap();
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn local_config(&self) -> ContentConfig {
        ContentConfig {
            scripts_dir: self.root().join("scripts"),
            bin_dir: self.root().join("bin"),
            ..Default::default()
        }
    }
}

/// Remote-mode config pointing at `base_url`.
pub fn remote_config(base_url: &str) -> ContentConfig {
    ContentConfig {
        mode: ContentMode::Remote,
        remote_base_url: base_url.to_string(),
        request_timeout_secs: 2,
        ..Default::default()
    }
}
