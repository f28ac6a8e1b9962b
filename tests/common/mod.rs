#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Template and deployed directories under one scratch root, removed on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let workspace = Self {
            temp_dir: tempdir().expect("temp dir"),
        };
        fs::create_dir(workspace.src()).expect("create src dir");
        fs::create_dir(workspace.dst()).expect("create dst dir");
        workspace
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Directory holding the updated templates.
    pub fn src(&self) -> PathBuf {
        self.path().join("src")
    }

    /// Directory holding the deployed files.
    pub fn dst(&self) -> PathBuf {
        self.path().join("dst")
    }

    pub fn write_src(&self, name: &str, contents: &str) -> PathBuf {
        write(&self.src().join(name), contents)
    }

    pub fn write_dst(&self, name: &str, contents: &str) -> PathBuf {
        write(&self.dst().join(name), contents)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        write(&self.path().join(name), contents)
    }

    pub fn read_dst(&self, name: &str) -> String {
        fs::read_to_string(self.dst().join(name)).expect("read deployed file")
    }

    /// The single backup directory created by a run.
    pub fn backup_dir(&self) -> PathBuf {
        let mut dirs: Vec<PathBuf> = fs::read_dir(self.dst())
            .expect("list dst")
            .map(|entry| entry.expect("dir entry").path())
            .filter(|path| path.is_dir())
            .collect();
        assert_eq!(dirs.len(), 1, "expected one backup dir, found {dirs:?}");
        dirs.remove(0)
    }
}

fn write(path: &Path, contents: &str) -> PathBuf {
    fs::write(path, contents).expect("write temp file contents");
    path.to_path_buf()
}
