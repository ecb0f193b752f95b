//! The staging tree and its promotion to the final output.
//!
//! A build writes into a staging directory that mirrors the final layout:
//!
//! ```text
//! tmp-site-build/
//! ├── index.html              # Home
//! ├── about/index.html
//! ├── posts/<slug>/index.html
//! └── assets/                 # Verbatim copy of sage/assets/
//! ```
//!
//! Only a fully rendered staging tree is promoted. Promotion is a single
//! `rename` when source and target share a filesystem. Across devices it falls
//! back to copy-then-delete, which is NOT atomic: a crash mid-copy leaves a
//! partial final tree, and a crash after the copy leaves both trees.
//!
//! Paths are write-once: staging, page directories' `index.html`, and the
//! final directory are all created with "must not exist" semantics.

use crate::output::PromoteMethod;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(
        "Output path \"{}\" already exists. Please remove it (or pass --clean) and try again.",
        .0.display()
    )]
    OutputAlreadyExists(PathBuf),
}

/// Fail if `path` exists in any form.
pub fn ensure_absent(path: &Path) -> Result<(), TreeError> {
    if path.exists() {
        return Err(TreeError::OutputAlreadyExists(path.to_path_buf()));
    }
    Ok(())
}

/// Remove each directory that exists. Returns the ones removed.
pub fn clean(paths: &[PathBuf]) -> Result<Vec<PathBuf>, TreeError> {
    let mut removed = Vec::new();
    for path in paths {
        if path.exists() {
            fs::remove_dir_all(path)?;
            removed.push(path.clone());
        }
    }
    Ok(removed)
}

/// A staging directory being written by one build.
#[derive(Debug)]
pub struct BuildTree {
    root: PathBuf,
}

impl BuildTree {
    /// Create the staging root. It must not already exist.
    pub fn create(root: &Path) -> Result<Self, TreeError> {
        if let Some(parent) = root.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir(root).map_err(|e| already_exists_or_io(e, root))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy `src` verbatim to `<root>/<name>/`. Returns the target directory.
    pub fn copy_in(&self, src: &Path, name: &str) -> Result<PathBuf, TreeError> {
        let dst = self.root.join(name);
        copy_tree(src, &dst)?;
        Ok(dst)
    }

    /// Write `html` as `index.html` under `rel_dir`, creating directories.
    ///
    /// Returns the written path relative to the tree root.
    pub fn write_page(&self, rel_dir: &Path, html: &str) -> Result<PathBuf, TreeError> {
        let dir = self.root.join(rel_dir);
        fs::create_dir_all(&dir)?;

        let rel_path = rel_dir.join(crate::layout::INDEX_PAGE);
        let path = self.root.join(&rel_path);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| already_exists_or_io(e, &path))?;
        file.write_all(html.as_bytes())?;
        Ok(rel_path)
    }

    /// Put the finished tree at `target`, which must not exist.
    ///
    /// A rename leaves nothing behind. After a cross-device copy the staging
    /// tree is still present until [`BuildTree::discard`] removes it.
    pub fn promote(&self, target: &Path) -> Result<PromoteMethod, TreeError> {
        ensure_absent(target)?;
        match fs::rename(&self.root, target) {
            Ok(()) => Ok(PromoteMethod::Rename),
            Err(e) if e.kind() == ErrorKind::CrossesDevices => self.promote_by_copy(target),
            Err(e) => Err(e.into()),
        }
    }

    /// Copy the finished tree to `target`, leaving staging for
    /// [`BuildTree::discard`].
    pub fn promote_by_copy(&self, target: &Path) -> Result<PromoteMethod, TreeError> {
        copy_tree(&self.root, target)?;
        Ok(PromoteMethod::CopyThenDelete)
    }

    /// Remove the staging tree if it still exists. Returns whether it did.
    pub fn discard(self) -> Result<bool, TreeError> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
            return Ok(true);
        }
        Ok(false)
    }
}

fn already_exists_or_io(err: std::io::Error, path: &Path) -> TreeError {
    if err.kind() == ErrorKind::AlreadyExists {
        TreeError::OutputAlreadyExists(path.to_path_buf())
    } else {
        TreeError::Io(err)
    }
}

/// Recursively copy `src` into a new directory `dst`.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<(), TreeError> {
    fs::create_dir(dst).map_err(|e| already_exists_or_io(e, dst))?;

    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
