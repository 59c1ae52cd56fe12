// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic one-file-per-instance persistence, grounded in the snapshot
//! store's write discipline: write to `.tmp`, `sync_all`, then rename, so a
//! crash mid-write never leaves a torn file behind. A corrupt file on load
//! is rotated to `.bak`/`.bak.N` rather than propagated as fatal, so a
//! damaged record never blocks the daemon from starting back up with a
//! fresh instance.

use crate::error::StorageError;
use crate::record::InstanceRecord;
use oj_core::InstanceId;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::warn;

const MAX_BAK_FILES: u32 = 3;

#[derive(Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, instance_id: &InstanceId) -> PathBuf {
        self.dir.join(format!("{}.json", instance_id.as_str()))
    }

    /// Save `record` atomically, creating the store directory if needed.
    pub fn save(&self, record: &InstanceRecord) -> Result<(), StorageError> {
        let path = self.path_for(&record.instance_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, record)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Load the record for `instance_id`. Returns `Ok(None)` if it doesn't
    /// exist or is corrupt; a corrupt file is moved aside to `.bak` first.
    pub fn load(&self, instance_id: &InstanceId) -> Result<Option<InstanceRecord>, StorageError> {
        let path = self.path_for(instance_id);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        let reader = BufReader::new(file);
        match serde_json::from_reader(reader) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                let bak_path = rotate_bak_path(&path);
                warn!(
                    error = %e,
                    path = %path.display(),
                    bak = %bak_path.display(),
                    "corrupt instance snapshot, moving to .bak",
                );
                fs::rename(&path, &bak_path)?;
                Ok(None)
            }
        }
    }

    pub fn delete(&self, instance_id: &InstanceId) -> Result<(), StorageError> {
        let path = self.path_for(instance_id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Every instance with a persisted record, derived from filenames —
    /// there's no separate index file to go stale.
    pub fn list(&self) -> Result<Vec<InstanceId>, StorageError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(InstanceId::new(stem));
            }
        }
        Ok(ids)
    }
}

/// Pick the next `.bak`/`.bak.N` path, rotating older backups out. Keeps up
/// to [`MAX_BAK_FILES`] backups, discarding the oldest once at capacity.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
