use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use data_error::{DonutError, Result};
use data_model::record::UserRecord;

use crate::atomic::write_atomic;

/// Flat-file store owning the canonical user collection.
///
/// Every operation re-reads the backing file, so each request observes
/// the latest persisted state. Mutations take the single-writer lock
/// and read-modify-write the whole collection; this serializes
/// concurrent in-process writers instead of letting them race on the
/// shared file.
pub struct UserStore {
    label: String,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl UserStore {
    /// Create a store with a diagnostic label and backing file path.
    pub fn new(label: String, path: &Path) -> Self {
        Self {
            label,
            path: PathBuf::from(path),
            write_lock: Mutex::new(()),
        }
    }

    /// Read the whole collection from the backing file.
    ///
    /// A missing or malformed file is a storage error; an empty
    /// collection is not.
    pub fn load_all(&self) -> Result<Vec<UserRecord>> {
        if !self.path.exists() {
            return Err(DonutError::StorageRead(
                self.label.clone(),
                "file does not exist".to_owned(),
            ));
        }

        let file = fs::File::open(&self.path).map_err(|err| {
            DonutError::StorageRead(self.label.clone(), err.to_string())
        })?;
        let records: Vec<UserRecord> = serde_json::from_reader(file)
            .map_err(|err| {
                DonutError::StorageRead(self.label.clone(), err.to_string())
            })?;

        log::debug!(
            "store/{}: {} records loaded",
            self.label,
            records.len()
        );
        Ok(records)
    }

    /// Overwrite the backing file with the full collection.
    ///
    /// The file is written as pretty-printed JSON with 4-space
    /// indentation, the format the front ends already consume, via an
    /// atomic temp-and-move. Saving the same data twice yields the same
    /// persisted bytes.
    pub fn save_all(&self, records: &[UserRecord]) -> Result<()> {
        let mut buf = Vec::new();
        let formatter =
            serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, formatter);
        records.serialize(&mut serializer).map_err(|err| {
            DonutError::StorageWrite(self.label.clone(), err.to_string())
        })?;

        write_atomic(&self.path, &buf).map_err(|err| {
            DonutError::StorageWrite(self.label.clone(), err.to_string())
        })?;

        log::info!(
            "store/{}: {} records written",
            self.label,
            records.len()
        );
        Ok(())
    }

    /// Append a new user, rejecting a case-insensitive username
    /// collision without touching the file.
    pub fn append_user(&self, record: UserRecord) -> Result<UserRecord> {
        let _guard = self.writer()?;

        let mut records = self.load_all()?;
        if records
            .iter()
            .any(|user| user.is_named(&record.username))
        {
            return Err(DonutError::DuplicateUser(record.username));
        }

        records.push(record.clone());
        self.save_all(&records)?;
        Ok(record)
    }

    /// Set the user's high score to the maximum of the existing score
    /// and `score`, and return the updated record. A user with no score
    /// yet takes `score` as-is.
    pub fn update_high_score(
        &self,
        username: &str,
        score: i64,
    ) -> Result<UserRecord> {
        let _guard = self.writer()?;

        let mut records = self.load_all()?;
        let user = records
            .iter_mut()
            .find(|user| user.is_named(username))
            .ok_or_else(|| DonutError::UserNotFound(username.to_owned()))?;

        user.high_score =
            Some(user.high_score.map_or(score, |prev| prev.max(score)));
        let updated = user.clone();

        self.save_all(&records)?;
        Ok(updated)
    }

    /// Record a friendship between `reference` and `target` on both
    /// records. Re-adding an existing friendship is a no-op, not an
    /// error. Returns the two updated friend lists, reference first.
    pub fn add_friend(
        &self,
        reference: &str,
        target: &str,
    ) -> Result<(Vec<String>, Vec<String>)> {
        let _guard = self.writer()?;

        let mut records = self.load_all()?;
        let ref_idx = records
            .iter()
            .position(|user| user.is_named(reference))
            .ok_or_else(|| DonutError::UserNotFound(reference.to_owned()))?;
        let tgt_idx = records
            .iter()
            .position(|user| user.is_named(target))
            .ok_or_else(|| DonutError::UserNotFound(target.to_owned()))?;

        let already_friends = ref_idx == tgt_idx
            || records[tgt_idx]
                .friends
                .iter()
                .any(|name| name.eq_ignore_ascii_case(reference));
        if !already_friends {
            let ref_name = records[ref_idx].username.clone();
            let tgt_name = records[tgt_idx].username.clone();
            records[tgt_idx].friends.push(ref_name);
            records[ref_idx].friends.push(tgt_name);
            self.save_all(&records)?;
        }

        Ok((
            records[ref_idx].friends.clone(),
            records[tgt_idx].friends.clone(),
        ))
    }

    fn writer(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| {
            DonutError::StorageWrite(
                self.label.clone(),
                "writer lock poisoned".to_owned(),
            )
        })
    }
}
