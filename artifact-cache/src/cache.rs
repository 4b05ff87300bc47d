use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use data_error::{DonutError, Result};
use data_model::record::UserRecord;

use crate::generator::Generator;
use crate::key::{derive_cache_key, describe};

/// Handle to a cached or freshly generated artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactHandle {
    pub path: PathBuf,
    pub description: String,
}

/// Outcome of a generation flight. `None` means the generator has not
/// run yet; requests that joined a finished flight observe the
/// recorded result instead of generating again.
type FlightOutcome = Option<std::result::Result<(), String>>;

/// Disk-backed cache of generated artifacts, keyed by the normalized
/// filter values.
///
/// The in-flight map hands each cache key its own flight: N concurrent
/// requests for the same key produce exactly one generator invocation
/// and N observers of its single result or single failure. A flight's
/// map entry is dropped once it completes, so a later request starts
/// fresh (and may retry a failed generation).
pub struct ArtifactCache {
    label: String,
    dir: PathBuf,
    inflight: Mutex<HashMap<String, Arc<Mutex<FlightOutcome>>>>,
}

impl ArtifactCache {
    /// Open (and create, if needed) a cache directory.
    pub fn new(label: String, dir: &Path) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        if !dir.is_dir() {
            return Err(DonutError::StorageWrite(
                label,
                "cache path is not a directory".to_owned(),
            ));
        }

        Ok(Self {
            label,
            dir: PathBuf::from(dir),
            inflight: Mutex::new(HashMap::new()),
        })
    }

    /// Pure existence check; contents are never validated.
    pub fn lookup(&self, key: &str) -> Option<PathBuf> {
        let path = self.artifact_path(key);
        path.exists().then_some(path)
    }

    /// Return the artifact for the request described by `components`,
    /// generating it at most once per distinct key.
    ///
    /// A cache hit never touches the generator. On a miss the
    /// generation happens under the per-key flight lock, and the
    /// flight's outcome is recorded there: a request that waited on
    /// another's generation observes that single result — the freshly
    /// written file on success, the same failure otherwise — instead
    /// of generating again.
    pub fn get_or_create<G: Generator>(
        &self,
        records: &[UserRecord],
        components: &[Option<&str>],
        generator: &G,
    ) -> Result<ArtifactHandle> {
        let key = derive_cache_key(components);
        let description = describe(components);

        if let Some(path) = self.lookup(&key) {
            log::debug!("artifacts/{}: hit for key {}", self.label, key);
            return Ok(ArtifactHandle { path, description });
        }

        let flight = self.flight(&key)?;
        let mut outcome = flight.lock().map_err(|_| {
            DonutError::GeneratorFailure(format!(
                "flight lock poisoned for key {}",
                key
            ))
        })?;

        // A request that joined a running flight observes the first
        // attempt's outcome instead of generating again.
        if let Some(result) = outcome.as_ref() {
            return match result {
                Ok(()) => Ok(ArtifactHandle {
                    path: self.artifact_path(&key),
                    description,
                }),
                Err(message) => {
                    Err(DonutError::GeneratorFailure(message.clone()))
                }
            };
        }

        // The artifact may exist from a flight that finished before we
        // acquired the lock.
        if let Some(path) = self.lookup(&key) {
            log::debug!(
                "artifacts/{}: key {} generated while waiting",
                self.label,
                key
            );
            self.finish_flight(&key, &flight);
            return Ok(ArtifactHandle { path, description });
        }

        let image_paths: Vec<String> = records
            .iter()
            .filter_map(|user| user.image_path.clone())
            .collect();
        if image_paths.is_empty() {
            self.finish_flight(&key, &flight);
            return Err(DonutError::EmptyResultSet);
        }

        let dest = self.artifact_path(&key);
        log::info!(
            "artifacts/{}: generating {} from {} images",
            self.label,
            key,
            image_paths.len()
        );
        let generated = generator.generate(&image_paths, &dest);
        *outcome = Some(match &generated {
            Ok(()) => Ok(()),
            Err(err) => Err(err.to_string()),
        });
        self.finish_flight(&key, &flight);
        generated?;

        Ok(ArtifactHandle {
            path: dest,
            description,
        })
    }

    fn artifact_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.png", key))
    }

    fn flight(&self, key: &str) -> Result<Arc<Mutex<FlightOutcome>>> {
        let mut map = self.inflight.lock().map_err(|_| {
            DonutError::GeneratorFailure(
                "in-flight map poisoned".to_owned(),
            )
        })?;
        Ok(map.entry(key.to_owned()).or_default().clone())
    }

    /// Drop the flight's map entry. Requests that already joined keep
    /// their handle to the recorded outcome; later requests start a
    /// fresh flight. The identity check keeps a finishing flight from
    /// evicting a successor that reused the key.
    fn finish_flight(&self, key: &str, flight: &Arc<Mutex<FlightOutcome>>) {
        if let Ok(mut map) = self.inflight.lock() {
            if map
                .get(key)
                .map_or(false, |entry| Arc::ptr_eq(entry, flight))
            {
                map.remove(key);
            }
        }
    }
}
