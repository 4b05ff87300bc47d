use std::path::{Path, PathBuf};
use std::process::Command;

use data_error::{DonutError, Result};

/// Boundary to the external image-averaging collaborator.
///
/// Implementations block until the artifact exists at `dest` (or the
/// attempt failed); there is no cancellation of a running generation.
pub trait Generator {
    /// Produce the artifact at `dest` from the given source images.
    fn generate(&self, image_paths: &[String], dest: &Path) -> Result<()>;
}

/// [`Generator`] that spawns the averaging script as a child process.
///
/// The image list travels as one JSON argument and the target path as
/// the second, passed as separate argv entries rather than an
/// interpolated shell string.
pub struct CommandGenerator {
    interpreter: String,
    script: PathBuf,
}

impl CommandGenerator {
    pub fn new(interpreter: String, script: PathBuf) -> Self {
        Self {
            interpreter,
            script,
        }
    }
}

impl Generator for CommandGenerator {
    fn generate(&self, image_paths: &[String], dest: &Path) -> Result<()> {
        let images = serde_json::to_string(image_paths).map_err(|err| {
            DonutError::GeneratorFailure(err.to_string())
        })?;

        log::info!(
            "generator: {} {} with {} images -> {}",
            self.interpreter,
            self.script.display(),
            image_paths.len(),
            dest.display()
        );

        let output = Command::new(&self.interpreter)
            .arg(&self.script)
            .arg(images)
            .arg(dest)
            .output()
            .map_err(|err| DonutError::GeneratorFailure(err.to_string()))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(DonutError::GeneratorFailure(format!(
                "script exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        // Diagnostic output counts as failure even on a zero exit.
        if !stderr.trim().is_empty() {
            return Err(DonutError::GeneratorFailure(format!(
                "script reported: {}",
                stderr.trim()
            )));
        }

        Ok(())
    }
}
