//! Extraction target planning
//!
//! Archives are dropped into a staging directory. Both extraction modes publish one
//! level above that staging directory:
//! - `Direct` extracts straight into the staging directory's parent
//! - `Nested` creates a fresh sibling of the staging directory named after the archive,
//!   probing `name_1`, `name_2`, ... when the name is taken

use crate::error::ExtractionError;
use crate::types::{ArchiveKind, ExtractMode};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maximum number of suffixed names tried before nested planning gives up
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Derives extraction target directories
pub struct PathPlanner;

impl PathPlanner {
    /// Compute (and for `Nested`, create) the target directory for an archive
    ///
    /// # Errors
    /// Returns [`ExtractionError::Planning`] if the archive has no grandparent directory,
    /// the mode is not recognized, or the nested directory cannot be created.
    pub fn plan(source: &Path, mode: &ExtractMode) -> Result<PathBuf, ExtractionError> {
        let target = match mode {
            ExtractMode::Direct => Self::direct_target(source)?,
            ExtractMode::Nested => Self::nested_target(source)?,
            ExtractMode::Unknown(name) => {
                return Err(planning_error(
                    source,
                    format!("unknown extraction mode '{}'", name),
                ));
            }
        };

        if target.starts_with(source) {
            return Err(planning_error(
                source,
                format!("target {} lies inside the archive path", target.display()),
            ));
        }

        debug!(?source, ?target, %mode, "planned extraction target");
        Ok(target)
    }

    /// Parent of the staging directory
    pub fn direct_target(source: &Path) -> Result<PathBuf, ExtractionError> {
        source
            .parent()
            .and_then(Path::parent)
            .filter(|upper| !upper.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .ok_or_else(|| planning_error(source, "archive has no grandparent directory"))
    }

    /// Fresh directory next to the staging directory, created eagerly
    pub fn nested_target(source: &Path) -> Result<PathBuf, ExtractionError> {
        let upper = Self::direct_target(source)?;
        let base = Self::base_name(source)?;

        for attempt in 0..=MAX_RENAME_ATTEMPTS {
            let name = if attempt == 0 {
                base.to_string()
            } else {
                format!("{}_{}", base, attempt)
            };
            let candidate = upper.join(name);

            // create_dir doubles as the existence probe so a concurrent creator can't
            // hand us a directory we didn't make
            match std::fs::create_dir(&candidate) {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(planning_error(
                        source,
                        format!("failed to create {}: {}", candidate.display(), e),
                    ));
                }
            }
        }

        Err(planning_error(
            source,
            format!(
                "could not find a free directory name after {} attempts",
                MAX_RENAME_ATTEMPTS
            ),
        ))
    }

    /// Archive file name with its recognized suffix removed
    fn base_name(source: &Path) -> Result<&str, ExtractionError> {
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| planning_error(source, "archive name is not valid UTF-8"))?;

        ArchiveKind::strip_suffix(file_name)
            .or_else(|| source.file_stem().and_then(|s| s.to_str()))
            .filter(|base| !base.is_empty())
            .ok_or_else(|| planning_error(source, "archive name has no base name"))
    }
}

fn planning_error(source: &Path, reason: impl Into<String>) -> ExtractionError {
    ExtractionError::Planning {
        archive: source.to_path_buf(),
        reason: reason.into(),
    }
}
