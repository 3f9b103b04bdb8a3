//! Relocation of simulator-produced recording files.
//!
//! The simulator writes video captures into its own working directory with
//! a `recording_` name prefix. The adapter moves them into the directory
//! chosen via `monitor` on every reset and on close. Recording itself is
//! produced by the simulator; this side only files the output.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Name prefix the simulator gives capture files.
pub const RECORDING_PREFIX: &str = "recording_";

// ---------------------------------------------------------------------------
// RecordingConfig
// ---------------------------------------------------------------------------

/// Where relocated recordings go, armed via `monitor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingConfig {
    /// Destination directory for relocated files.
    pub save_dir: PathBuf,
    /// Collapse every capture to the single fixed name `recording<ext>`,
    /// overwritten each run.
    pub force: bool,
}

impl RecordingConfig {
    #[must_use]
    pub fn new(save_dir: impl Into<PathBuf>, force: bool) -> Self {
        Self {
            save_dir: save_dir.into(),
            force,
        }
    }

    /// Destination path for a capture file named `name`.
    #[must_use]
    pub fn destination(&self, name: &str) -> PathBuf {
        if self.force {
            let mut fixed = OsString::from("recording");
            if let Some(ext) = Path::new(name).extension() {
                fixed.push(".");
                fixed.push(ext);
            }
            self.save_dir.join(fixed)
        } else {
            self.save_dir.join(name)
        }
    }
}

// ---------------------------------------------------------------------------
// Relocation
// ---------------------------------------------------------------------------

/// Move every `recording_*` file out of `sim_dir` per `config`.
///
/// Returns the destination paths, in directory-iteration order.
///
/// # Errors
///
/// Returns the first IO error hit while scanning or moving.
pub fn relocate(sim_dir: &Path, config: &RecordingConfig) -> std::io::Result<Vec<PathBuf>> {
    let mut moved = Vec::new();
    for entry in std::fs::read_dir(sim_dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !name.starts_with(RECORDING_PREFIX) {
            continue;
        }
        let dest = config.destination(name);
        move_file(&entry.path(), &dest)?;
        debug!(from = %entry.path().display(), to = %dest.display(), "relocated recording");
        moved.push(dest);
    }
    Ok(moved)
}

/// Rename, falling back to copy-and-remove across filesystems.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(from, to)?;
            std::fs::remove_file(from)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(tag: &str) -> (PathBuf, PathBuf) {
        let base = std::env::temp_dir().join(format!("telesim_test_recording_{tag}"));
        let sim_dir = base.join("sim");
        let save_dir = base.join("out");
        let _ = std::fs::remove_dir_all(&base);
        std::fs::create_dir_all(&sim_dir).unwrap();
        std::fs::create_dir_all(&save_dir).unwrap();
        (sim_dir, save_dir)
    }

    fn teardown(sim_dir: &Path) {
        let _ = std::fs::remove_dir_all(sim_dir.parent().unwrap());
    }

    #[test]
    fn force_collapses_to_fixed_name() {
        let (sim_dir, save_dir) = fixture("force");
        std::fs::write(sim_dir.join("recording_2024_01.avi"), b"frames").unwrap();
        std::fs::write(sim_dir.join("scene.ttt"), b"scene").unwrap();

        let config = RecordingConfig::new(&save_dir, true);
        let moved = relocate(&sim_dir, &config).unwrap();

        assert_eq!(moved, vec![save_dir.join("recording.avi")]);
        assert_eq!(
            std::fs::read(save_dir.join("recording.avi")).unwrap(),
            b"frames"
        );
        // Source gone, unrelated file untouched.
        assert!(!sim_dir.join("recording_2024_01.avi").exists());
        assert!(sim_dir.join("scene.ttt").exists());
        teardown(&sim_dir);
    }

    #[test]
    fn force_overwrites_previous_capture() {
        let (sim_dir, save_dir) = fixture("overwrite");
        std::fs::write(save_dir.join("recording.avi"), b"old").unwrap();
        std::fs::write(sim_dir.join("recording_new.avi"), b"new").unwrap();

        let config = RecordingConfig::new(&save_dir, true);
        relocate(&sim_dir, &config).unwrap();

        assert_eq!(
            std::fs::read(save_dir.join("recording.avi")).unwrap(),
            b"new"
        );
        teardown(&sim_dir);
    }

    #[test]
    fn plain_mode_keeps_names() {
        let (sim_dir, save_dir) = fixture("plain");
        std::fs::write(sim_dir.join("recording_a.avi"), b"a").unwrap();
        std::fs::write(sim_dir.join("recording_b.avi"), b"b").unwrap();

        let config = RecordingConfig::new(&save_dir, false);
        let mut moved = relocate(&sim_dir, &config).unwrap();
        moved.sort();

        assert_eq!(
            moved,
            vec![save_dir.join("recording_a.avi"), save_dir.join("recording_b.avi")]
        );
        teardown(&sim_dir);
    }

    #[test]
    fn nothing_to_move_is_empty() {
        let (sim_dir, save_dir) = fixture("empty");
        let config = RecordingConfig::new(&save_dir, true);
        assert!(relocate(&sim_dir, &config).unwrap().is_empty());
        teardown(&sim_dir);
    }

    #[test]
    fn destination_without_extension() {
        let config = RecordingConfig::new("/out", true);
        assert_eq!(
            config.destination("recording_raw"),
            PathBuf::from("/out/recording")
        );
    }
}
