//! Simulator process launch and teardown.
//!
//! The simulator runs as a detached child in its own process group:
//! teardown signals the whole group, catching any helper processes the
//! simulator forks, then waits for the child to exit. Recording files land
//! in the install directory, which doubles as the child's working
//! directory.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use tracing::{debug, info};

use telesim_core::config::LaunchConfig;

use crate::error::LaunchError;

/// Flag that keeps the simulator from opening a window.
const HEADLESS_FLAG: &str = "-h";

// ---------------------------------------------------------------------------
// Platform resolution
// ---------------------------------------------------------------------------

/// Platform-default simulator install directory.
///
/// # Errors
///
/// Returns [`LaunchError::UnsupportedPlatform`] off Linux/macOS and
/// [`LaunchError::HomeNotSet`] when the Linux default cannot be formed.
pub fn default_install_dir() -> Result<PathBuf, LaunchError> {
    if cfg!(target_os = "linux") {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join("simulator"))
            .ok_or(LaunchError::HomeNotSet)
    } else if cfg!(target_os = "macos") {
        Ok(PathBuf::from("/Applications/Simulator.app"))
    } else {
        Err(LaunchError::UnsupportedPlatform {
            os: std::env::consts::OS,
        })
    }
}

/// Path of the simulator executable inside an install directory.
///
/// # Errors
///
/// Returns [`LaunchError::UnsupportedPlatform`] off Linux/macOS.
pub fn executable_path(install_dir: &Path) -> Result<PathBuf, LaunchError> {
    let relative = if cfg!(target_os = "linux") {
        "simulator.sh"
    } else if cfg!(target_os = "macos") {
        "Contents/MacOS/simulator"
    } else {
        return Err(LaunchError::UnsupportedPlatform {
            os: std::env::consts::OS,
        });
    };
    Ok(install_dir.join(relative))
}

/// Resolve the effective install directory for a launch configuration.
///
/// # Errors
///
/// Propagates [`default_install_dir`] errors when no override is set.
pub fn resolve_install_dir(config: &LaunchConfig) -> Result<PathBuf, LaunchError> {
    match &config.install_dir {
        Some(dir) => Ok(dir.clone()),
        None => default_install_dir(),
    }
}

// ---------------------------------------------------------------------------
// SimProcess
// ---------------------------------------------------------------------------

/// A simulator child process this adapter booted and owns.
#[derive(Debug)]
pub struct SimProcess {
    child: Child,
    install_dir: PathBuf,
}

impl SimProcess {
    /// Spawn the simulator with the configured scene.
    ///
    /// The child gets the scene path as its first argument, the headless
    /// flag when rendering is off, discarded stdout/stderr, and its own
    /// process group.
    ///
    /// # Errors
    ///
    /// Returns a [`LaunchError`] when the platform is unsupported, the
    /// executable is missing, or the spawn itself fails.
    pub fn launch(config: &LaunchConfig) -> Result<Self, LaunchError> {
        let install_dir = resolve_install_dir(config)?;
        let executable = executable_path(&install_dir)?;
        if !executable.exists() {
            return Err(LaunchError::ExecutableNotFound(executable));
        }

        let mut command = Command::new(&executable);
        command
            .arg(&config.scene)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .current_dir(&install_dir);
        if !config.render {
            command.arg(HEADLESS_FLAG);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command.spawn().map_err(LaunchError::Spawn)?;
        info!(
            pid = child.id(),
            scene = %config.scene.display(),
            headless = !config.render,
            "simulator launched"
        );
        Ok(Self { child, install_dir })
    }

    /// Directory the simulator runs in (recordings land here).
    #[must_use]
    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// OS process id of the child (and its group leader).
    #[must_use]
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Send one SIGTERM to the process group and wait for the child.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Terminate`] when signalling or waiting fails.
    /// A group that already exited on its own is not an error.
    pub fn terminate(mut self) -> Result<(), LaunchError> {
        #[cfg(unix)]
        {
            #[allow(clippy::cast_possible_wrap)]
            let pgid = self.child.id() as libc::pid_t;
            let rc = unsafe { libc::killpg(pgid, libc::SIGTERM) };
            if rc != 0 {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() != Some(libc::ESRCH) {
                    return Err(LaunchError::Terminate(err));
                }
            }
        }
        #[cfg(not(unix))]
        {
            self.child.kill().map_err(LaunchError::Terminate)?;
        }

        let status = self.child.wait().map_err(LaunchError::Terminate)?;
        debug!(?status, "simulator exited");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_prefers_override() {
        let config = LaunchConfig {
            install_dir: Some(PathBuf::from("/opt/sim")),
            ..LaunchConfig::default()
        };
        assert_eq!(resolve_install_dir(&config).unwrap(), PathBuf::from("/opt/sim"));
    }

    #[test]
    fn missing_executable_is_typed() {
        let dir = std::env::temp_dir().join("telesim_test_launcher_empty");
        std::fs::create_dir_all(&dir).unwrap();

        let config = LaunchConfig {
            scene: PathBuf::from("scene.ttt"),
            install_dir: Some(dir.clone()),
            ..LaunchConfig::default()
        };
        let err = SimProcess::launch(&config).unwrap_err();
        assert!(matches!(err, LaunchError::ExecutableNotFound(_)));

        let _ = std::fs::remove_dir(&dir);
    }

    #[cfg(target_os = "linux")]
    mod linux {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Stage an install dir whose `simulator.sh` just sleeps.
        fn fake_install_dir(tag: &str) -> PathBuf {
            let dir = std::env::temp_dir().join(format!("telesim_test_launcher_{tag}"));
            std::fs::create_dir_all(&dir).unwrap();
            let exe = dir.join("simulator.sh");
            std::fs::write(&exe, "#!/bin/sh\nexec sleep 30\n").unwrap();
            std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
            dir
        }

        fn cleanup(dir: &Path) {
            let _ = std::fs::remove_file(dir.join("simulator.sh"));
            let _ = std::fs::remove_dir(dir);
        }

        #[test]
        fn launch_and_terminate() {
            let dir = fake_install_dir("terminate");
            let config = LaunchConfig {
                scene: PathBuf::from("scene.ttt"),
                install_dir: Some(dir.clone()),
                ..LaunchConfig::default()
            };

            let process = SimProcess::launch(&config).unwrap();
            assert_eq!(process.install_dir(), dir.as_path());
            assert!(process.id() > 0);

            // Blocks until the child is gone; sleep 30 would hold this for
            // half a minute if the signal were not delivered.
            process.terminate().unwrap();
            cleanup(&dir);
        }

        #[test]
        fn terminate_after_child_already_exited() {
            let dir = std::env::temp_dir().join("telesim_test_launcher_shortlived");
            std::fs::create_dir_all(&dir).unwrap();
            let exe = dir.join("simulator.sh");
            std::fs::write(&exe, "#!/bin/sh\nexit 0\n").unwrap();
            std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

            let config = LaunchConfig {
                scene: PathBuf::from("scene.ttt"),
                install_dir: Some(dir.clone()),
                ..LaunchConfig::default()
            };
            let process = SimProcess::launch(&config).unwrap();
            // Give the child time to exit on its own.
            std::thread::sleep(std::time::Duration::from_millis(200));
            process.terminate().unwrap();
            cleanup(&dir);
        }
    }
}
