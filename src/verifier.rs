//! Candidate verification through an external archive tester
//!
//! The engine never inspects the archive itself; a candidate is correct iff
//! the external tester exits with status 0 when asked to test the archive
//! with that password. Each call spawns its own process, so the adapter is
//! safe to share across worker threads.

use crate::error::EnvironmentError;
use log::{debug, info};
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[cfg(windows)]
const TESTER_EXE: &str = "7z.exe";
#[cfg(not(windows))]
const TESTER_EXE: &str = "7z";

/// Something that can decide whether a candidate opens the archive
pub trait Verifier: Send + Sync {
    fn verify(&self, candidate: &str, archive: &Path) -> bool;
}

/// Adapter around the 7-Zip command line tester
pub struct SevenZipVerifier {
    program: PathBuf,
}

impl SevenZipVerifier {
    /// Wrap an explicit tester executable
    pub fn new(program: PathBuf) -> Result<Self, EnvironmentError> {
        if !program.is_file() {
            return Err(EnvironmentError::VerifierNotAFile(program));
        }
        Ok(SevenZipVerifier { program })
    }

    /// Locate the tester: an explicit override first, then `bin/` next to the
    /// running executable, then the parent directory's `bin/`, then `PATH`.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, EnvironmentError> {
        if let Some(path) = explicit {
            return Self::new(path.to_path_buf());
        }

        let mut searched = Vec::new();
        if let Some(exe_dir) = env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
            for dir in [exe_dir.join("bin"), exe_dir.join("..").join("bin")] {
                let candidate = dir.join(TESTER_EXE);
                debug!("checking for archive tester at {}", candidate.display());
                if candidate.is_file() {
                    info!("found archive tester at {}", candidate.display());
                    return Ok(SevenZipVerifier { program: candidate });
                }
                searched.push(candidate.display().to_string());
            }
        }

        if let Some(paths) = env::var_os("PATH") {
            for dir in env::split_paths(&paths) {
                let candidate = dir.join(TESTER_EXE);
                if candidate.is_file() {
                    info!("found archive tester on PATH: {}", candidate.display());
                    return Ok(SevenZipVerifier { program: candidate });
                }
            }
            searched.push("$PATH".to_string());
        }

        Err(EnvironmentError::VerifierNotFound {
            name: TESTER_EXE.to_string(),
            searched: searched.join(", "),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Verifier for SevenZipVerifier {
    /// `7z t <archive> -p<candidate> -y` with both output streams discarded.
    /// Spawn failures and non-zero exits both count as a miss.
    fn verify(&self, candidate: &str, archive: &Path) -> bool {
        Command::new(&self.program)
            .arg("t")
            .arg(archive)
            .arg(format!("-p{candidate}"))
            .arg("-y")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_rejected() {
        let result = SevenZipVerifier::new(PathBuf::from("/nonexistent/7z"));
        assert!(matches!(result, Err(EnvironmentError::VerifierNotAFile(_))));
    }

    #[test]
    fn test_spawn_failure_is_a_miss() {
        // Bypass the existence check to exercise the spawn-error path.
        let verifier = SevenZipVerifier {
            program: PathBuf::from("/nonexistent/7z"),
        };
        assert!(!verifier.verify("secret", Path::new("archive.7z")));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_mapping() {
        // `true`/`false` stand in for the tester: exit 0 is a hit, 1 a miss.
        let hit = SevenZipVerifier::new(PathBuf::from("/bin/true")).or_else(|_| {
            SevenZipVerifier::new(PathBuf::from("/usr/bin/true"))
        });
        if let Ok(verifier) = hit {
            assert!(verifier.verify("pw", Path::new("archive.7z")));
        }
        let miss = SevenZipVerifier::new(PathBuf::from("/bin/false")).or_else(|_| {
            SevenZipVerifier::new(PathBuf::from("/usr/bin/false"))
        });
        if let Ok(verifier) = miss {
            assert!(!verifier.verify("pw", Path::new("archive.7z")));
        }
    }
}
