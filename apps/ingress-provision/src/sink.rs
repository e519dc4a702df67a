//! Delivery of the one-time secret access key.
//!
//! The secret is written in shared-credentials format either to stdout,
//! which requires `--reveal-secret`, or to a new file created with mode
//! `0600`. A real run refuses to start without one of the two, and the file
//! is created before the run so the key always has somewhere to go.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use ingress_core::NewAccessKey;
use tracing::{info, warn};

/// Where the secret goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSink {
    /// Print to stdout.
    Stdout,
    /// Write to a new file.
    File(PathBuf),
    /// Drop it (dry runs only).
    Discard,
}

impl SecretSink {
    /// Pick the sink from CLI flags.
    pub fn from_flags(
        reveal_secret: bool,
        credentials_file: Option<PathBuf>,
        dry_run: bool,
    ) -> Result<Self> {
        match (reveal_secret, credentials_file) {
            (true, Some(_)) => {
                bail!("--reveal-secret and --credentials-file are mutually exclusive")
            }
            (true, None) => Ok(Self::Stdout),
            (false, Some(path)) => Ok(Self::File(path)),
            (false, None) if dry_run => Ok(Self::Discard),
            (false, None) => bail!(
                "the secret access key is only returned once: \
                 pass --credentials-file <PATH> or --reveal-secret"
            ),
        }
    }

    /// Claim the sink before any resource is created.
    ///
    /// A credentials file is created here, empty, so a missing directory or
    /// an existing file is reported before the key is minted.
    pub fn open(self) -> Result<OpenSink> {
        match self {
            Self::Stdout => Ok(OpenSink::Stdout),
            Self::Discard => Ok(OpenSink::Discard),
            Self::File(path) => {
                let mut options = OpenOptions::new();
                options.write(true).create_new(true);
                #[cfg(unix)]
                {
                    use std::os::unix::fs::OpenOptionsExt;
                    options.mode(0o600);
                }
                let file = options.open(&path).with_context(|| {
                    format!("failed to create credentials file {}", path.display())
                })?;
                Ok(OpenSink::File { path, file })
            }
        }
    }
}

/// A sink that is ready to take the key.
#[derive(Debug)]
pub enum OpenSink {
    /// Print to stdout.
    Stdout,
    /// Write to the file created by [`SecretSink::open`].
    File {
        /// Where the file lives.
        path: PathBuf,
        /// Handle opened with `create_new`.
        file: File,
    },
    /// Drop it (dry runs only).
    Discard,
}

impl OpenSink {
    /// Hand over the key. `stdout` is used only for [`OpenSink::Stdout`].
    pub fn deliver(
        self,
        key: NewAccessKey,
        profile: &str,
        stdout: &mut impl Write,
    ) -> Result<()> {
        let (access_key_id, secret) = key.into_parts();

        match self {
            Self::Stdout => {
                let text = render_credentials(profile, &access_key_id, &secret.expose());
                stdout
                    .write_all(text.as_bytes())
                    .context("failed to write credentials to stdout")?;
            }
            Self::File { path, mut file } => {
                let text = render_credentials(profile, &access_key_id, &secret.expose());
                file.write_all(text.as_bytes())
                    .and_then(|()| file.sync_all())
                    .with_context(|| {
                        format!("failed to write credentials file {}", path.display())
                    })?;
                info!(
                    path = %path.display(),
                    access_key_id = %access_key_id,
                    "credentials written"
                );
            }
            Self::Discard => {
                info!(access_key_id = %access_key_id, "dry run: emulated secret discarded");
            }
        }
        Ok(())
    }

    /// Release a sink that never received a key, removing the empty file.
    pub fn abandon(self) {
        if let Self::File { path, file } = self {
            drop(file);
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to remove unused credentials file"
                );
            }
        }
    }
}

fn render_credentials(profile: &str, access_key_id: &str, secret: &str) -> String {
    format!("[{profile}]\naws_access_key_id = {access_key_id}\naws_secret_access_key = {secret}\n")
}

#[cfg(test)]
mod tests {
    use ingress_core::SecretAccessKey;

    use super::*;

    fn key() -> NewAccessKey {
        NewAccessKey::new("AKIAEXAMPLE", SecretAccessKey::new("wJalrXUtnFEMI"))
    }

    #[test]
    fn test_should_require_a_sink_for_real_runs() {
        assert!(SecretSink::from_flags(false, None, false).is_err());
        assert_eq!(SecretSink::from_flags(false, None, true).unwrap(), SecretSink::Discard);
        assert_eq!(SecretSink::from_flags(true, None, false).unwrap(), SecretSink::Stdout);
    }

    #[test]
    fn test_should_print_credentials_when_revealed() {
        let mut out = Vec::new();
        let sink = SecretSink::Stdout.open().unwrap();
        sink.deliver(key(), "u1", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[u1]\n"));
        assert!(text.contains("aws_secret_access_key = wJalrXUtnFEMI"));
    }

    #[test]
    fn test_should_write_private_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consumer.credentials");
        let sink = SecretSink::File(path.clone()).open().unwrap();
        assert!(path.exists());

        let mut out = Vec::new();
        sink.deliver(key(), "u1", &mut out).unwrap();
        assert!(out.is_empty());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("aws_access_key_id = AKIAEXAMPLE"));
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_should_refuse_existing_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consumer.credentials");
        std::fs::write(&path, "keep me").unwrap();

        assert!(SecretSink::File(path.clone()).open().is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");
    }

    #[test]
    fn test_should_fail_open_when_directory_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("consumer.credentials");

        let err = SecretSink::File(path).open().unwrap_err();
        assert!(format!("{err:#}").contains("failed to create credentials file"));
    }

    #[test]
    fn test_should_remove_file_when_abandoned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consumer.credentials");
        let sink = SecretSink::File(path.clone()).open().unwrap();

        sink.abandon();
        assert!(!path.exists());
    }
}
