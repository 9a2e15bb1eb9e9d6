//! Part-file handling for downloads.

use std::io;
use std::path::{Path, PathBuf};

use futures_util::{Stream, StreamExt};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::warn;

const PART_SUFFIX: &str = ".part";

/// Transient file a download streams into before it is renamed into place.
///
/// The part file exists on disk from [`PartFile::create`] onwards. Dropping an
/// uncommitted part file removes it, which covers error returns and futures
/// cancelled by a deadline.
pub(crate) struct PartFile {
    part_path: PathBuf,
    final_path: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl PartFile {
    /// Create (or truncate a stale) part file next to `final_path`.
    pub(crate) async fn create(final_path: PathBuf) -> Result<Self, SaveError> {
        let part_path = part_path_for(&final_path);
        let file = File::create(&part_path)
            .await
            .map_err(|source| SaveError::Io {
                path: part_path.clone(),
                source,
            })?;
        Ok(Self {
            part_path,
            final_path,
            file: Some(file),
            committed: false,
        })
    }

    #[cfg(test)]
    pub(crate) fn part_path(&self) -> &Path {
        &self.part_path
    }

    /// Drain `chunks` into the part file, then rename it to the final path.
    ///
    /// Returns the number of bytes written.
    pub(crate) async fn write_all<S, E>(mut self, chunks: S) -> Result<u64, SaveError>
    where
        S: Stream<Item = Result<bytes::Bytes, E>>,
        E: std::fmt::Display,
    {
        let mut chunks = std::pin::pin!(chunks);
        let Some(mut file) = self.file.take() else {
            return Err(SaveError::Io {
                path: self.part_path.clone(),
                source: io::Error::other("part file already consumed"),
            });
        };
        let mut written: u64 = 0;
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|err| SaveError::Stream(err.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|source| SaveError::Io {
                    path: self.part_path.clone(),
                    source,
                })?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|source| SaveError::Io {
            path: self.part_path.clone(),
            source,
        })?;
        drop(file);

        fs::rename(&self.part_path, &self.final_path)
            .await
            .map_err(|source| SaveError::Io {
                path: self.final_path.clone(),
                source,
            })?;
        self.committed = true;
        Ok(written)
    }
}

fn part_path_for(final_path: &Path) -> PathBuf {
    let file_name = final_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    final_path.with_file_name(format!(".{file_name}{PART_SUFFIX}"))
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.part_path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(
                error = %err,
                path = %self.part_path.display(),
                "failed to remove download part file"
            ),
        }
    }
}

/// Failure while saving a download.
#[derive(Debug)]
pub(crate) enum SaveError {
    Io { path: PathBuf, source: io::Error },
    Stream(String),
}

impl SaveError {
    pub(crate) fn detail(&self) -> String {
        match self {
            Self::Io { path, source } => format!("failed to write '{}': {source}", path.display()),
            Self::Stream(detail) => format!("download interrupted: {detail}"),
        }
    }

    pub(crate) const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// Resolve the final path for `name` under `dir`.
pub(crate) fn target_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures_util::stream;

    #[tokio::test]
    async fn committed_part_file_is_renamed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = target_path(dir.path(), "report.txt");
        let part = PartFile::create(target.clone()).await.expect("part file");
        let part_path = part.part_path().to_path_buf();

        let chunks = stream::iter(vec![
            Ok::<_, io::Error>(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ]);
        let written = part.write_all(chunks).await.expect("save");

        assert_eq!(written, 11);
        assert_eq!(std::fs::read(&target).expect("read"), b"hello world");
        assert!(!part_path.exists());
    }

    #[tokio::test]
    async fn failed_stream_removes_part_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = target_path(dir.path(), "broken.bin");
        let part = PartFile::create(target.clone()).await.expect("part file");
        let part_path = part.part_path().to_path_buf();

        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ]);
        let err = part.write_all(chunks).await.expect_err("stream error");

        assert!(!err.is_io());
        assert!(err.detail().contains("reset"));
        assert!(!part_path.exists());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn created_part_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let part = PartFile::create(target_path(dir.path(), "pending.bin"))
            .await
            .expect("part file");
        let part_path = part.part_path().to_path_buf();
        assert!(part_path.exists());

        drop(part);
        assert!(!part_path.exists());
    }

    #[tokio::test]
    async fn stale_part_file_is_truncated_and_cleaned() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = target_path(dir.path(), "stale.bin");
        std::fs::write(part_path_for(&target), b"left over").expect("stale part");

        let part = PartFile::create(target.clone()).await.expect("part file");
        let part_path = part.part_path().to_path_buf();
        assert_eq!(std::fs::read(&part_path).expect("read part").len(), 0);

        drop(part);
        assert!(!part_path.exists());
        assert!(!target.exists());
    }
}
