//! Output directory and file handling shared by both renderers.

use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};

use super::GenerationError;

pub type OutputStream = BufWriter<File>;

pub fn target_path(dir: &Path, receipt_id: i64) -> PathBuf {
    dir.join(format!("{}.pdf", receipt_id))
}

/// Recursive and idempotent, so concurrent callers may race on it.
pub async fn ensure_output_dir(dir: &Path) -> Result<(), GenerationError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|source| GenerationError::OutputDir {
            path: dir.display().to_string(),
            source,
        })
}

pub async fn open_stream(path: &Path) -> Result<OutputStream, GenerationError> {
    let file = File::create(path)
        .await
        .map_err(GenerationError::OpenStream)?;
    Ok(BufWriter::new(file))
}

/// Writes `bytes` and waits until they are flushed and synced to disk.
pub async fn finish_stream(stream: &mut OutputStream, bytes: &[u8]) -> Result<(), GenerationError> {
    stream.write_all(bytes).await.map_err(GenerationError::Stream)?;
    stream.flush().await.map_err(GenerationError::Stream)?;
    stream
        .get_ref()
        .sync_all()
        .await
        .map_err(GenerationError::Stream)
}

/// Best-effort close of a stream that will not be completed.
pub async fn close_stream(mut stream: OutputStream, prefix: &str) {
    if let Err(e) = stream.shutdown().await {
        warn!("{} failed to close output stream: {}", prefix, e);
    }
}

/// Deletes a partially written file. Errors are logged, never returned.
pub async fn remove_partial(path: &Path, prefix: &str) {
    match fs::try_exists(path).await {
        Ok(true) => match fs::remove_file(path).await {
            Ok(()) => info!("{} removed partial file {}", prefix, path.display()),
            Err(e) => error!(
                "{} could not remove partial file {}: {}",
                prefix,
                path.display(),
                e
            ),
        },
        Ok(false) => debug!("{} no partial file at {}", prefix, path.display()),
        Err(e) => error!(
            "{} could not check for partial file {}: {}",
            prefix,
            path.display(),
            e
        ),
    }
}

/// Writes a complete document in one go, removing the file on failure.
pub async fn write_document(path: &Path, bytes: &[u8], prefix: &str) -> Result<(), GenerationError> {
    let mut stream = open_stream(path).await?;
    match finish_stream(&mut stream, bytes).await {
        Ok(()) => Ok(()),
        Err(e) => {
            close_stream(stream, prefix).await;
            remove_partial(path, prefix).await;
            Err(e)
        }
    }
}
