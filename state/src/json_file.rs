use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Reads a JSON document, treating a missing or blank file as `T::default()`.
pub(crate) fn read_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(err) => return Err(err).with_context(|| format!("failed to read {}", path.display())),
    };
    if data.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
}

/// Replaces `path` atomically: the payload goes to a temp file in the same
/// directory which is then renamed over the target.
pub(crate) fn write_json<T>(path: &Path, payload: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let dir = path
        .parent()
        .context("failed to resolve directory for state storage")?;
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    serde_json::to_writer_pretty(&mut temp, payload)?;
    temp.as_file_mut().write_all(b"\n")?;
    temp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to persist {}", path.display()))?;
    Ok(())
}

/// Runs a load/modify/save closure on the blocking pool so store calls made
/// from async code never hold a runtime worker.
pub(crate) async fn run_blocking<F, T, E>(task: F) -> std::result::Result<T, E>
where
    F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<anyhow::Error> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| E::from(anyhow::Error::new(err).context("store task failed")))?
}
