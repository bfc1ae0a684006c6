use anyhow::{Context, bail};
use fs2::FileExt;
use std::fs::File;
use std::path::PathBuf;

/// Takes the exclusive lock that guards the credential store.
///
/// Two processes rewriting `wpa_supplicant.conf` at once would each roll the
/// other back, so store-mutating commands hold this for their whole run.
/// The lock is released when the returned file is dropped.
pub fn acquire_store_lock() -> anyhow::Result<File> {
    let path = lock_path();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let file = File::create(&path)
        .with_context(|| format!("Failed to create lock file {}", path.display()))?;

    if file.try_lock_exclusive().is_err() {
        bail!("Another wipi instance is changing networks");
    }

    Ok(file)
}

fn lock_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
    path.push("wipi.lock");
    path
}
