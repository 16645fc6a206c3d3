//! Wallet files on disk.
//!
//! Each wallet lives in `{dir}/{id}.wlt`. Updates go through three steps so
//! a crash at any point leaves a complete wallet behind:
//!
//! 1. write `{id}.wlt.tmp` and fsync it
//! 2. rename an existing `{id}.wlt` to `{id}.wlt.bak`
//! 3. rename the temp file to `{id}.wlt`
//!
//! Loading only reads `.wlt` files. Backups are recovery material.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::WalletError;
use crate::wallet::{Wallet, WALLET_EXT};

/// Path of the wallet file for `id`.
pub fn wallet_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}.{WALLET_EXT}"))
}

/// Path of the backup written when `id` is overwritten.
pub fn backup_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}.{WALLET_EXT}.bak"))
}

fn temp_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}.{WALLET_EXT}.tmp"))
}

/// Step 1: write and fsync the temp file. Returns its path.
///
/// The file is created owner-only; a temp file left by an earlier crash is
/// removed first so its permissions are not inherited.
pub fn write_temp(dir: &Path, id: &str, bytes: &[u8]) -> Result<PathBuf, WalletError> {
    let tmp = temp_path(dir, id);
    match fs::remove_file(&tmp) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(WalletError::Io(format!("remove {}: {e}", tmp.display()))),
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(&tmp)
        .map_err(|e| WalletError::Io(format!("create {}: {e}", tmp.display())))?;
    file.write_all(bytes)
        .map_err(|e| WalletError::Io(format!("write {}: {e}", tmp.display())))?;
    file.sync_all()
        .map_err(|e| WalletError::Io(format!("fsync {}: {e}", tmp.display())))?;
    Ok(tmp)
}

/// Step 2: move the current file, if any, to its backup path.
pub fn backup_existing(dir: &Path, id: &str) -> Result<(), WalletError> {
    let path = wallet_path(dir, id);
    if path.exists() {
        let bak = backup_path(dir, id);
        fs::rename(&path, &bak)
            .map_err(|e| WalletError::Io(format!("backup {}: {e}", path.display())))?;
    }
    Ok(())
}

/// Step 3: move the temp file into place.
pub fn commit_temp(dir: &Path, id: &str, tmp: &Path) -> Result<(), WalletError> {
    let path = wallet_path(dir, id);
    fs::rename(tmp, &path).map_err(|e| WalletError::Io(format!("rename {}: {e}", path.display())))?;
    if let Ok(d) = fs::File::open(dir) {
        let _ = d.sync_all();
    }
    Ok(())
}

/// Persist a locked wallet with the temp/backup/rename sequence.
pub fn save(dir: &Path, wallet: &Wallet) -> Result<(), WalletError> {
    let bytes = wallet.to_json()?;
    let tmp = write_temp(dir, wallet.id(), &bytes)?;
    if let Err(e) = backup_existing(dir, wallet.id()) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    commit_temp(dir, wallet.id(), &tmp)?;
    tracing::debug!(path = %wallet_path(dir, wallet.id()).display(), "wallet saved");
    Ok(())
}

/// Read and validate one wallet file. The result is locked.
pub fn load(path: &Path) -> Result<Wallet, WalletError> {
    let bytes = fs::read(path).map_err(|e| WalletError::Io(format!("read {}: {e}", path.display())))?;
    Wallet::from_json(&bytes)
        .map_err(|e| WalletError::CorruptedFile(format!("{}: {e}", path.display())))
}

/// Delete the wallet file for `id`. Missing files are not an error.
pub fn remove(dir: &Path, id: &str) -> Result<(), WalletError> {
    let path = wallet_path(dir, id);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(WalletError::Io(format!("remove {}: {e}", path.display()))),
    }
}

/// All `.wlt` files in `dir`, sorted by name. Backups and temp files are skipped.
pub fn list_wallet_files(dir: &Path) -> Result<Vec<PathBuf>, WalletError> {
    let mut files = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| WalletError::Io(format!("read dir {}: {e}", dir.display())))?;
    for entry in entries {
        let path = entry.map_err(|e| WalletError::Io(e.to_string()))?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(WALLET_EXT) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
