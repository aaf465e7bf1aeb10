// Key Files
// `public.key` / `private.key`: one line holding "{exponent} {modulus}"

use std::fs;
use std::path::{Path, PathBuf};

use super::file_ops::{write_file, FileResult};
use crate::rsa::{Mode, RsaError, RsaKey, RsaKeyPair, RsaResult};

pub const PUBLIC_KEY_FILE: &str = "public.key";
pub const PRIVATE_KEY_FILE: &str = "private.key";

/// Where the key for a transform comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Exponent and modulus given directly
    Inline(RsaKey),
    File(PathBuf),
    /// `public.key` when encrypting, `private.key` when decrypting
    Default,
}

impl KeySource {
    pub fn resolve(&self, mode: Mode, key_dir: &Path) -> RsaResult<RsaKey> {
        match self {
            KeySource::Inline(key) => Ok(key.clone()),
            KeySource::File(path) => read_key(path),
            KeySource::Default => read_key(&key_dir.join(default_key_file(mode))),
        }
    }
}

pub fn default_key_file(mode: Mode) -> &'static str {
    match mode {
        Mode::Encrypt => PUBLIC_KEY_FILE,
        Mode::Decrypt => PRIVATE_KEY_FILE,
    }
}

pub fn read_key(path: &Path) -> RsaResult<RsaKey> {
    let text = fs::read_to_string(path).map_err(|e| {
        log::debug!("cannot read {}: {e}", path.display());
        RsaError::KeyFileMissing {
            path: path.to_path_buf(),
        }
    })?;

    let key = text.parse::<RsaKey>().map_err(|reason| RsaError::KeyFileMalformed {
        path: path.to_path_buf(),
        reason,
    })?;
    log::debug!("loaded key ({key}) from {}", path.display());
    Ok(key)
}

pub fn write_key(path: &Path, key: &RsaKey) -> FileResult<()> {
    write_file(path, key.to_string().as_bytes())
}

/// Write both halves of `keypair` into `dir`, returning (public, private) paths
pub fn write_keypair(dir: &Path, keypair: &RsaKeyPair) -> FileResult<(PathBuf, PathBuf)> {
    let public_path = dir.join(PUBLIC_KEY_FILE);
    let private_path = dir.join(PRIVATE_KEY_FILE);

    log::info!("writing public key to {}", public_path.display());
    write_key(&public_path, &keypair.public_key)?;
    log::info!("writing private key to {}", private_path.display());
    write_key(&private_path, &keypair.private_key)?;

    Ok((public_path, private_path))
}
