// File Operations for RSA Encryption/Decryption
// Handles reading, writing and naming of transformed files

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::rsa::{run, BlockScheme, Mode, RsaError, RsaKey, TransformConfig, WindowObserver};

/// Errors that can occur during file operations
#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error on `{}`: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Crypto(#[from] RsaError),
}

/// Result type for file operations
pub type FileResult<T> = Result<T, FileError>;

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> FileError + '_ {
    move |source| FileError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Configuration for file encryption/decryption
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileConfig {
    /// Directory searched for `public.key` / `private.key` when no key is given
    pub key_dir: PathBuf,
    pub transform: TransformConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            key_dir: PathBuf::from("."),
            transform: TransformConfig::default(),
        }
    }
}

impl FileConfig {
    pub fn with_key_dir(mut self, key_dir: impl Into<PathBuf>) -> Self {
        self.key_dir = key_dir.into();
        self
    }

    pub fn with_scheme(mut self, scheme: BlockScheme) -> Self {
        self.transform = self.transform.with_scheme(scheme);
        self
    }
}

/// Read entire file into memory
pub fn read_file(path: &Path) -> FileResult<Vec<u8>> {
    let mut file = File::open(path).map_err(io_error(path))?;
    let mut data = Vec::new();
    file.read_to_end(&mut data).map_err(io_error(path))?;
    Ok(data)
}

/// Write data to file
pub fn write_file(path: &Path, data: &[u8]) -> FileResult<()> {
    let mut file = File::create(path).map_err(io_error(path))?;
    file.write_all(data).map_err(io_error(path))?;
    Ok(())
}

/// Output name used when none is given:
/// `x` -> `x.enc` when encrypting; `x.enc.ext` or `x.ext.enc` -> `x_decrypted.ext`
/// and any other `x` -> `x.dec` when decrypting
pub fn default_output_path(input: &Path, mode: Mode) -> PathBuf {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let derived = match mode {
        Mode::Encrypt => format!("{name}.enc"),
        Mode::Decrypt if name.contains(".enc") => {
            let stripped = name.replacen(".enc", "", 1);
            match stripped.rfind('.') {
                Some(dot) if dot > 0 => format!("{}_decrypted{}", &stripped[..dot], &stripped[dot..]),
                _ => format!("{stripped}_decrypted"),
            }
        }
        Mode::Decrypt => format!("{name}.dec"),
    };

    input.with_file_name(derived)
}

/// Transform `input` into `output` (or the derived default path); returns the path written
pub fn transform_file(
    input: &Path,
    output: Option<&Path>,
    key: &RsaKey,
    mode: Mode,
    config: &FileConfig,
    observer: &mut dyn WindowObserver,
) -> FileResult<PathBuf> {
    let data = read_file(input)?;
    log::info!("read {} ({})", input.display(), format_file_size(data.len() as u64));

    let transformed = run(&data, key, mode, &config.transform, observer)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input, mode));
    write_file(&output, &transformed)?;
    log::info!("wrote {} ({})", output.display(), format_file_size(transformed.len() as u64));

    Ok(output)
}

/// Format file size for display
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.2} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.2} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.2} KB", b as f64 / KB as f64),
        b => format!("{b} B"),
    }
}
