// Transform Driver
// Runs one encrypt or decrypt pass over an in-memory buffer

use super::block::{BlockLayout, BlockScheme};
use super::decrypt::decrypt_bytes;
use super::encrypt::encrypt_bytes;
use super::error::RsaResult;
use super::keygen::RsaKey;
use super::observer::{NoopObserver, WindowObserver};

/// Direction of a transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Encrypt,
    Decrypt,
}

impl Mode {
    pub fn is_encrypt(self) -> bool {
        self == Mode::Encrypt
    }
}

/// Configuration for a single transform
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransformConfig {
    pub scheme: BlockScheme,
}

impl TransformConfig {
    pub fn with_scheme(mut self, scheme: BlockScheme) -> Self {
        self.scheme = scheme;
        self
    }
}

/// Encrypt or decrypt `input` with `key`, reporting every window to `observer`
pub fn run(
    input: &[u8],
    key: &RsaKey,
    mode: Mode,
    config: &TransformConfig,
    observer: &mut dyn WindowObserver,
) -> RsaResult<Vec<u8>> {
    let scheme = config.scheme;
    if let Ok(layout) = BlockLayout::new(&key.modulus, scheme) {
        log::debug!(
            "{mode:?} with ({key}) as {scheme}: window {} bits, unified {} bits, block {} bytes",
            layout.window_bits,
            layout.unified_bits,
            layout.block_bytes
        );
    }

    match mode {
        Mode::Encrypt => encrypt_bytes(input, key, scheme, observer),
        Mode::Decrypt => decrypt_bytes(input, key, scheme, observer),
    }
}

/// [`run`] with the default scheme and no observer
pub fn run_default(input: &[u8], key: &RsaKey, mode: Mode) -> RsaResult<Vec<u8>> {
    run(input, key, mode, &TransformConfig::default(), &mut NoopObserver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::error::RsaError;
    use super::super::keygen::generate_keypair;
    use super::super::observer::RecordingObserver;

    #[test]
    fn test_run_roundtrip() {
        let keypair = generate_keypair(Some(42)).unwrap();
        let message = b"The quick brown fox jumps over the lazy dog";

        let encrypted = run_default(message, &keypair.public_key, Mode::Encrypt).unwrap();
        assert_ne!(encrypted.as_slice(), message.as_slice());
        let decrypted = run_default(&encrypted, &keypair.private_key, Mode::Decrypt).unwrap();
        assert_eq!(decrypted, message);
    }

    #[test]
    fn test_run_with_config_and_observer() {
        let keypair = generate_keypair(Some(9)).unwrap();
        let config = TransformConfig::default().with_scheme(BlockScheme::Marked);
        assert_eq!(config.scheme, BlockScheme::Marked);

        let mut observer = RecordingObserver::new();
        let encrypted = run(b"observe", &keypair.public_key, Mode::Encrypt, &config, &mut observer).unwrap();
        assert!(!observer.windows.is_empty());

        let decrypted = run(&encrypted, &keypair.private_key, Mode::Decrypt, &config, &mut NoopObserver).unwrap();
        assert_eq!(decrypted, b"observe");
    }

    #[test]
    fn test_run_empty_input() {
        let key = RsaKey::from_u64(7, 55);
        assert_eq!(run_default(b"", &key, Mode::Encrypt), Err(RsaError::EmptyInput));
        assert_eq!(run_default(b"", &key, Mode::Decrypt), Err(RsaError::EmptyInput));
    }

    #[test]
    fn test_run_zero_modulus() {
        let key = RsaKey::from_u64(7, 0);
        assert_eq!(run_default(b"x", &key, Mode::Encrypt), Err(RsaError::InvalidModulus));
    }

    #[test]
    fn test_default_scheme_is_unified() {
        assert_eq!(TransformConfig::default().scheme, BlockScheme::Unified);
        assert!(Mode::Encrypt.is_encrypt());
        assert!(!Mode::Decrypt.is_encrypt());
    }
}
