// RSA Decryption Implementation
// Reverses the block framing of `encrypt` and restores the exact plaintext length

use num_traits::{ToPrimitive, Zero};

use super::bigint::{mod_pow, RsaBigInt};
use super::bits::BitBuffer;
use super::block::{BlockLayout, BlockScheme};
use super::error::{RsaError, RsaResult};
use super::keygen::RsaKey;
use super::observer::{WindowEvent, WindowKind, WindowObserver};

/// Decrypt ciphertext bytes using an RSA private key
/// Returns plaintext as bytes
pub fn decrypt_bytes(
    ciphertext: &[u8],
    private_key: &RsaKey,
    scheme: BlockScheme,
    observer: &mut dyn WindowObserver,
) -> RsaResult<Vec<u8>> {
    if ciphertext.is_empty() {
        return Err(RsaError::EmptyInput);
    }
    let layout = BlockLayout::new(&private_key.modulus, scheme)?;

    let plaintext = match scheme {
        BlockScheme::Marked => decrypt_marked(ciphertext, private_key, &layout, observer)?,
        BlockScheme::Unified => decrypt_unified(ciphertext, private_key, &layout, observer)?,
        BlockScheme::Bytewise => decrypt_bytewise(ciphertext, private_key, &layout, observer)?,
    };

    log::debug!(
        "{scheme}: {} ciphertext bytes -> {} plaintext bytes",
        ciphertext.len(),
        plaintext.len()
    );
    Ok(plaintext)
}

/// A ciphertext window read from a marked stream and its decryption
struct MarkedWindow {
    cipher: RsaBigInt,
    cipher_bits: usize,
    plain: RsaBigInt,
}

/// Marked scheme, best effort: truncated or corrupted input is not detected
fn decrypt_marked(
    ciphertext: &[u8],
    key: &RsaKey,
    layout: &BlockLayout,
    observer: &mut dyn WindowObserver,
) -> RsaResult<Vec<u8>> {
    let w = layout.window_bits;
    let marker = layout.marker();
    let bits = BitBuffer::from_bytes(ciphertext);
    let mut reader = bits.reader();

    let mut windows: Vec<MarkedWindow> = Vec::new();
    let mut pending_wide = false;
    loop {
        let width = if pending_wide { w + 1 } else { w };
        let position = reader.position();
        // Incomplete window: only padding is left
        let Some(cipher) = reader.read(width) else {
            break;
        };

        if pending_wide {
            pending_wide = false;
            // Padding ones after a marker read as a value no residue can take
            if cipher >= key.modulus {
                break;
            }
        } else if cipher == marker {
            observer.on_marker(position);
            pending_wide = true;
            continue;
        }

        let plain = mod_pow(&cipher, &key.exponent, &key.modulus)?;
        windows.push(MarkedWindow {
            cipher,
            cipher_bits: width,
            plain,
        });
    }

    let mut plaintext = BitBuffer::with_capacity(windows.len() * w);
    let last = windows.len().saturating_sub(1);
    for (index, window) in windows.into_iter().enumerate() {
        let (kind, value, width) = if index == last {
            // Strip the sentinel: the highest set bit marks where the data starts
            let width = (window.plain.bits() as usize).saturating_sub(1);
            let value = if window.plain.is_zero() {
                window.plain.clone()
            } else {
                &window.plain - (RsaBigInt::from(1u8) << width)
            };
            (WindowKind::Final, value, width)
        } else if window.cipher_bits > w {
            (WindowKind::Overflow, window.plain.clone(), w)
        } else {
            (WindowKind::Regular, window.plain.clone(), w)
        };

        observer.on_window(&WindowEvent {
            index,
            kind,
            input: window.cipher,
            input_bits: window.cipher_bits,
            output: value.clone(),
            output_bits: width,
        });
        plaintext.push_bits(&value, width);
    }

    // Drop bits that do not make up a whole byte
    let whole = plaintext.len() / 8 * 8;
    plaintext.truncate(whole);
    Ok(plaintext.into_bytes())
}

/// Unified scheme: fixed-width windows, final window length taken from the trailer
fn decrypt_unified(
    ciphertext: &[u8],
    key: &RsaKey,
    layout: &BlockLayout,
    observer: &mut dyn WindowObserver,
) -> RsaResult<Vec<u8>> {
    let w = layout.window_bits;
    let u = layout.unified_bits;
    let bits = BitBuffer::from_bytes(ciphertext);

    if bits.len() % u != 0 || bits.len() < 2 * u {
        return Err(RsaError::TruncatedCiphertext(format!(
            "{} bits do not form whole {u}-bit windows plus a trailer",
            bits.len()
        )));
    }

    // Trailer first: it tells how long the last plaintext window is
    let windows = bits.len() / u - 1;
    let final_bits = bits
        .read(windows * u, u)
        .and_then(|trailer| trailer.to_usize())
        .unwrap_or(0);
    observer.on_trailer(final_bits);
    if final_bits == 0 || final_bits > w {
        return Err(RsaError::TruncatedCiphertext(format!(
            "trailer declares a final window of {final_bits} bits, expected 1..={w}"
        )));
    }

    let mut plaintext = BitBuffer::with_capacity(windows * w);
    let mut reader = bits.reader();
    for index in 0..windows {
        let Some(cipher) = reader.read(u) else {
            break;
        };
        let value = mod_pow(&cipher, &key.exponent, &key.modulus)?;

        let is_final = index + 1 == windows;
        let width = if is_final { final_bits } else { w };
        if is_final && value.bits() as usize > width {
            return Err(RsaError::TruncatedCiphertext(format!(
                "final window decrypts to {value}, wider than the declared {width} bits"
            )));
        }

        observer.on_window(&WindowEvent {
            index,
            kind: if is_final { WindowKind::Final } else { WindowKind::Regular },
            input: cipher,
            input_bits: u,
            output: value.clone(),
            output_bits: width,
        });
        plaintext.push_bits(&value, width);
    }

    if plaintext.len() % 8 != 0 {
        return Err(RsaError::TruncatedCiphertext(format!(
            "{} plaintext bits do not fill whole bytes",
            plaintext.len()
        )));
    }
    Ok(plaintext.into_bytes())
}

/// Bytewise scheme: each block of `block_bytes` decrypts to exactly one byte
fn decrypt_bytewise(
    ciphertext: &[u8],
    key: &RsaKey,
    layout: &BlockLayout,
    observer: &mut dyn WindowObserver,
) -> RsaResult<Vec<u8>> {
    let block_bytes = layout.block_bytes;
    if ciphertext.len() % block_bytes != 0 {
        return Err(RsaError::TruncatedCiphertext(format!(
            "{} bytes is not a multiple of the {block_bytes}-byte block",
            ciphertext.len()
        )));
    }

    let blocks = ciphertext.len() / block_bytes;
    let mut plaintext = Vec::with_capacity(blocks);
    for (index, block) in ciphertext.chunks(block_bytes).enumerate() {
        let c = RsaBigInt::from_bytes_be(block);
        let m = mod_pow(&c, &key.exponent, &key.modulus)?;
        let byte = m.to_u8().ok_or_else(|| RsaError::InvalidBlock {
            index,
            value: m.clone(),
        })?;

        observer.on_window(&WindowEvent {
            index,
            kind: if index + 1 == blocks { WindowKind::Final } else { WindowKind::Regular },
            input: c,
            input_bits: block_bytes * 8,
            output: m,
            output_bits: 8,
        });
        plaintext.push(byte);
    }

    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::bigint::from_u64;
    use super::super::encrypt::encrypt_bytes;
    use super::super::keygen::{generate_keypair, RsaKeyPair};
    use super::super::observer::{NoopObserver, RecordingObserver};
    use proptest::prelude::*;

    const SCHEMES: [BlockScheme; 3] = [BlockScheme::Marked, BlockScheme::Unified, BlockScheme::Bytewise];

    fn textbook() -> RsaKeyPair {
        RsaKeyPair::from_primes(from_u64(5), from_u64(11), from_u64(7)).unwrap()
    }

    fn roundtrip(keypair: &RsaKeyPair, message: &[u8], scheme: BlockScheme) -> Vec<u8> {
        let ciphertext = encrypt_bytes(message, &keypair.public_key, scheme, &mut NoopObserver).unwrap();
        decrypt_bytes(&ciphertext, &keypair.private_key, scheme, &mut NoopObserver).unwrap()
    }

    #[test]
    fn test_textbook_single_byte() {
        let keypair = textbook();
        assert_eq!(keypair.private_key, RsaKey::from_u64(23, 55));
        for scheme in [BlockScheme::Marked, BlockScheme::Unified] {
            assert_eq!(roundtrip(&keypair, &[0x41], scheme), vec![0x41]);
        }
    }

    #[test]
    fn test_decrypt_empty() {
        let key = RsaKey::from_u64(23, 323);
        for scheme in SCHEMES {
            let result = decrypt_bytes(&[], &key, scheme, &mut NoopObserver);
            assert_eq!(result, Err(RsaError::EmptyInput));
            assert_eq!(result.unwrap_err().to_string(), "No data to encrypt/decrypt");
        }
    }

    #[test]
    fn test_unified_three_bytes() {
        let keypair = textbook();
        let mut observer = RecordingObserver::new();
        let ciphertext = encrypt_bytes(b"abc", &keypair.public_key, BlockScheme::Unified, &mut observer).unwrap();
        assert_eq!(observer.trailers, vec![4]);

        let mut observer = RecordingObserver::new();
        let decrypted = decrypt_bytes(&ciphertext, &keypair.private_key, BlockScheme::Unified, &mut observer).unwrap();
        assert_eq!(decrypted, b"abc");
        assert_eq!(observer.trailers, vec![4]);
        assert_eq!(observer.windows.last().map(|w| w.output_bits), Some(4));
    }

    #[test]
    fn test_unified_detects_truncation() {
        // n = 323, w = 8: 16-bit windows, so one missing byte breaks the framing
        let keypair = RsaKeyPair::from_primes(from_u64(17), from_u64(19), from_u64(5)).unwrap();
        let ciphertext = keypair.public_key.encrypt(b"truncate me", BlockScheme::Unified).unwrap();

        let result = keypair.private_key.decrypt(&ciphertext[..ciphertext.len() - 1], BlockScheme::Unified);
        assert!(matches!(result, Err(RsaError::TruncatedCiphertext(_))));

        // Trailer alone
        let result = keypair.private_key.decrypt(&ciphertext[ciphertext.len() - 2..], BlockScheme::Unified);
        assert!(matches!(result, Err(RsaError::TruncatedCiphertext(_))));
    }

    #[test]
    fn test_unified_detects_bad_trailer() {
        let keypair = textbook();
        let mut ciphertext = keypair.public_key.encrypt(b"A", BlockScheme::Unified).unwrap();

        // w = 5: a trailer of 9 bits is impossible
        *ciphertext.last_mut().unwrap() = 9;
        let result = keypair.private_key.decrypt(&ciphertext, BlockScheme::Unified);
        assert!(matches!(result, Err(RsaError::TruncatedCiphertext(_))));

        // A trailer of 4 leaves 9 plaintext bits
        *ciphertext.last_mut().unwrap() = 4;
        let result = keypair.private_key.decrypt(&ciphertext, BlockScheme::Unified);
        assert!(matches!(result, Err(RsaError::TruncatedCiphertext(_))));
    }

    #[test]
    fn test_marked_ciphertext_equal_to_marker() {
        // Find a key with a w-bit plaintext window that encrypts to exactly the marker
        let (keypair, plain, w) = (0..200u64)
            .find_map(|seed| {
                let keypair = generate_keypair(Some(seed)).unwrap();
                let layout = BlockLayout::new(keypair.modulus(), BlockScheme::Marked).unwrap();
                let marker = layout.marker();
                let plain = mod_pow(&marker, &keypair.private_key.exponent, keypair.modulus()).unwrap();
                (plain < marker).then_some((keypair, plain, layout.window_bits))
            })
            .unwrap();

        let mut bits = BitBuffer::new();
        bits.push_bits(&plain, w);
        bits.push_bits(&from_u64(0xA5), 8);
        bits.pad_to_byte(false);
        let message = bits.into_bytes();

        let mut observer = RecordingObserver::new();
        let ciphertext = encrypt_bytes(&message, &keypair.public_key, BlockScheme::Marked, &mut observer).unwrap();
        assert_eq!(observer.windows[0].output.bits() as usize, w);
        assert_eq!(observer.windows[0].output_bits, w + 1);
        assert_eq!(observer.markers[0], 0);

        let decrypted = decrypt_bytes(&ciphertext, &keypair.private_key, BlockScheme::Marked, &mut NoopObserver).unwrap();
        assert_eq!(decrypted, message);
    }

    #[test]
    fn test_marked_consecutive_overflows() {
        // Repeat one window whose ciphertext needs six bits
        let keypair = textbook();
        let wide = (0..31u64)
            .find(|&m| mod_pow(&from_u64(m), &from_u64(7), &from_u64(55)).unwrap() > from_u64(31))
            .unwrap();

        // 40 bits = eight 5-bit windows, all equal to `wide`
        let mut bits = BitBuffer::new();
        for _ in 0..8 {
            bits.push_bits(&from_u64(wide), 5);
        }
        let message = bits.into_bytes();

        let mut observer = RecordingObserver::new();
        let ciphertext = encrypt_bytes(&message, &keypair.public_key, BlockScheme::Marked, &mut observer).unwrap();
        assert!(observer.markers.len() >= 8);

        let mut observer = RecordingObserver::new();
        let decrypted = decrypt_bytes(&ciphertext, &keypair.private_key, BlockScheme::Marked, &mut observer).unwrap();
        assert_eq!(decrypted, message);
        assert!(observer.count(WindowKind::Overflow) >= 7);
    }

    #[test]
    fn test_marked_padding_after_marker() {
        // n = 10, w = 3: seven padding ones hold a marker and an impossible wide value
        let public = RsaKey::from_u64(3, 10);
        let private = RsaKey::from_u64(3, 10);
        for byte in 0..=255u8 {
            for message in [vec![byte], vec![byte, !byte], vec![byte, 0, byte]] {
                let ciphertext = encrypt_bytes(&message, &public, BlockScheme::Marked, &mut NoopObserver).unwrap();
                let decrypted = decrypt_bytes(&ciphertext, &private, BlockScheme::Marked, &mut NoopObserver).unwrap();
                assert_eq!(decrypted, message);
            }
        }
    }

    #[test]
    fn test_marked_truncation_is_not_detected() {
        let keypair = generate_keypair(Some(5)).unwrap();
        let ciphertext = keypair.public_key.encrypt(b"best effort only", BlockScheme::Marked).unwrap();
        let result = keypair.private_key.decrypt(&ciphertext[..ciphertext.len() / 2], BlockScheme::Marked);
        assert!(result.is_ok());
        assert_ne!(result.unwrap(), b"best effort only");
    }

    #[test]
    fn test_bytewise_errors() {
        let keypair = RsaKeyPair::from_primes(from_u64(17), from_u64(19), from_u64(5)).unwrap();
        let ciphertext = keypair.public_key.encrypt(b"hi", BlockScheme::Bytewise).unwrap();
        assert_eq!(ciphertext.len(), 4);

        let result = keypair.private_key.decrypt(&ciphertext[..3], BlockScheme::Bytewise);
        assert!(matches!(result, Err(RsaError::TruncatedCiphertext(_))));

        // 300 is a residue of 323 but no byte encrypts to it under this key
        let forged = from_u64(300);
        let plain = mod_pow(&forged, &keypair.private_key.exponent, keypair.modulus()).unwrap();
        let result = keypair.private_key.decrypt(&[0x01, 0x2C], BlockScheme::Bytewise);
        if plain > from_u64(255) {
            assert_eq!(result, Err(RsaError::InvalidBlock { index: 0, value: plain }));
        } else {
            assert_eq!(result, Ok(vec![plain.to_u8().unwrap()]));
        }
    }

    #[test]
    fn test_roundtrip_various_sizes() {
        let keypair = generate_keypair(Some(2024)).unwrap();
        let test_cases: Vec<Vec<u8>> = vec![
            b"A".to_vec(),
            b"AB".to_vec(),
            b"Hello".to_vec(),
            b"Hello, World!".to_vec(),
            vec![0u8; 100],
            vec![255u8; 100],
            (0..=255u8).collect(),
        ];

        for message in test_cases {
            for scheme in [BlockScheme::Marked, BlockScheme::Unified] {
                assert_eq!(roundtrip(&keypair, &message, scheme), message);
            }
        }
    }

    proptest! {
        #[test]
        fn roundtrip_generated_keys(seed in any::<u64>(), message in proptest::collection::vec(any::<u8>(), 1..64)) {
            let keypair = generate_keypair(Some(seed)).unwrap();
            prop_assert_eq!(roundtrip(&keypair, &message, BlockScheme::Marked), message.clone());
            prop_assert_eq!(roundtrip(&keypair, &message, BlockScheme::Unified), message.clone());
            if keypair.modulus() > &from_u64(255) {
                prop_assert_eq!(roundtrip(&keypair, &message, BlockScheme::Bytewise), message);
            }
        }

        #[test]
        fn roundtrip_textbook_key(message in proptest::collection::vec(any::<u8>(), 1..128)) {
            let keypair = textbook();
            prop_assert_eq!(roundtrip(&keypair, &message, BlockScheme::Marked), message.clone());
            prop_assert_eq!(roundtrip(&keypair, &message, BlockScheme::Unified), message);
        }
    }
}
