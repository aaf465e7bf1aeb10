// RSA Encryption Implementation
// Encrypts a byte buffer block by block under one of the block schemes

use super::bigint::{from_u64, mod_pow, RsaBigInt};
use super::bits::BitBuffer;
use super::block::{BlockLayout, BlockScheme};
use super::error::{RsaError, RsaResult};
use super::keygen::RsaKey;
use super::observer::{WindowEvent, WindowKind, WindowObserver};

/// Encrypt bytes using an RSA public key
/// Returns ciphertext as bytes
pub fn encrypt_bytes(
    plaintext: &[u8],
    public_key: &RsaKey,
    scheme: BlockScheme,
    observer: &mut dyn WindowObserver,
) -> RsaResult<Vec<u8>> {
    if plaintext.is_empty() {
        return Err(RsaError::EmptyInput);
    }
    let layout = BlockLayout::new(&public_key.modulus, scheme)?;

    let ciphertext = match scheme {
        BlockScheme::Marked => encrypt_marked(plaintext, public_key, &layout, observer)?,
        BlockScheme::Unified => encrypt_unified(plaintext, public_key, &layout, observer)?,
        BlockScheme::Bytewise => encrypt_bytewise(plaintext, public_key, &layout, observer)?,
    };

    log::debug!(
        "{scheme}: {} plaintext bytes -> {} ciphertext bytes, head {}",
        plaintext.len(),
        ciphertext.len(),
        hex::encode(&ciphertext[..ciphertext.len().min(16)])
    );
    Ok(ciphertext)
}

/// Writes marked ciphertext windows, escaping wide values with the overflow marker
struct MarkedWriter<'a, 'o> {
    key: &'a RsaKey,
    layout: &'a BlockLayout,
    marker: RsaBigInt,
    out: BitBuffer,
    observer: &'o mut dyn WindowObserver,
}

impl MarkedWriter<'_, '_> {
    fn push(&mut self, index: usize, kind: WindowKind, value: RsaBigInt, input_bits: usize) -> RsaResult<()> {
        let w = self.layout.window_bits;
        let c = mod_pow(&value, &self.key.exponent, &self.key.modulus)?;

        // A value equal to the marker is escaped as well, so an all-ones
        // window in the stream is always a marker
        let (kind, output_bits) = if c >= self.marker {
            self.observer.on_marker(self.out.len());
            self.out.push_ones(w);
            let kind = if kind == WindowKind::Final { kind } else { WindowKind::Overflow };
            (kind, w + 1)
        } else {
            (kind, w)
        };

        self.observer.on_window(&WindowEvent {
            index,
            kind,
            input: value,
            input_bits,
            output: c.clone(),
            output_bits,
        });
        self.out.push_bits(&c, output_bits);
        Ok(())
    }
}

/// Marked scheme: w-bit windows, the last chunk tagged with a leading sentinel bit
fn encrypt_marked(
    plaintext: &[u8],
    key: &RsaKey,
    layout: &BlockLayout,
    observer: &mut dyn WindowObserver,
) -> RsaResult<Vec<u8>> {
    let w = layout.window_bits;
    let bits = BitBuffer::from_bytes(plaintext);
    let chunks: Vec<(RsaBigInt, usize)> = bits.chunks(w).collect();
    let last = chunks.len() - 1;

    let mut writer = MarkedWriter {
        key,
        layout,
        marker: layout.marker(),
        out: BitBuffer::with_capacity(bits.len() * 2),
        observer,
    };

    for (index, (value, width)) in chunks.into_iter().enumerate() {
        if index < last {
            writer.push(index, WindowKind::Regular, value, width)?;
        } else if width < w {
            let tagged = value | (RsaBigInt::from(1u8) << width);
            writer.push(index, WindowKind::Final, tagged, width + 1)?;
        } else {
            // Full last chunk: the sentinel travels alone in one more window
            writer.push(index, WindowKind::Regular, value, width)?;
            writer.push(index + 1, WindowKind::Final, from_u64(1), 1)?;
        }
    }

    // One-bits never complete a valid window, so the decoder stops on them
    writer.out.pad_to_byte(true);
    Ok(writer.out.into_bytes())
}

/// Unified scheme: every ciphertext window widened to a whole number of bytes,
/// followed by a trailer with the bit length of the last plaintext window
fn encrypt_unified(
    plaintext: &[u8],
    key: &RsaKey,
    layout: &BlockLayout,
    observer: &mut dyn WindowObserver,
) -> RsaResult<Vec<u8>> {
    let w = layout.window_bits;
    let u = layout.unified_bits;
    let bits = BitBuffer::from_bytes(plaintext);
    let chunks: Vec<(RsaBigInt, usize)> = bits.chunks(w).collect();
    let last = chunks.len() - 1;

    let mut out = BitBuffer::with_capacity((chunks.len() + 1) * u);
    let mut final_bits = w;
    for (index, (value, width)) in chunks.into_iter().enumerate() {
        let kind = if index == last {
            final_bits = width;
            WindowKind::Final
        } else {
            WindowKind::Regular
        };

        let c = mod_pow(&value, &key.exponent, &key.modulus)?;
        observer.on_window(&WindowEvent {
            index,
            kind,
            input: value,
            input_bits: width,
            output: c.clone(),
            output_bits: u,
        });
        out.push_bits(&c, u);
    }

    observer.on_trailer(final_bits);
    out.push_bits(&from_u64(final_bits as u64), u);
    out.pad_to_byte(false);
    Ok(out.into_bytes())
}

/// Bytewise scheme: every plaintext byte becomes one big-endian block of `block_bytes`
fn encrypt_bytewise(
    plaintext: &[u8],
    key: &RsaKey,
    layout: &BlockLayout,
    observer: &mut dyn WindowObserver,
) -> RsaResult<Vec<u8>> {
    let block_bytes = layout.block_bytes;
    let mut result = vec![0u8; plaintext.len() * block_bytes];

    for (index, (&byte, block)) in plaintext.iter().zip(result.chunks_mut(block_bytes)).enumerate() {
        let m = RsaBigInt::from(byte);
        let c = mod_pow(&m, &key.exponent, &key.modulus)?;
        let encrypted = c.to_bytes_be();

        // Pad with leading zeros to match the block size
        let start = block_bytes.saturating_sub(encrypted.len());
        block[start..].copy_from_slice(&encrypted);

        observer.on_window(&WindowEvent {
            index,
            kind: if index + 1 == plaintext.len() { WindowKind::Final } else { WindowKind::Regular },
            input: m,
            input_bits: 8,
            output: c,
            output_bits: block_bytes * 8,
        });
    }

    Ok(result)
}
