// RSA Module - Main module file
// Exports all RSA-related functionality

pub mod bigint;
pub mod bits;
pub mod block;
pub mod decrypt;
pub mod encrypt;
pub mod error;
pub mod keygen;
pub mod observer;
pub mod transform;

pub use bigint::{mod_pow, RsaBigInt};
pub use bits::BitBuffer;
pub use block::{BlockLayout, BlockScheme};
pub use decrypt::decrypt_bytes;
pub use encrypt::encrypt_bytes;
pub use error::{RsaError, RsaResult};
pub use keygen::{generate_keypair, RsaKey, RsaKeyPair};
pub use observer::{LogObserver, NoopObserver, RecordingObserver, WindowEvent, WindowKind, WindowObserver};
pub use transform::{run, Mode, TransformConfig};
