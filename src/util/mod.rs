// Utilities - file and key file handling around the RSA core

pub mod file_ops;
pub mod key_file;

pub use file_ops::{default_output_path, read_file, transform_file, write_file, FileConfig, FileError, FileResult};
pub use key_file::{read_key, write_keypair, KeySource};
