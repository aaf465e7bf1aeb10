// Command Line Interface
// generate / encrypt / decrypt subcommands over the RSA core

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::rsa::{generate_keypair, BlockScheme, LogObserver, Mode, RsaBigInt, RsaKey};
use crate::util::file_ops::{transform_file, FileConfig};
use crate::util::key_file::{write_keypair, KeySource};

#[derive(Parser, Debug)]
#[command(name = "rsa-blocks", version, about = "Textbook RSA file encryption with bit-block framing")]
pub struct Cli {
    /// Trace every window as it is transformed
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding public.key and private.key
    #[arg(long, global = true, env = "RSA_BLOCKS_KEY_DIR", default_value = ".")]
    pub key_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a key pair and write it to the key directory
    Generate {
        /// Seed for reproducible key pairs
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Encrypt a file with a public key
    Encrypt(TransformArgs),
    /// Decrypt a file with a private key
    Decrypt(TransformArgs),
}

#[derive(Args, Debug)]
pub struct TransformArgs {
    pub input: PathBuf,

    /// Output file; derived from the input name when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Key given inline as exponent and modulus
    #[arg(short, long, num_args = 2, value_names = ["EXPONENT", "MODULUS"], conflicts_with = "key_path")]
    pub key: Option<Vec<RsaBigInt>>,

    /// Key file holding "{exponent} {modulus}"
    #[arg(short = 'p', long)]
    pub key_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = BlockScheme::Unified)]
    pub scheme: BlockScheme,
}

impl TransformArgs {
    pub fn key_source(&self) -> Result<KeySource> {
        match (&self.key, &self.key_path) {
            (Some(values), _) => match values.as_slice() {
                [exponent, modulus] => Ok(KeySource::Inline(RsaKey::new(exponent.clone(), modulus.clone()))),
                _ => bail!("--key takes exactly two values, got {}", values.len()),
            },
            (None, Some(path)) => Ok(KeySource::File(path.clone())),
            (None, None) => Ok(KeySource::Default),
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate { seed } => generate(seed, &cli.key_dir),
        Commands::Encrypt(args) => transform(&args, Mode::Encrypt, &cli.key_dir),
        Commands::Decrypt(args) => transform(&args, Mode::Decrypt, &cli.key_dir),
    }
}

fn generate(seed: Option<u64>, key_dir: &Path) -> Result<()> {
    let keypair = generate_keypair(seed).context("Key generation failed")?;

    fs::create_dir_all(key_dir).with_context(|| format!("Cannot create key directory `{}`", key_dir.display()))?;
    let (public_path, private_path) = write_keypair(key_dir, &keypair).context("Failed to write key files")?;

    println!("p = {}, q = {}, phi = {}", keypair.p, keypair.q, keypair.phi());
    println!("Public key:  ({}) -> {}", keypair.public_key, public_path.display());
    println!("Private key: ({}) -> {}", keypair.private_key, private_path.display());
    Ok(())
}

fn transform(args: &TransformArgs, mode: Mode, key_dir: &Path) -> Result<()> {
    let config = FileConfig::default().with_key_dir(key_dir).with_scheme(args.scheme);
    let key = args
        .key_source()?
        .resolve(mode, &config.key_dir)
        .context("Failed to load key")?;

    let written = transform_file(&args.input, args.output.as_deref(), &key, mode, &config, &mut LogObserver)
        .with_context(|| format!("Failed to {} `{}`", if mode.is_encrypt() { "encrypt" } else { "decrypt" }, args.input.display()))?;

    println!("{}", written.display());
    Ok(())
}
