//! mmkyber-cli: key generation, encapsulation and encryption to many
//! recipients from the command line.
//!
//! Keys and ciphertexts are raw byte files. Seeds are hex strings; any seed
//! left out is drawn from the operating system RNG.

use std::fs;
use std::hint::black_box;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use eyre::{bail, Context, Result};
use rand::{rngs::OsRng, RngCore};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use lattice_core::hashing::shake128;
use mmkyber::{
    decapsulate_with, decrypt_with, encapsulate, encrypt, keygen, setup, sizes, Ciphertext,
    DecryptionPath, Message, Mode, ParameterSet, PublicKey, PublicParams, SecretKey,
    SecurityLevel, MAX_RECIPIENTS,
};

/// Matrix seed used when none is given, shared by all parties
const DEFAULT_SEED_A: &str = "0123456789abcdef";

#[derive(Parser)]
#[command(name = "mmkyber-cli")]
#[command(about = "Multi-recipient lattice KEM and PKE")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct LevelArgs {
    /// Security level: 128, 192 or 256
    #[arg(long, default_value_t = 128)]
    level: u32,

    /// JSON parameter set to load instead of --level
    #[arg(long, conflicts_with = "level")]
    params: Option<PathBuf>,
}

impl LevelArgs {
    fn level(&self) -> Result<SecurityLevel> {
        match &self.params {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let params: ParameterSet = serde_json::from_str(&text)
                    .with_context(|| format!("Invalid parameter set in {}", path.display()))?;
                Ok(SecurityLevel::from_params(&params)?)
            }
            None => Ok(SecurityLevel::from_bits(self.level)?),
        }
    }
}

#[derive(clap::Args)]
struct MatrixArgs {
    #[command(flatten)]
    level: LevelArgs,

    /// Public matrix seed (16 bytes of text)
    #[arg(long, default_value = DEFAULT_SEED_A)]
    seed_a: String,
}

impl MatrixArgs {
    fn public_params(&self) -> Result<PublicParams> {
        let seed_a: [u8; sizes::MATRIX_SEED_BYTES] = self
            .seed_a
            .as_bytes()
            .try_into()
            .with_context(|| format!("--seed-a must be exactly {} bytes", sizes::MATRIX_SEED_BYTES))?;
        Ok(setup(self.level.level()?, &seed_a))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print a parameter set as JSON
    Params {
        #[command(flatten)]
        level: LevelArgs,
    },

    /// Generate a key pair
    Keygen {
        #[command(flatten)]
        matrix: MatrixArgs,
        /// 32-byte key seed in hex
        #[arg(long)]
        seed: Option<String>,
        #[arg(long)]
        pk: PathBuf,
        #[arg(long)]
        sk: PathBuf,
    },

    /// Encapsulate one session key per public key
    Encap {
        #[command(flatten)]
        matrix: MatrixArgs,
        /// Recipient public keys, in recipient order
        #[arg(long = "pk", required = true)]
        pks: Vec<PathBuf>,
        /// 32-byte encapsulation seed in hex
        #[arg(long)]
        seed: Option<String>,
        #[arg(long)]
        ct: PathBuf,
    },

    /// Recover one recipient's session key
    Decap {
        #[command(flatten)]
        level: LevelArgs,
        #[arg(long)]
        sk: PathBuf,
        #[arg(long)]
        ct: PathBuf,
        /// Position of this recipient in the ciphertext
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Use the NTT inner product instead of the schoolbook one
        #[arg(long)]
        ntt: bool,
    },

    /// Encrypt one 32-byte message per public key
    Enc {
        #[command(flatten)]
        matrix: MatrixArgs,
        #[arg(long = "pk", required = true)]
        pks: Vec<PathBuf>,
        /// Messages in hex, one per public key
        #[arg(long = "msg", required = true)]
        messages: Vec<String>,
        #[arg(long)]
        seed: Option<String>,
        #[arg(long)]
        ct: PathBuf,
    },

    /// Decrypt one recipient's message
    Dec {
        #[command(flatten)]
        level: LevelArgs,
        #[arg(long)]
        sk: PathBuf,
        #[arg(long)]
        ct: PathBuf,
        #[arg(long, default_value_t = 0)]
        index: usize,
        #[arg(long)]
        ntt: bool,
    },

    /// Print checksums of the deterministic test vectors
    Testvec {
        #[command(flatten)]
        level: LevelArgs,
        #[arg(long, value_enum, default_value = "kem")]
        mode: ModeArg,
        /// Number of recipients
        #[arg(long, default_value_t = 5)]
        recipients: usize,
    },

    /// Print ciphertext sizes for N = 1, 2, 4, ..., 1024 recipients
    Sizes {
        #[command(flatten)]
        level: LevelArgs,
        #[arg(long, value_enum, default_value = "kem")]
        mode: ModeArg,
    },

    /// Time every operation for N = 1, 2, 4, ... recipients
    Bench {
        #[command(flatten)]
        level: LevelArgs,
        #[arg(long, value_enum, default_value = "kem")]
        mode: ModeArg,
        /// Repetitions at N = 1; N recipients run reps / N times
        #[arg(long, default_value_t = 1024)]
        reps: usize,
        /// Largest recipient count to time
        #[arg(long, default_value_t = MAX_RECIPIENTS)]
        max_recipients: usize,
        #[arg(long)]
        ntt: bool,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ModeArg {
    Kem,
    Pke,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Kem => Mode::Kem,
            ModeArg::Pke => Mode::Pke,
        }
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    match args.command {
        Command::Params { level } => {
            let level = level.level()?;
            let params = level.params();
            println!("{}", header_line(level, Mode::Kem));
            println!("{}", serde_json::to_string_pretty(params)?);
        }

        Command::Keygen { matrix, seed, pk, sk } => {
            let pp = matrix.public_params()?;
            let seed = seed_or_random(seed.as_deref())?;
            let (public, secret) = keygen(&pp, &seed)?;

            write_file(&pk, public.as_bytes())?;
            write_file(&sk, secret.as_bytes())?;
            info!("Wrote {} byte public key to {}", public.as_bytes().len(), pk.display());
            info!("Wrote {} byte secret key to {}", secret.as_bytes().len(), sk.display());
        }

        Command::Encap { matrix, pks, seed, ct } => {
            let pp = matrix.public_params()?;
            let keys = read_public_keys(pp.level(), &pks)?;
            let seed = seed_or_random(seed.as_deref())?;

            let start = Instant::now();
            let enc = encapsulate(&pp, &keys, &seed)?;
            debug!("Encapsulation took {:.2?}", start.elapsed());

            let bytes = enc.ciphertext.to_bytes();
            write_file(&ct, &bytes)?;
            info!("Wrote {} byte ciphertext for {} recipients", bytes.len(), keys.len());
            for (i, key) in enc.keys.iter().enumerate() {
                println!("{} {}", i, hex::encode(key.as_bytes()));
            }
        }

        Command::Decap { level, sk, ct, index, ntt } => {
            let level = level.level()?;
            let secret = read_secret_key(level, &sk)?;
            let ciphertext = read_ciphertext(level, Mode::Kem, &ct)?;
            let individual = ciphertext
                .individual(index)
                .ok_or_else(|| eyre::eyre!("no recipient #{} in a {}-recipient ciphertext", index, ciphertext.len()))?;

            let key = decapsulate_with(path(ntt), &secret, ciphertext.shared(), individual)?;
            println!("{}", hex::encode(key.as_bytes()));
        }

        Command::Enc { matrix, pks, messages, seed, ct } => {
            let pp = matrix.public_params()?;
            let keys = read_public_keys(pp.level(), &pks)?;
            let messages = messages
                .iter()
                .map(|m| parse_hex::<{ sizes::MESSAGE_BYTES }>(m, "message"))
                .collect::<Result<Vec<Message>>>()?;
            let seed = seed_or_random(seed.as_deref())?;

            let ciphertext = encrypt(&pp, &keys, &messages, &seed)?;
            let bytes = ciphertext.to_bytes();
            write_file(&ct, &bytes)?;
            info!("Wrote {} byte ciphertext for {} recipients", bytes.len(), keys.len());
        }

        Command::Dec { level, sk, ct, index, ntt } => {
            let level = level.level()?;
            let secret = read_secret_key(level, &sk)?;
            let ciphertext = read_ciphertext(level, Mode::Pke, &ct)?;
            let individual = ciphertext
                .individual(index)
                .ok_or_else(|| eyre::eyre!("no recipient #{} in a {}-recipient ciphertext", index, ciphertext.len()))?;

            let message = decrypt_with(path(ntt), &secret, ciphertext.shared(), individual)?;
            println!("{}", hex::encode(message));
        }

        Command::Testvec { level, mode, recipients } => {
            test_vectors(level.level()?, mode.into(), recipients)?;
        }

        Command::Sizes { level, mode } => {
            let level = level.level()?;
            let mode = Mode::from(mode);
            let params = level.params();
            println!("{}", header_line(level, mode));
            let mut n = 1;
            while n <= params.max_recipients {
                println!("{}", size_line(level, mode, n));
                n *= 2;
            }
        }

        Command::Bench { level, mode, reps, max_recipients, ntt } => {
            if max_recipients == 0 || max_recipients > MAX_RECIPIENTS {
                bail!("--max-recipients must be in 1..={}", MAX_RECIPIENTS);
            }
            run_bench(level.level()?, mode.into(), reps, max_recipients, path(ntt))?;
        }
    }

    Ok(())
}

fn path(ntt: bool) -> DecryptionPath {
    if ntt {
        DecryptionPath::Ntt
    } else {
        DecryptionPath::Schoolbook
    }
}

fn header_line(level: SecurityLevel, mode: Mode) -> String {
    let p = level.params();
    format!(
        "{:>16}  {:>16}  m= {}  n= {}  du= {}  dv= {}  sig0= {:.6}  sig1= {:.6}",
        p.name(mode),
        "parameters",
        p.m,
        p.n,
        p.du,
        p.dv,
        p.sigma0,
        p.sigma1
    )
}

fn size_line(level: SecurityLevel, mode: Mode, recipients: usize) -> String {
    let p = level.params();
    format!(
        "{:>16}  {:>16}  N= {:>4}  len= {:>9}",
        p.name(mode),
        "ciphertext",
        recipients,
        p.ciphertext_bytes(mode, recipients)
    )
}

/// Mean cost of one repetition of a timed operation
struct Timing {
    cycles: u64,
    seconds: f64,
}

#[cfg(target_arch = "x86_64")]
fn cycle_counter() -> u64 {
    // SAFETY: RDTSC is available on every x86_64 CPU and has no side effects
    unsafe { core::arch::x86_64::_rdtsc() }
}

#[cfg(not(target_arch = "x86_64"))]
fn cycle_counter() -> u64 {
    0
}

fn time_reps(reps: usize, mut op: impl FnMut() -> Result<()>) -> Result<Timing> {
    let reps = reps.max(1);
    let start = Instant::now();
    let cycles = cycle_counter();
    for _ in 0..reps {
        op()?;
    }
    Ok(Timing {
        cycles: cycle_counter().wrapping_sub(cycles) / reps as u64,
        seconds: start.elapsed().as_secs_f64() / reps as f64,
    })
}

fn timing_line(level: SecurityLevel, mode: Mode, op: &str, recipients: usize, timing: &Timing) -> String {
    format!(
        "{:>16}  {:>16}  N= {:>4}  cyc= {:>9}  sec= {:>8.6}",
        level.params().name(mode),
        op,
        recipients,
        timing.cycles,
        timing.seconds
    )
}

fn random_array<const L: usize>() -> [u8; L] {
    let mut out = [0u8; L];
    OsRng.fill_bytes(&mut out);
    out
}

/// Times setup, key generation, encryption and decryption at N = 1, 2, 4, ...
///
/// Each N gets fresh random seeds and runs reps / N repetitions.
fn run_bench(
    level: SecurityLevel,
    mode: Mode,
    reps: usize,
    max_recipients: usize,
    path: DecryptionPath,
) -> Result<()> {
    println!("{}", header_line(level, mode));

    let mut n = 1;
    while n <= max_recipients {
        let rep = reps / n;
        let seed_a: [u8; sizes::MATRIX_SEED_BYTES] = random_array();
        let mut seed_k: [u8; sizes::SEED_BYTES] = random_array();
        let seed_e: [u8; sizes::SEED_BYTES] = random_array();
        println!("{}", size_line(level, mode, n));

        let mut pp = setup(level, &seed_a);
        let timing = time_reps(rep, || {
            pp = setup(level, &seed_a);
            Ok(())
        })?;
        println!("{}", timing_line(level, mode, "mmSetup()", n, &timing));

        let mut pks = Vec::with_capacity(n);
        let mut sks = Vec::with_capacity(n);
        let timing = time_reps(rep, || {
            pks.clear();
            sks.clear();
            for i in 0..n {
                seed_k[..8].copy_from_slice(&(i as u64).to_le_bytes());
                let (pk, sk) = keygen(&pp, &seed_k)?;
                pks.push(pk);
                sks.push(sk);
            }
            Ok(())
        })?;
        println!("{}", timing_line(level, mode, "mmKGen()", n, &timing));

        match mode {
            Mode::Kem => {
                let enc = encapsulate(&pp, &pks, &seed_e)?;
                let timing = time_reps(rep, || {
                    black_box(encapsulate(&pp, &pks, &seed_e)?);
                    Ok(())
                })?;
                println!("{}", timing_line(level, mode, "mmEncap()", n, &timing));

                let ct = &enc.ciphertext;
                let timing = time_reps(rep, || {
                    for (i, sk) in sks.iter().enumerate() {
                        let individual = ct
                            .individual(i)
                            .ok_or_else(|| eyre::eyre!("missing recipient #{}", i))?;
                        let key = decapsulate_with(path, sk, ct.shared(), individual)?;
                        if key != enc.keys[i] {
                            println!("[FAIL] decaps #{}", i);
                        }
                    }
                    Ok(())
                })?;
                println!("{}", timing_line(level, mode, "mmDecap()", n, &timing));
            }
            Mode::Pke => {
                let messages: Vec<Message> = (0..n).map(|i| test_message(&seed_e, i)).collect();
                let ct = encrypt(&pp, &pks, &messages, &seed_e)?;
                let timing = time_reps(rep, || {
                    black_box(encrypt(&pp, &pks, &messages, &seed_e)?);
                    Ok(())
                })?;
                println!("{}", timing_line(level, mode, "mmEnc()", n, &timing));

                let timing = time_reps(rep, || {
                    for (i, sk) in sks.iter().enumerate() {
                        let individual = ct
                            .individual(i)
                            .ok_or_else(|| eyre::eyre!("missing recipient #{}", i))?;
                        let m = decrypt_with(path, sk, ct.shared(), individual)?;
                        if m != messages[i] {
                            println!("[FAIL] dec #{}", i);
                        }
                    }
                    Ok(())
                })?;
                println!("{}", timing_line(level, mode, "mmDec()", n, &timing));
            }
        }

        n *= 2;
    }

    Ok(())
}

/// Running checksum x = x * 0x103 + byte, printed as `label[len] chk xxxxxxxx`
fn checksum(data: &[u8], label: &str) {
    let x = data
        .iter()
        .fold(1u32, |x, &b| x.wrapping_mul(0x103).wrapping_add(b as u32));
    println!("{}[{}] chk {:08x}", label, data.len(), x);
}

fn test_vectors(level: SecurityLevel, mode: Mode, recipients: usize) -> Result<()> {
    let seed_a = b"0123456789abcdef";
    let mut seed_k = *b"000102030405060708090a0b0c0d0e0f";
    let seed_e = b"00112233445566778899aabbccddeeff";

    let params = level.params();
    let name = params.name(mode);
    println!("{}", header_line(level, mode));
    println!("=== chk {} N={}", name, recipients);
    println!("{}", size_line(level, mode, recipients));

    let pp = setup(level, seed_a);
    let mut pks = Vec::with_capacity(recipients);
    let mut sks = Vec::with_capacity(recipients);
    for i in 0..recipients {
        seed_k[..8].copy_from_slice(&(i as u64).to_le_bytes());
        let (pk, sk) = keygen(&pp, &seed_k)?;
        checksum(sk.as_bytes(), "sk");
        checksum(pk.as_bytes(), "pk");
        pks.push(pk);
        sks.push(sk);
    }

    match mode {
        Mode::Kem => {
            let enc = encapsulate(&pp, &pks, seed_e)?;
            let ct = &enc.ciphertext;
            checksum(ct.shared().as_bytes(), "ct_u");
            checksum(&ct.to_bytes(), "ct");

            for (i, sk) in sks.iter().enumerate() {
                let individual = ct
                    .individual(i)
                    .ok_or_else(|| eyre::eyre!("missing recipient #{}", i))?;
                let key = decapsulate_with(DecryptionPath::default(), sk, ct.shared(), individual)?;
                if key != enc.keys[i] {
                    println!("[FAIL] decaps #{}", i);
                }
                println!("decaps #{}", i);
                checksum(key.as_bytes(), "k_i");
                checksum(individual.as_bytes(), "ct_i");
            }
        }
        Mode::Pke => {
            let messages: Vec<Message> = (0..recipients).map(|i| test_message(seed_e, i)).collect();
            let ct = encrypt(&pp, &pks, &messages, seed_e)?;
            checksum(ct.shared().as_bytes(), "ct_u");
            checksum(&ct.to_bytes(), "ct");

            for (i, sk) in sks.iter().enumerate() {
                let individual = ct
                    .individual(i)
                    .ok_or_else(|| eyre::eyre!("missing recipient #{}", i))?;
                let m = decrypt_with(DecryptionPath::default(), sk, ct.shared(), individual)?;
                if m != messages[i] {
                    println!("[FAIL] dec #{}", i);
                }
                println!("dec #{}", i);
                checksum(&m, "m_i");
                checksum(individual.as_bytes(), "ct_i");
            }
        }
    }

    Ok(())
}

/// Message i of the test vectors: SHAKE128(seed_e || le64(i) || "m")
fn test_message(seed_e: &[u8; 32], i: usize) -> Message {
    let mut input = seed_e.to_vec();
    input.extend_from_slice(&(i as u64).to_le_bytes());
    input.push(b'm');

    let mut m = [0u8; sizes::MESSAGE_BYTES];
    m.copy_from_slice(&shake128(&input, sizes::MESSAGE_BYTES));
    m
}

fn parse_hex<const L: usize>(text: &str, what: &str) -> Result<[u8; L]> {
    let bytes = hex::decode(text).with_context(|| format!("{} is not valid hex", what))?;
    match <[u8; L]>::try_from(bytes.as_slice()) {
        Ok(out) => Ok(out),
        Err(_) => bail!("{} must be {} bytes, got {}", what, L, bytes.len()),
    }
}

fn seed_or_random(seed: Option<&str>) -> Result<[u8; sizes::SEED_BYTES]> {
    match seed {
        Some(text) => parse_hex(text, "seed"),
        None => Ok(random_array()),
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_public_keys(level: SecurityLevel, paths: &[PathBuf]) -> Result<Vec<PublicKey>> {
    paths
        .iter()
        .map(|path| {
            let bytes = read_file(path)?;
            PublicKey::from_bytes(level, &bytes)
                .with_context(|| format!("Invalid public key in {}", path.display()))
        })
        .collect()
}

fn read_secret_key(level: SecurityLevel, path: &Path) -> Result<SecretKey> {
    let bytes = read_file(path)?;
    SecretKey::from_bytes(level, &bytes).with_context(|| format!("Invalid secret key in {}", path.display()))
}

fn read_ciphertext(level: SecurityLevel, mode: Mode, path: &Path) -> Result<Ciphertext> {
    let bytes = read_file(path)?;
    Ciphertext::from_bytes(level, mode, &bytes)
        .with_context(|| format!("Invalid {} ciphertext in {}", mode, path.display()))
}
