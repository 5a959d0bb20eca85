use std::env;
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use triage_core::services::filter::FilterMode;

pub mod commands;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "LABEL_TRIAGE_LOG";

static INIT_TRACING: Once = Once::new();

/// Install the stderr log subscriber.
///
/// Reads `LABEL_TRIAGE_LOG` (e.g. `triage_core=debug`), falling back to `warn`.
/// Safe to call more than once.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
        // Another subscriber may already be installed by an embedding process.
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .try_init();
    });
}

/// Canonicalize the root path if possible, falling back to the given string
/// relative to the current working directory.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    if path == Path::new(".") {
        Ok(env::current_dir().context("Failed to get current directory")?)
    } else {
        match path.canonicalize() {
            Ok(p) => Ok(p),
            Err(_) => {
                let cwd = env::current_dir().context("Failed to get current directory")?;
                Ok(cwd.join(path))
            }
        }
    }
}

/// Infer a project name from the root path.
///
/// If the root has no final component (e.g., `/`), fallback to `unnamed-project`.
pub fn infer_project_name(root: &Path) -> String {
    root.file_name().and_then(|os_str| os_str.to_str()).unwrap_or("unnamed-project").to_string()
}

/// Compute the SHA-256 hash of a file and return it as a hex string.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open file for hashing: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read file for hashing: {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let digest = hasher.finalize();
    Ok(format!("{:x}", digest))
}

/// Parse a function offset given as `0x`-prefixed hex or decimal.
pub fn parse_offset(raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse::<u64>(),
    };
    parsed.map_err(|_| format!("invalid offset '{raw}' (expected 0x-prefixed hex or decimal)"))
}

/// clap value parser for `--filter`.
pub fn parse_filter(raw: &str) -> Result<FilterMode, String> {
    raw.parse::<FilterMode>().map_err(|err| err.to_string())
}

/// Render an offset the way the host displays addresses.
pub fn format_offset(offset: u64) -> String {
    format!("0x{offset:x}")
}
