//! Invocation of the external TPC-H data generator.
//!
//! The generator is a separate program (`tpchgen-cli` by default) writing one
//! delimited file per table into the output directory.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, TpchError};

/// Default column delimiter passed to the generator.
pub const DEFAULT_DELIMITER: &str = "\\t";

/// One generator run.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorRequest {
    pub program: String,
    pub scale_factor: f64,
    pub output_dir: PathBuf,
    pub delimiter: String,
    pub threads: Option<usize>,
}

impl GeneratorRequest {
    /// Checks the request before anything is spawned.
    pub fn validate(&self) -> Result<()> {
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(TpchError::config(format!(
                "--scale-factor must be greater than 0, got {}",
                self.scale_factor
            )));
        }
        if self.threads == Some(0) {
            return Err(TpchError::config("--threads must be at least 1"));
        }
        parse_delimiter(&self.delimiter)?;
        Ok(())
    }

    /// Command-line arguments for the generator.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--scale-factor".into(),
            self.scale_factor.to_string().into(),
            "--output-dir".into(),
            self.output_dir.clone().into(),
            "--format".into(),
            "csv".into(),
            "--delimiter".into(),
            self.delimiter.clone().into(),
        ];
        if let Some(threads) = self.threads {
            args.push("--num-threads".into());
            args.push(threads.to_string().into());
        }
        args
    }
}

/// Parses a delimiter given literally or as a `\t`, `\\` or `\xHH` escape.
pub fn parse_delimiter(value: &str) -> Result<u8> {
    let invalid = || TpchError::config(format!("invalid delimiter: {value:?}"));

    let byte = match value.as_bytes() {
        [b] => *b,
        [b'\\', b't'] => b'\t',
        [b'\\', b'\\'] => b'\\',
        [b'\\', b'x', hi, lo] if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
            let digits = [*hi, *lo];
            let hex = std::str::from_utf8(&digits)
                .ok()
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            hex.ok_or_else(invalid)?
        }
        _ => return Err(invalid()),
    };

    match byte {
        0 | b'\n' | b'\r' | b'"' => Err(invalid()),
        b if !b.is_ascii() => Err(invalid()),
        b => Ok(b),
    }
}

/// Runs the generator to completion.
///
/// A missing program or a non-zero exit is a `Generator` error; the latter
/// carries the program's stderr.
pub async fn generate(request: &GeneratorRequest) -> Result<()> {
    request.validate()?;
    tokio::fs::create_dir_all(&request.output_dir)
        .await
        .map_err(|e| TpchError::io(format!("create {}: {e}", request.output_dir.display())))?;

    info!(
        "Generating scale factor {} into {}",
        request.scale_factor,
        request.output_dir.display()
    );
    let start = Instant::now();
    let output = Command::new(&request.program)
        .args(request.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            TpchError::generator(format!("failed to start {}: {e}", request.program))
        })?;

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        debug!("{}: {line}", request.program);
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TpchError::generator(format!(
            "{} exited with {}: {}",
            request.program,
            output.status,
            stderr.trim()
        )));
    }

    info!("Generated data in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}
