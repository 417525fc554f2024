use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::Config;
use crate::fingerprint::{Fingerprint, Fingerprinter};
use crate::{LandmarkError, Result};

const CHUNK_SIZE: usize = 64 * 1024;

/// Decodes an audio file to raw PCM via a child `ffmpeg` process and streams
/// it through a [`Fingerprinter`].
///
/// Grounded on the teacher's file-based entry point
/// (`SignatureGenerator::make_signature_from_file`), reworked to shell out to
/// `ffmpeg` instead of decoding in-process with `rodio`.
pub struct Decoder {
    command: String,
}

impl Decoder {
    /// Creates a decoder that invokes the system `ffmpeg` binary.
    pub fn new() -> Self {
        Decoder {
            command: "ffmpeg".to_string(),
        }
    }

    /// Creates a decoder that invokes a different binary, for testing.
    pub fn with_command(command: impl Into<String>) -> Self {
        Decoder {
            command: command.into(),
        }
    }

    /// Decodes `path` to PCM and fingerprints it with `config` in one pass.
    pub fn decode_and_fingerprint(
        &self,
        path: &Path,
        config: Config,
    ) -> Result<Vec<Fingerprint>> {
        let mut child = Command::new(&self.command)
            .arg("-i")
            .arg(path)
            .arg("-f")
            .arg("s16le")
            .arg("-ar")
            .arg(config.sampling_rate.to_string())
            .arg("-ac")
            .arg("1")
            .arg("-loglevel")
            .arg("error")
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                LandmarkError::InputUnavailable(format!(
                    "could not spawn `{}`: {}",
                    self.command, e
                ))
            })?;

        let mut stdout = child.stdout.take().expect("stdout was piped");
        let mut stderr = child.stderr.take().expect("stderr was piped");

        // Drain stderr on its own thread so a chatty decoder can't deadlock
        // us against a full pipe buffer while we're still reading stdout.
        let stderr_handle = std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf);
            buf
        });

        let mut fingerprinter = Fingerprinter::new(config);
        let mut fingerprints = Vec::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = stdout.read(&mut buf).map_err(|e| {
                LandmarkError::DecoderFailure(format!("error reading decoder output: {}", e))
            })?;
            if n == 0 {
                break;
            }
            fingerprints.extend(fingerprinter.push(&buf[..n]));
        }
        fingerprints.extend(fingerprinter.finish());

        let stderr_bytes = stderr_handle.join().unwrap_or_default();
        let status = child.wait().map_err(|e| {
            LandmarkError::DecoderFailure(format!("decoder process failed: {}", e))
        })?;

        if !status.success() {
            let stderr_text = String::from_utf8_lossy(&stderr_bytes);
            return Err(LandmarkError::DecoderFailure(format!(
                "`{}` exited with {}: {}",
                self.command,
                status,
                stderr_text.trim()
            )));
        }

        Ok(fingerprints)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
