//! # Audio/Video Merger Module
//!
//! Questo modulo invoca la toolchain media esterna (ffmpeg) per combinare
//! un file video e un file audio in un unico output.
//!
//! ## Responsabilità:
//! - Probe di disponibilità di ffmpeg una sola volta a inizio sessione
//!   (invocazione `-version`); se assente, ogni merge ritorna
//!   `ToolUnavailable` senza lanciare altri processi
//! - Merge con copia dello stream video e ricodifica audio AAC
//! - Cattura dello stderr di ffmpeg come diagnostica sui fallimenti
//!
//! ## Pipeline di merge:
//! - Codec video: copy (nessuna ricodifica)
//! - Codec audio: AAC per massima compatibilità
//! - Output sovrascritto se già presente (`-y`)
//!
//! Il merger non cancella mai i file di input: la cleanup policy è del
//! chiamante.

use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[cfg(windows)]
const FFMPEG_PROGRAM: &str = "ffmpeg.exe";
#[cfg(not(windows))]
const FFMPEG_PROGRAM: &str = "ffmpeg";

/// Result of one merge invocation.
#[derive(Debug)]
pub enum MergeOutcome {
    Success,
    /// The toolchain was not found at session start; merging is disabled.
    ToolUnavailable,
    /// The toolchain ran and exited non-zero (or could not be spawned).
    ToolFailed(String),
}

/// Invokes the external media toolchain to mux audio into video.
pub struct Merger {
    program: String,
    available: bool,
}

impl Merger {
    /// Probe the system ffmpeg once and remember the result.
    pub async fn detect() -> Self {
        Self::detect_with_program(FFMPEG_PROGRAM).await
    }

    /// Probe a specific toolchain executable.
    pub async fn detect_with_program(program: &str) -> Self {
        let available = match Command::new(program).arg("-version").output().await {
            Ok(output) if output.status.success() => {
                debug!("ffmpeg is available");
                true
            }
            Ok(_) => {
                warn!("ffmpeg command returned non-zero exit code");
                false
            }
            Err(_) => {
                warn!(
                    "ffmpeg not found. Audio merging will be disabled. \
                     Please install ffmpeg to enable audio merging."
                );
                false
            }
        };

        Self {
            program: program.to_string(),
            available,
        }
    }

    /// A merger that was never probed because audio download is off.
    pub fn unavailable() -> Self {
        Self {
            program: FFMPEG_PROGRAM.to_string(),
            available: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Merge `video_path` and `audio_path` into `output_path`, copying the
    /// video stream and re-encoding audio to AAC.
    pub async fn merge(
        &self,
        video_path: &Path,
        audio_path: &Path,
        output_path: &Path,
    ) -> MergeOutcome {
        if !self.available {
            return MergeOutcome::ToolUnavailable;
        }

        debug!(
            "Merging {} and {} to {}",
            video_path.display(),
            audio_path.display(),
            output_path.display()
        );

        let result = Command::new(&self.program)
            .arg("-i")
            .arg(video_path)
            .arg("-i")
            .arg(audio_path)
            .args(["-c:v", "copy"])
            .args(["-c:a", "aac"])
            .args(["-strict", "experimental"])
            .args(["-loglevel", "warning"])
            .arg("-y")
            .arg(output_path)
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                info!(
                    "Successfully merged audio and video: {}",
                    output_path.file_name().unwrap_or_default().to_string_lossy()
                );
                MergeOutcome::Success
            }
            Ok(output) => {
                MergeOutcome::ToolFailed(String::from_utf8_lossy(&output.stderr).to_string())
            }
            Err(e) => MergeOutcome::ToolFailed(e.to_string()),
        }
    }
}
