//! ffmpeg/ffprobe backed engine
//!
//! Every invocation is throttled (`-threads`, `nice`, optional `cpulimit`)
//! so a render never starves the controlling process, and is killed when it
//! exceeds its wall-clock budget. On unix each run leads its own process
//! group, so a kill reaches ffmpeg behind the `nice`/`cpulimit` wrappers.

use super::config::RenderConfig;
use super::effects::OUTPUT_LABEL;
use super::engine::{AudioEngine, EngineInvocation};
use crate::error::EngineError;
use serde::Deserialize;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Most stderr kept in error messages
const STDERR_LIMIT: usize = 2000;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    config: RenderConfig,
}

impl FfmpegEngine {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Full argv for an invocation, including throttling wrappers
    pub fn command_line(&self, invocation: &EngineInvocation) -> Vec<String> {
        let throttle = &self.config.throttle;
        let mut argv: Vec<String> = Vec::new();
        if let Some(niceness) = throttle.niceness {
            argv.extend(["nice".to_string(), "-n".to_string(), niceness.to_string()]);
        }
        if let Some(percent) = throttle.cpu_limit_percent {
            argv.extend([
                "cpulimit".to_string(),
                "-l".to_string(),
                percent.to_string(),
                "--".to_string(),
            ]);
        }

        argv.push(self.config.ffmpeg.clone());
        argv.extend(
            ["-hide_banner", "-nostdin", "-y", "-loglevel", "error"]
                .iter()
                .map(|s| s.to_string()),
        );
        argv.extend(["-threads".to_string(), throttle.threads.max(1).to_string()]);
        for input in &invocation.inputs {
            argv.push("-i".to_string());
            argv.push(input.to_string_lossy().into_owned());
        }
        if let Some(graph) = &invocation.filter {
            argv.extend([
                "-filter_complex_threads".to_string(),
                throttle.threads.max(1).to_string(),
                "-filter_complex".to_string(),
                graph.to_string(),
                "-map".to_string(),
                format!("[{}]", graph.output_label().unwrap_or(OUTPUT_LABEL)),
            ]);
        } else {
            argv.extend(["-map".to_string(), "0:a".to_string()]);
        }
        argv.extend(invocation.codec_args.iter().cloned());
        argv.push(invocation.output.to_string_lossy().into_owned());
        argv
    }
}

impl AudioEngine for FfmpegEngine {
    fn probe_duration(&self, path: &Path) -> Result<f64, EngineError> {
        let output = Command::new(&self.config.ffprobe)
            .args(["-v", "error", "-print_format", "json", "-show_format"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| EngineError::Spawn {
                program: self.config.ffprobe.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(EngineError::Probe {
                path: path.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let probe: FfprobeOutput =
            serde_json::from_slice(&output.stdout).map_err(|e| EngineError::Probe {
                path: path.to_path_buf(),
                reason: format!("JSON parse error: {}", e),
            })?;

        probe
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| EngineError::Probe {
                path: path.to_path_buf(),
                reason: "no duration reported".to_string(),
            })
    }

    fn run(&self, invocation: &EngineInvocation, timeout: Duration) -> Result<(), EngineError> {
        let argv = self.command_line(invocation);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| EngineError::Failed {
                program: self.config.ffmpeg.clone(),
                status: "empty command".to_string(),
                stderr: String::new(),
            })?;
        log::debug!("Running {}: {}", invocation.label, argv.join(" "));

        // stderr goes to an anonymous file so a chatty child never blocks on a full pipe
        let mut stderr_file = tempfile::tempfile()?;
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_file.try_clone()?));
        own_process_group(&mut command);
        let mut child = command
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: program.clone(),
                source,
            })?;

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= timeout {
                log::warn!(
                    "{} exceeded {:.0}s, killing it",
                    invocation.label,
                    timeout.as_secs_f64()
                );
                kill_group(&mut child);
                let _ = std::fs::remove_file(&invocation.output);
                return Err(EngineError::TimedOut {
                    program: self.config.ffmpeg.clone(),
                    seconds: timeout.as_secs_f64(),
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        if status.success() {
            log::debug!(
                "{} finished in {:.1}s",
                invocation.label,
                started.elapsed().as_secs_f64()
            );
            return Ok(());
        }

        let mut stderr = String::new();
        stderr_file.seek(SeekFrom::Start(0))?;
        stderr_file.read_to_string(&mut stderr)?;
        let stderr = stderr.trim();
        let tail_start = stderr
            .char_indices()
            .rev()
            .nth(STDERR_LIMIT)
            .map(|(i, _)| i)
            .unwrap_or(0);
        Err(EngineError::Failed {
            program: self.config.ffmpeg.clone(),
            status: status.to_string(),
            stderr: stderr[tail_start..].to_string(),
        })
    }
}

#[cfg(unix)]
fn own_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_command: &mut Command) {}

/// Kill the child and everything it started, then reap it
fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: plain syscall on a group this engine created
            unsafe {
                libc::killpg(pgid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}
