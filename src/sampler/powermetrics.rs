// Subprocess sampler: stream null-delimited plist documents from
// powermetrics. The child is killed on every exit path through the drop
// guard, including panics in the callback.

use std::io::BufReader;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;

use log::{debug, warn};

use super::{SampleCallback, SamplerHandle};
use crate::error::TelemetryError;
use crate::metrics::{PlatformContext, PowerMetricsDoc, Sample};

const BINARY: &str = "/usr/bin/powermetrics";
const SAMPLERS: &str = "cpu_power,gpu_power,ane_power,network,disk";

/// Consecutive parse misses tolerated at DEBUG before escalating to WARN.
const PARSE_WARN_THRESHOLD: u32 = 3;

struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

pub fn spawn(
    refresh_ms: u64,
    shutdown: Arc<AtomicBool>,
    fatal: Arc<OnceLock<String>>,
    callback: SampleCallback,
) -> Result<SamplerHandle, TelemetryError> {
    let interval = refresh_ms.to_string();
    let child = Command::new(BINARY)
        .args([
            "-i",
            &interval,
            "-f",
            "plist",
            "--samplers",
            SAMPLERS,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| {
            TelemetryError::PlatformUnavailable(format!(
                "cannot start powermetrics: {err} (root privileges are required)"
            ))
        })?;

    let thread = thread::Builder::new()
        .name("sampler".into())
        .spawn(move || stream_documents(child, shutdown, fatal, callback))
        .map_err(TelemetryError::Io)?;
    Ok(SamplerHandle::new(thread))
}

fn stream_documents(
    child: Child,
    shutdown: Arc<AtomicBool>,
    fatal: Arc<OnceLock<String>>,
    mut callback: SampleCallback,
) {
    let mut guard = ChildGuard(child);
    let stdout = match guard.0.stdout.take() {
        Some(stdout) => stdout,
        None => {
            let _ = fatal.set("powermetrics stdout unavailable".into());
            shutdown.store(true, Ordering::Release);
            return;
        }
    };
    let mut reader = BufReader::new(stdout);
    let mut document = Vec::new();
    let mut parse_failures = 0u32;

    while !shutdown.load(Ordering::Acquire) {
        document.clear();
        match read_until_null(&mut reader, &mut document) {
            Ok(0) => {
                let _ = fatal.set("powermetrics exited unexpectedly".into());
                shutdown.store(true, Ordering::Release);
                return;
            }
            Ok(_) => {}
            Err(err) => {
                let _ = fatal.set(format!("error reading powermetrics output: {err}"));
                shutdown.store(true, Ordering::Release);
                return;
            }
        }
        if document.iter().all(|b| b.is_ascii_whitespace() || *b == 0) {
            continue;
        }
        match PowerMetricsDoc::from_bytes(&document) {
            Ok(doc) => {
                parse_failures = 0;
                callback(Sample::now(PlatformContext::PowerMetrics(doc)));
            }
            Err(err) => {
                parse_failures += 1;
                if parse_failures >= PARSE_WARN_THRESHOLD {
                    warn!("skipping malformed powermetrics document ({parse_failures} in a row): {err}");
                } else {
                    debug!("skipping malformed powermetrics document: {err}");
                }
            }
        }
    }
}

/// Read one document: everything up to and excluding the next null byte.
/// Returns the number of bytes read, 0 at EOF.
fn read_until_null<R: std::io::BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<usize> {
    let read = reader.read_until(0, buf)?;
    if buf.last() == Some(&0) {
        buf.pop();
    }
    Ok(read)
}
