use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use crossbeam_channel::{Receiver, bounded};
use dotenvy::dotenv;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};
use time::OffsetDateTime;
use tracing::{info, warn};

use prop_feed::logging::{self, LogFormat};
use prop_feed::record::{CAPTURE_VERSION, CaptureFrame, CaptureHeader, CapturedFlow, write_frame};

#[derive(Debug, Parser)]
#[command(version, about = "Pack saved markets API response bodies into a capture file")]
struct Args {
    /// Response body files (already decompressed text)
    #[arg(required = true)]
    bodies: Vec<PathBuf>,

    /// Request URL recorded for every body
    #[arg(long, env = "CAPTURE_URL")]
    url: String,

    /// HTTP method recorded for every body
    #[arg(long, default_value = "GET")]
    method: String,

    /// Output file path (.cap); defaults to captures/capture_YYYY_MM_DD.cap
    #[arg(long, env = "CAPTURE_OUT")]
    out: Option<PathBuf>,

    /// Label stored in the capture header
    #[arg(long, default_value = "ingest")]
    source: String,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,
}

fn now_unix_ns() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}

/// Modification time of `path`, falling back to now.
fn captured_at(path: &Path) -> u128 {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or_else(now_unix_ns)
}

fn default_out_path() -> PathBuf {
    let d = OffsetDateTime::now_utc().date();
    let mut p = PathBuf::from("captures");
    p.push(format!("capture_{}_{:02}_{:02}.cap", d.year(), d.month() as u8, d.day()));
    p
}

fn writer_thread(out: PathBuf, rx: Receiver<CaptureFrame>) -> Result<usize> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).ok();
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&out)
        .with_context(|| format!("open {:?}", out))?;
    let mut w = BufWriter::with_capacity(1 << 20, file);
    let mut frames = 0usize;
    for frame in rx {
        write_frame(&mut w, &frame)?;
        frames += 1;
    }
    w.flush()?;
    Ok(frames)
}

fn main() -> Result<()> {
    let _ = dotenv();
    let args = Args::parse();
    logging::init(&args.log_level, args.log_format);

    let out = args.out.clone().unwrap_or_else(default_out_path);
    let (tx, rx) = bounded::<CaptureFrame>(256);
    let writer_out = out.clone();
    let writer = thread::spawn(move || writer_thread(writer_out, rx));

    let header = CaptureFrame::Header(CaptureHeader {
        version: CAPTURE_VERSION,
        created_unix_ns: now_unix_ns(),
        source: args.source.clone(),
    });
    tx.send(header).ok();

    let mut seq = 0u64;
    for path in &args.bodies {
        let body = match fs::read_to_string(path) {
            Ok(b) => b,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable body");
                continue;
            }
        };
        let flow = CapturedFlow {
            seq,
            captured_unix_ns: captured_at(path),
            method: args.method.clone(),
            url: args.url.clone(),
            status: 200,
            response_body: body,
        };
        if tx.send(CaptureFrame::Flow(flow)).is_err() {
            // Writer gone; its error is reported below.
            break;
        }
        seq += 1;
    }
    drop(tx);

    let frames = writer.join().map_err(|_| anyhow!("writer thread panicked"))??;
    if seq == 0 {
        bail!("no readable bodies among {} input(s)", args.bodies.len());
    }
    info!(out = %out.display(), flows = seq, frames, "capture written");
    Ok(())
}
