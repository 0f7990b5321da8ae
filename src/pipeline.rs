//! Replay of capture files through the parser registry.
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::record::{CaptureFrame, CaptureReader};
use crate::router::{DecodedFeed, ParserRegistry};

/// Extension of capture files picked up from input directories.
pub const CAPTURE_EXT: &str = "cap";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub flows: usize,
    pub decoded: usize,
    /// Decoded but carried no recognizable market.
    pub empty: usize,
    pub unrouted: usize,
    pub failed: usize,
}

impl ReplayStats {
    pub fn merge(&mut self, other: ReplayStats) {
        self.flows += other.flows;
        self.decoded += other.decoded;
        self.empty += other.empty;
        self.unrouted += other.unrouted;
        self.failed += other.failed;
    }
}

/// Decode every flow of a capture stream, handing non-empty results to
/// `emit`. Per-flow failures are logged and counted; a framing error ends the
/// stream and is returned after whatever was read before it was emitted.
pub fn replay<R, F>(reader: R, registry: &ParserRegistry, stop: &AtomicBool, mut emit: F) -> Result<ReplayStats>
where
    R: Read,
    F: FnMut(DecodedFeed),
{
    let mut stats = ReplayStats::default();
    for frame in CaptureReader::new(reader) {
        if stop.load(Ordering::Relaxed) {
            debug!("stop requested");
            break;
        }
        let flow = match frame? {
            CaptureFrame::Header(h) => {
                debug!(version = h.version, source = h.source.as_str(), "capture header");
                continue;
            }
            CaptureFrame::Flow(flow) => flow,
        };
        stats.flows += 1;
        match registry.process(&flow) {
            Ok(feed) if feed.is_empty() => {
                stats.empty += 1;
                debug!(seq = flow.seq, url = flow.url.as_str(), "no recognizable market");
            }
            Ok(feed) => {
                stats.decoded += 1;
                info!(seq = flow.seq, url = flow.url.as_str(), stat = feed.stat_type.as_deref().unwrap_or("-"), players = feed.players.len(), "decoded flow");
                emit(feed);
            }
            Err(e) if e.is_unrouted() => {
                stats.unrouted += 1;
                debug!(url = flow.url.as_str(), "no parser for url");
            }
            Err(e) => {
                stats.failed += 1;
                warn!(seq = flow.seq, error = %e, "error processing flow");
            }
        }
    }
    Ok(stats)
}

pub fn replay_file<F>(path: &Path, registry: &ParserRegistry, stop: &AtomicBool, emit: F) -> Result<ReplayStats>
where
    F: FnMut(DecodedFeed),
{
    let file = File::open(path).with_context(|| format!("open {:?}", path))?;
    replay(BufReader::new(file), registry, stop, emit).with_context(|| format!("replay {:?}", path))
}

/// Expand inputs: files are taken as given, directories contribute their
/// `*.cap` entries (not recursive), sorted by name.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)
                .with_context(|| format!("read dir {:?}", input))?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == CAPTURE_EXT))
                .collect();
            found.sort();
            out.extend(found);
        } else if input.exists() {
            out.push(input.clone());
        } else {
            anyhow::bail!("input not found: {:?}", input);
        }
    }
    Ok(out)
}
