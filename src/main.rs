use anyhow::{Context, Result, anyhow};
use clap::Parser;
use crossbeam_channel::{Receiver, Sender, bounded};
use dotenvy::dotenv;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

use prop_feed::classify::{StatTable, default_table};
use prop_feed::decode::FeedDecoder;
use prop_feed::logging::{self, LogFormat};
use prop_feed::pipeline::{ReplayStats, collect_inputs, replay_file};
use prop_feed::router::{DEFAULT_SOURCE, DEFAULT_URL_PATTERN, DecodedFeed, MarketsApiParser, ParserRegistry};
use prop_feed::sink::{Fanout, HttpSink, JsonLinesSink, Sink};

#[derive(Debug, Parser)]
#[command(version, about = "Replay captured markets traffic and decode player prop odds")]
struct Args {
    /// Capture files, or directories containing `.cap` files
    #[arg(long = "input", short = 'i', required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Write JSON lines to this file (stdout when neither --out nor --endpoint is given)
    #[arg(long, env = "OUT_FILE")]
    out: Option<PathBuf>,

    /// POST each decoded feed to this URL (e.g. http://host:8000/api/odds)
    #[arg(long, env = "ODDS_ENDPOINT")]
    endpoint: Option<String>,

    /// HTTP delivery timeout in milliseconds
    #[arg(long, env = "ODDS_ENDPOINT_TIMEOUT_MS", default_value_t = 10_000)]
    endpoint_timeout_ms: u64,

    /// URL substring that selects the markets parser
    #[arg(long, env = "URL_PATTERN", default_value = DEFAULT_URL_PATTERN)]
    url_pattern: String,

    /// Source label attached to every decoded feed
    #[arg(long, env = "SOURCE", default_value = DEFAULT_SOURCE)]
    source: String,

    /// Stat names decoded as threshold ladders; replaces the built-in list
    #[arg(long = "ladder-stat", env = "LADDER_STATS", value_delimiter = ',')]
    ladder_stats: Vec<String>,

    /// Decode worker threads (defaults to available parallelism)
    #[arg(long, env = "WORKERS")]
    workers: Option<usize>,

    /// Log level filter, overridden by RUST_LOG
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format: pretty or json
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,
}

fn stat_table(names: &[String]) -> StatTable {
    let names: Vec<&str> = names.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
    if names.is_empty() { default_table().clone() } else { StatTable::with_ladder(names) }
}

fn build_sink(args: &Args) -> Result<Fanout> {
    let mut fan = Fanout::default();
    if let Some(out) = &args.out {
        if let Some(parent) = out.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).ok();
            }
        }
        let file = File::create(out).with_context(|| format!("create {:?}", out))?;
        fan.push(JsonLinesSink::new(BufWriter::new(file)));
    }
    if let Some(endpoint) = &args.endpoint {
        let sink = HttpSink::new(endpoint.as_str(), Duration::from_millis(args.endpoint_timeout_ms))
            .context("build HTTP client")?;
        fan.push(sink);
    }
    if fan.is_empty() {
        fan.push(JsonLinesSink::new(BufWriter::new(std::io::stdout())));
    }
    Ok(fan)
}

fn writer_thread(mut sink: Fanout, rx: Receiver<DecodedFeed>) -> Result<usize> {
    let mut delivered = 0usize;
    for feed in rx {
        match sink.deliver(&feed) {
            Ok(()) => delivered += 1,
            Err(e) => error!(url = feed.url.as_str(), error = %e, "failed to deliver feed"),
        }
    }
    sink.finish()?;
    Ok(delivered)
}

/// Hand a feed to the writer. Returns false once the writer has hung up.
fn forward(tx: &Sender<DecodedFeed>, feed: DecodedFeed) -> bool {
    match tx.send(feed) {
        Ok(()) => true,
        Err(e) => {
            warn!(url = e.0.url.as_str(), "writer gone, dropping decoded feed");
            false
        }
    }
}

fn worker(jobs: Receiver<PathBuf>, registry: &ParserRegistry, stop: &AtomicBool, tx: Sender<DecodedFeed>) -> ReplayStats {
    let mut stats = ReplayStats::default();
    for path in jobs {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        info!(path = %path.display(), "processing capture");
        let res = replay_file(&path, registry, stop, |feed| {
            forward(&tx, feed);
        });
        match res {
            Ok(s) => stats.merge(s),
            Err(e) => error!(path = %path.display(), error = %format!("{e:#}"), "failed to process capture"),
        }
    }
    stats
}

fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();
    let args = Args::parse();
    logging::init(&args.log_level, args.log_format);

    let decoder = FeedDecoder::new(stat_table(&args.ladder_stats));
    let mut registry = ParserRegistry::new();
    registry.register(MarketsApiParser::new(args.source.as_str(), args.url_pattern.as_str(), decoder));
    let registry = Arc::new(registry);

    let files = collect_inputs(&args.inputs)?;
    if files.is_empty() {
        warn!("no capture files found");
        return Ok(());
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed)).ok();
    }

    let sink = build_sink(&args)?;
    let (feed_tx, feed_rx) = bounded::<DecodedFeed>(1024);
    let writer = thread::spawn(move || writer_thread(sink, feed_rx));

    let (job_tx, job_rx) = bounded::<PathBuf>(files.len());
    let n_files = files.len();
    for f in files {
        job_tx.send(f).ok();
    }
    drop(job_tx);

    let workers = args
        .workers
        .unwrap_or_else(|| thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
        .clamp(1, n_files);
    let mut handles = Vec::with_capacity(workers);
    for i in 0..workers {
        let (jobs, registry, stop, tx) = (job_rx.clone(), registry.clone(), stop.clone(), feed_tx.clone());
        let h = thread::Builder::new()
            .name(format!("decode-{i}"))
            .spawn(move || worker(jobs, &registry, &stop, tx))
            .context("spawn decode worker")?;
        handles.push(h);
    }
    drop(feed_tx);

    let mut total = ReplayStats::default();
    for h in handles {
        match h.join() {
            Ok(s) => total.merge(s),
            Err(_) => error!("decode worker panicked"),
        }
    }
    let delivered = writer.join().map_err(|_| anyhow!("writer thread panicked"))??;

    info!(
        files = n_files,
        flows = total.flows,
        decoded = total.decoded,
        empty = total.empty,
        unrouted = total.unrouted,
        failed = total.failed,
        delivered,
        interrupted = stop.load(Ordering::Relaxed),
        "replay finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> DecodedFeed {
        DecodedFeed {
            source: "bet365".into(),
            url: "https://x/matchmarketscontentapi/markets".into(),
            timestamp: "2025-03-27T23:10:00Z".into(),
            stat_type: Some("Steals".into()),
            players: Vec::new(),
            matches: Vec::new(),
        }
    }

    #[test]
    fn forward_reports_a_closed_writer() {
        let (tx, rx) = bounded::<DecodedFeed>(1);
        assert!(forward(&tx, feed()));
        assert_eq!(rx.recv().unwrap().stat_type.as_deref(), Some("Steals"));
        drop(rx);
        assert!(!forward(&tx, feed()));
    }
}
