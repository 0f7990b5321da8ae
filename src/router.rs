//! Routing of captured flows to feed parsers.
//!
//! A [`ParserRegistry`] holds every parser; the first one whose
//! [`FeedParser::can_handle_url`] accepts a flow's URL processes it into a
//! [`DecodedFeed`], the decoded payload wrapped with where and when it was
//! captured.
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use crate::decode::FeedDecoder;
use crate::error::{PipelineError, Result};
use crate::model::{MatchInfo, ParsedPayload, PlayerOddsEntry};
use crate::record::CapturedFlow;

/// Path segment of the markets content API.
pub const DEFAULT_URL_PATTERN: &str = "matchmarketscontentapi/markets";
pub const DEFAULT_SOURCE: &str = "bet365";

/// What gets delivered downstream for one flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedFeed {
    pub source: String,
    pub url: String,
    /// Capture time, RFC 3339.
    pub timestamp: String,
    pub stat_type: Option<String>,
    pub players: Vec<PlayerOddsEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<MatchInfo>,
}

impl DecodedFeed {
    pub fn is_empty(&self) -> bool {
        self.stat_type.is_none() && self.players.is_empty()
    }
}

pub trait FeedParser: Send + Sync {
    fn source(&self) -> &str;
    fn can_handle_url(&self, url: &str) -> bool;
    fn process(&self, flow: &CapturedFlow) -> Result<DecodedFeed>;
}

/// Parser for the sportsbook markets content API.
#[derive(Debug, Clone)]
pub struct MarketsApiParser {
    source: String,
    url_pattern: String,
    decoder: FeedDecoder,
}

impl Default for MarketsApiParser {
    fn default() -> Self {
        MarketsApiParser::new(DEFAULT_SOURCE, DEFAULT_URL_PATTERN, FeedDecoder::default())
    }
}

impl MarketsApiParser {
    pub fn new(source: impl Into<String>, url_pattern: impl Into<String>, decoder: FeedDecoder) -> Self {
        MarketsApiParser { source: source.into(), url_pattern: url_pattern.into(), decoder }
    }
}

impl FeedParser for MarketsApiParser {
    fn source(&self) -> &str {
        &self.source
    }

    fn can_handle_url(&self, url: &str) -> bool {
        url.contains(&self.url_pattern)
    }

    fn process(&self, flow: &CapturedFlow) -> Result<DecodedFeed> {
        if flow.response_body.is_empty() {
            return Err(PipelineError::EmptyResponse { url: flow.url.clone() });
        }
        let ParsedPayload { stat, players, matches } = self.decoder.decode(&flow.response_body);
        Ok(DecodedFeed {
            source: self.source.clone(),
            url: flow.url.clone(),
            timestamp: format_capture_time(flow.captured_unix_ns),
            stat_type: stat,
            players,
            matches,
        })
    }
}

/// RFC 3339 rendering of a capture timestamp; falls back to the raw
/// nanosecond count if it is out of range.
pub fn format_capture_time(unix_ns: u128) -> String {
    i128::try_from(unix_ns)
        .ok()
        .and_then(|ns| OffsetDateTime::from_unix_timestamp_nanos(ns).ok())
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| unix_ns.to_string())
}

#[derive(Default)]
pub struct ParserRegistry {
    parsers: Vec<Box<dyn FeedParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, parser: impl FeedParser + 'static) {
        debug!(source = parser.source(), "registered parser");
        self.parsers.push(Box::new(parser));
    }

    pub fn parser_for_url(&self, url: &str) -> Option<&dyn FeedParser> {
        self.parsers.iter().find(|p| p.can_handle_url(url)).map(|p| p.as_ref())
    }

    pub fn process(&self, flow: &CapturedFlow) -> Result<DecodedFeed> {
        let parser = self
            .parser_for_url(&flow.url)
            .ok_or_else(|| PipelineError::NoParser { url: flow.url.clone() })?;
        parser.process(flow)
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}
