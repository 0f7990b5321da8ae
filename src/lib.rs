//! Sportsbook player-prop feed decoder.
//!
//! This crate reconstructs per-player odds from the flat, `|`/`;`-delimited
//! markets feed and provides the glue used by the `prop_feed` replay binary
//! and the `ingest` capture tool:
//!
//! - `feed`: record tokenizer
//! - `odds`: fractional odds and feed date codecs
//! - `classify`: selected-stat detection and the stat → topology table
//! - `decode`: ladder (id-correlated) and line (position-correlated) decoders
//! - `model`: decoded players and odds points
//! - `record`: framed, CRC-checked capture files of HTTP flows
//! - `router`: URL-based parser registry wrapping decoded payloads with metadata
//! - `sink`: JSON lines and HTTP delivery
//! - `pipeline`: capture replay through the registry
pub mod classify;
pub mod decode;
pub mod error;
pub mod feed;
pub mod logging;
pub mod model;
pub mod odds;
pub mod pipeline;
pub mod record;
pub mod router;
pub mod sink;

pub use decode::{FeedDecoder, decode};
pub use model::{MatchInfo, OddsPoint, ParsedPayload, PlayerOddsEntry, Side};
