//! Payload decoding: tokenize, classify, then run exactly one topology.
//!
//! Both topologies are [`MarketStrategy`] implementations fed one record at a
//! time by [`drive`]. All correlation state (identity map, roster order, open
//! block) lives in the strategy value, which is created fresh for every
//! payload and dropped when the payload is decoded.
use tracing::{debug, trace};

use crate::classify::{StatTable, Topology, default_table, selected_stat};
use crate::feed::{FeedRecord, tokenize};
use crate::model::{ParsedPayload, PlayerBook};

mod ladder;
mod line;
mod matches;

pub use ladder::LadderDecoder;
pub use line::LineDecoder;
pub use matches::collect_matches;

/// Per-record state machine for one topology.
pub trait MarketStrategy<'a> {
    const TOPOLOGY: Topology;

    /// Consume one record. Records the strategy does not understand are
    /// ignored; this never fails.
    fn step(&mut self, record: &FeedRecord<'a>, book: &mut PlayerBook);
}

/// Run `strategy` over every record in order.
pub fn drive<'a, S: MarketStrategy<'a>>(records: &[FeedRecord<'a>], mut strategy: S) -> PlayerBook {
    trace!(topology = ?S::TOPOLOGY, records = records.len(), "driving records");
    let mut book = PlayerBook::default();
    for record in records {
        strategy.step(record, &mut book);
    }
    book
}

/// Decoder bound to a stat-family table.
#[derive(Debug, Clone)]
pub struct FeedDecoder {
    table: StatTable,
}

impl Default for FeedDecoder {
    fn default() -> Self {
        FeedDecoder { table: default_table().clone() }
    }
}

impl FeedDecoder {
    pub fn new(table: StatTable) -> Self {
        FeedDecoder { table }
    }

    pub fn table(&self) -> &StatTable {
        &self.table
    }

    pub fn decode(&self, payload: &str) -> ParsedPayload {
        decode_with(&self.table, payload)
    }
}

/// Decode with the default stat table.
pub fn decode(payload: &str) -> ParsedPayload {
    decode_with(default_table(), payload)
}

pub fn decode_with(table: &StatTable, payload: &str) -> ParsedPayload {
    let records = tokenize(payload);
    let stat = selected_stat(&records);
    let topology = table.topology(stat);
    let book = match topology {
        Topology::Ladder => drive(&records, LadderDecoder::default()),
        Topology::Line => drive(&records, LineDecoder::default()),
    };
    debug!(stat = stat.unwrap_or("-"), ?topology, records = records.len(), players = book.len(), "decoded payload");
    let mut payload = book.into_payload(stat.map(str::to_owned));
    payload.matches = collect_matches(&records);
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Side;

    const LADDER: &str = "MA;NA=More;LS=1;|MA;NA=Points;LS=1;|MG;NA=A @ B;|PA;ID=PC100;NA=Alice;|PA;ID=PC200;NA=Bob;|\
                          CO;NA=10;|PA;ID=100;OD=1/2;|PA;ID=200;OD=1/4;|";

    #[test]
    fn dispatches_ladder_families() {
        let p = decode(LADDER);
        assert_eq!(p.stat.as_deref(), Some("Points"));
        assert_eq!(p.players.len(), 2);
        assert_eq!(p.players[0].odds[0].side, Side::Over);
        assert_eq!(p.matches.len(), 1);
        assert_eq!(p.matches[0].teams, "A @ B");
    }

    #[test]
    fn same_payload_under_line_table_finds_nothing() {
        // Without a ladder entry for "Points" the ids are never consulted.
        let p = FeedDecoder::new(StatTable::default()).decode(LADDER);
        assert_eq!(p.stat.as_deref(), Some("Points"));
        assert!(p.players.is_empty());
    }

    #[test]
    fn decoding_is_repeatable() {
        let d = FeedDecoder::default();
        assert_eq!(d.decode(LADDER), d.decode(LADDER));
        assert_eq!(d.table().topology(Some("Points")), Topology::Ladder);
    }
}
