//! Threshold-ladder markets (points, rebounds, assists, threes made).
//!
//! Layout per match group:
//!
//! ```text
//! MG;...|PA;ID=PC411423913;NA=Johnny Juzang;...|CO;NA=2;|PA;ID=411423913;FI=171969260;OD=27/10;|CO;NA=3;|...
//! ```
//!
//! Roster records carry `ID=PC<id>`; odds records repeat `<id>` without the
//! prefix, so correlation is an identifier lookup. Ladders only quote the
//! over leg.
use std::collections::HashMap;

use tracing::{debug, trace};

use super::MarketStrategy;
use crate::classify::Topology;
use crate::feed::{FeedRecord, RecordTag};
use crate::model::{OddsPoint, PlayerBook, Side};

/// Prefix on roster identifiers that odds records omit.
pub const ROSTER_ID_PREFIX: &str = "PC";

#[derive(Debug, Default)]
pub struct LadderDecoder<'a> {
    /// short id -> display name. Survives match-group boundaries.
    identities: HashMap<&'a str, &'a str>,
    /// Roster of the current match group, in declaration order.
    match_order: Vec<&'a str>,
    /// Threshold of the open column block, `None` outside a block.
    threshold: Option<&'a str>,
}

impl<'a> LadderDecoder<'a> {
    fn register(&mut self, short_id: &'a str, name: &'a str) {
        self.identities.insert(short_id, name);
        self.match_order.push(short_id);
    }

    fn odds(&self, record: &FeedRecord<'a>, book: &mut PlayerBook) {
        let Some(threshold) = self.threshold else {
            trace!(raw = record.raw, "odds outside column block");
            return;
        };
        let (Some(id), Some(od)) = (record.non_empty("ID"), record.non_empty("OD")) else {
            return;
        };
        let Some(name) = self.identities.get(id) else {
            trace!(id, "odds for unknown player id");
            return;
        };
        if threshold.is_empty() {
            trace!(id, "column without threshold");
            return;
        }
        book.push(name, OddsPoint::new(threshold, od, Side::Over));
    }
}

impl<'a> MarketStrategy<'a> for LadderDecoder<'a> {
    const TOPOLOGY: Topology = Topology::Ladder;

    fn step(&mut self, record: &FeedRecord<'a>, book: &mut PlayerBook) {
        match record.tag {
            RecordTag::MatchGroup => {
                debug!(roster = self.match_order.len(), known = self.identities.len(), "ladder match group");
                self.match_order.clear();
                self.threshold = None;
            }
            RecordTag::Column => {
                self.threshold = Some(record.get("NA").unwrap_or_default());
            }
            RecordTag::Participant => {
                let roster = record.get("ID").and_then(|id| id.strip_prefix(ROSTER_ID_PREFIX));
                match (roster, record.non_empty("NA")) {
                    (Some(short_id), Some(name)) if !short_id.is_empty() => self.register(short_id, name),
                    (Some(_), _) => {}
                    (None, _) => self.odds(record, book),
                }
            }
            _ => {}
        }
    }
}
