//! Symmetric over/under line markets.
//!
//! Each match group declares its roster as name-only participant records,
//! then lists one market per side. Odds records in a market carry a line
//! (`HA`) and odds (`OD`) but no player id, so the n-th odds record belongs
//! to the n-th rostered player.
//!
//! ```text
//! MG;...|MA;NA=Player Steals;|PA;NA=Alice;|PA;NA=Bob;|MA;NA=Over;|PA;HA=1.5;OD=5/6;|PA;HA=0.5;OD=1/3;|MA;NA=Under;|...
//! ```
use tracing::{debug, trace};

use super::MarketStrategy;
use crate::classify::Topology;
use crate::feed::{FeedRecord, RecordTag};
use crate::model::{OddsPoint, PlayerBook, Side};

#[derive(Debug, Clone, Copy)]
struct MarketBlock {
    side: Side,
    /// Roster position of the next odds record.
    next: usize,
}

#[derive(Debug, Default)]
pub struct LineDecoder<'a> {
    roster: Vec<&'a str>,
    block: Option<MarketBlock>,
}

impl<'a> LineDecoder<'a> {
    fn odds(&mut self, record: &FeedRecord<'a>, book: &mut PlayerBook) {
        let Some(block) = self.block.as_mut() else {
            trace!(raw = record.raw, "odds outside market block");
            return;
        };
        let idx = block.next;
        block.next += 1;
        let Some(name) = self.roster.get(idx) else {
            trace!(idx, roster = self.roster.len(), "odds beyond roster");
            return;
        };
        if let (Some(line), Some(od)) = (record.non_empty("HA"), record.non_empty("OD")) {
            book.push(name, OddsPoint::new(line, od, block.side));
        }
    }
}

impl<'a> MarketStrategy<'a> for LineDecoder<'a> {
    const TOPOLOGY: Topology = Topology::Line;

    fn step(&mut self, record: &FeedRecord<'a>, book: &mut PlayerBook) {
        match record.tag {
            RecordTag::MatchGroup => {
                debug!(roster = self.roster.len(), "line match group");
                self.roster.clear();
                self.block = None;
            }
            RecordTag::Market => {
                // The side hint may sit in any field, so match on the whole record.
                let side = if record.raw.contains("Over") { Side::Over } else { Side::Under };
                self.block = Some(MarketBlock { side, next: 0 });
            }
            RecordTag::Participant => match (record.has("OD"), record.has("HA")) {
                (true, true) => self.odds(record, book),
                (false, false) => {
                    if let Some(name) = record.non_empty("NA") {
                        self.roster.push(name);
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::drive;
    use crate::feed::tokenize;
    use crate::model::ParsedPayload;

    fn run(payload: &str) -> ParsedPayload {
        drive(&tokenize(payload), LineDecoder::default()).into_payload(None)
    }

    #[test]
    fn pairs_odds_with_roster_by_position() {
        let p = run("MG;|MA;NA=Player Steals;|PA;NA=Alice;|PA;NA=Bob;|\
                     MA;NA=Over;|PA;HA=1.5;OD=5/6;|PA;HA=0.5;OD=1/3;|\
                     MA;NA=Under;|PA;HA=1.5;OD=10/11;|PA;HA=0.5;OD=9/4;");
        assert_eq!(p.players.len(), 2);
        let alice = p.player("Alice").unwrap();
        assert_eq!(alice.odds.len(), 2);
        assert_eq!((alice.odds[0].side, alice.odds[0].threshold.as_str()), (Side::Over, "1.5"));
        assert_eq!((alice.odds[1].side, alice.odds[1].fractional_odds.as_str()), (Side::Under, "10/11"));
        let bob = p.player("Bob").unwrap();
        assert_eq!(bob.odds[1].decimal_odds, Some(3.25));
    }

    #[test]
    fn missing_values_still_advance_the_index() {
        let p = run("PA;NA=Alice;|PA;NA=Bob;|MA;NA=Over;|PA;HA=;OD=1/2;|PA;HA=2.5;OD=1/2;");
        assert_eq!(p.players.len(), 1);
        assert_eq!(p.players[0].player_name, "Bob");
    }

    #[test]
    fn overflow_is_dropped() {
        let p = run("PA;NA=Alice;|MA;NA=Over;|PA;HA=1.5;OD=1/2;|PA;HA=2.5;OD=1/2;|PA;HA=3.5;OD=1/2;");
        assert_eq!(p.players.len(), 1);
        assert_eq!(p.players[0].odds.len(), 1);
    }

    #[test]
    fn match_group_resets_roster_and_block() {
        let p = run("PA;NA=Alice;|MA;NA=Over;|MG;|PA;HA=1.5;OD=1/2;|PA;NA=Bob;|MA;NA=Under;|PA;HA=1.5;OD=1/2;");
        assert_eq!(p.players.len(), 1);
        assert_eq!(p.players[0].player_name, "Bob");
        assert_eq!(p.players[0].odds[0].side, Side::Under);
    }

    #[test]
    fn roster_records_inside_a_block_still_register() {
        let p = run("MG;|MA;NA=Player Rebounds O/U;|PA;NA=Alice;|MA;NA=Over;|PA;HA=7.5;OD=4/5;");
        assert_eq!(p.player("Alice").unwrap().odds[0].side, Side::Over);
    }

    #[test]
    fn every_market_record_opens_a_block() {
        let p = run("PA;NA=Alice;|MA;ID=M1;SY=Over;|PA;HA=1.5;OD=1/2;|MA;ID=M2;|PA;HA=1.5;OD=6/4;");
        let alice = p.player("Alice").unwrap();
        assert_eq!(alice.odds.len(), 2);
        assert_eq!(alice.odds[0].side, Side::Over);
        assert_eq!(alice.odds[1].side, Side::Under);
    }

    #[test]
    fn partial_odds_records_are_ignored() {
        let p = run("PA;NA=Alice;|MA;NA=Over;|PA;OD=1/2;|PA;HA=1.5;OD=1/2;");
        assert_eq!(p.players[0].odds.len(), 1);
    }
}
