//! Match metadata carried alongside the odds.
//!
//! `EV` records name the event (`ID`, `TB`) and every named `MG` that follows
//! is one match: teams (`NA`), kickoff (`BC`) and league (`L3`). This pass is
//! independent of the market topology.
use crate::feed::{FeedRecord, RecordTag};
use crate::model::MatchInfo;
use crate::odds::parse_feed_date;

#[derive(Debug, Default, Clone, Copy)]
struct Event<'a> {
    id: Option<&'a str>,
    category: Option<&'a str>,
}

pub fn collect_matches(records: &[FeedRecord<'_>]) -> Vec<MatchInfo> {
    let mut event = Event::default();
    let mut matches = Vec::new();
    for record in records {
        match record.tag {
            RecordTag::Event => {
                event = Event {
                    id: record.non_empty("ID"),
                    category: record.non_empty("TB").and_then(|tb| tb.split(',').next()),
                };
            }
            RecordTag::MatchGroup => {
                let Some(teams) = record.non_empty("NA") else { continue };
                matches.push(MatchInfo {
                    event_id: event.id.map(str::to_owned),
                    category: event.category.map(str::to_owned),
                    teams: teams.to_owned(),
                    start_time: record.non_empty("BC").map(parse_feed_date),
                    league: record.non_empty("L3").map(str::to_owned),
                });
            }
            _ => {}
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::tokenize;

    #[test]
    fn match_groups_inherit_the_open_event() {
        let recs = tokenize(
            "EV;ID=E1;TB=18#Basketball,¬NBA;|MG;ID=G1;NA=DAL Mavericks @ ORL Magic;BC=20250327231000;L3=NBA;|\
             MG;NA=Second game;BC=soon;|EV;ID=E2;|MG;NA=Third;",
        );
        let m = collect_matches(&recs);
        assert_eq!(m.len(), 3);
        assert_eq!(m[0].event_id.as_deref(), Some("E1"));
        assert_eq!(m[0].category.as_deref(), Some("18#Basketball"));
        assert_eq!(m[0].teams, "DAL Mavericks @ ORL Magic");
        assert_eq!(m[0].start_time.as_deref(), Some("2025-03-27 23:10:00"));
        assert_eq!(m[0].league.as_deref(), Some("NBA"));
        assert_eq!(m[1].start_time.as_deref(), Some("soon"));
        assert_eq!(m[1].league, None);
        assert_eq!((m[2].event_id.as_deref(), m[2].category.as_deref()), (Some("E2"), None));
    }

    #[test]
    fn unnamed_match_groups_are_skipped() {
        assert!(collect_matches(&tokenize("MG;|MG;NA=;BC=20250327231000;|PA;NA=Alice;")).is_empty());
    }
}
