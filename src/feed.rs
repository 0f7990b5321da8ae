//! Record tokenizer for the markets feed.
//!
//! A payload is a flat string of records separated by `|`. Each record is a
//! `;`-separated list whose first element is a short type tag (`MG`, `MA`,
//! `CO`, `PA`, `EV`, ...) and whose remaining elements are `KEY=VALUE` pairs:
//!
//! ```text
//! MG;NA=DAL Mavericks @ ORL Magic;BC=20250327231000;|CO;ID=C181449;NA=2;|PA;ID=411340637;OD=27/10;|
//! ```
//!
//! Tokenizing never fails. Elements without `=` are ignored and empty records
//! (e.g. from a trailing `|`) are skipped.

/// Separator between records.
pub const RECORD_DELIM: char = '|';
/// Separator between fields inside one record.
pub const FIELD_DELIM: char = ';';

/// Type tag of a record, the first `;`-delimited element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTag<'a> {
    /// `MG`: start of a new match group.
    MatchGroup,
    /// `MA`: market header, carries the side hint in line markets.
    Market,
    /// `CO`: column header, carries the threshold in ladder markets.
    Column,
    /// `PA`: participant; a roster player or an odds line.
    Participant,
    /// `EV`: event.
    Event,
    /// Anything else (`F`, `CL`, ...). Kept so positional scans still see it.
    Unknown(&'a str),
}

impl<'a> RecordTag<'a> {
    pub fn parse(tag: &'a str) -> Self {
        match tag {
            "MG" => RecordTag::MatchGroup,
            "MA" => RecordTag::Market,
            "CO" => RecordTag::Column,
            "PA" => RecordTag::Participant,
            "EV" => RecordTag::Event,
            other => RecordTag::Unknown(other),
        }
    }
}

/// One tokenized record. Borrows from the payload it was cut from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRecord<'a> {
    pub tag: RecordTag<'a>,
    /// The untouched record text, used for positional lookups.
    pub raw: &'a str,
    fields: Vec<(&'a str, &'a str)>,
}

impl<'a> FeedRecord<'a> {
    /// Tokenize a single raw record (no `|` expected inside).
    pub fn parse(raw: &'a str) -> Self {
        let mut parts = raw.split(FIELD_DELIM);
        let tag = RecordTag::parse(parts.next().unwrap_or_default());
        let mut fields: Vec<(&'a str, &'a str)> = Vec::new();
        for part in parts {
            let Some((key, value)) = part.split_once('=') else { continue };
            match fields.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => fields.push((key, value)),
            }
        }
        FeedRecord { tag, raw, fields }
    }

    /// Value of `key`; `Some("")` when present but empty.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Value of `key`, treating present-but-empty as absent.
    pub fn non_empty(&self, key: &str) -> Option<&'a str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Value of the second `;`-delimited element of the raw record, read
    /// positionally regardless of its key (text between the first and second
    /// `=`). This is how the feed exposes a record's display name.
    pub fn positional_name(&self) -> Option<&'a str> {
        self.raw.split(FIELD_DELIM).nth(1)?.split('=').nth(1)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.fields.iter().copied()
    }
}

/// Split a payload into its ordered records.
pub fn tokenize(payload: &str) -> Vec<FeedRecord<'_>> {
    payload
        .split(RECORD_DELIM)
        .filter(|raw| !raw.is_empty())
        .map(FeedRecord::parse)
        .collect()
}
