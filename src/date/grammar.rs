//! Per-site date grammars
//!
//! A grammar says how many raw tokens a site renders for a kickoff time,
//! which token carries the date and which the time of day, and how the date
//! token is laid out.

/// Localized month-name lookup, keyed by abbreviation
///
/// Lookups compare case-insensitively against the leading characters of the
/// word, so both `Окт` and `Октября` resolve to October.
#[derive(Debug)]
pub struct MonthTable {
    entries: &'static [(&'static str, u32)],
}

impl MonthTable {
    pub const fn new(entries: &'static [(&'static str, u32)]) -> Self {
        Self { entries }
    }

    /// Returns the month number (1-12) for a localized month word
    pub fn lookup(&self, word: &str) -> Option<u32> {
        let word = word.trim().to_lowercase();

        self.entries.iter().find_map(|(abbrev, month)| {
            let abbrev = abbrev.to_lowercase();
            let prefix: String = word.chars().take(abbrev.chars().count()).collect();
            (prefix == abbrev).then_some(*month)
        })
    }
}

/// Layout of the date portion of a kickoff string
#[derive(Debug, Clone, Copy)]
pub enum DateLayout {
    /// `12 Окт 2024`: day, localized month abbreviation, year
    DayMonthName(&'static MonthTable),

    /// `11/05` or `11/05/2024`: month, day and optional year, with the time
    /// token as `18:30`. A non-numeric leading field is a relative day word,
    /// in which case the time token is space separated (`19 ч 30 мин`).
    MonthDay,

    /// `Today`, `Tomorrow` or `05 11 2024` (day, month, year); numeric dates
    /// are built with the shifted calendar offsets
    RelativeOrDayMonthYear,

    /// `5.11.2024, 18:00 UTC`: date and time share one token; the zone
    /// abbreviation is ignored and the time read as UTC
    DottedWithTime,
}

/// Token layout for one site's kickoff times
#[derive(Debug, Clone, Copy)]
pub struct DateGrammar {
    /// Site the grammar belongs to, for diagnostics
    pub site: &'static str,

    /// Number of tokens the site renders
    pub tokens: usize,

    /// Index of the token holding the date
    pub date_at: usize,

    /// Index of the token holding the time of day
    pub time_at: usize,

    pub layout: DateLayout,
}

/// Relative day words and their offset from today
const RELATIVE_DAYS: &[(&str, i64)] = &[
    ("today", 0),
    ("сегодня", 0),
    ("tomorrow", 1),
    ("завтра", 1),
];

/// Resolves a relative day word to a day offset from today
pub fn relative_day(word: &str) -> Option<i64> {
    let word = word.trim().to_lowercase();
    RELATIVE_DAYS
        .iter()
        .find(|(keyword, _)| *keyword == word)
        .map(|(_, offset)| *offset)
}
