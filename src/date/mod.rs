//! Kickoff date normalization
//!
//! Bookmakers render kickoff times as a couple of loosely formatted text
//! fragments, each in its own layout. [`normalize`] turns those fragments into
//! an absolute UTC timestamp using the site's [`DateGrammar`].
//!
//! Failures come in two strengths:
//! - a malformed hour or minute is a hard [`DateParseError`], since a match
//!   without a kickoff time is useless;
//! - anything else (wrong token count, missing or unreadable date fields) falls
//!   back to the current time and is logged with `fallback = true`.

pub mod calendar;
mod grammar;

pub use grammar::{relative_day, DateGrammar, DateLayout, MonthTable};

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

/// Hard failures while reading a kickoff time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("invalid {field} `{value}` in {site} kickoff time")]
    InvalidTime {
        site: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{site} kickoff time `{value}` is out of range")]
    OutOfRange { site: &'static str, value: String },
}

/// Why a token sequence could not be resolved
enum Failure {
    /// Degrade to the current time
    Soft(String),
    /// Abort the extraction
    Hard(DateParseError),
}

/// Normalizes kickoff tokens against the current wall-clock time
pub fn normalize<S: AsRef<str>>(
    tokens: &[S],
    grammar: &DateGrammar,
) -> Result<DateTime<Utc>, DateParseError> {
    normalize_at(tokens, grammar, Utc::now())
}

/// Normalizes kickoff tokens, resolving relative days and fallbacks against `now`
pub fn normalize_at<S: AsRef<str>>(
    tokens: &[S],
    grammar: &DateGrammar,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, DateParseError> {
    let tokens: Vec<&str> = tokens.iter().map(|t| t.as_ref().trim()).collect();

    let resolved = if tokens.len() != grammar.tokens {
        Err(Failure::Soft(format!(
            "got {} date tokens, expected {}",
            tokens.len(),
            grammar.tokens
        )))
    } else {
        resolve(&tokens, grammar, now)
    };

    match resolved {
        Ok(timestamp) => Ok(timestamp),
        Err(Failure::Hard(err)) => Err(err),
        Err(Failure::Soft(reason)) => {
            tracing::warn!(
                site = grammar.site,
                tokens = ?tokens,
                fallback = true,
                reason = %reason,
                "Unreadable kickoff date, using current time"
            );
            Ok(now)
        }
    }
}

fn resolve(
    tokens: &[&str],
    grammar: &DateGrammar,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, Failure> {
    let site = grammar.site;
    let date_token = token(tokens, grammar.date_at)?;
    let time_token = token(tokens, grammar.time_at)?;

    match grammar.layout {
        DateLayout::DayMonthName(months) => {
            let clock = colon_clock(site, time_token)?;

            let fields: Vec<&str> = date_token.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(soft(format!("date `{}` needs day, month and year", date_token)));
            }
            let day = date_field(fields[0], "day")?;
            let month = months
                .lookup(fields[1])
                .ok_or_else(|| soft(format!("unknown month `{}`", fields[1])))?;
            let year = date_field(fields[2], "year")?;

            let date = calendar::absolute(year, i64::from(month), day)
                .ok_or_else(|| soft(format!("date `{}` is out of range", date_token)))?;
            at(site, date, clock, time_token)
        }

        DateLayout::MonthDay => {
            let fields: Vec<&str> = date_token.split('/').map(str::trim).collect();

            if fields[0].parse::<i64>().is_err() {
                let clock = spaced_clock(site, time_token)?;
                let offset = relative_day(fields[0]).unwrap_or_else(|| {
                    tracing::debug!(site, word = fields[0], "Unknown day word, assuming today");
                    0
                });
                let date = days_from(now.date_naive(), offset)?;
                return at(site, date, clock, time_token);
            }

            let clock = colon_clock(site, time_token)?;
            if fields.len() < 2 {
                return Err(soft(format!("date `{}` needs month and day", date_token)));
            }
            let month = date_field(fields[0], "month")?;
            let day = date_field(fields[1], "day")?;
            let year = match fields.get(2) {
                Some(year) => date_field(year, "year")?,
                None => i64::from(now.year()),
            };

            let date = calendar::absolute(year, month, day)
                .ok_or_else(|| soft(format!("date `{}` is out of range", date_token)))?;
            at(site, date, clock, time_token)
        }

        DateLayout::RelativeOrDayMonthYear => {
            let clock = colon_clock(site, time_token)?;

            let fields: Vec<&str> = date_token.split_whitespace().collect();
            let date = match fields.first().and_then(|word| relative_day(word)) {
                Some(offset) => days_from(now.date_naive(), offset)?,
                None => {
                    if fields.len() < 3 {
                        return Err(soft(format!(
                            "date `{}` needs day, month and year",
                            date_token
                        )));
                    }
                    let day = date_field(fields[0], "day")?;
                    let month = date_field(fields[1], "month")?;
                    let year = date_field(fields[2], "year")?;

                    calendar::shifted(year, month, day)
                        .ok_or_else(|| soft(format!("date `{}` is out of range", date_token)))?
                }
            };
            at(site, date, clock, time_token)
        }

        DateLayout::DottedWithTime => {
            let (date_part, rest) = date_token
                .split_once(',')
                .ok_or_else(|| soft(format!("`{}` has no date/time separator", date_token)))?;
            let time_part = rest.split_whitespace().next().unwrap_or("");
            let clock = colon_clock(site, time_part)?;

            let fields: Vec<&str> = date_part.trim().split('.').collect();
            if fields.len() != 3 {
                return Err(soft(format!("date `{}` needs day.month.year", date_part)));
            }
            let day = date_field(fields[0], "day")?;
            let month = date_field(fields[1], "month")?;
            let year = date_field(fields[2], "year")?;

            let date = i32::try_from(year)
                .ok()
                .zip(u32::try_from(month).ok())
                .zip(u32::try_from(day).ok())
                .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
                .ok_or_else(|| soft(format!("`{}` is not a calendar date", date_part)))?;
            at(site, date, clock, time_part)
        }
    }
}

/// Hour and minute offsets from midnight; not range checked, so `25:00`
/// rolls into the next day
struct Clock {
    hours: i64,
    minutes: i64,
}

fn soft(reason: String) -> Failure {
    Failure::Soft(reason)
}

fn token<'a>(tokens: &[&'a str], index: usize) -> Result<&'a str, Failure> {
    tokens
        .get(index)
        .copied()
        .ok_or_else(|| soft(format!("no date token at position {}", index)))
}

fn date_field(value: &str, field: &str) -> Result<i64, Failure> {
    value
        .trim()
        .parse()
        .map_err(|_| soft(format!("invalid {} `{}`", field, value)))
}

fn time_field(site: &'static str, value: &str, field: &'static str) -> Result<i64, Failure> {
    value.trim().parse().map_err(|_| {
        Failure::Hard(DateParseError::InvalidTime {
            site,
            field,
            value: value.to_string(),
        })
    })
}

/// Reads `HH:MM`
fn colon_clock(site: &'static str, token: &str) -> Result<Clock, Failure> {
    let parts: Vec<&str> = token.split(':').collect();
    if parts.len() < 2 {
        return Err(soft(format!("time `{}` has no minutes", token)));
    }

    Ok(Clock {
        hours: time_field(site, parts[0], "hours")?,
        minutes: time_field(site, parts[1], "minutes")?,
    })
}

/// Reads `HH <unit> MM <unit>`, e.g. `19 ч 30 мин`
fn spaced_clock(site: &'static str, token: &str) -> Result<Clock, Failure> {
    let parts: Vec<&str> = token.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(soft(format!(
            "time `{}` has {} parts, expected 4",
            token,
            parts.len()
        )));
    }

    Ok(Clock {
        hours: time_field(site, parts[0], "hours")?,
        minutes: time_field(site, parts[2], "minutes")?,
    })
}

fn days_from(date: NaiveDate, offset: i64) -> Result<NaiveDate, Failure> {
    Duration::try_days(offset)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| soft(format!("cannot move {} by {} days", date, offset)))
}

fn at(
    site: &'static str,
    date: NaiveDate,
    clock: Clock,
    raw: &str,
) -> Result<DateTime<Utc>, Failure> {
    let out_of_range = || {
        Failure::Hard(DateParseError::OutOfRange {
            site,
            value: raw.to_string(),
        })
    };

    let minutes = clock
        .hours
        .checked_mul(60)
        .and_then(|m| m.checked_add(clock.minutes))
        .ok_or_else(out_of_range)?;

    Duration::try_minutes(minutes)
        .and_then(|delta| date.and_time(NaiveTime::MIN).checked_add_signed(delta))
        .map(|naive| naive.and_utc())
        .ok_or_else(out_of_range)
}
