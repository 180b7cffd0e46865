//! Moment.js style date formatting.
//!
//! `datetime_format` accepts the format strings users know from moment.js (`YYYY-MM-DD`,
//! `dddd, MMMM Do`, ...). Patterns are tokenised once and then rendered against a zoned
//! date/time; tokens with a chrono equivalent delegate to chrono, the rest are computed here.
//!
//! Reference: https://momentjs.com/docs/#/displaying/format/

use std::fmt::{Display, Write};

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    combinator::value,
    multi::many0,
};

/// A token in a moment.js format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MomentToken {
    /// A literal string that should be passed through unchanged.
    Literal(String),
    YearFour,       // YYYY
    YearTwo,        // YY
    MonthPadded,    // MM
    MonthUnpadded,  // M
    MonthFull,      // MMMM
    MonthAbbrev,    // MMM
    DayPadded,      // DD
    DayUnpadded,    // D
    DayOrdinal,     // Do -> 1st, 2nd, ...
    WeekdayFull,    // dddd
    WeekdayAbbrev,  // ddd
    WeekdayMin,     // dd -> Mo, Tu, ...
    WeekdayNum,     // d -> 0-6, Sunday first
    Hour24Padded,   // HH
    Hour24Unpadded, // H
    Hour12Padded,   // hh
    Hour12Unpadded, // h
    MinutePadded,   // mm
    MinuteUnpadded, // m
    SecondPadded,   // ss
    SecondUnpadded, // s
    /// Fractional seconds with the given number of digits (S, SS, SSS).
    Fraction(u8),
    AmPmUpper,       // A
    AmPmLower,       // a
    TimezoneColon,   // Z -> +01:00
    TimezoneNoColon, // ZZ -> +0100
    TimezoneName,    // z or zz -> CET
    UnixSeconds,     // X
    UnixMillis,      // x
    DayOfYearPadded, // DDDD -> 001-366
    DayOfYear,       // DDD -> 1-366
    WeekOfYear,      // ww or WW
    Quarter,         // Q -> 1-4
}

impl MomentToken {
    /// The chrono specifier for this token, when chrono has one.
    pub fn chrono_specifier(&self) -> Option<&'static str> {
        let specifier = match self {
            MomentToken::YearFour => "%Y",
            MomentToken::YearTwo => "%y",
            MomentToken::MonthPadded => "%m",
            MomentToken::MonthUnpadded => "%-m",
            MomentToken::MonthFull => "%B",
            MomentToken::MonthAbbrev => "%b",
            MomentToken::DayPadded => "%d",
            MomentToken::DayUnpadded => "%-d",
            MomentToken::WeekdayFull => "%A",
            MomentToken::WeekdayAbbrev => "%a",
            MomentToken::WeekdayNum => "%w",
            MomentToken::Hour24Padded => "%H",
            MomentToken::Hour24Unpadded => "%-H",
            MomentToken::Hour12Padded => "%I",
            MomentToken::Hour12Unpadded => "%-I",
            MomentToken::MinutePadded => "%M",
            MomentToken::MinuteUnpadded => "%-M",
            MomentToken::SecondPadded => "%S",
            MomentToken::SecondUnpadded => "%-S",
            MomentToken::AmPmUpper => "%p",
            MomentToken::AmPmLower => "%P",
            MomentToken::TimezoneColon => "%:z",
            MomentToken::TimezoneNoColon => "%z",
            MomentToken::TimezoneName => "%Z",
            MomentToken::UnixSeconds => "%s",
            MomentToken::DayOfYearPadded => "%j",
            MomentToken::DayOfYear => "%-j",
            MomentToken::WeekOfYear => "%V",
            MomentToken::Literal(_)
            | MomentToken::DayOrdinal
            | MomentToken::WeekdayMin
            | MomentToken::Fraction(_)
            | MomentToken::UnixMillis
            | MomentToken::Quarter => return None,
        };
        Some(specifier)
    }
}

/// Parse a moment.js format string into tokens.
///
/// Every character is either part of a token or a literal, so tokenising cannot fail.
pub fn parse_moment_format(input: &str) -> Vec<MomentToken> {
    match many0(parse_token).parse(input) {
        Ok((_, tokens)) => tokens,
        Err(_) => vec![MomentToken::Literal(input.to_string())],
    }
}

/// Render `datetime` according to a moment.js format string.
pub fn format_datetime<Tz>(datetime: &DateTime<Tz>, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();

    for token in parse_moment_format(pattern) {
        if let Some(specifier) = token.chrono_specifier() {
            // Writing into a String cannot fail
            let _ = write!(out, "{}", datetime.format(specifier));
            continue;
        }

        match token {
            MomentToken::Literal(text) => out.push_str(&text),
            MomentToken::DayOrdinal => {
                let day = datetime.day();
                let _ = write!(out, "{day}{}", ordinal_suffix(day));
            }
            MomentToken::WeekdayMin => {
                let name = datetime.weekday().to_string();
                out.extend(name.chars().take(2));
            }
            MomentToken::Fraction(digits) => {
                let divisor = 10u32.pow(9 - u32::from(digits));
                let fraction = datetime.nanosecond() % 1_000_000_000 / divisor;
                let _ = write!(out, "{fraction:0width$}", width = usize::from(digits));
            }
            MomentToken::UnixMillis => {
                let _ = write!(out, "{}", datetime.timestamp_millis());
            }
            MomentToken::Quarter => {
                let _ = write!(out, "{}", datetime.month0() / 3 + 1);
            }
            _ => {}
        }
    }

    out
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

// Parser combinators for each token type.
// Order matters: longer tokens must be tried before shorter ones.

fn parse_token(input: &str) -> IResult<&str, MomentToken> {
    alt((
        parse_year_tokens,
        parse_month_tokens,
        parse_day_tokens,
        parse_weekday_tokens,
        parse_hour_tokens,
        parse_minute_second_tokens,
        parse_other_tokens,
        parse_escaped,
        parse_literal,
    ))
    .parse(input)
}

fn parse_year_tokens(input: &str) -> IResult<&str, MomentToken> {
    alt((
        value(MomentToken::YearFour, tag("YYYY")),
        value(MomentToken::YearTwo, tag("YY")),
    ))
    .parse(input)
}

fn parse_month_tokens(input: &str) -> IResult<&str, MomentToken> {
    alt((
        value(MomentToken::MonthFull, tag("MMMM")),
        value(MomentToken::MonthAbbrev, tag("MMM")),
        value(MomentToken::MonthPadded, tag("MM")),
        value(MomentToken::MonthUnpadded, tag("M")),
    ))
    .parse(input)
}

fn parse_day_tokens(input: &str) -> IResult<&str, MomentToken> {
    alt((
        value(MomentToken::DayOfYearPadded, tag("DDDD")),
        value(MomentToken::DayOfYear, tag("DDD")),
        value(MomentToken::DayPadded, tag("DD")),
        value(MomentToken::DayOrdinal, tag("Do")),
        value(MomentToken::DayUnpadded, tag("D")),
    ))
    .parse(input)
}

fn parse_weekday_tokens(input: &str) -> IResult<&str, MomentToken> {
    alt((
        value(MomentToken::WeekdayFull, tag("dddd")),
        value(MomentToken::WeekdayAbbrev, tag("ddd")),
        value(MomentToken::WeekdayMin, tag("dd")),
        value(MomentToken::WeekdayNum, tag("d")),
    ))
    .parse(input)
}

fn parse_hour_tokens(input: &str) -> IResult<&str, MomentToken> {
    alt((
        value(MomentToken::Hour24Padded, tag("HH")),
        value(MomentToken::Hour24Unpadded, tag("H")),
        value(MomentToken::Hour12Padded, tag("hh")),
        value(MomentToken::Hour12Unpadded, tag("h")),
    ))
    .parse(input)
}

fn parse_minute_second_tokens(input: &str) -> IResult<&str, MomentToken> {
    alt((
        value(MomentToken::Fraction(3), tag("SSS")),
        value(MomentToken::Fraction(2), tag("SS")),
        value(MomentToken::Fraction(1), tag("S")),
        value(MomentToken::SecondPadded, tag("ss")),
        value(MomentToken::SecondUnpadded, tag("s")),
        value(MomentToken::MinutePadded, tag("mm")),
        value(MomentToken::MinuteUnpadded, tag("m")),
    ))
    .parse(input)
}

fn parse_other_tokens(input: &str) -> IResult<&str, MomentToken> {
    alt((
        value(MomentToken::AmPmUpper, tag("A")),
        value(MomentToken::AmPmLower, tag("a")),
        value(MomentToken::TimezoneNoColon, tag("ZZ")),
        value(MomentToken::TimezoneColon, tag("Z")),
        value(MomentToken::TimezoneName, tag("zz")),
        value(MomentToken::TimezoneName, tag("z")),
        value(MomentToken::UnixSeconds, tag("X")),
        value(MomentToken::UnixMillis, tag("x")),
        value(MomentToken::WeekOfYear, tag("ww")),
        value(MomentToken::WeekOfYear, tag("WW")),
        value(MomentToken::Quarter, tag("Q")),
    ))
    .parse(input)
}

/// Parse escaped text within square brackets [literal text].
fn parse_escaped(input: &str) -> IResult<&str, MomentToken> {
    let (input, _) = tag("[").parse(input)?;
    let (input, content) = take_while1(|c| c != ']').parse(input)?;
    let (input, _) = tag("]").parse(input)?;
    Ok((input, MomentToken::Literal(content.to_string())))
}

/// Parse a literal character that isn't a format specifier.
fn parse_literal(input: &str) -> IResult<&str, MomentToken> {
    let (rest, c) = nom::character::complete::anychar.parse(input)?;
    Ok((rest, MomentToken::Literal(c.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{NaiveDate, Utc};
    use chrono_tz::Tz;

    fn sample() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2025, 11, 3)
            .and_then(|d| d.and_hms_milli_opt(14, 5, 9, 861))
            .unwrap()
            .and_utc()
    }

    #[test]
    fn format_date() {
        assert_eq!(format_datetime(&sample(), "YYYY-MM-DD"), "2025-11-03");
        assert_eq!(format_datetime(&sample(), "YY/MM/DD"), "25/11/03");
    }

    #[test]
    fn format_time_with_milliseconds() {
        assert_eq!(format_datetime(&sample(), "HH:mm:ss.SSS"), "14:05:09.861");
        assert_eq!(format_datetime(&sample(), "h:mm a"), "2:05 pm");
    }

    #[test]
    fn format_names_and_ordinals() {
        assert_eq!(
            format_datetime(&sample(), "dddd, MMMM Do"),
            "Monday, November 3rd"
        );
        assert_eq!(format_datetime(&sample(), "dd Q"), "Mo 4");
    }

    #[test]
    fn format_with_escaped_text() {
        assert_eq!(
            format_datetime(&sample(), "[Date: ]YYYY-MM-DD"),
            "Date: 2025-11-03"
        );
    }

    #[test]
    fn format_in_other_timezone() {
        let tz: Tz = "Europe/Amsterdam".parse().unwrap();
        let zoned = sample().with_timezone(&tz);
        assert_eq!(format_datetime(&zoned, "HH:mm Z"), "15:05 +01:00");
    }

    #[test]
    fn ordinal_suffixes() {
        assert_eq!(ordinal_suffix(1), "st");
        assert_eq!(ordinal_suffix(12), "th");
        assert_eq!(ordinal_suffix(22), "nd");
        assert_eq!(ordinal_suffix(23), "rd");
    }
}
