use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};

use crate::error::ErrorAccumulator;

/// Wall-clock rendering of one instant. Every field is `""` when the instant is unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MomentParts {
    pub date: String,
    pub time: String,
    pub date_time: String,
    pub iso: String,
}

impl MomentParts {
    fn render<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let date = instant.format("%Y-%m-%d").to_string();
        let time = instant.format("%H:%M:%S").to_string();
        Self {
            date_time: format!("{date} {time}"),
            date,
            time,
            iso: instant
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Start, end and elapsed seconds of a game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameTimes {
    pub start: MomentParts,
    pub end: MomentParts,
    pub duration: String,
}

/// Inputs of [`reconcile`], borrowed from the raw game and its annotation headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeSources<'a> {
    pub start_epoch: Option<i64>,
    pub end_epoch: Option<i64>,
    /// `YYYY.MM.DD` from the `UTCDate` tag.
    pub header_date: Option<&'a str>,
    /// `HH:MM:SS` from the `UTCTime` tag.
    pub header_time: Option<&'a str>,
}

/// Resolves start/end instants in `tz`.
///
/// The end comes only from the epoch timestamp. The start prefers the epoch timestamp and
/// falls back to the header date/time, read as calendar fields already in `tz`.
pub fn reconcile<Tz: TimeZone>(
    sources: &TimeSources<'_>,
    tz: &Tz,
    notes: &mut ErrorAccumulator,
) -> GameTimes
where
    Tz::Offset: std::fmt::Display,
{
    let end = sources
        .end_epoch
        .and_then(|secs| from_epoch(secs, "end_time", tz, notes));

    let start = match sources.start_epoch {
        Some(secs) => from_epoch(secs, "start_time", tz, notes),
        None => match (sources.header_date, sources.header_time) {
            (Some(date), Some(time)) if !date.is_empty() && !time.is_empty() => {
                from_header(date, time, tz, notes)
            }
            _ => None,
        },
    };

    let duration = match (&start, &end) {
        (Some(start), Some(end)) => (end.timestamp() - start.timestamp()).max(0).to_string(),
        _ => String::new(),
    };

    GameTimes {
        start: start.as_ref().map(MomentParts::render).unwrap_or_default(),
        end: end.as_ref().map(MomentParts::render).unwrap_or_default(),
        duration,
    }
}

fn from_epoch<Tz: TimeZone>(
    secs: i64,
    label: &str,
    tz: &Tz,
    notes: &mut ErrorAccumulator,
) -> Option<DateTime<Tz>> {
    match DateTime::from_timestamp(secs, 0) {
        Some(utc) => Some(utc.with_timezone(tz)),
        None => {
            notes.push(&format!("Conversion error: {label}={secs} (out of range)"));
            None
        }
    }
}

fn from_header<Tz: TimeZone>(
    date: &str,
    time: &str,
    tz: &Tz,
    notes: &mut ErrorAccumulator,
) -> Option<DateTime<Tz>> {
    let Some(naive) = parse_header_datetime(date, time) else {
        notes.push(&format!(
            "Conversion error: UTCDate='{date}' UTCTime='{time}'"
        ));
        return None;
    };

    let local = tz.from_local_datetime(&naive).earliest();
    if local.is_none() {
        notes.push(&format!(
            "Conversion error: UTCDate='{date}' UTCTime='{time}' (no such local time)"
        ));
    }
    local
}

/// `YYYY.MM.DD` + `HH:MM:SS`. Missing or unreadable time components count as zero;
/// the date must be complete and valid.
fn parse_header_datetime(date: &str, time: &str) -> Option<NaiveDateTime> {
    let mut ymd = date.trim().split('.');
    let year = ymd.next()?.parse::<i32>().ok()?;
    let month = ymd.next()?.parse::<u32>().ok()?;
    let day = ymd.next()?.parse::<u32>().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let mut hms = time
        .trim()
        .split(':')
        .map(|part| part.parse::<u32>().unwrap_or(0));
    let hour = hms.next().unwrap_or(0);
    let minute = hms.next().unwrap_or(0);
    let second = hms.next().unwrap_or(0);
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;

    Some(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, LocalResult};

    /// UTC-5 until 2024-03-10 07:00 UTC, UTC-4 afterwards. Local 02:00 to 03:00 that day
    /// does not exist.
    #[derive(Debug, Clone, Copy)]
    struct SpringForwardZone;

    impl SpringForwardZone {
        fn switch_local() -> NaiveDateTime {
            parse_header_datetime("2024.03.10", "02:00:00").unwrap()
        }

        fn before() -> FixedOffset {
            FixedOffset::west_opt(5 * 3600).unwrap()
        }

        fn after() -> FixedOffset {
            FixedOffset::west_opt(4 * 3600).unwrap()
        }
    }

    #[allow(deprecated)]
    impl TimeZone for SpringForwardZone {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            SpringForwardZone
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            if *local < Self::switch_local().date() {
                LocalResult::Single(Self::before())
            } else {
                LocalResult::Single(Self::after())
            }
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let switch = Self::switch_local();
            if *local < switch {
                LocalResult::Single(Self::before())
            } else if *local < switch + chrono::Duration::hours(1) {
                LocalResult::None
            } else {
                LocalResult::Single(Self::after())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            if *utc < Self::switch_local().date() {
                Self::before()
            } else {
                Self::after()
            }
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::switch_local() + chrono::Duration::hours(5) {
                Self::before()
            } else {
                Self::after()
            }
        }
    }

    fn reconcile_utc(sources: TimeSources<'_>) -> GameTimes {
        reconcile(&sources, &Utc, &mut ErrorAccumulator::default())
    }

    #[test]
    fn test_epochs_render_date_time_and_iso() {
        let times = reconcile_utc(TimeSources {
            start_epoch: Some(1_704_110_400),
            end_epoch: Some(1_704_110_700),
            ..Default::default()
        });

        assert_eq!(times.start.date, "2024-01-01");
        assert_eq!(times.start.time, "12:00:00");
        assert_eq!(times.start.date_time, "2024-01-01 12:00:00");
        assert_eq!(times.end.time, "12:05:00");
        assert_eq!(times.end.iso, "2024-01-01T12:05:00.000Z");
        assert_eq!(times.duration, "300");
    }

    #[test]
    fn test_local_zone_shifts_calendar_fields_not_iso() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let times = reconcile(
            &TimeSources {
                end_epoch: Some(1_704_153_600), // 2024-01-02T00:00:00Z
                ..Default::default()
            },
            &tz,
            &mut ErrorAccumulator::default(),
        );

        assert_eq!(times.end.date_time, "2024-01-02 02:00:00");
        assert_eq!(times.end.iso, "2024-01-02T00:00:00.000Z");
    }

    #[test]
    fn test_start_falls_back_to_header_pair() {
        let times = reconcile_utc(TimeSources {
            end_epoch: Some(1_704_110_700),
            header_date: Some("2024.01.01"),
            header_time: Some("12:00:00"),
            ..Default::default()
        });

        assert_eq!(times.start.date, "2024-01-01");
        assert_eq!(times.start.time, "12:00:00");
        assert_eq!(times.duration, "300");
    }

    #[test]
    fn test_header_pair_is_read_as_local_calendar_fields() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let times = reconcile(
            &TimeSources {
                header_date: Some("2024.03.10"),
                header_time: Some("23:15:00"),
                ..Default::default()
            },
            &tz,
            &mut ErrorAccumulator::default(),
        );

        assert_eq!(times.start.date_time, "2024-03-10 23:15:00");
        assert_eq!(times.start.iso, "2024-03-11T04:15:00.000Z");
        assert_eq!(times.end, MomentParts::default());
        assert_eq!(times.duration, "");
    }

    #[test]
    fn test_header_pair_in_skipped_local_hour_has_no_start() {
        let mut notes = ErrorAccumulator::default();
        let times = reconcile(
            &TimeSources {
                end_epoch: Some(1_710_054_000), // 2024-03-10T07:00:00Z
                header_date: Some("2024.03.10"),
                header_time: Some("02:30:00"),
                ..Default::default()
            },
            &SpringForwardZone,
            &mut notes,
        );

        assert_eq!(times.start, MomentParts::default());
        assert_eq!(times.duration, "");
        assert_eq!(times.end.date_time, "2024-03-10 03:00:00");
        assert!(notes.take().unwrap().contains("no such local time"));
    }

    #[test]
    fn test_header_pair_around_skipped_local_hour() {
        let mut notes = ErrorAccumulator::default();
        let before = reconcile(
            &TimeSources {
                header_date: Some("2024.03.10"),
                header_time: Some("01:59:59"),
                ..Default::default()
            },
            &SpringForwardZone,
            &mut notes,
        );
        let after = reconcile(
            &TimeSources {
                header_date: Some("2024.03.10"),
                header_time: Some("03:00:00"),
                ..Default::default()
            },
            &SpringForwardZone,
            &mut notes,
        );

        assert_eq!(before.start.iso, "2024-03-10T06:59:59.000Z");
        assert_eq!(after.start.iso, "2024-03-10T07:00:00.000Z");
        assert!(notes.is_empty());
    }

    #[test]
    fn test_start_epoch_wins_over_headers() {
        let times = reconcile_utc(TimeSources {
            start_epoch: Some(1_704_110_400),
            header_date: Some("1999.12.31"),
            header_time: Some("00:00:00"),
            ..Default::default()
        });
        assert_eq!(times.start.date, "2024-01-01");
    }

    #[test]
    fn test_negative_elapsed_is_floored_at_zero() {
        let times = reconcile_utc(TimeSources {
            start_epoch: Some(1_704_110_700),
            end_epoch: Some(1_704_110_400),
            ..Default::default()
        });
        assert_eq!(times.duration, "0");
    }

    #[test]
    fn test_everything_missing_is_empty() {
        let mut notes = ErrorAccumulator::default();
        let times = reconcile(&TimeSources::default(), &Utc, &mut notes);
        assert_eq!(times, GameTimes::default());
        assert!(notes.is_empty());
    }

    #[test]
    fn test_incomplete_header_pair_is_ignored() {
        let times = reconcile_utc(TimeSources {
            header_date: Some("2024.01.01"),
            ..Default::default()
        });
        assert_eq!(times.start, MomentParts::default());
    }

    #[test]
    fn test_unreadable_header_date_is_noted() {
        let mut notes = ErrorAccumulator::default();
        let times = reconcile(
            &TimeSources {
                header_date: Some("2024.??.??"),
                header_time: Some("10:00:00"),
                ..Default::default()
            },
            &Utc,
            &mut notes,
        );
        assert_eq!(times.start, MomentParts::default());
        assert!(notes.take().unwrap().contains("UTCDate='2024.??.??'"));
    }

    #[test]
    fn test_partial_header_time_defaults_to_zero() {
        let naive = parse_header_datetime("2024.02.29", "7").unwrap();
        assert_eq!(naive.to_string(), "2024-02-29 07:00:00");
        assert!(parse_header_datetime("2023.02.29", "07:00:00").is_none());
    }

    #[test]
    fn test_out_of_range_epoch_is_noted() {
        let mut notes = ErrorAccumulator::default();
        let times = reconcile(
            &TimeSources {
                end_epoch: Some(i64::MAX),
                ..Default::default()
            },
            &Utc,
            &mut notes,
        );
        assert_eq!(times.end, MomentParts::default());
        assert!(notes.take().unwrap().contains("end_time"));
    }
}
