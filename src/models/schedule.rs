// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Prayer and fasting schedule records.
//!
//! One document per calendar day in a region collection (e.g. `Dhaka`),
//! keyed by the day number. Times are local clock strings such as `"05:12"`
//! or `"6:10 PM"`.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Raw schedule document as stored by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "SehriEnd", default)]
    pub sehri_end: Option<String>,
    #[serde(rename = "Iftar", default)]
    pub iftar: Option<String>,
    #[serde(rename = "Fajr", default)]
    pub fajr: Option<String>,
    #[serde(rename = "Dhuhr", default)]
    pub dhuhr: Option<String>,
    #[serde(rename = "Asr", default)]
    pub asr: Option<String>,
    #[serde(rename = "Maghrib", default)]
    pub maghrib: Option<String>,
    #[serde(rename = "Isha", default)]
    pub isha: Option<String>,
}

/// A schedule record together with its numeric document id.
#[derive(Debug, Clone)]
pub struct ScheduleDay {
    pub day: u32,
    pub record: ScheduleRecord,
}

impl ScheduleDay {
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.record.date.trim(), "%Y-%m-%d").ok()
    }

    /// The five daily prayers in canonical order, skipping any the record
    /// does not carry or that fail to parse.
    pub fn prayers(&self) -> Vec<PrayerTime> {
        let r = &self.record;
        [
            ("Fajr", &r.fajr),
            ("Dhuhr", &r.dhuhr),
            ("Asr", &r.asr),
            ("Maghrib", &r.maghrib),
            ("Isha", &r.isha),
        ]
        .into_iter()
        .filter_map(|(name, raw)| {
            let time = raw.as_deref().and_then(|t| ClockTime::parse(t).ok())?;
            Some(PrayerTime {
                name: name.to_string(),
                time: time.to_string(),
            })
        })
        .collect()
    }

    /// Sehri end and iftar for this day, if both are present.
    pub fn fasting_times(&self) -> Option<FastingTimes> {
        let sehri = ClockTime::parse(self.record.sehri_end.as_deref()?).ok()?;
        let iftar = ClockTime::parse(self.record.iftar.as_deref()?).ok()?;
        FastingTimes::new(sehri, iftar)
    }
}

/// Error parsing a clock time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid clock time: {0}")]
pub struct ClockTimeError(pub String);

/// Hour and minute of a local clock time (24-hour).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
}

impl ClockTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ClockTimeError> {
        if hour > 23 || minute > 59 {
            return Err(ClockTimeError(format!("{hour}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }

    /// Parse `"HH:MM"`, optionally followed by `AM`/`PM`.
    pub fn parse(raw: &str) -> Result<Self, ClockTimeError> {
        let err = || ClockTimeError(raw.to_string());
        let trimmed = raw.trim();
        let upper = trimmed.to_ascii_uppercase();

        let (clock, meridiem) = if let Some(rest) = upper.strip_suffix("AM") {
            (rest.trim(), Some(false))
        } else if let Some(rest) = upper.strip_suffix("PM") {
            (rest.trim(), Some(true))
        } else {
            (upper.as_str(), None)
        };

        let (h, m) = clock.split_once(':').ok_or_else(err)?;
        let mut hour: u32 = h.trim().parse().map_err(|_| err())?;
        let minute: u32 = m.trim().parse().map_err(|_| err())?;

        if let Some(pm) = meridiem {
            if hour == 0 || hour > 12 {
                return Err(err());
            }
            hour = match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            };
        }

        Self::new(hour, minute).map_err(|_| err())
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.hour * 60 + self.minute
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// One named prayer and its time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PrayerTime {
    pub name: String,
    pub time: String,
}

/// Length of the fast in hours and minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FastDuration {
    pub hours: u32,
    pub minutes: u32,
}

/// The two fasting boundaries of one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastingTimes {
    pub sehri_end: ClockTime,
    pub iftar: ClockTime,
}

impl FastingTimes {
    /// Iftar is always an evening time; schedules often store it on a
    /// 12-hour clock without a suffix, so morning hours are moved to PM.
    pub fn new(sehri_end: ClockTime, iftar: ClockTime) -> Option<Self> {
        let iftar = if iftar.hour < 12 {
            ClockTime::new(iftar.hour + 12, iftar.minute).ok()?
        } else {
            iftar
        };
        if iftar <= sehri_end {
            return None;
        }
        Some(Self { sehri_end, iftar })
    }

    pub fn duration(&self) -> FastDuration {
        let minutes = self.iftar.minutes_since_midnight() - self.sehri_end.minutes_since_midnight();
        FastDuration {
            hours: minutes / 60,
            minutes: minutes % 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(record: ScheduleRecord) -> ScheduleDay {
        ScheduleDay { day: 1, record }
    }

    #[test]
    fn test_parse_clock_times() {
        assert_eq!(ClockTime::parse("05:12").unwrap(), ClockTime::new(5, 12).unwrap());
        assert_eq!(ClockTime::parse("6:10 PM").unwrap(), ClockTime::new(18, 10).unwrap());
        assert_eq!(ClockTime::parse("12:30 pm").unwrap(), ClockTime::new(12, 30).unwrap());
        assert_eq!(ClockTime::parse("12:05 AM").unwrap(), ClockTime::new(0, 5).unwrap());
        assert!(ClockTime::parse("25:00").is_err());
        assert!(ClockTime::parse("13:00 PM").is_err());
        assert!(ClockTime::parse("noon").is_err());
    }

    #[test]
    fn test_iftar_moved_to_evening() {
        let record = ScheduleRecord {
            date: "2026-03-20".to_string(),
            sehri_end: Some("05:12".to_string()),
            iftar: Some("05:58".to_string()),
            ..Default::default()
        };
        let times = day(record).fasting_times().unwrap();
        assert_eq!(times.iftar, ClockTime::new(17, 58).unwrap());
        assert_eq!(
            times.duration(),
            FastDuration {
                hours: 12,
                minutes: 46
            }
        );
    }

    #[test]
    fn test_fasting_times_missing_field() {
        let record = ScheduleRecord {
            date: "2026-03-20".to_string(),
            sehri_end: Some("05:12".to_string()),
            ..Default::default()
        };
        assert!(day(record).fasting_times().is_none());
    }

    #[test]
    fn test_prayers_in_order_skipping_missing() {
        let record = ScheduleRecord {
            date: "2026-03-20".to_string(),
            fajr: Some("5:15 AM".to_string()),
            asr: Some("3:45 PM".to_string()),
            isha: Some("19:30".to_string()),
            ..Default::default()
        };
        let prayers = day(record).prayers();
        let names: Vec<&str> = prayers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Fajr", "Asr", "Isha"]);
        assert_eq!(prayers[1].time, "15:45");
    }

    #[test]
    fn test_record_from_backend_field_names() {
        let record: ScheduleRecord = serde_json::from_value(serde_json::json!({
            "Date": "2026-03-19",
            "SehriEnd": "05:13",
            "Iftar": "05:57"
        }))
        .unwrap();
        assert_eq!(record.date, "2026-03-19");
        assert_eq!(record.iftar.as_deref(), Some("05:57"));
        assert!(record.fajr.is_none());
    }
}
