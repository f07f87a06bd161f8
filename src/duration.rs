//! Resolves named reporting durations into concrete calendar date ranges.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime, macros::date, util};

use crate::{Error, timezone::get_local_offset};

time::serde::format_description!(pub(crate) calendar_day, Date, "[year]-[month]-[day]");

/// A named reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationTag {
    /// The first to the last day of the current month.
    ThisMonth,
    /// The first to the last day of the month before the current one.
    LastMonth,
    /// The first to the last day of the current year.
    ThisYear,
    /// The configured epoch through today.
    AllTime,
    /// Caller supplied bounds.
    CustomRange,
}

impl DurationTag {
    /// The value used for this tag in query strings and config files.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::ThisMonth => "this_month",
            Self::LastMonth => "last_month",
            Self::ThisYear => "this_year",
            Self::AllTime => "all_time",
            Self::CustomRange => "custom_range",
        }
    }

    /// A human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::ThisMonth => "This Month",
            Self::LastMonth => "Last Month",
            Self::ThisYear => "This Year",
            Self::AllTime => "All Time",
            Self::CustomRange => "Custom Range",
        }
    }
}

impl FromStr for DurationTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "this_month" => Ok(Self::ThisMonth),
            "last_month" => Ok(Self::LastMonth),
            "this_year" => Ok(Self::ThisYear),
            "all_time" => Ok(Self::AllTime),
            "custom_range" => Ok(Self::CustomRange),
            other => Err(format!(
                "unknown duration \"{other}\", expected one of this_month, last_month, \
                this_year, all_time or custom_range"
            )),
        }
    }
}

impl Display for DurationTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_query_value())
    }
}

/// An inclusive range of calendar days where the start is never after the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(with = "calendar_day")]
    start_date: Date,
    #[serde(with = "calendar_day")]
    end_date: Date,
}

impl DateRange {
    /// Create a date range.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateRange] if `start` is after `end`.
    pub fn new(start: Date, end: Date) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidDateRange { start, end });
        }

        Ok(Self {
            start_date: start,
            end_date: end,
        })
    }

    /// The first day in the range.
    pub fn start(&self) -> Date {
        self.start_date
    }

    /// The last day in the range.
    pub fn end(&self) -> Date {
        self.end_date
    }

    /// Whether `date` falls within the range, bounds included.
    pub fn contains(&self, date: Date) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start_date, self.end_date)
    }
}

/// The bounds picked for a [DurationTag::CustomRange], either of which may be
/// missing while the user is still choosing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomRangeBounds {
    /// The first day of the range.
    pub start: Option<Date>,
    /// The last day of the range.
    pub end: Option<Date>,
}

/// What to do with a custom range that is missing a bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncompleteRangePolicy {
    /// Resolve the range as [DurationTag::AllTime].
    #[default]
    FallBackToAllTime,
    /// Fail with [Error::IncompleteCustomRange].
    Reject,
}

/// Settings for resolving durations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DurationConfig {
    /// The first day of [DurationTag::AllTime].
    #[serde(with = "calendar_day")]
    pub all_time_start: Date,
    /// How incomplete custom ranges are handled.
    pub incomplete_custom_range: IncompleteRangePolicy,
    /// A canonical IANA time zone (e.g. "Asia/Kolkata") that decides what
    /// "today" is. The system offset is used when unset.
    pub timezone: Option<String>,
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            all_time_start: date!(2025 - 01 - 01),
            incomplete_custom_range: IncompleteRangePolicy::default(),
            timezone: None,
        }
    }
}

/// Resolve `tag` into a concrete date range relative to `today`.
///
/// `custom` is only read for [DurationTag::CustomRange].
///
/// # Errors
/// Returns [Error::InvalidDateRange] if custom bounds are reversed, and
/// [Error::IncompleteCustomRange] if a custom bound is missing and the policy
/// is [IncompleteRangePolicy::Reject].
pub fn resolve_duration(
    tag: DurationTag,
    custom: CustomRangeBounds,
    today: Date,
    config: &DurationConfig,
) -> Result<DateRange, Error> {
    let range = match tag {
        DurationTag::ThisMonth => month_bounds(today),
        DurationTag::LastMonth => {
            let first_of_month = month_bounds(today).start_date;
            month_bounds(first_of_month - Duration::days(1))
        }
        DurationTag::ThisYear => year_bounds(today),
        DurationTag::AllTime => all_time_bounds(today, config.all_time_start),
        DurationTag::CustomRange => match (custom.start, custom.end) {
            (Some(start), Some(end)) => DateRange::new(start, end)?,
            _ => match config.incomplete_custom_range {
                IncompleteRangePolicy::FallBackToAllTime => {
                    tracing::debug!("Custom range {custom:?} is incomplete, using all time.");
                    all_time_bounds(today, config.all_time_start)
                }
                IncompleteRangePolicy::Reject => return Err(Error::IncompleteCustomRange),
            },
        },
    };

    tracing::debug!("Resolved {tag} on {today} to {range}");

    Ok(range)
}

/// Resolve `tag` relative to the current local date.
///
/// # Errors
/// Returns [Error::InvalidTimezone] if the configured time zone is unknown,
/// otherwise the errors of [resolve_duration].
pub fn resolve_duration_today(
    tag: DurationTag,
    custom: CustomRangeBounds,
    config: &DurationConfig,
) -> Result<DateRange, Error> {
    resolve_duration(tag, custom, local_today(config)?, config)
}

/// Today's date in the configured time zone, or the system offset when no
/// time zone is configured.
pub fn local_today(config: &DurationConfig) -> Result<Date, Error> {
    let now = match &config.timezone {
        Some(timezone) => {
            let offset = get_local_offset(timezone)
                .ok_or_else(|| Error::InvalidTimezone(timezone.to_owned()))?;
            OffsetDateTime::now_utc().to_offset(offset)
        }
        None => OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()),
    };

    Ok(now.date())
}

fn month_bounds(anchor_date: Date) -> DateRange {
    let start = anchor_date - Duration::days(i64::from(anchor_date.day()) - 1);
    let length = anchor_date.month().length(anchor_date.year());
    let end = start + Duration::days(i64::from(length) - 1);

    DateRange {
        start_date: start,
        end_date: end,
    }
}

fn year_bounds(anchor_date: Date) -> DateRange {
    let start = anchor_date - Duration::days(i64::from(anchor_date.ordinal()) - 1);
    let end = start + Duration::days(i64::from(util::days_in_year(anchor_date.year())) - 1);

    DateRange {
        start_date: start,
        end_date: end,
    }
}

fn all_time_bounds(today: Date, epoch: Date) -> DateRange {
    DateRange {
        start_date: epoch.min(today),
        end_date: today,
    }
}
