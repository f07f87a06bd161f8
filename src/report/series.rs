//! Reshapes monthly totals into stacked bar chart data.
//!
//! The chart has one record per month that has data, with one value per
//! group (book or category) spent on in that month. Groups are given colours
//! from a fixed palette in the order they are first seen, so a legend keeps
//! its colours when the same data is fetched again.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer, ser::SerializeMap};
use time::Month;

use crate::{Error, config::ChartConfig, report::MonthlyGroupTotal};

/// The totals for each group in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRecord {
    year: i32,
    month: Month,
    values: Vec<(String, f64)>,
}

impl ChartRecord {
    fn new(year: i32, month: Month) -> Self {
        Self {
            year,
            month,
            values: Vec::new(),
        }
    }

    /// The label for the record's month, e.g. "Nov 2025".
    pub fn label(&self) -> String {
        format!("{} {}", short_month_name(self.month), self.year)
    }

    /// The calendar year of the record.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month of the record.
    pub fn month(&self) -> Month {
        self.month
    }

    /// The value for each group in the order the groups were first set.
    pub fn values(&self) -> &[(String, f64)] {
        &self.values
    }

    /// The value for `group`, if the group has any spending this month.
    pub fn get(&self, group: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name == group)
            .map(|(_, value)| *value)
    }

    /// The sum of every group's value.
    pub fn total(&self) -> f64 {
        self.values.iter().map(|(_, value)| value).sum()
    }

    /// Set the value for `group`, replacing any earlier value.
    fn set(&mut self, group: &str, value: f64) {
        match self.values.iter_mut().find(|(name, _)| name == group) {
            Some((_, existing)) => *existing = value,
            None => self.values.push((group.to_owned(), value)),
        }
    }
}

/// Serializes as a flat object, e.g. `{"month": "Nov 2025", "Rent": 100.0}`.
///
/// A group called "month" would clash with the label and is written after it.
impl Serialize for ChartRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("month", &self.label())?;

        for (group, value) in &self.values {
            map.serialize_entry(group, value)?;
        }

        map.end()
    }
}

fn short_month_name(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

/// Group `rows` into one record per month, oldest first.
///
/// If the same month and group appear more than once, the last row wins.
/// Months without rows are not included.
pub fn build_records(rows: &[MonthlyGroupTotal]) -> Vec<ChartRecord> {
    let mut records: BTreeMap<(i32, u8), ChartRecord> = BTreeMap::new();

    for row in rows {
        records
            .entry((row.year_number(), row.month_number()))
            .or_insert_with(|| ChartRecord::new(row.year_number(), row.month()))
            .set(row.group_name(), row.total_expense());
    }

    records.into_values().collect()
}

/// A non-empty list of colours, e.g. "#5470c6".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette(Vec<String>);

impl Palette {
    /// Create a palette.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyPalette] if `colors` is empty.
    pub fn new(colors: Vec<String>) -> Result<Self, Error> {
        if colors.is_empty() {
            return Err(Error::EmptyPalette);
        }

        Ok(Self(colors))
    }

    /// The colour for the `index`th group. Colours repeat once the palette
    /// runs out.
    pub fn color(&self, index: usize) -> &str {
        &self.0[index % self.0.len()]
    }

    /// The number of distinct colours.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false, palettes have at least one colour.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A group and the colour it is drawn in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    /// The name of the book or category.
    pub label: String,
    /// The colour of the group's bars.
    pub color: String,
}

/// The chart legend, in the order the groups were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChartLegend(Vec<LegendEntry>);

impl ChartLegend {
    /// The legend entries.
    pub fn entries(&self) -> &[LegendEntry] {
        &self.0
    }

    /// The colour of `group`, if it is in the legend.
    pub fn color_of(&self, group: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|entry| entry.label == group)
            .map(|entry| entry.color.as_str())
    }
}

/// Give each distinct group in `rows` a colour from `palette`.
pub fn build_legend(rows: &[MonthlyGroupTotal], palette: &Palette) -> ChartLegend {
    let mut entries: Vec<LegendEntry> = Vec::new();

    for row in rows {
        if entries.iter().any(|entry| entry.label == row.group_name()) {
            continue;
        }

        entries.push(LegendEntry {
            label: row.group_name().to_owned(),
            color: palette.color(entries.len()).to_owned(),
        });
    }

    ChartLegend(entries)
}

/// The value axis range `(0, top)` for `records`.
///
/// `top` is the next multiple of `step` above the largest monthly total. A
/// total that is already a multiple of `step` gets one extra step of
/// headroom, so 10,000 with a step of 5,000 gives 15,000 and 7,000 gives
/// 10,000.
///
/// # Errors
///
/// Returns [Error::InvalidAxisStep] if `step` is not a positive number.
pub fn axis_range(records: &[ChartRecord], step: f64) -> Result<(f64, f64), Error> {
    if !(step.is_finite() && step > 0.0) {
        return Err(Error::InvalidAxisStep(step));
    }

    let max = records
        .iter()
        .map(ChartRecord::total)
        .fold(0.0_f64, f64::max);
    let remainder = max % step;

    Ok((0.0, max + step - remainder))
}

/// Everything needed to draw the monthly stacked bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    /// One record per month, oldest first.
    pub records: Vec<ChartRecord>,
    /// The colour of each group.
    pub legend: ChartLegend,
    /// The value axis range `(0, top)`.
    pub axis_range: (f64, f64),
}

/// Build the chart records, legend and axis range for `rows`.
///
/// # Errors
///
/// Returns [Error::EmptyPalette] or [Error::InvalidAxisStep] if `config` is
/// invalid.
pub fn build_chart_series(
    rows: &[MonthlyGroupTotal],
    config: &ChartConfig,
) -> Result<ChartSeries, Error> {
    let palette = config.palette()?;
    let records = build_records(rows);
    let legend = build_legend(rows, &palette);
    let axis_range = axis_range(&records, config.axis_step)?;

    tracing::debug!(
        "Built chart series with {} months and {} groups",
        records.len(),
        legend.entries().len()
    );

    Ok(ChartSeries {
        records,
        legend,
        axis_range,
    })
}
