//! Spending reports: book summaries, monthly totals and the charts built
//! from them.

mod chart;
mod rows;
mod series;
mod summary;

pub use chart::stacked_bar_chart;
pub use rows::{BookSummary, MonthlyGroupTotal, parse_books_summary, parse_monthly_totals};
pub use series::{
    ChartLegend, ChartRecord, ChartSeries, LegendEntry, Palette, axis_range, build_chart_series,
    build_legend, build_records,
};
pub use summary::{books_summary, monthly_totals_by_book, monthly_totals_by_category};
