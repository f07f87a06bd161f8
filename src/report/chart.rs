//! Renders chart series as ECharts options.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Color, Emphasis, EmphasisFocus,
        JsFunction, Tooltip, Trigger,
    },
    series::bar,
};

use crate::report::ChartSeries;

/// Build a stacked bar chart with one bar per month and one stack segment
/// per legend entry.
///
/// Segments are coloured in legend order, months where a group has no
/// spending are left empty. Values are formatted as `currency_code`, e.g. "INR".
pub fn stacked_bar_chart(
    series: &ChartSeries,
    title: &str,
    subtitle: &str,
    currency_code: &str,
) -> Chart {
    let labels: Vec<String> = series.records.iter().map(|record| record.label()).collect();
    let colors: Vec<Color> = series
        .legend
        .entries()
        .iter()
        .map(|entry| Color::from(entry.color.as_str()))
        .collect();
    let (axis_min, axis_max) = series.axis_range;

    let mut chart = Chart::new()
        .title(
            Title::new()
                .text(title)
                .subtext(subtitle)
                .left(20)
                .top("1%"),
        )
        .tooltip(currency_tooltip(currency_code))
        .legend(Legend::new().left(250).top("1%"))
        .color(colors)
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(90)
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .min(axis_min)
                .max(axis_max)
                .axis_label(AxisLabel::new().formatter(currency_formatter(currency_code))),
        );

    for entry in series.legend.entries() {
        let data: Vec<Option<f64>> = series
            .records
            .iter()
            .map(|record| record.get(&entry.label))
            .collect();

        chart = chart.series(
            bar::Bar::new()
                .name(entry.label.as_str())
                .stack("Expenses")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(data),
        );
    }

    chart
}

fn currency_formatter(currency_code: &str) -> JsFunction {
    JsFunction::new_with_args(
        "number",
        &format!(
            "const currencyFormatter = new Intl.NumberFormat('en-IN', {{
                  style: 'currency',
                  currency: '{currency_code}'
                }});
                return (number) ? currencyFormatter.format(number) : \"-\";"
        ),
    )
}

fn currency_tooltip(currency_code: &str) -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter(currency_code))
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
