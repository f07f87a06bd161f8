//! Reporting queries behind the books overview and the monthly charts.

use rusqlite::{Connection, Params};
use time::Date;

use crate::{
    Error,
    database_id::BookId,
    duration::{CustomRangeBounds, DateRange, DurationConfig, DurationTag, resolve_duration},
    report::{BookSummary, MonthlyGroupTotal},
    session::Session,
};

/// The spending in each of the session user's active books, newest book
/// first.
///
/// "This month" and "this year" are relative to `today`.
///
/// # Errors
///
/// Returns [Error::SqlError] if there is an SQL error.
pub fn books_summary(
    session: &Session,
    today: Date,
    config: &DurationConfig,
    connection: &Connection,
) -> Result<Vec<BookSummary>, Error> {
    let this_month = resolve_duration(
        DurationTag::ThisMonth,
        CustomRangeBounds::default(),
        today,
        config,
    )?;
    let this_year = resolve_duration(
        DurationTag::ThisYear,
        CustomRangeBounds::default(),
        today,
        config,
    )?;

    connection
        .prepare(
            "SELECT b.id, b.name, b.description,
                COALESCE(SUM(e.amount), 0.0),
                COALESCE(SUM(CASE WHEN e.date BETWEEN ?2 AND ?3 THEN e.amount END), 0.0),
                COALESCE(SUM(CASE WHEN e.date BETWEEN ?4 AND ?5 THEN e.amount END), 0.0)
             FROM book b
             LEFT JOIN expense e ON e.book_id = b.id AND e.user_id = b.user_id
             WHERE b.user_id = ?1 AND b.is_active
             GROUP BY b.id
             ORDER BY b.created_at DESC, b.id DESC",
        )?
        .query_map(
            (
                session.user_id(),
                this_month.start(),
                this_month.end(),
                this_year.start(),
                this_year.end(),
            ),
            |row| {
                Ok(BookSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    all_time: row.get(3)?,
                    this_month: row.get(4)?,
                    this_year: row.get(5)?,
                })
            },
        )?
        .map(|maybe_summary| maybe_summary.map_err(|error| error.into()))
        .collect()
}

/// The monthly spending in each of the session user's active books within
/// `range`.
pub fn monthly_totals_by_book(
    session: &Session,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<MonthlyGroupTotal>, Error> {
    query_monthly_totals(
        "SELECT CAST(strftime('%m', e.date) AS INTEGER) AS month_number,
            CAST(strftime('%Y', e.date) AS INTEGER) AS year_number,
            b.name,
            SUM(e.amount)
         FROM expense e
         INNER JOIN book b ON b.id = e.book_id
         WHERE e.user_id = ?1 AND b.is_active AND e.date BETWEEN ?2 AND ?3
         GROUP BY year_number, month_number, b.id
         ORDER BY year_number, month_number, b.name",
        (session.user_id(), range.start(), range.end()),
        connection,
    )
}

/// The monthly spending in each category of a book within `range`.
///
/// Inactive categories are included since their expenses still count.
pub fn monthly_totals_by_category(
    session: &Session,
    book_id: BookId,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<MonthlyGroupTotal>, Error> {
    query_monthly_totals(
        "SELECT CAST(strftime('%m', e.date) AS INTEGER) AS month_number,
            CAST(strftime('%Y', e.date) AS INTEGER) AS year_number,
            c.name,
            SUM(e.amount)
         FROM expense e
         INNER JOIN category c ON c.id = e.category_id
         WHERE e.user_id = ?1 AND e.book_id = ?2 AND e.date BETWEEN ?3 AND ?4
         GROUP BY year_number, month_number, c.id
         ORDER BY year_number, month_number, c.name",
        (session.user_id(), book_id, range.start(), range.end()),
        connection,
    )
}

fn query_monthly_totals<P: Params>(
    query: &str,
    params: P,
    connection: &Connection,
) -> Result<Vec<MonthlyGroupTotal>, Error> {
    let rows = connection
        .prepare(query)?
        .query_map(params, |row| {
            Ok((
                row.get::<_, u8>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(month_number, year_number, group_name, total_expense)| {
            MonthlyGroupTotal::new(month_number, year_number, &group_name, total_expense)
        })
        .collect()
}
