//! Runs compiled expense filters against the database.

use rusqlite::{Connection, Row, params_from_iter, types::Value};

use crate::{
    Error,
    category::CategoryName,
    database_id::BookId,
    expense::{
        ExpenseWithDetails,
        db::map_expense_row,
        filter::{CompiledFilter, Constraint, SortKey},
    },
    db::LOWER_UNICODE,
    pagination::Paginated,
    payment_mode::PaymentModeName,
    session::Session,
};

const SELECT_WITH_DETAILS: &str = "SELECT e.id, e.user_id, e.book_id, e.category_id, \
    e.payment_mode_id, e.amount, e.date, e.remark, e.created_at, c.name, p.name \
    FROM expense e \
    INNER JOIN category c ON c.id = e.category_id \
    INNER JOIN payment_mode p ON p.id = e.payment_mode_id";

/// A parameterised `WHERE` clause.
#[derive(Debug, PartialEq)]
struct WhereClause {
    sql: String,
    parameters: Vec<Value>,
}

/// Build the `WHERE` clause for the expenses in `book_id` that satisfy
/// every constraint.
fn where_clause(session: &Session, book_id: BookId, constraints: &[Constraint]) -> WhereClause {
    let mut where_clause_parts = vec!["e.user_id = ?1".to_owned(), "e.book_id = ?2".to_owned()];
    let mut parameters = vec![Value::Integer(session.user_id()), Value::Integer(book_id)];

    for constraint in constraints {
        let next = parameters.len() + 1;

        match constraint {
            Constraint::DateFrom(date) => {
                where_clause_parts.push(format!("e.date >= ?{next}"));
                parameters.push(Value::Text(date.to_string()));
            }
            Constraint::DateTo(date) => {
                where_clause_parts.push(format!("e.date <= ?{next}"));
                parameters.push(Value::Text(date.to_string()));
            }
            Constraint::CategoryIn(ids) => {
                where_clause_parts.push(format!(
                    "e.category_id IN ({})",
                    placeholders(next, ids.len())
                ));
                parameters.extend(ids.iter().copied().map(Value::Integer));
            }
            Constraint::PaymentModeIn(ids) => {
                where_clause_parts.push(format!(
                    "e.payment_mode_id IN ({})",
                    placeholders(next, ids.len())
                ));
                parameters.extend(ids.iter().copied().map(Value::Integer));
            }
            Constraint::RemarkContains(text) => {
                where_clause_parts.push(format!("instr({LOWER_UNICODE}(e.remark), ?{next}) > 0"));
                parameters.push(Value::Text(text.to_lowercase()));
            }
            Constraint::AmountAtLeast(amount) => {
                where_clause_parts.push(format!("e.amount >= ?{next}"));
                parameters.push(Value::Real(*amount));
            }
            Constraint::AmountAtMost(amount) => {
                where_clause_parts.push(format!("e.amount <= ?{next}"));
                parameters.push(Value::Real(*amount));
            }
        }
    }

    WhereClause {
        sql: String::from("WHERE ") + &where_clause_parts.join(" AND "),
        parameters,
    }
}

/// `count` numbered placeholders starting at `?first`.
fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convert a row count for `LIMIT`/`OFFSET`, which SQLite only accepts as
/// 64-bit signed integers.
fn sql_count(count: u64) -> Value {
    Value::Integer(i64::try_from(count).unwrap_or(i64::MAX))
}

fn order_by_clause(sort: &[SortKey]) -> String {
    let keys: Vec<_> = sort
        .iter()
        .map(|key| match key {
            SortKey::DateDescending => "e.date DESC",
            SortKey::IdDescending => "e.id DESC",
        })
        .collect();

    format!("ORDER BY {}", keys.join(", "))
}

fn map_row_with_details(row: &Row) -> Result<ExpenseWithDetails, rusqlite::Error> {
    let expense = map_expense_row(row)?;
    let category_name: String = row.get(9)?;
    let payment_mode_name: String = row.get(10)?;

    Ok(ExpenseWithDetails {
        expense,
        category_name: CategoryName::new_unchecked(&category_name),
        payment_mode_name: PaymentModeName::new_unchecked(&payment_mode_name),
    })
}

/// List one page of the expenses in the session's active book that match
/// `filter`, newest first.
///
/// # Errors
///
/// Returns [Error::NoActiveBook] if the session has no book selected, or
/// [Error::SqlError] if there is an SQL error.
pub fn list_expenses(
    session: &Session,
    filter: &CompiledFilter,
    connection: &Connection,
) -> Result<Paginated<ExpenseWithDetails>, Error> {
    let book_id = session.active_book()?;
    let where_clause = where_clause(session, book_id, &filter.constraints);

    let count: i64 = connection.query_row(
        &format!("SELECT COUNT(*) FROM expense e {}", where_clause.sql),
        params_from_iter(where_clause.parameters.iter()),
        |row| row.get(0),
    )?;
    let total_items = u64::try_from(count).unwrap_or_default();

    let limit_index = where_clause.parameters.len() + 1;
    let query = format!(
        "{SELECT_WITH_DETAILS} {} {} LIMIT ?{} OFFSET ?{}",
        where_clause.sql,
        order_by_clause(&filter.sort),
        limit_index,
        limit_index + 1,
    );
    tracing::debug!("Listing expenses with query: {query}");

    let mut parameters = where_clause.parameters;
    parameters.push(sql_count(filter.page.page_size()));
    parameters.push(sql_count(filter.page.offset()));

    let data = connection
        .prepare(&query)?
        .query_map(params_from_iter(parameters.iter()), map_row_with_details)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Paginated::new(data, filter.page, total_items))
}

/// The sum of the amounts of all expenses in the session's active book that
/// match `filter`, ignoring pagination. Zero when nothing matches.
///
/// # Errors
///
/// Returns [Error::NoActiveBook] if the session has no book selected, or
/// [Error::SqlError] if there is an SQL error.
pub fn total_expenses(
    session: &Session,
    filter: &CompiledFilter,
    connection: &Connection,
) -> Result<f64, Error> {
    let book_id = session.active_book()?;
    let where_clause = where_clause(session, book_id, &filter.constraints);

    connection
        .query_row(
            &format!(
                "SELECT COALESCE(SUM(e.amount), 0.0) FROM expense e {}",
                where_clause.sql
            ),
            params_from_iter(where_clause.parameters.iter()),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// The session user's `limit` largest expenses across all of their books.
pub fn top_expenses(
    session: &Session,
    limit: u64,
    connection: &Connection,
) -> Result<Vec<ExpenseWithDetails>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_WITH_DETAILS} WHERE e.user_id = ?1 ORDER BY e.amount DESC, e.id DESC LIMIT ?2"
        ))?
        .query_map(
            [Value::Integer(session.user_id()), sql_count(limit)],
            map_row_with_details,
        )?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rusqlite::{Connection, types::Value};
    use time::{Date, Duration, macros::date};

    use crate::{
        Error,
        book::{BookName, NewBook, create_book},
        category::{CategoryName, create_category},
        db::initialize,
        expense::{
            AmountCondition, AmountQuery, Expense, ExpenseFilter, NewExpense, compile_filter,
            create_expense,
            filter::{CompiledFilter, Constraint},
        },
        pagination::{PageMeta, PaginationConfig},
        payment_mode::{PaymentModeName, create_payment_mode},
        session::Session,
        user::{NewUser, Username, register_user},
    };

    use super::{WhereClause, list_expenses, top_expenses, total_expenses, where_clause};

    struct Fixture {
        connection: Connection,
        session: Session,
        categories: [i64; 2],
        payment_modes: [i64; 2],
        expenses: Vec<Expense>,
    }

    const REMARKS: [&str; 6] = [
        "Milk",
        "Rent for November",
        "Oat milk",
        "50% off shoes",
        "Bus_pass",
        "CAFÉ latte",
    ];

    fn fixture() -> Fixture {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = register_user(
            NewUser {
                username: Username::new_unchecked("asha"),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
            },
            &connection,
        )
        .unwrap();
        let mut session = Session::log_in(&user);
        let book = create_book(
            &session,
            NewBook {
                name: BookName::new_unchecked("Home"),
                description: String::new(),
            },
            &connection,
        )
        .unwrap();
        session.select_book(&book).unwrap();

        let categories = ["Food", "Rent"].map(|name| {
            create_category(&session, book.id, CategoryName::new_unchecked(name), &connection)
                .unwrap()
                .id
        });
        let payment_modes = ["Cash", "Card"].map(|name| {
            create_payment_mode(&session, PaymentModeName::new_unchecked(name), &connection)
                .unwrap()
                .id
        });

        let start = date!(2025 - 10 - 28);
        let expenses = (0..24)
            .map(|i: usize| {
                create_expense(
                    &session,
                    NewExpense {
                        category_id: categories[i % 2],
                        payment_mode_id: payment_modes[(i / 2) % 2],
                        amount: (i as f64 + 1.0) * 100.0,
                        // Three expenses per day so that dates tie.
                        date: start + Duration::days((i / 3) as i64),
                        remark: REMARKS[i % REMARKS.len()].to_owned(),
                    },
                    &connection,
                )
                .unwrap()
            })
            .collect();

        Fixture {
            connection,
            session,
            categories,
            payment_modes,
            expenses,
        }
    }

    fn compile(filter: ExpenseFilter) -> CompiledFilter {
        compile_filter(&filter, &PaginationConfig::default()).unwrap()
    }

    /// The IDs of the expenses on the filter's page, computed in memory.
    fn expected_page(fixture: &Fixture, filter: &CompiledFilter) -> (Vec<i64>, u64) {
        let mut matching: Vec<_> = fixture
            .expenses
            .iter()
            .filter(|expense| filter.matches(expense))
            .collect();
        matching.sort_by(|a, b| filter.compare(a, b));

        let ids = matching
            .iter()
            .skip(filter.page.offset() as usize)
            .take(filter.page.page_size() as usize)
            .map(|expense| expense.id)
            .collect();

        (ids, matching.len() as u64)
    }

    fn assert_sql_matches_memory(fixture: &Fixture, filter: ExpenseFilter) {
        let compiled = compile(filter);
        let (want_ids, want_total) = expected_page(fixture, &compiled);

        let got = list_expenses(&fixture.session, &compiled, &fixture.connection).unwrap();

        let got_ids: Vec<_> = got.data.iter().map(|row| row.expense.id).collect();
        assert_eq!(got_ids, want_ids, "page contents differ for {compiled:?}");
        assert_eq!(
            got.meta,
            PageMeta::new(compiled.page, want_total),
            "page metadata differs for {compiled:?}"
        );
    }

    #[test]
    fn sql_returns_same_rows_as_in_memory_filter() {
        let fixture = fixture();
        let date = |day: u8| Date::from_calendar_date(2025, time::Month::November, day).unwrap();

        let filters = [
            ExpenseFilter::default(),
            ExpenseFilter {
                start_date: Some(date(1)),
                end_date: Some(date(3)),
                ..Default::default()
            },
            ExpenseFilter {
                category_ids: BTreeSet::from([fixture.categories[1]]),
                ..Default::default()
            },
            ExpenseFilter {
                category_ids: BTreeSet::from(fixture.categories),
                payment_mode_ids: BTreeSet::from([fixture.payment_modes[0]]),
                ..Default::default()
            },
            ExpenseFilter {
                search_query: Some("MILK".to_owned()),
                ..Default::default()
            },
            ExpenseFilter {
                search_query: Some("café".to_owned()),
                ..Default::default()
            },
            ExpenseFilter {
                amount_query: Some(AmountQuery {
                    condition: AmountCondition::Gte,
                    amount: 1200.0,
                }),
                page: Some(2),
                page_size: Some(5),
                ..Default::default()
            },
            ExpenseFilter {
                amount_query: Some(AmountQuery {
                    condition: AmountCondition::Lte,
                    amount: 700.0,
                }),
                start_date: Some(date(1)),
                ..Default::default()
            },
            ExpenseFilter {
                page: Some(3),
                page_size: Some(7),
                ..Default::default()
            },
        ];

        for filter in filters {
            assert_sql_matches_memory(&fixture, filter);
        }
    }

    #[test]
    fn date_ties_are_ordered_by_id_descending() {
        let fixture = fixture();

        let got = list_expenses(
            &fixture.session,
            &compile(ExpenseFilter::default()),
            &fixture.connection,
        )
        .unwrap();

        let first_day: Vec<_> = got.data[..3].iter().map(|row| row.expense.id).collect();
        let mut want: Vec<_> = fixture.expenses[21..].iter().map(|e| e.id).collect();
        want.reverse();
        assert_eq!(first_day, want);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let fixture = fixture();
        let filter = compile(ExpenseFilter {
            page: Some(10),
            page_size: Some(10),
            ..Default::default()
        });

        let got = list_expenses(&fixture.session, &filter, &fixture.connection).unwrap();

        assert!(got.data.is_empty());
        assert_eq!(got.meta.total_items, 24);
        assert_eq!(got.meta.total_pages, 3);
    }

    #[test]
    fn rows_include_category_and_payment_mode_names() {
        let fixture = fixture();

        let got = list_expenses(
            &fixture.session,
            &compile(ExpenseFilter::default()),
            &fixture.connection,
        )
        .unwrap();

        let newest = &got.data[0];
        assert_eq!(newest.expense.id, fixture.expenses[23].id);
        assert_eq!(newest.category_name, CategoryName::new_unchecked("Rent"));
        assert_eq!(newest.payment_mode_name, PaymentModeName::new_unchecked("Card"));
    }

    #[test]
    fn search_matches_wildcards_literally() {
        let fixture = fixture();

        let percent = compile(ExpenseFilter {
            search_query: Some("50%".to_owned()),
            ..Default::default()
        });
        let underscore = compile(ExpenseFilter {
            search_query: Some("s_p".to_owned()),
            ..Default::default()
        });

        let got_percent = list_expenses(&fixture.session, &percent, &fixture.connection).unwrap();
        let got_underscore =
            list_expenses(&fixture.session, &underscore, &fixture.connection).unwrap();

        assert_eq!(got_percent.meta.total_items, 4);
        assert!(
            got_percent
                .data
                .iter()
                .all(|row| row.expense.remark == "50% off shoes")
        );
        assert_eq!(got_underscore.meta.total_items, 4);
    }

    #[test]
    fn search_folds_non_ascii_case() {
        let fixture = fixture();
        let filter = compile(ExpenseFilter {
            search_query: Some("café".to_owned()),
            ..Default::default()
        });

        let got = list_expenses(&fixture.session, &filter, &fixture.connection).unwrap();

        assert_eq!(got.meta.total_items, 4);
        assert!(got.data.iter().all(|row| row.expense.remark == "CAFÉ latte"));
    }

    #[test]
    fn huge_page_number_returns_empty_page() {
        let fixture = fixture();
        let filter = compile(ExpenseFilter {
            page: Some(1 << 62),
            page_size: Some(25),
            ..Default::default()
        });

        let got = list_expenses(&fixture.session, &filter, &fixture.connection).unwrap();

        assert!(got.data.is_empty());
        assert_eq!(got.meta.total_items, 24);
        assert_eq!(got.meta.current_page, 1 << 62);
    }

    #[test]
    fn where_clause_numbers_parameters_in_order() {
        let session = fixture().session;
        let constraints = [
            Constraint::CategoryIn(vec![4, 5]),
            Constraint::AmountAtLeast(10.0),
        ];

        let got = where_clause(&session, 7, &constraints);

        assert_eq!(
            got,
            WhereClause {
                sql: "WHERE e.user_id = ?1 AND e.book_id = ?2 AND e.category_id IN (?3, ?4) \
                    AND e.amount >= ?5"
                    .to_owned(),
                parameters: vec![
                    Value::Integer(session.user_id()),
                    Value::Integer(7),
                    Value::Integer(4),
                    Value::Integer(5),
                    Value::Real(10.0),
                ],
            }
        );
    }

    #[test]
    fn total_ignores_pagination() {
        let fixture = fixture();
        let filter = compile(ExpenseFilter {
            category_ids: BTreeSet::from([fixture.categories[0]]),
            page_size: Some(1),
            ..Default::default()
        });
        let want: f64 = fixture
            .expenses
            .iter()
            .filter(|expense| filter.matches(expense))
            .map(|expense| expense.amount)
            .sum();

        let got = total_expenses(&fixture.session, &filter, &fixture.connection).unwrap();

        assert_eq!(got, want);
    }

    #[test]
    fn total_is_zero_when_nothing_matches() {
        let fixture = fixture();
        let filter = compile(ExpenseFilter {
            search_query: Some("no such remark".to_owned()),
            ..Default::default()
        });

        let got = total_expenses(&fixture.session, &filter, &fixture.connection).unwrap();

        assert_eq!(got, 0.0);
    }

    #[test]
    fn list_without_active_book_fails() {
        let mut fixture = fixture();
        fixture.session.clear_book();

        let got = list_expenses(
            &fixture.session,
            &compile(ExpenseFilter::default()),
            &fixture.connection,
        );

        assert_eq!(got, Err(Error::NoActiveBook));
    }

    #[test]
    fn top_expenses_are_largest_first() {
        let fixture = fixture();

        let got = top_expenses(&fixture.session, 3, &fixture.connection).unwrap();

        let amounts: Vec<_> = got.iter().map(|row| row.expense.amount).collect();
        assert_eq!(amounts, vec![2400.0, 2300.0, 2200.0]);
    }

    #[test]
    fn top_expenses_accepts_limit_beyond_i64() {
        let fixture = fixture();

        let got = top_expenses(&fixture.session, u64::MAX, &fixture.connection).unwrap();

        assert_eq!(got.len(), 24);
    }
}
