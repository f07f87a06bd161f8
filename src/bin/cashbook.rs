use std::{collections::BTreeSet, error::Error, fs, path::PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use serde::Serialize;
use time::{Date, macros::format_description};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cashbook::{
    AmountCondition, AmountQuery, BookName, BookUpdate, CashbookConfig, CategoryName,
    CategoryUpdate, CustomRangeBounds, DurationTag, ExpenseFilter, ExpenseUpdate, NewBook,
    NewExpense, NewUser, PaymentModeName, PaymentModeUpdate, Session, Username, books_summary,
    build_chart_series, compile_filter, create_book, create_category, create_expense,
    create_payment_mode, delete_expense, get_book, get_books, get_categories, get_payment_modes,
    get_user_by_username, initialize_db, list_expenses, local_today, monthly_totals_by_book,
    monthly_totals_by_category, register_user, resolve_duration, stacked_bar_chart, top_expenses,
    total_expenses, update_book, update_category, update_expense, update_payment_mode,
};

/// Record and report on expenses from the command line.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// File path to the application SQLite database.
    #[arg(long, short)]
    db_path: PathBuf,

    /// File path to a JSON config file. Defaults are used when not given.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// The user to act as. Required for everything except `register`.
    #[arg(long, short)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new user.
    Register {
        username: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    /// Manage books.
    #[command(subcommand)]
    Book(BookCommand),
    /// Manage the categories of a book.
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Manage payment modes.
    #[command(subcommand)]
    PaymentMode(PaymentModeCommand),
    /// Record, list and delete expenses.
    #[command(subcommand)]
    Expense(ExpenseCommand),
    /// Show the spending in each active book.
    Summary {
        /// The day to treat as today, defaults to the current local date.
        #[arg(long, value_parser = parse_date)]
        today: Option<Date>,
    },
    /// Print the ECharts options for the monthly expenses chart.
    Chart(ChartArgs),
}

#[derive(Subcommand, Debug)]
enum BookCommand {
    /// Create a book.
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List books, newest first.
    List,
    /// Change a book.
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// Create a category in a book.
    Add {
        #[arg(long)]
        book: i64,
        name: String,
    },
    /// List the categories of a book.
    List {
        #[arg(long)]
        book: i64,
        /// Include inactive categories.
        #[arg(long)]
        all: bool,
    },
    /// Change a category.
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
}

#[derive(Subcommand, Debug)]
enum PaymentModeCommand {
    /// Create a payment mode.
    Add { name: String },
    /// List payment modes, newest first.
    List {
        /// Include inactive payment modes.
        #[arg(long)]
        all: bool,
    },
    /// Change a payment mode.
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    /// Record an expense.
    Add {
        #[arg(long)]
        book: i64,
        #[arg(long)]
        category: i64,
        #[arg(long)]
        payment_mode: i64,
        #[arg(long)]
        amount: f64,
        /// The day of the expense, e.g. 2025-11-15.
        #[arg(long, value_parser = parse_date)]
        date: Date,
        #[arg(long)]
        remark: String,
    },
    /// List one page of a book's expenses.
    List(ListArgs),
    /// Change an expense.
    Update {
        id: i64,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        payment_mode: Option<i64>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long, value_parser = parse_date)]
        date: Option<Date>,
        #[arg(long)]
        remark: Option<String>,
    },
    /// Delete an expense.
    Delete { id: i64 },
    /// List the largest expenses across all books.
    Top {
        #[arg(long, default_value_t = 10)]
        limit: u64,
    },
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long)]
    book: i64,
    #[arg(long, value_parser = parse_date)]
    start: Option<Date>,
    #[arg(long, value_parser = parse_date)]
    end: Option<Date>,
    /// Only these categories, may be repeated.
    #[arg(long)]
    category: Vec<i64>,
    /// Only these payment modes, may be repeated.
    #[arg(long)]
    payment_mode: Vec<i64>,
    /// Text to look for in the remark.
    #[arg(long)]
    search: Option<String>,
    /// Only expenses of at least this amount.
    #[arg(long, conflicts_with = "amount_lte")]
    amount_gte: Option<f64>,
    /// Only expenses of at most this amount.
    #[arg(long)]
    amount_lte: Option<f64>,
    #[arg(long)]
    page: Option<u64>,
    #[arg(long)]
    page_size: Option<u64>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GroupBy {
    Book,
    Category,
}

#[derive(Args, Debug)]
struct ChartArgs {
    /// Stack the bars by book, or by the categories of `--book`.
    #[arg(long, value_enum, default_value_t = GroupBy::Book)]
    by: GroupBy,
    /// The book to chart when grouping by category.
    #[arg(long, required_if_eq("by", "category"))]
    book: Option<i64>,
    /// One of this_month, last_month, this_year, all_time or custom_range.
    #[arg(long, default_value_t = DurationTag::ThisYear)]
    duration: DurationTag,
    #[arg(long, value_parser = parse_date)]
    start: Option<Date>,
    #[arg(long, value_parser = parse_date)]
    end: Option<Date>,
    /// Write the chart to this file instead of printing it.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn parse_date(text: &str) -> Result<Date, String> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map_err(|error| format!("expected a date like 2025-11-15: {error}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CashbookConfig::load(path)?,
        None => CashbookConfig::default(),
    };

    let connection = Connection::open(&cli.db_path)?;
    initialize_db(&connection)?;

    let command = match cli.command {
        Command::Register {
            username,
            first_name,
            last_name,
            email,
        } => {
            let user = register_user(
                NewUser {
                    username: Username::new(&username)?,
                    first_name,
                    last_name,
                    email,
                },
                &connection,
            )?;

            return print_json(&user);
        }
        command => command,
    };

    let username = cli
        .user
        .as_deref()
        .ok_or("--user is required for this command")?;
    let user = get_user_by_username(&Username::new(username)?, &connection)?;
    let mut session = Session::log_in(&user);

    match command {
        Command::Register { .. } => {}
        Command::Book(command) => run_book_command(command, &session, &connection)?,
        Command::Category(command) => run_category_command(command, &session, &connection)?,
        Command::PaymentMode(command) => {
            run_payment_mode_command(command, &session, &connection)?
        }
        Command::Expense(command) => {
            run_expense_command(command, &mut session, &config, &connection)?
        }
        Command::Summary { today } => {
            let today = match today {
                Some(today) => today,
                None => local_today(&config.duration)?,
            };

            print_json(&books_summary(&session, today, &config.duration, &connection)?)?;
        }
        Command::Chart(args) => run_chart_command(args, &session, &config, &connection)?,
    }

    session.log_out();

    Ok(())
}

fn run_book_command(
    command: BookCommand,
    session: &Session,
    connection: &Connection,
) -> Result<(), Box<dyn Error>> {
    match command {
        BookCommand::Add { name, description } => print_json(&create_book(
            session,
            NewBook {
                name: BookName::new(&name)?,
                description,
            },
            connection,
        )?),
        BookCommand::List => print_json(&get_books(session, connection)?),
        BookCommand::Update {
            id,
            name,
            description,
            active,
        } => {
            let update = BookUpdate {
                name: name.as_deref().map(BookName::new).transpose()?,
                description,
                is_active: active,
            };

            print_json(&update_book(session, id, update, connection)?)
        }
    }
}

fn run_category_command(
    command: CategoryCommand,
    session: &Session,
    connection: &Connection,
) -> Result<(), Box<dyn Error>> {
    match command {
        CategoryCommand::Add { book, name } => print_json(&create_category(
            session,
            book,
            CategoryName::new(&name)?,
            connection,
        )?),
        CategoryCommand::List { book, all } => {
            print_json(&get_categories(session, book, all, connection)?)
        }
        CategoryCommand::Update { id, name, active } => {
            let update = CategoryUpdate {
                name: name.as_deref().map(CategoryName::new).transpose()?,
                is_active: active,
            };

            print_json(&update_category(session, id, update, connection)?)
        }
    }
}

fn run_payment_mode_command(
    command: PaymentModeCommand,
    session: &Session,
    connection: &Connection,
) -> Result<(), Box<dyn Error>> {
    match command {
        PaymentModeCommand::Add { name } => print_json(&create_payment_mode(
            session,
            PaymentModeName::new(&name)?,
            connection,
        )?),
        PaymentModeCommand::List { all } => {
            print_json(&get_payment_modes(session, all, connection)?)
        }
        PaymentModeCommand::Update { id, name, active } => {
            let update = PaymentModeUpdate {
                name: name.as_deref().map(PaymentModeName::new).transpose()?,
                is_active: active,
            };

            print_json(&update_payment_mode(session, id, update, connection)?)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExpenseListOutput<T: Serialize> {
    #[serde(flatten)]
    page: T,
    filtered_total: f64,
}

fn run_expense_command(
    command: ExpenseCommand,
    session: &mut Session,
    config: &CashbookConfig,
    connection: &Connection,
) -> Result<(), Box<dyn Error>> {
    match command {
        ExpenseCommand::Add {
            book,
            category,
            payment_mode,
            amount,
            date,
            remark,
        } => {
            session.select_book(&get_book(session, book, connection)?)?;

            print_json(&create_expense(
                session,
                NewExpense {
                    category_id: category,
                    payment_mode_id: payment_mode,
                    amount,
                    date,
                    remark,
                },
                connection,
            )?)
        }
        ExpenseCommand::List(args) => {
            session.select_book(&get_book(session, args.book, connection)?)?;

            let amount_query = match (args.amount_gte, args.amount_lte) {
                (Some(amount), _) => Some(AmountQuery {
                    condition: AmountCondition::Gte,
                    amount,
                }),
                (None, Some(amount)) => Some(AmountQuery {
                    condition: AmountCondition::Lte,
                    amount,
                }),
                (None, None) => None,
            };
            let filter = ExpenseFilter {
                start_date: args.start,
                end_date: args.end,
                category_ids: args.category.into_iter().collect::<BTreeSet<_>>(),
                payment_mode_ids: args.payment_mode.into_iter().collect::<BTreeSet<_>>(),
                search_query: args.search,
                amount_query,
                page: args.page,
                page_size: args.page_size,
            };
            let compiled = compile_filter(&filter, &config.pagination)?;

            print_json(&ExpenseListOutput {
                page: list_expenses(session, &compiled, connection)?,
                filtered_total: total_expenses(session, &compiled, connection)?,
            })
        }
        ExpenseCommand::Update {
            id,
            category,
            payment_mode,
            amount,
            date,
            remark,
        } => {
            let update = ExpenseUpdate {
                category_id: category,
                payment_mode_id: payment_mode,
                amount,
                date,
                remark,
            };

            print_json(&update_expense(session, id, update, connection)?)
        }
        ExpenseCommand::Delete { id } => {
            delete_expense(session, id, connection)?;
            println!("Deleted expense {id}");
            Ok(())
        }
        ExpenseCommand::Top { limit } => print_json(&top_expenses(session, limit, connection)?),
    }
}

fn run_chart_command(
    args: ChartArgs,
    session: &Session,
    config: &CashbookConfig,
    connection: &Connection,
) -> Result<(), Box<dyn Error>> {
    let range = resolve_duration(
        args.duration,
        CustomRangeBounds {
            start: args.start,
            end: args.end,
        },
        local_today(&config.duration)?,
        &config.duration,
    )?;

    let (rows, subtitle) = match (args.by, args.book) {
        (GroupBy::Category, Some(book_id)) => {
            let book = get_book(session, book_id, connection)?;
            (
                monthly_totals_by_category(session, book.id, range, connection)?,
                format!("{}, {} by category", range, book.name),
            )
        }
        _ => (
            monthly_totals_by_book(session, range, connection)?,
            format!("{range} by book"),
        ),
    };

    let series = build_chart_series(&rows, &config.chart)?;
    let chart = stacked_bar_chart(
        &series,
        "Monthly Expenses",
        &subtitle,
        &config.chart.currency_code,
    );
    let json = serde_json::to_string_pretty(&chart)?;

    match args.output {
        Some(path) => {
            fs::write(&path, json)?;
            tracing::info!("Wrote chart to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
