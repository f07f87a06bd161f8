use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use cashbook::{
    BookName, CategoryName, NewBook, NewExpense, NewUser, PaymentModeName, Session, Username,
    create_book, create_category, create_expense, create_payment_mode, initialize_db,
    register_user,
};

/// A utility for creating a test database for cashbook.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// How many months of expenses to generate, ending this month.
    #[arg(long, default_value_t = 6)]
    months: i64,
}

const BOOKS: [(&str, &str, &[&str]); 2] = [
    (
        "Household",
        "Day to day spending at home",
        &["Groceries", "Rent", "Utilities", "Dining Out"],
    ),
    ("Travel", "Trips and commuting", &["Fuel", "Tickets", "Hotels"]),
];

const PAYMENT_MODES: [&str; 3] = ["Cash", "Card", "UPI"];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let user = register_user(
        NewUser {
            username: Username::new("test")?,
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
            email: "test@example.com".to_owned(),
        },
        &conn,
    )?;
    let mut session = Session::log_in(&user);

    let payment_mode_ids = PAYMENT_MODES
        .iter()
        .map(|name| {
            create_payment_mode(&session, PaymentModeName::new(name)?, &conn).map(|mode| mode.id)
        })
        .collect::<Result<Vec<_>, _>>()?;

    println!("Creating books and expenses...");

    let today = OffsetDateTime::now_utc().date();
    let days = args.months.max(1) * 30;
    let mut expense_count = 0;

    for (book_index, (name, description, categories)) in BOOKS.iter().enumerate() {
        let book = create_book(
            &session,
            NewBook {
                name: BookName::new(name)?,
                description: description.to_string(),
            },
            &conn,
        )?;
        session.select_book(&book)?;

        let category_ids = categories
            .iter()
            .map(|category| {
                create_category(&session, book.id, CategoryName::new(category)?, &conn)
                    .map(|category| category.id)
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Deterministic spread of amounts, dates and labels.
        for i in 0..days {
            if (i + book_index as i64) % 3 != 0 {
                continue;
            }

            let category_index = (i as usize / 3) % category_ids.len();
            let amount = 150.0 + ((i * 37 + book_index as i64 * 101) % 2400) as f64;

            create_expense(
                &session,
                NewExpense {
                    category_id: category_ids[category_index],
                    payment_mode_id: payment_mode_ids[i as usize % payment_mode_ids.len()],
                    amount,
                    date: today - Duration::days(i),
                    remark: format!("{} #{}", categories[category_index], i / 3 + 1),
                },
                &conn,
            )?;
            expense_count += 1;
        }
    }

    session.log_out();

    println!("Created {expense_count} expenses for user \"test\".");
    println!("Success!");

    Ok(())
}
