use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime, macros::date};

use riconcilia_rs::{
    BankTransaction, Direction, LedgerAmount, LedgerEntry, LinkState, RuleDefinition,
    create_bank_transaction, create_category, create_ledger_entry, create_rule, create_user,
    create_venue, initialize_db,
};

/// A utility for creating a test database for the REST API server of riconcilia_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test venue and user...");
    let venue = create_venue("Bar Centrale", &conn)?;
    let user = create_user("test", venue.id, &conn)?;

    println!("Creating categories and rules...");
    let utilities = create_category("Utenze", venue.id, &conn)?;
    let takings = create_category("Incassi", venue.id, &conn)?;
    let transfers = create_category("Giroconti", venue.id, &conn)?;

    create_rule(
        venue.id,
        &RuleDefinition::new(Direction::Outflow, &["ENEL", "A2A"], utilities.id)
            .priority(1)
            .auto_verify(true),
        &conn,
    )?;
    create_rule(
        venue.id,
        &RuleDefinition::new(Direction::Inflow, &["POS", "SATISPAY"], takings.id).priority(2),
        &conn,
    )?;
    create_rule(
        venue.id,
        &RuleDefinition::new(Direction::Outflow, &["GIROCONTO"], transfers.id)
            .priority(1)
            .auto_hide(true),
        &conn,
    )?;

    println!("Creating ledger entries and bank transactions...");
    let now = OffsetDateTime::now_utc();
    let entries = [
        (LedgerAmount::Debit(45.0), date!(2024 - 03 - 09), "Bolletta ENEL ENERGIA"),
        (LedgerAmount::Credit(1_240.5), date!(2024 - 03 - 10), "Incasso POS sabato"),
        (LedgerAmount::Debit(500.0), date!(2024 - 03 - 11), "Giroconto a deposito"),
        (LedgerAmount::Debit(89.9), date!(2024 - 03 - 12), "Fornitura caffè"),
        (LedgerAmount::Debit(89.9), date!(2024 - 03 - 14), "Fornitura caffè"),
    ];

    for (i, (amount, date, description)) in entries.into_iter().enumerate() {
        create_ledger_entry(
            LedgerEntry::build(venue.id, amount, date, description)
                .created_at(now - Duration::minutes(i as i64)),
            &conn,
        )?;
    }

    let transactions = [
        (-45.0, date!(2024 - 03 - 10), "ADDEBITO SDD ENEL ENERGIA SPA"),
        (1_240.5, date!(2024 - 03 - 11), "ACCREDITO POS NEXI"),
        (-500.0, date!(2024 - 03 - 11), "GIROCONTO"),
        (-89.9, date!(2024 - 03 - 13), "BONIFICO TORREFAZIONE"),
        (-12.0, date!(2024 - 03 - 15), "COMMISSIONI TENUTA CONTO"),
    ];

    for (amount, date, description) in transactions {
        create_bank_transaction(
            BankTransaction::build(venue.id, amount, date, description),
            &conn,
        )?;
    }

    // One transaction that has already been through review.
    create_bank_transaction(
        BankTransaction::build(venue.id, -45.0, date!(2024 - 02 - 10), "ADDEBITO SDD ENEL")
            .link_state(LinkState::IGNORED),
        &conn,
    )?;

    println!(
        "Success! Send requests with the header 'x-user-id: {}' to act as the test user.",
        user.id
    );

    Ok(())
}
