//! Command-line interface for circulate.
//!
//! Hosts the interactive loops the library crate deliberately does not
//! own: the password command feeds stdin candidates through the pure
//! checker, and the demo command drives a fixed circulation sequence,
//! printing every outcome.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::catalog::{BookId, Catalog, UserId};
use crate::password::PasswordRules;

/// circulate - Library circulation desk and password policy toolkit
#[derive(Parser, Debug)]
#[command(name = "circulate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate password candidates read from stdin until one passes
    Password {
        /// Username the password will be paired with
        username: String,

        /// Previously set passwords (most recent ones; at most the
        /// policy's history depth is kept)
        #[arg(long = "history")]
        history: Vec<String>,
    },

    /// Run the circulation demonstration sequence
    Demo {
        /// Also print the final catalog snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Password { username, history } => run_password_loop(&username, history),
            Commands::Demo { json } => run_demo(json),
        }
    }
}

/// Prompt for password candidates until one satisfies the policy.
///
/// The checker itself is pure; this loop owns the prompt, the retry, and
/// the bounded history.
fn run_password_loop(username: &str, mut history: Vec<String>) -> Result<()> {
    let rules = PasswordRules::default();
    // Only the most recent entries count against reuse
    if history.len() > rules.history_depth {
        let drop = history.len() - rules.history_depth;
        history.drain(..drop);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Enter password: ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next() else {
            anyhow::bail!("No password accepted before end of input");
        };
        let candidate = line.context("Failed to read password from stdin")?;

        match rules.validate(&candidate, username, &history) {
            Ok(()) => {
                info!(username, "password accepted");
                println!("Password successfully set.");
                return Ok(());
            }
            Err(violation) => {
                println!("Invalid password: {violation}");
            }
        }
    }
}

/// Drive the fixed demonstration sequence against a fresh catalog
fn run_demo(json: bool) -> Result<()> {
    let mut catalog = Catalog::new();

    // Adding some initial books to the catalog
    report(catalog.add_book(BookId::from("1"), "The White Tiger", "Aravind Adiga", 5).map(
        |book| format!("Book '{}' added to catalog.", book.title),
    ));
    report(
        catalog
            .add_book(BookId::from("2"), "Midnight's Children", "Salman Rushdie", 3)
            .map(|book| format!("Book '{}' added to catalog.", book.title)),
    );
    report(catalog.add_book(BookId::from("3"), "The Guide", "R.K. Narayan", 4).map(
        |book| format!("Book '{}' added to catalog.", book.title),
    ));

    // Registering some users
    report(
        catalog
            .register_user(UserId::from("101"), "ekta")
            .map(|user| format!("User '{}' registered.", user.name)),
    );
    report(
        catalog
            .register_user(UserId::from("102"), "isha")
            .map(|user| format!("User '{}' registered.", user.name)),
    );

    display_catalog(&catalog);

    // Checking out and returning books
    let loan_days = catalog.policy().loan_days;
    report(catalog.checkout(&UserId::from("101"), &BookId::from("1")).map(|receipt| {
        format!(
            "Book '{}' checked out by '{}'. Due in {} days.",
            receipt.title, receipt.borrower, loan_days
        )
    }));
    report(catalog.checkout(&UserId::from("102"), &BookId::from("2")).map(|receipt| {
        format!(
            "Book '{}' checked out by '{}'. Due in {} days.",
            receipt.title, receipt.borrower, loan_days
        )
    }));
    report(
        catalog
            .return_book(&UserId::from("101"), &BookId::from("1"))
            .map(|receipt| {
                if receipt.was_overdue() {
                    format!(
                        "Book '{}' returned by '{}' after due date. Fine: ${}.",
                        receipt.title, receipt.borrower, receipt.fine_dollars
                    )
                } else {
                    format!("Book '{}' returned by '{}'.", receipt.title, receipt.borrower)
                }
            }),
    );
    report(
        catalog
            .return_book(&UserId::from("102"), &BookId::from("2"))
            .map(|receipt| format!("Book '{}' returned by '{}'.", receipt.title, receipt.borrower)),
    );

    // Listing overdue books for a user
    report(catalog.checkout(&UserId::from("101"), &BookId::from("3")).map(|receipt| {
        format!(
            "Book '{}' checked out by '{}'. Due in {} days.",
            receipt.title, receipt.borrower, loan_days
        )
    }));
    report(catalog.checkout(&UserId::from("102"), &BookId::from("3")).map(|receipt| {
        format!(
            "Book '{}' checked out by '{}'. Due in {} days.",
            receipt.title, receipt.borrower, loan_days
        )
    }));
    match catalog.list_overdue(&UserId::from("101")) {
        Ok(report) if report.is_empty() => println!("No overdue books."),
        Ok(report) => {
            println!("\nOverdue Books:");
            for entry in &report.entries {
                println!("Title: {}, Fine: ${}", entry.title, entry.fine_dollars);
            }
            println!("Total Fine: ${}", report.total_fine_dollars);
        }
        Err(err) => println!("{err}"),
    }

    // Extending due date for a book
    report(
        catalog
            .extend_due_date(&UserId::from("101"), &BookId::from("3"))
            .map(|receipt| {
                format!(
                    "Due date extended for book '{}' for user '{}'.",
                    receipt.title, receipt.borrower
                )
            }),
    );

    if json {
        let snapshot =
            serde_json::to_string_pretty(&catalog).context("Failed to serialize catalog")?;
        println!("{snapshot}");
    }

    Ok(())
}

/// Print a human-readable outcome, success or failure
fn report(outcome: Result<String, crate::catalog::CatalogError>) {
    match outcome {
        Ok(message) => println!("{message}"),
        Err(err) => println!("{err}"),
    }
}

/// Print the catalog with derived availability, sorted by book id
fn display_catalog(catalog: &Catalog) {
    println!("\nCatalog:");
    for book in catalog.books() {
        let availability = if book.available() { "Available" } else { "Unavailable" };
        println!(
            "ID: {}, Title: {}, Author: {}, Availability: {}",
            book.id, book.title, book.author, availability
        );
    }
}
