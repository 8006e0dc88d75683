//! Domain types for the circulation desk: books and borrowers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Book identifier (caller-chosen, unique within a catalog)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(String);

impl BookId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BookId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Borrower identifier (caller-chosen, unique within a catalog)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A title held by the library, possibly in multiple copies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier
    pub id: BookId,

    /// Human-readable title
    pub title: String,

    /// Author name
    pub author: String,

    /// Total copies owned by the library
    pub quantity: u32,

    /// Active checkouts: borrower -> checkout timestamp.
    /// Invariant: len() <= quantity.
    #[serde(default)]
    pub checked_out_by: HashMap<UserId, DateTime<Utc>>,
}

impl Book {
    pub fn new(id: BookId, title: impl Into<String>, author: impl Into<String>, quantity: u32) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            quantity,
            checked_out_by: HashMap::new(),
        }
    }

    /// Number of copies currently on loan
    pub fn active_checkouts(&self) -> u32 {
        self.checked_out_by.len() as u32
    }

    /// Whether at least one copy is on the shelf
    pub fn available(&self) -> bool {
        self.active_checkouts() < self.quantity
    }
}

/// A registered borrower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borrower {
    /// Unique identifier
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Books currently held, each id at most once.
    /// Invariant: len() <= the catalog's checkout limit.
    #[serde(default)]
    pub held_books: Vec<BookId>,
}

impl Borrower {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            held_books: Vec::new(),
        }
    }

    /// Whether this borrower currently holds the given book
    pub fn holds(&self, book_id: &BookId) -> bool {
        self.held_books.contains(book_id)
    }
}
