//! In-memory circulation desk.
//!
//! Tracks books, borrowers, and active checkouts for the lifetime of the
//! process. Checkout state per (book, borrower) moves
//! Available -> CheckedOut -> Available; "overdue" is never stored, it is
//! derived from the checkout timestamp and the loan policy at the moment
//! an operation looks.
//!
//! Every operation that depends on the clock has an `*_at` form taking
//! the time explicitly; the plain form reads `Utc::now()`. All failures
//! are ordinary [`CatalogError`] values, reported by the caller.

pub mod book;
pub mod policy;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use book::{Book, BookId, Borrower, UserId};
pub use policy::LoanPolicy;

/// Registry of books and borrowers with checkout tracking
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// All titles, by book id
    books: HashMap<BookId, Book>,

    /// All registered borrowers, by user id
    borrowers: HashMap<UserId, Borrower>,

    /// Circulation limits
    #[serde(default)]
    policy: LoanPolicy,
}

impl Catalog {
    /// Create an empty catalog with the default loan policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty catalog with a custom loan policy
    pub fn with_policy(policy: LoanPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// The loan policy in effect
    pub fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    /// Add a new title to the catalog
    pub fn add_book(
        &mut self,
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        quantity: u32,
    ) -> Result<&Book, CatalogError> {
        if self.books.contains_key(&id) {
            return Err(CatalogError::BookExists { id });
        }
        let book = Book::new(id.clone(), title, author, quantity);
        debug!(book_id = %id, title = %book.title, quantity, "book added");
        Ok(self.books.entry(id).or_insert(book))
    }

    /// Remove a title. Fails while any copy is still on loan so the
    /// borrower records stay consistent with the shelf.
    pub fn remove_book(&mut self, id: &BookId) -> Result<Book, CatalogError> {
        let book = self
            .books
            .remove(id)
            .ok_or_else(|| CatalogError::BookNotFound { id: id.clone() })?;
        if book.active_checkouts() > 0 {
            let active = book.active_checkouts();
            // Put it back, the shelf is unchanged on failure
            self.books.insert(id.clone(), book);
            return Err(CatalogError::BookInCirculation {
                id: id.clone(),
                active,
            });
        }
        debug!(book_id = %id, "book removed");
        Ok(book)
    }

    /// Register a new borrower
    pub fn register_user(
        &mut self,
        id: UserId,
        name: impl Into<String>,
    ) -> Result<&Borrower, CatalogError> {
        if self.borrowers.contains_key(&id) {
            return Err(CatalogError::UserExists { id });
        }
        let borrower = Borrower::new(id.clone(), name);
        debug!(user_id = %id, name = %borrower.name, "borrower registered");
        Ok(self.borrowers.entry(id).or_insert(borrower))
    }

    /// Look up a book
    pub fn book(&self, id: &BookId) -> Option<&Book> {
        self.books.get(id)
    }

    /// Look up a borrower
    pub fn borrower(&self, id: &UserId) -> Option<&Borrower> {
        self.borrowers.get(id)
    }

    /// All books, sorted by id for stable display
    pub fn books(&self) -> Vec<&Book> {
        let mut books: Vec<_> = self.books.values().collect();
        books.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        books
    }

    /// Check a book out to a borrower, due after the policy's loan window
    pub fn checkout(&mut self, user_id: &UserId, book_id: &BookId) -> Result<CheckoutReceipt, CatalogError> {
        self.checkout_at(user_id, book_id, Utc::now())
    }

    /// Check a book out at an explicit clock reading
    pub fn checkout_at(
        &mut self,
        user_id: &UserId,
        book_id: &BookId,
        now: DateTime<Utc>,
    ) -> Result<CheckoutReceipt, CatalogError> {
        let borrower = self
            .borrowers
            .get(user_id)
            .ok_or_else(|| CatalogError::UserNotFound { id: user_id.clone() })?;
        let book = self
            .books
            .get(book_id)
            .ok_or_else(|| CatalogError::BookNotFound { id: book_id.clone() })?;

        if borrower.held_books.len() >= self.policy.checkout_limit {
            return Err(CatalogError::CheckoutLimit {
                limit: self.policy.checkout_limit,
            });
        }
        if borrower.holds(book_id) {
            return Err(CatalogError::AlreadyCheckedOut {
                user_id: user_id.clone(),
                book_id: book_id.clone(),
            });
        }
        if !book.available() {
            return Err(CatalogError::NoCopiesAvailable { id: book_id.clone() });
        }

        let due_at = now + self.policy.loan_period();
        let book = self
            .books
            .get_mut(book_id)
            .ok_or_else(|| CatalogError::BookNotFound { id: book_id.clone() })?;
        book.checked_out_by.insert(user_id.clone(), now);
        let title = book.title.clone();
        let borrower = self
            .borrowers
            .get_mut(user_id)
            .ok_or_else(|| CatalogError::UserNotFound { id: user_id.clone() })?;
        borrower.held_books.push(book_id.clone());

        debug!(user_id = %user_id, book_id = %book_id, %due_at, "checkout");
        Ok(CheckoutReceipt {
            title,
            borrower: borrower.name.clone(),
            due_at,
        })
    }

    /// Return a book, settling any fine accrued past the due date
    pub fn return_book(&mut self, user_id: &UserId, book_id: &BookId) -> Result<ReturnReceipt, CatalogError> {
        self.return_book_at(user_id, book_id, Utc::now())
    }

    /// Return a book at an explicit clock reading
    pub fn return_book_at(
        &mut self,
        user_id: &UserId,
        book_id: &BookId,
        now: DateTime<Utc>,
    ) -> Result<ReturnReceipt, CatalogError> {
        if !self.borrowers.contains_key(user_id) {
            return Err(CatalogError::UserNotFound { id: user_id.clone() });
        }
        let book = self
            .books
            .get_mut(book_id)
            .ok_or_else(|| CatalogError::BookNotFound { id: book_id.clone() })?;
        let checked_out_at = book
            .checked_out_by
            .remove(user_id)
            .ok_or_else(|| CatalogError::NotCheckedOut {
                user_id: user_id.clone(),
                book_id: book_id.clone(),
            })?;
        let title = book.title.clone();

        let borrower = self
            .borrowers
            .get_mut(user_id)
            .ok_or_else(|| CatalogError::UserNotFound { id: user_id.clone() })?;
        borrower.held_books.retain(|held| held != book_id);

        let fine_dollars = self.policy.fine_dollars(checked_out_at, now);
        debug!(user_id = %user_id, book_id = %book_id, fine_dollars, "return");
        Ok(ReturnReceipt {
            title,
            borrower: borrower.name.clone(),
            fine_dollars,
        })
    }

    /// List a borrower's overdue books with per-book and total fines
    pub fn list_overdue(&self, user_id: &UserId) -> Result<OverdueReport, CatalogError> {
        self.list_overdue_at(user_id, Utc::now())
    }

    /// List overdue books at an explicit clock reading. Pure: no mutation.
    pub fn list_overdue_at(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<OverdueReport, CatalogError> {
        let borrower = self
            .borrowers
            .get(user_id)
            .ok_or_else(|| CatalogError::UserNotFound { id: user_id.clone() })?;

        let mut entries = Vec::new();
        let mut total_fine_dollars = 0;
        for book_id in &borrower.held_books {
            // Held ids always reference a live checkout record
            let Some(book) = self.books.get(book_id) else {
                continue;
            };
            let Some(&checked_out_at) = book.checked_out_by.get(user_id) else {
                continue;
            };
            // A loan is overdue the moment the due date passes, even
            // before a whole day has accrued and the fine is still $0
            let due_at = checked_out_at + self.policy.loan_period();
            if now > due_at {
                let fine = self.policy.fine_dollars(checked_out_at, now);
                total_fine_dollars += fine;
                entries.push(OverdueEntry {
                    book_id: book_id.clone(),
                    title: book.title.clone(),
                    days_overdue: (now - due_at).num_days() as u32,
                    fine_dollars: fine,
                });
            }
        }

        Ok(OverdueReport {
            entries,
            total_fine_dollars,
        })
    }

    /// Restart the loan window for a timely checkout
    pub fn extend_due_date(&mut self, user_id: &UserId, book_id: &BookId) -> Result<CheckoutReceipt, CatalogError> {
        self.extend_due_date_at(user_id, book_id, Utc::now())
    }

    /// Restart the loan window at an explicit clock reading.
    ///
    /// Fails once the loan is already overdue; a successful extension only
    /// refreshes the checkout timestamp, the borrower's held list is
    /// untouched.
    pub fn extend_due_date_at(
        &mut self,
        user_id: &UserId,
        book_id: &BookId,
        now: DateTime<Utc>,
    ) -> Result<CheckoutReceipt, CatalogError> {
        let borrower_name = self
            .borrowers
            .get(user_id)
            .ok_or_else(|| CatalogError::UserNotFound { id: user_id.clone() })?
            .name
            .clone();
        let book = self
            .books
            .get_mut(book_id)
            .ok_or_else(|| CatalogError::BookNotFound { id: book_id.clone() })?;

        let checked_out_at = book
            .checked_out_by
            .get_mut(user_id)
            .ok_or_else(|| CatalogError::NotCheckedOut {
                user_id: user_id.clone(),
                book_id: book_id.clone(),
            })?;
        if now > *checked_out_at + self.policy.loan_period() {
            return Err(CatalogError::PastDue {
                user_id: user_id.clone(),
                book_id: book_id.clone(),
            });
        }

        *checked_out_at = now;
        let due_at = now + self.policy.loan_period();
        debug!(user_id = %user_id, book_id = %book_id, %due_at, "due date extended");
        Ok(CheckoutReceipt {
            title: book.title.clone(),
            borrower: borrower_name,
            due_at,
        })
    }
}

/// Outcome of a successful checkout or extension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    /// Title of the book
    pub title: String,

    /// Borrower display name
    pub borrower: String,

    /// When the loan becomes overdue
    pub due_at: DateTime<Utc>,
}

/// Outcome of a successful return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnReceipt {
    /// Title of the book
    pub title: String,

    /// Borrower display name
    pub borrower: String,

    /// Fine settled at return, in whole dollars (0 when on time)
    pub fine_dollars: u32,
}

impl ReturnReceipt {
    /// Whether the return happened past the due date
    pub fn was_overdue(&self) -> bool {
        self.fine_dollars > 0
    }
}

/// One overdue loan in an [`OverdueReport`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueEntry {
    /// Book identifier
    pub book_id: BookId,

    /// Title of the book
    pub title: String,

    /// Whole days past the due date
    pub days_overdue: u32,

    /// Accrued fine in whole dollars
    pub fine_dollars: u32,
}

/// Overdue listing for one borrower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueReport {
    /// Overdue loans, in the order the books were checked out
    pub entries: Vec<OverdueEntry>,

    /// Sum of per-book fines, in whole dollars
    pub total_fine_dollars: u32,
}

impl OverdueReport {
    /// Whether nothing is overdue
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Circulation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Book ID already exists: {id}")]
    BookExists { id: BookId },

    #[error("Book ID not found in catalog: {id}")]
    BookNotFound { id: BookId },

    #[error("Book {id} still has {active} active checkout(s)")]
    BookInCirculation { id: BookId, active: u32 },

    #[error("User ID already exists: {id}")]
    UserExists { id: UserId },

    #[error("User ID not found: {id}")]
    UserNotFound { id: UserId },

    #[error("User has reached the maximum limit of {limit} checked-out books")]
    CheckoutLimit { limit: usize },

    #[error("Book {book_id} already checked out by user {user_id}")]
    AlreadyCheckedOut { user_id: UserId, book_id: BookId },

    #[error("Book {id} not available for checkout")]
    NoCopiesAvailable { id: BookId },

    #[error("User {user_id} hasn't checked out book {book_id}")]
    NotCheckedOut { user_id: UserId, book_id: BookId },

    #[error("Cannot extend due date for book {book_id}: already overdue for user {user_id}")]
    PastDue { user_id: UserId, book_id: BookId },
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn seeded() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .add_book(BookId::from("1"), "The White Tiger", "Aravind Adiga", 5)
            .unwrap();
        catalog
            .add_book(BookId::from("2"), "Midnight's Children", "Salman Rushdie", 3)
            .unwrap();
        catalog.register_user(UserId::from("101"), "ekta").unwrap();
        catalog.register_user(UserId::from("102"), "isha").unwrap();
        catalog
    }

    #[test]
    fn test_add_duplicate_book() {
        let mut catalog = seeded();
        let result = catalog.add_book(BookId::from("1"), "Dup", "Nobody", 1);
        assert!(matches!(result, Err(CatalogError::BookExists { .. })));
    }

    #[test]
    fn test_register_duplicate_user() {
        let mut catalog = seeded();
        let result = catalog.register_user(UserId::from("101"), "dup");
        assert!(matches!(result, Err(CatalogError::UserExists { .. })));
    }

    #[test]
    fn test_remove_book_twice() {
        let mut catalog = seeded();
        assert!(catalog.remove_book(&BookId::from("2")).is_ok());
        let second = catalog.remove_book(&BookId::from("2"));
        assert!(matches!(second, Err(CatalogError::BookNotFound { .. })));
    }

    #[test]
    fn test_remove_book_in_circulation() {
        let mut catalog = seeded();
        catalog
            .checkout(&UserId::from("101"), &BookId::from("1"))
            .unwrap();

        let result = catalog.remove_book(&BookId::from("1"));
        assert_eq!(
            result,
            Err(CatalogError::BookInCirculation {
                id: BookId::from("1"),
                active: 1,
            })
        );

        // Returning the copy unblocks removal
        catalog
            .return_book(&UserId::from("101"), &BookId::from("1"))
            .unwrap();
        assert!(catalog.remove_book(&BookId::from("1")).is_ok());
    }

    #[test]
    fn test_checkout_unknown_ids() {
        let mut catalog = seeded();
        assert!(matches!(
            catalog.checkout(&UserId::from("999"), &BookId::from("1")),
            Err(CatalogError::UserNotFound { .. })
        ));
        assert!(matches!(
            catalog.checkout(&UserId::from("101"), &BookId::from("999")),
            Err(CatalogError::BookNotFound { .. })
        ));
    }

    #[test]
    fn test_checkout_limit() {
        let mut catalog = seeded();
        catalog
            .add_book(BookId::from("3"), "The Guide", "R.K. Narayan", 4)
            .unwrap();
        catalog
            .add_book(BookId::from("4"), "Train to Pakistan", "Khushwant Singh", 2)
            .unwrap();

        let user = UserId::from("101");
        for id in ["1", "2", "3"] {
            catalog.checkout(&user, &BookId::from(id)).unwrap();
        }
        let result = catalog.checkout(&user, &BookId::from("4"));
        assert_eq!(result, Err(CatalogError::CheckoutLimit { limit: 3 }));
    }

    #[test]
    fn test_checkout_same_book_twice() {
        let mut catalog = seeded();
        let user = UserId::from("101");
        catalog.checkout(&user, &BookId::from("1")).unwrap();
        let result = catalog.checkout(&user, &BookId::from("1"));
        assert!(matches!(result, Err(CatalogError::AlreadyCheckedOut { .. })));
    }

    #[test]
    fn test_checkout_exhausted_quantity() {
        let mut catalog = seeded();
        catalog
            .add_book(BookId::from("single"), "Rare Folio", "Anon", 1)
            .unwrap();
        catalog
            .checkout(&UserId::from("101"), &BookId::from("single"))
            .unwrap();

        let result = catalog.checkout(&UserId::from("102"), &BookId::from("single"));
        assert!(matches!(result, Err(CatalogError::NoCopiesAvailable { .. })));
    }

    #[test]
    fn test_same_day_return_has_no_fine() {
        let mut catalog = seeded();
        let user = UserId::from("101");
        catalog.checkout(&user, &BookId::from("1")).unwrap();

        let receipt = catalog.return_book(&user, &BookId::from("1")).unwrap();
        assert_eq!(receipt.fine_dollars, 0);
        assert!(!receipt.was_overdue());
        assert!(catalog.book(&BookId::from("1")).unwrap().available());
        assert!(!catalog.borrower(&user).unwrap().holds(&BookId::from("1")));
    }

    #[test]
    fn test_return_never_checked_out() {
        let mut catalog = seeded();
        let result = catalog.return_book(&UserId::from("101"), &BookId::from("1"));
        assert!(matches!(result, Err(CatalogError::NotCheckedOut { .. })));
    }

    #[test]
    fn test_late_return_fine() {
        let mut catalog = seeded();
        let user = UserId::from("101");
        let book = BookId::from("1");
        let now = Utc::now();

        catalog
            .checkout_at(&user, &book, now - Duration::days(20))
            .unwrap();
        let receipt = catalog.return_book_at(&user, &book, now).unwrap();
        // 20 days out on a 14-day window: 6 days overdue
        assert_eq!(receipt.fine_dollars, 6);
        assert!(receipt.was_overdue());
    }

    #[test]
    fn test_overdue_listing() {
        let mut catalog = seeded();
        let user = UserId::from("101");
        let now = Utc::now();

        catalog
            .checkout_at(&user, &BookId::from("1"), now - Duration::days(17))
            .unwrap();
        catalog
            .checkout_at(&user, &BookId::from("2"), now - Duration::days(2))
            .unwrap();

        let report = catalog.list_overdue_at(&user, now).unwrap();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].title, "The White Tiger");
        assert_eq!(report.entries[0].days_overdue, 3);
        assert_eq!(report.entries[0].fine_dollars, 3);
        assert_eq!(report.total_fine_dollars, 3);
    }

    #[test]
    fn test_overdue_listing_empty_for_idle_user() {
        let catalog = seeded();
        let report = catalog.list_overdue(&UserId::from("102")).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.total_fine_dollars, 0);
    }

    #[test]
    fn test_extend_resets_window_without_duplicating() {
        let mut catalog = seeded();
        let user = UserId::from("101");
        let book = BookId::from("1");
        let now = Utc::now();

        catalog
            .checkout_at(&user, &book, now - Duration::days(10))
            .unwrap();
        let receipt = catalog.extend_due_date_at(&user, &book, now).unwrap();
        assert_eq!(receipt.due_at, now + Duration::days(14));

        // Held list still has exactly one entry for the book
        let held = &catalog.borrower(&user).unwrap().held_books;
        assert_eq!(held.iter().filter(|id| **id == book).count(), 1);

        // And the refreshed loan is no longer near its due date
        let report = catalog
            .list_overdue_at(&user, now + Duration::days(10))
            .unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_extend_rejected_once_overdue() {
        let mut catalog = seeded();
        let user = UserId::from("101");
        let book = BookId::from("1");
        let now = Utc::now();

        catalog
            .checkout_at(&user, &book, now - Duration::days(15))
            .unwrap();
        let result = catalog.extend_due_date_at(&user, &book, now);
        assert!(matches!(result, Err(CatalogError::PastDue { .. })));
    }

    #[test]
    fn test_extend_requires_active_checkout() {
        let mut catalog = seeded();
        let result = catalog.extend_due_date(&UserId::from("101"), &BookId::from("1"));
        assert!(matches!(result, Err(CatalogError::NotCheckedOut { .. })));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut catalog = seeded();
        catalog
            .checkout(&UserId::from("101"), &BookId::from("1"))
            .unwrap();

        let json = serde_json::to_string(&catalog).unwrap();
        let restored: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.books().len(), 2);
        assert!(restored.borrower(&UserId::from("101")).unwrap().holds(&BookId::from("1")));
        assert_eq!(restored.book(&BookId::from("1")).unwrap().active_checkouts(), 1);
    }
}
