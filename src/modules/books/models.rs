use std::fmt;

use serde::{Deserialize, Serialize};

/// Store-assigned identifier of a book
pub type BookId = i64;

/// Numeric ISBN; unique across the catalog
pub type Isbn = i64;

/// A persisted catalog entry.
///
/// Two books are equal when their ids are equal, whatever their fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier assigned on creation
    pub id: BookId,
    /// Unique numeric ISBN
    pub isbn: Isbn,
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Year the book was published
    pub publication_year: i32,
    /// Copies in stock
    pub stock_quantity: i32,
}

impl Book {
    pub fn new(id: BookId, fields: BookFields) -> Self {
        Self {
            id,
            isbn: fields.isbn,
            title: fields.title,
            author: fields.author,
            publication_year: fields.publication_year,
            stock_quantity: fields.stock_quantity,
        }
    }

    /// The business fields of this book, without its id.
    pub fn fields(&self) -> BookFields {
        BookFields {
            isbn: self.isbn,
            title: self.title.clone(),
            author: self.author.clone(),
            publication_year: self.publication_year,
            stock_quantity: self.stock_quantity,
        }
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Book {}

impl std::hash::Hash for Book {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Everything a book carries apart from its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFields {
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub stock_quantity: i32,
}

impl BookFields {
    /// Check every field constraint, reporting all violations at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check_not_blank("title", &self.title);
        errors.check_not_blank("author", &self.author);
        errors.check_positive("publicationYear", self.publication_year);
        errors.check_positive("stockQuantity", self.stock_quantity);
        errors.into_result()
    }
}

/// Request body for creating or replacing a book.
///
/// Fields are optional so that a missing field is reported as a
/// validation failure alongside any other violated constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    pub isbn: Option<Isbn>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_year: Option<i32>,
    pub stock_quantity: Option<i32>,
}

impl BookPayload {
    pub fn into_fields(self) -> Result<BookFields, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let isbn = errors.require("isbn", self.isbn);
        let title = errors.require("title", self.title);
        let author = errors.require("author", self.author);
        let publication_year = errors.require("publicationYear", self.publication_year);
        let stock_quantity = errors.require("stockQuantity", self.stock_quantity);

        if let Some(title) = &title {
            errors.check_not_blank("title", title);
        }
        if let Some(author) = &author {
            errors.check_not_blank("author", author);
        }
        if let Some(year) = publication_year {
            errors.check_positive("publicationYear", year);
        }
        if let Some(stock) = stock_quantity {
            errors.check_positive("stockQuantity", stock);
        }

        match (isbn, title, author, publication_year, stock_quantity) {
            (Some(isbn), Some(title), Some(author), Some(publication_year), Some(stock_quantity))
                if errors.is_empty() =>
            {
                Ok(BookFields {
                    isbn,
                    title,
                    author,
                    publication_year,
                    stock_quantity,
                })
            }
            _ => Err(errors),
        }
    }
}

impl From<BookFields> for BookPayload {
    fn from(fields: BookFields) -> Self {
        Self {
            isbn: Some(fields.isbn),
            title: Some(fields.title),
            author: Some(fields.author),
            publication_year: Some(fields.publication_year),
            stock_quantity: Some(fields.stock_quantity),
        }
    }
}

/// One violated field constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: &'static str,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Every constraint a book failed, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `field` has at least one violation.
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|violation| violation.field == field)
    }

    fn push(&mut self, field: &'static str, message: &'static str) {
        self.0.push(FieldViolation { field, message });
    }

    fn require<T>(&mut self, field: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(field, "is required");
        }
        value
    }

    fn check_not_blank(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "must not be blank");
        }
    }

    fn check_positive(&mut self, field: &'static str, value: i32) {
        if value <= 0 {
            self.push(field, "must be positive");
        }
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, violation) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}
