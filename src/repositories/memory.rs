//! An in-process store implementing every repository trait.
//!
//! Shares the sort-field and relation allow-lists, the `id` tie-breaker and
//! the absence of cascading deletes with the Postgres repositories. Nulls
//! sort last ascending and first descending, as in Postgres; text compares
//! bytewise rather than by collation. Timestamps are strictly increasing
//! within one store.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use super::{AuthorRepository, BookRepository, UserRepository};
use crate::error::AppError;
use crate::filter::{FieldValue, Filter};
use crate::models::{
    check_relations, sort_column, Author, Book, CreateAuthorInput, CreateBookInput, Entity,
    UpdateAuthorInput, UpdateBookInput, User,
};
use crate::pagination::{CollectionAccessor, SortDirection, SortKey};

#[derive(Debug, Default)]
struct Tables {
    authors: Vec<Author>,
    books: Vec<Book>,
    users: Vec<User>,
    last_author_id: i32,
    last_book_id: i32,
    last_user_id: i32,
    clock: Option<DateTime<Utc>>,
}

impl Tables {
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.clock {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.clock = Some(next);
        next
    }
}

/// Shared in-memory tables. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authors(&self) -> InMemoryAuthors {
        InMemoryAuthors { db: self.clone() }
    }

    pub fn books(&self) -> InMemoryBooks {
        InMemoryBooks { db: self.clone() }
    }

    pub fn users(&self) -> InMemoryUsers {
        InMemoryUsers { db: self.clone() }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::InternalServerError("In-memory store is poisoned".into()))
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryAuthors {
    db: InMemoryDatabase,
}

#[derive(Debug, Clone)]
pub struct InMemoryBooks {
    db: InMemoryDatabase,
}

#[derive(Debug, Clone)]
pub struct InMemoryUsers {
    db: InMemoryDatabase,
}

impl CollectionAccessor<Author> for InMemoryAuthors {
    async fn count(&self, filter: &Filter) -> Result<u64, AppError> {
        let tables = self.db.lock()?;
        Ok(count_matching(&tables.authors, filter))
    }

    async fn fetch(
        &self,
        filter: &Filter,
        order: &[SortKey],
        offset: u64,
        limit: u64,
        relations: &[String],
    ) -> Result<Vec<Author>, AppError> {
        check_relations::<Author>(relations)?;
        let tables = self.db.lock()?;
        let mut authors = select_page(&tables.authors, filter, order, offset, limit)?;
        if relations.iter().any(|relation| relation == "books") {
            for author in authors.iter_mut() {
                author.books = Some(books_of(&tables.books, author.id));
            }
        }
        Ok(authors)
    }
}

impl AuthorRepository for InMemoryAuthors {
    async fn find_by_id(&self, id: i32) -> Result<Option<Author>, AppError> {
        let tables = self.db.lock()?;
        Ok(tables.authors.iter().find(|author| author.id == id).cloned())
    }

    async fn email_taken(&self, email: &str, exclude_id: Option<i32>) -> Result<bool, AppError> {
        let tables = self.db.lock()?;
        Ok(tables
            .authors
            .iter()
            .any(|author| author.email == email && Some(author.id) != exclude_id))
    }

    async fn insert(&self, input: &CreateAuthorInput) -> Result<Author, AppError> {
        let mut tables = self.db.lock()?;
        let now = tables.tick();
        tables.last_author_id += 1;
        let author = Author {
            id: tables.last_author_id,
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email: input.email.clone(),
            created_at: now,
            updated_at: now,
            books: None,
        };
        tables.authors.push(author.clone());
        Ok(author)
    }

    async fn update(&self, id: i32, changes: &UpdateAuthorInput) -> Result<Option<Author>, AppError> {
        let mut tables = self.db.lock()?;
        let now = tables.tick();
        let Some(author) = tables.authors.iter_mut().find(|author| author.id == id) else {
            return Ok(None);
        };
        if let Some(first_name) = &changes.first_name {
            author.first_name = first_name.clone();
        }
        if let Some(last_name) = &changes.last_name {
            author.last_name = last_name.clone();
        }
        if let Some(email) = &changes.email {
            author.email = email.clone();
        }
        author.updated_at = now;
        Ok(Some(author.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let mut tables = self.db.lock()?;
        let before = tables.authors.len();
        tables.authors.retain(|author| author.id != id);
        Ok(tables.authors.len() < before)
    }
}

impl CollectionAccessor<Book> for InMemoryBooks {
    async fn count(&self, filter: &Filter) -> Result<u64, AppError> {
        let tables = self.db.lock()?;
        Ok(count_matching(&tables.books, filter))
    }

    async fn fetch(
        &self,
        filter: &Filter,
        order: &[SortKey],
        offset: u64,
        limit: u64,
        relations: &[String],
    ) -> Result<Vec<Book>, AppError> {
        check_relations::<Book>(relations)?;
        let tables = self.db.lock()?;
        let mut books = select_page(&tables.books, filter, order, offset, limit)?;
        if relations.iter().any(|relation| relation == "author") {
            for book in books.iter_mut() {
                book.author = tables
                    .authors
                    .iter()
                    .find(|author| author.id == book.author_id)
                    .cloned();
            }
        }
        Ok(books)
    }
}

impl BookRepository for InMemoryBooks {
    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, AppError> {
        let tables = self.db.lock()?;
        Ok(tables.books.iter().find(|book| book.id == id).cloned())
    }

    async fn isbn_taken(&self, isbn: &str, exclude_id: Option<i32>) -> Result<bool, AppError> {
        let tables = self.db.lock()?;
        Ok(tables
            .books
            .iter()
            .any(|book| book.isbn == isbn && Some(book.id) != exclude_id))
    }

    async fn insert(&self, input: &CreateBookInput) -> Result<Book, AppError> {
        let mut tables = self.db.lock()?;
        let now = tables.tick();
        tables.last_book_id += 1;
        let book = Book {
            id: tables.last_book_id,
            title: input.title.clone(),
            description: input.description.clone(),
            pages: input.pages,
            genre: input.genre.clone(),
            isbn: input.isbn.clone(),
            author_id: input.author_id,
            created_at: now,
            updated_at: now,
            author: None,
        };
        tables.books.push(book.clone());
        Ok(book)
    }

    async fn update(&self, id: i32, changes: &UpdateBookInput) -> Result<Option<Book>, AppError> {
        let mut tables = self.db.lock()?;
        let now = tables.tick();
        let Some(book) = tables.books.iter_mut().find(|book| book.id == id) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            book.title = title.clone();
        }
        if let Some(description) = &changes.description {
            book.description = description.clone();
        }
        if changes.pages.is_some() {
            book.pages = changes.pages;
        }
        if let Some(genre) = &changes.genre {
            book.genre = genre.clone();
        }
        if let Some(isbn) = &changes.isbn {
            book.isbn = isbn.clone();
        }
        if let Some(author_id) = changes.author_id {
            book.author_id = author_id;
        }
        book.updated_at = now;
        Ok(Some(book.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let mut tables = self.db.lock()?;
        let before = tables.books.len();
        tables.books.retain(|book| book.id != id);
        Ok(tables.books.len() < before)
    }
}

impl UserRepository for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.db.lock()?;
        Ok(tables.users.iter().find(|user| user.email == email).cloned())
    }

    async fn insert(&self, username: &str, email: &str, password_hash: &str) -> Result<User, AppError> {
        let mut tables = self.db.lock()?;
        let now = tables.tick();
        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}

fn count_matching<E: Entity>(rows: &[E], filter: &Filter) -> u64 {
    rows.iter().filter(|row| filter.matches(*row)).count() as u64
}

fn select_page<E: Entity + Clone>(
    rows: &[E],
    filter: &Filter,
    order: &[SortKey],
    offset: u64,
    limit: u64,
) -> Result<Vec<E>, AppError> {
    let columns = order
        .iter()
        .map(|key| sort_column::<E>(&key.field).map(|column| (column, key.direction)))
        .collect::<Result<Vec<_>, AppError>>()?;

    let mut matched: Vec<E> = rows.iter().filter(|row| filter.matches(*row)).cloned().collect();
    matched.sort_by(|a, b| {
        columns
            .iter()
            .map(|(column, direction)| {
                let ordering = compare_nulls_last(a.value_of(column), b.value_of(column));
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.id().cmp(&b.id()))
    });

    Ok(matched
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect())
}

fn compare_nulls_last(a: Option<FieldValue>, b: Option<FieldValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn books_of(books: &[Book], author_id: i32) -> Vec<Book> {
    let mut owned: Vec<Book> = books
        .iter()
        .filter(|book| book.author_id == author_id)
        .cloned()
        .collect();
    owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    owned
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn author_input(first_name: &str, email: &str) -> CreateAuthorInput {
        CreateAuthorInput {
            first_name: first_name.to_string(),
            last_name: "Writer".to_string(),
            email: email.to_string(),
        }
    }

    fn book_input(title: &str, isbn: &str, author_id: i32, pages: Option<i32>) -> CreateBookInput {
        CreateBookInput {
            title: title.to_string(),
            description: "A description long enough".to_string(),
            pages,
            genre: "fiction".to_string(),
            isbn: isbn.to_string(),
            author_id,
        }
    }

    fn titles(books: &[Book]) -> Vec<&str> {
        books.iter().map(|book| book.title.as_str()).collect()
    }

    #[actix_rt::test]
    async fn test_insert_assigns_ids_and_increasing_timestamps() {
        let db = InMemoryDatabase::new();
        let authors = db.authors();
        let first = authors.insert(&author_input("Ann", "ann@example.com")).await.unwrap();
        let second = authors.insert(&author_input("Bea", "bea@example.com")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(second.created_at > first.created_at);
    }

    #[actix_rt::test]
    async fn test_fetch_multi_key_sort_with_nulls_last() {
        let db = InMemoryDatabase::new();
        let books = db.books();
        books.insert(&book_input("B", "1111111111", 1, Some(100))).await.unwrap();
        books.insert(&book_input("A", "2222222222", 1, None)).await.unwrap();
        books.insert(&book_input("C", "3333333333", 1, Some(100))).await.unwrap();
        books.insert(&book_input("D", "4444444444", 1, Some(50))).await.unwrap();

        let order = vec![
            SortKey::new("pages", SortDirection::Asc),
            SortKey::new("title", SortDirection::Desc),
        ];
        let page = books.fetch(&Filter::new(), &order, 0, 10, &[]).await.unwrap();
        assert_eq!(titles(&page), vec!["D", "C", "B", "A"]);

        let newest_first = vec![SortKey::new("createdAt", SortDirection::Desc)];
        let page = books.fetch(&Filter::new(), &newest_first, 1, 2, &[]).await.unwrap();
        assert_eq!(titles(&page), vec!["C", "A"]);
    }

    #[actix_rt::test]
    async fn test_fetch_desc_puts_nulls_first_and_compares_bytes() {
        let db = InMemoryDatabase::new();
        let books = db.books();
        books.insert(&book_input("apple", "1111111111", 1, Some(100))).await.unwrap();
        books.insert(&book_input("Zebra", "2222222222", 1, Some(100))).await.unwrap();
        books.insert(&book_input("Blank", "3333333333", 1, None)).await.unwrap();
        books.insert(&book_input("Short", "4444444444", 1, Some(50))).await.unwrap();

        let order = vec![
            SortKey::new("pages", SortDirection::Desc),
            SortKey::new("title", SortDirection::Asc),
        ];
        let page = books.fetch(&Filter::new(), &order, 0, 10, &[]).await.unwrap();
        assert_eq!(titles(&page), vec!["Blank", "Zebra", "apple", "Short"]);
    }

    #[actix_rt::test]
    async fn test_fetch_filters_and_counts() {
        let db = InMemoryDatabase::new();
        let books = db.books();
        books.insert(&book_input("One", "1111111111", 1, None)).await.unwrap();
        books.insert(&book_input("Two", "2222222222", 2, None)).await.unwrap();
        books.insert(&book_input("Three", "3333333333", 1, None)).await.unwrap();

        let filter = Filter::new().eq("author_id", 1);
        assert_eq!(CollectionAccessor::<Book>::count(&books, &filter).await.unwrap(), 2);
        let order = vec![SortKey::new("id", SortDirection::Asc)];
        let page = books.fetch(&filter, &order, 0, 10, &[]).await.unwrap();
        assert_eq!(titles(&page), vec!["One", "Three"]);
    }

    #[actix_rt::test]
    async fn test_fetch_populates_relations_and_tolerates_orphans() {
        let db = InMemoryDatabase::new();
        let author = db.authors().insert(&author_input("Ann", "ann@example.com")).await.unwrap();
        let books = db.books();
        books.insert(&book_input("Owned", "1111111111", author.id, None)).await.unwrap();
        books.insert(&book_input("Orphan", "2222222222", 99, None)).await.unwrap();

        let order = vec![SortKey::new("id", SortDirection::Asc)];
        let relations = vec!["author".to_string()];
        let page = books.fetch(&Filter::new(), &order, 0, 10, &relations).await.unwrap();
        assert_eq!(page[0].author.as_ref().map(|a| a.id), Some(author.id));
        assert!(page[1].author.is_none());

        let relations = vec!["books".to_string()];
        let authors = db.authors().fetch(&Filter::new(), &order, 0, 10, &relations).await.unwrap();
        let owned = authors[0].books.as_ref().unwrap();
        assert_eq!(titles(owned), vec!["Owned"]);
    }

    #[actix_rt::test]
    async fn test_fetch_rejects_unknown_fields_and_relations() {
        let db = InMemoryDatabase::new();
        let books = db.books();
        let bad_sort = vec![SortKey::new("password", SortDirection::Asc)];
        assert!(matches!(
            books.fetch(&Filter::new(), &bad_sort, 0, 10, &[]).await,
            Err(AppError::BadRequest(_))
        ));

        let order = vec![SortKey::new("id", SortDirection::Asc)];
        let relations = vec!["publisher".to_string()];
        assert!(matches!(
            books.fetch(&Filter::new(), &order, 0, 10, &relations).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[actix_rt::test]
    async fn test_uniqueness_checks_exclude_current_row() {
        let db = InMemoryDatabase::new();
        let authors = db.authors();
        let ann = authors.insert(&author_input("Ann", "ann@example.com")).await.unwrap();

        assert!(authors.email_taken("ann@example.com", None).await.unwrap());
        assert!(!authors.email_taken("ann@example.com", Some(ann.id)).await.unwrap());
        assert!(!authors.email_taken("bea@example.com", None).await.unwrap());
    }

    #[actix_rt::test]
    async fn test_update_and_delete_missing_rows() {
        let db = InMemoryDatabase::new();
        let authors = db.authors();
        let changes = UpdateAuthorInput {
            first_name: Some("Zed".to_string()),
            ..Default::default()
        };
        assert!(authors.update(7, &changes).await.unwrap().is_none());
        assert!(!authors.delete(7).await.unwrap());
    }
}
