use std::collections::HashMap;

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::{AuthorRepository, BookRepository, UserRepository};
use crate::error::AppError;
use crate::filter::{FieldValue, Filter};
use crate::models::{
    check_relations, sort_column, Author, Book, CreateAuthorInput, CreateBookInput, Entity,
    UpdateAuthorInput, UpdateBookInput, User,
};
use crate::pagination::{CollectionAccessor, SortKey};

/// Authors stored in Postgres.
#[derive(Debug, Clone)]
pub struct PgAuthorRepository {
    pool: PgPool,
}

impl PgAuthorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Books stored in Postgres.
#[derive(Debug, Clone)]
pub struct PgBookRepository {
    pool: PgPool,
}

impl PgBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CollectionAccessor<Author> for PgAuthorRepository {
    async fn count(&self, filter: &Filter) -> Result<u64, AppError> {
        count_rows::<Author>(&self.pool, filter).await
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
        let mut authors = fetch_rows::<Author>(&self.pool, filter, order, offset, limit).await?;
        if relations.iter().any(|relation| relation == "books") {
            attach_books(&self.pool, &mut authors).await?;
        }
        Ok(authors)
    }
}

impl AuthorRepository for PgAuthorRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Author>, AppError> {
        let author = sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(author)
    }

    async fn email_taken(&self, email: &str, exclude_id: Option<i32>) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM authors WHERE email = $1 AND ($2::INT4 IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn insert(&self, input: &CreateAuthorInput) -> Result<Author, AppError> {
        let author = sqlx::query_as::<_, Author>(
            "INSERT INTO authors (first_name, last_name, email)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .fetch_one(&self.pool)
        .await?;
        Ok(author)
    }

    async fn update(&self, id: i32, changes: &UpdateAuthorInput) -> Result<Option<Author>, AppError> {
        let author = sqlx::query_as::<_, Author>(
            "UPDATE authors
             SET first_name = COALESCE($1, first_name),
                 last_name = COALESCE($2, last_name),
                 email = COALESCE($3, email),
                 updated_at = NOW()
             WHERE id = $4
             RETURNING *",
        )
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.email)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl CollectionAccessor<Book> for PgBookRepository {
    async fn count(&self, filter: &Filter) -> Result<u64, AppError> {
        count_rows::<Book>(&self.pool, filter).await
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
        let mut books = fetch_rows::<Book>(&self.pool, filter, order, offset, limit).await?;
        if relations.iter().any(|relation| relation == "author") {
            attach_authors(&self.pool, &mut books).await?;
        }
        Ok(books)
    }
}

impl BookRepository for PgBookRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, AppError> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn isbn_taken(&self, isbn: &str, exclude_id: Option<i32>) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::INT4 IS NULL OR id <> $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn insert(&self, input: &CreateBookInput) -> Result<Book, AppError> {
        let book = sqlx::query_as::<_, Book>(
            "INSERT INTO books (title, description, pages, genre, isbn, author_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.pages)
        .bind(&input.genre)
        .bind(&input.isbn)
        .bind(input.author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(book)
    }

    async fn update(&self, id: i32, changes: &UpdateBookInput) -> Result<Option<Book>, AppError> {
        let book = sqlx::query_as::<_, Book>(
            "UPDATE books
             SET title = COALESCE($1, title),
                 description = COALESCE($2, description),
                 pages = COALESCE($3, pages),
                 genre = COALESCE($4, genre),
                 isbn = COALESCE($5, isbn),
                 author_id = COALESCE($6, author_id),
                 updated_at = NOW()
             WHERE id = $7
             RETURNING *",
        )
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.pages)
        .bind(&changes.genre)
        .bind(&changes.isbn)
        .bind(changes.author_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(&self, username: &str, email: &str, password_hash: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash)
             VALUES ($1, $2, $3)
             RETURNING id, username, email, password_hash, created_at",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}

async fn count_rows<E: Entity>(pool: &PgPool, filter: &Filter) -> Result<u64, AppError> {
    let mut query = count_query::<E>(filter);
    let total: i64 = query.build_query_scalar().fetch_one(pool).await?;
    Ok(u64::try_from(total).unwrap_or_default())
}

async fn fetch_rows<E>(
    pool: &PgPool,
    filter: &Filter,
    order: &[SortKey],
    offset: u64,
    limit: u64,
) -> Result<Vec<E>, AppError>
where
    E: Entity + for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut query = select_query::<E>(filter, order, offset, limit)?;
    let rows = query.build_query_as::<E>().fetch_all(pool).await?;
    Ok(rows)
}

fn count_query<E: Entity>(filter: &Filter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", E::TABLE));
    push_filter(&mut query, filter);
    query
}

fn select_query<E: Entity>(
    filter: &Filter,
    order: &[SortKey],
    offset: u64,
    limit: u64,
) -> Result<QueryBuilder<'static, Postgres>, AppError> {
    let mut query = QueryBuilder::new(format!("SELECT * FROM {}", E::TABLE));
    push_filter(&mut query, filter);
    push_order::<E>(&mut query, order)?;
    query
        .push(" LIMIT ")
        .push_bind(to_bind(limit))
        .push(" OFFSET ")
        .push_bind(to_bind(offset));
    Ok(query)
}

// Column names come from the allow-listed `Filter`; values are always bound.
fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    for (index, (column, value)) in filter.conditions().iter().enumerate() {
        query.push(if index == 0 { " WHERE " } else { " AND " });
        query.push(*column).push(" = ");
        match value {
            FieldValue::Int(value) => query.push_bind(*value),
            FieldValue::Text(value) => query.push_bind(value.clone()),
            FieldValue::Timestamp(value) => query.push_bind(*value),
        };
    }
}

// `id ASC` is appended as a final tie-breaker so equal sort keys page deterministically.
fn push_order<E: Entity>(query: &mut QueryBuilder<'_, Postgres>, order: &[SortKey]) -> Result<(), AppError> {
    let mut columns = Vec::with_capacity(order.len() + 1);
    for key in order {
        columns.push(format!("{} {}", sort_column::<E>(&key.field)?, key.direction.as_sql()));
    }
    if !order.iter().any(|key| matches!(sort_column::<E>(&key.field), Ok("id"))) {
        columns.push("id ASC".to_string());
    }
    query.push(" ORDER BY ").push(columns.join(", "));
    Ok(())
}

fn to_bind(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

async fn attach_authors(pool: &PgPool, books: &mut [Book]) -> Result<(), AppError> {
    let mut author_ids: Vec<i32> = books.iter().map(|book| book.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    if author_ids.is_empty() {
        return Ok(());
    }

    let authors: HashMap<i32, Author> =
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = ANY($1)")
            .bind(author_ids)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(|author| (author.id, author))
            .collect();

    for book in books.iter_mut() {
        book.author = authors.get(&book.author_id).cloned();
    }
    Ok(())
}

async fn attach_books(pool: &PgPool, authors: &mut [Author]) -> Result<(), AppError> {
    if authors.is_empty() {
        return Ok(());
    }
    let author_ids: Vec<i32> = authors.iter().map(|author| author.id).collect();

    let books = sqlx::query_as::<_, Book>(
        "SELECT * FROM books WHERE author_id = ANY($1) ORDER BY created_at, id",
    )
    .bind(author_ids)
    .fetch_all(pool)
    .await?;

    let mut by_author: HashMap<i32, Vec<Book>> = HashMap::new();
    for book in books {
        by_author.entry(book.author_id).or_default().push(book);
    }
    for author in authors.iter_mut() {
        author.books = Some(by_author.remove(&author.id).unwrap_or_default());
    }
    Ok(())
}
