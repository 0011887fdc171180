//! Offset pagination over any collection of entities.
//!
//! `paginate` turns the raw `sortBy` / `limit` / `page` / `populate` query
//! parameters into a bounded, ordered fetch against a `CollectionAccessor`
//! and wraps the rows in a `PageResult` envelope.
//!
//! Malformed pagination input is never an error: non-numeric or non-positive
//! `limit` and `page` values fall back to their defaults, and an absent
//! `sortBy` sorts by `createdAt`, newest first.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::filter::Filter;

pub const DEFAULT_LIMIT: u64 = 10;
pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_SORT_FIELD: &str = "createdAt";
pub const DEFAULT_SORT_DIRECTION: SortDirection = SortDirection::Desc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Only the exact token `desc` selects descending order.
    pub fn parse(token: &str) -> Self {
        if token == "desc" {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One `field:direction` pair of a multi-key sort. The field is the
/// client-facing name; accessors map it to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Pagination parameters as they arrive in the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationOptions {
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub limit: Option<String>,
    pub page: Option<String>,
    pub populate: Option<String>,
}

/// Fully resolved pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub order: Vec<SortKey>,
    pub limit: u64,
    pub page: u64,
    pub offset: u64,
    pub relations: Vec<String>,
}

impl PaginationOptions {
    /// Picks the pagination keys out of decoded query pairs. The first
    /// occurrence of a repeated key wins; unrelated keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "sortBy" => &mut options.sort_by,
                "limit" => &mut options.limit,
                "page" => &mut options.page,
                "populate" => &mut options.populate,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        options
    }

    pub fn resolve(&self) -> PageRequest {
        let limit = parse_positive(self.limit.as_deref(), DEFAULT_LIMIT);
        let page = parse_positive(self.page.as_deref(), DEFAULT_PAGE);
        PageRequest {
            order: parse_sort(self.sort_by.as_deref()),
            limit,
            page,
            offset: page.saturating_sub(1).saturating_mul(limit),
            relations: parse_relations(self.populate.as_deref()),
        }
    }
}

/// The page envelope returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub results: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub total_results: u64,
}

/// Read access to one entity collection: counting and paged fetching.
pub trait CollectionAccessor<T> {
    fn count(&self, filter: &Filter) -> impl Future<Output = Result<u64, AppError>> + Send;

    fn fetch(
        &self,
        filter: &Filter,
        order: &[SortKey],
        offset: u64,
        limit: u64,
        relations: &[String],
    ) -> impl Future<Output = Result<Vec<T>, AppError>> + Send;
}

/// Counts and fetches one page of `collection` matching `filter`.
///
/// The count and the fetch are independent reads issued concurrently; they are
/// not guaranteed to observe the same snapshot under concurrent writes.
/// Errors from the accessor are returned unchanged.
pub async fn paginate<T, C>(
    collection: &C,
    filter: &Filter,
    options: &PaginationOptions,
) -> Result<PageResult<T>, AppError>
where
    C: CollectionAccessor<T>,
{
    let request = options.resolve();
    let (total_results, results) = futures::try_join!(
        collection.count(filter),
        collection.fetch(
            filter,
            &request.order,
            request.offset,
            request.limit,
            &request.relations,
        )
    )?;

    Ok(PageResult {
        results,
        page: request.page,
        limit: request.limit,
        total_pages: total_pages(total_results, request.limit),
        total_results,
    })
}

/// Parses `field:direction[,field:direction...]`, preserving key order.
/// Pairs with an empty field are dropped; with nothing left the default
/// `createdAt DESC` applies.
pub fn parse_sort(raw: Option<&str>) -> Vec<SortKey> {
    let keys: Vec<SortKey> = raw
        .unwrap_or_default()
        .split(',')
        .filter_map(|pair| {
            let mut parts = pair.split(':');
            let field = parts.next().unwrap_or_default().trim();
            let direction = SortDirection::parse(parts.next().unwrap_or_default());
            (!field.is_empty()).then(|| SortKey::new(field, direction))
        })
        .collect();

    if keys.is_empty() {
        vec![SortKey::new(DEFAULT_SORT_FIELD, DEFAULT_SORT_DIRECTION)]
    } else {
        keys
    }
}

/// Returns the integer `raw` starts with when it is strictly positive, else `default`.
pub fn parse_positive(raw: Option<&str>, default: u64) -> u64 {
    match raw.and_then(parse_leading_int) {
        Some(value) if value > 0 => value.unsigned_abs(),
        _ => default,
    }
}

/// Splits a comma-separated relation list, ignoring blank entries.
pub fn parse_relations(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

pub fn total_pages(total_results: u64, limit: u64) -> u64 {
    if limit == 0 {
        return 0;
    }
    total_results.div_ceil(limit)
}

// Leading whitespace, an optional sign, then at least one digit; trailing
// garbage is ignored ("12abc" is 12, "2.5" is 2). Magnitudes beyond i64 clamp.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    // Only digits remain, so the parse can fail on overflow alone.
    let value: i64 = rest[..digits_len].parse().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}
