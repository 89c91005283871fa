//! Query model for the list endpoints: ordering, pagination and filtering.
//!
//! Everything here is pure and store-agnostic: each construct renders both
//! an SQL fragment for the relational store and an in-memory equivalent for
//! mock repositories, so query semantics are defined exactly once.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{Chain, SafeApp};

/// Sortable fields of the chain list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOrderField {
    Relevance,
    Name,
}

impl ChainOrderField {
    fn column(self) -> &'static str {
        match self {
            ChainOrderField::Relevance => "relevance",
            ChainOrderField::Name => "name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordering of the chain list, parsed from the `ordering` query parameter.
///
/// The parameter is a comma-separated list of field names, each optionally
/// prefixed with `-` for descending order. Unknown fields are ignored; an
/// empty or absent parameter falls back to the default
/// `relevance asc, name asc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOrdering(Vec<(ChainOrderField, Direction)>);

impl Default for ChainOrdering {
    fn default() -> Self {
        ChainOrdering(vec![
            (ChainOrderField::Relevance, Direction::Asc),
            (ChainOrderField::Name, Direction::Asc),
        ])
    }
}

impl ChainOrdering {
    pub fn parse(param: Option<&str>) -> Self {
        let Some(param) = param else {
            return Self::default();
        };

        let fields: Vec<(ChainOrderField, Direction)> = param
            .split(',')
            .filter_map(|token| {
                let token = token.trim();
                let (direction, name) = match token.strip_prefix('-') {
                    Some(rest) => (Direction::Desc, rest),
                    None => (Direction::Asc, token),
                };
                match name {
                    "relevance" => Some((ChainOrderField::Relevance, direction)),
                    "name" => Some((ChainOrderField::Name, direction)),
                    _ => None,
                }
            })
            .collect();

        if fields.is_empty() {
            Self::default()
        } else {
            ChainOrdering(fields)
        }
    }

    /// ORDER BY fragment built from the field whitelist only, never from
    /// raw request input.
    #[must_use]
    pub fn to_sql(&self) -> String {
        self.0
            .iter()
            .map(|(field, direction)| {
                let dir = match direction {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                };
                format!("{} {}", field.column(), dir)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// In-memory comparator with the same semantics as [`Self::to_sql`].
    #[must_use]
    pub fn compare(&self, a: &Chain, b: &Chain) -> Ordering {
        for (field, direction) in &self.0 {
            let ordering = match field {
                ChainOrderField::Relevance => a.relevance.cmp(&b.relevance),
                ChainOrderField::Name => a.name.cmp(&b.name),
            };
            let ordering = match direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    pub fn sort(&self, chains: &mut [Chain]) {
        chains.sort_by(|a, b| self.compare(a, b));
    }
}

/// Limit/offset page window with the clamping rules of the chain list:
/// default page size 10, maximum 100. Oversized requests are clamped, never
/// rejected; malformed values fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    #[must_use]
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, Self::MAX_LIMIT),
            offset: offset.max(0),
        }
    }

    /// Lenient parse of the raw query values.
    #[must_use]
    pub fn from_query(limit: Option<&str>, offset: Option<&str>) -> Self {
        let limit = limit
            .and_then(|value| value.parse::<i64>().ok())
            .filter(|parsed| *parsed > 0)
            .unwrap_or(Self::DEFAULT_LIMIT);
        let offset = offset
            .and_then(|value| value.parse::<i64>().ok())
            .filter(|parsed| *parsed >= 0)
            .unwrap_or(0);
        Self::new(limit, offset)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, 0)
    }
}

/// Paginated response envelope: total count plus ready-made next/previous
/// page URLs so clients iterate without re-deriving offsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    #[must_use]
    pub fn new(
        count: u64,
        results: Vec<T>,
        page: &PageRequest,
        path: &str,
        extra_query: &[(&str, String)],
    ) -> Self {
        let next = if page.offset + page.limit < count as i64 {
            Some(page_url(path, page.limit, page.offset + page.limit, extra_query))
        } else {
            None
        };
        let previous = if page.offset > 0 {
            Some(page_url(
                path,
                page.limit,
                (page.offset - page.limit).max(0),
                extra_query,
            ))
        } else {
            None
        };

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

fn page_url(path: &str, limit: i64, offset: i64, extra_query: &[(&str, String)]) -> String {
    let mut url = format!("{path}?limit={limit}&offset={offset}");
    for (key, value) in extra_query {
        url.push('&');
        url.push_str(key);
        url.push('=');
        url.push_str(value);
    }
    url
}

/// Visibility-scoped safe app filter.
///
/// The `chainId` parameter is applied only when it consists solely of
/// decimal digits; anything else silently skips the filter so malformed
/// client input degrades to the unfiltered listing instead of an error.
/// Chain ids are compared as text, matching how they arrive in the query
/// string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafeAppFilter {
    All,
    OnChain(String),
}

impl SafeAppFilter {
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some(value) if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) => {
                SafeAppFilter::OnChain(value.to_string())
            }
            Some(value) => {
                debug!(chain_id = %value, "ignoring non-numeric chainId filter");
                SafeAppFilter::All
            }
            None => SafeAppFilter::All,
        }
    }

    /// The digit-validated chain id text, if the filter is active.
    #[must_use]
    pub fn chain_id_text(&self) -> Option<&str> {
        match self {
            SafeAppFilter::All => None,
            SafeAppFilter::OnChain(id) => Some(id),
        }
    }

    #[must_use]
    pub fn matches(&self, app: &SafeApp) -> bool {
        match self {
            SafeAppFilter::All => true,
            SafeAppFilter::OnChain(id) => {
                app.chain_ids.iter().any(|chain_id| chain_id.to_string() == *id)
            }
        }
    }
}
