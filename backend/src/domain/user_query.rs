//! Listing, filtering and pagination of accounts.

use serde::Serialize;
use utoipa::ToSchema;

use super::{Role, User};

/// Default page size.
pub const DEFAULT_LIMIT: u32 = 10;
/// Largest page size a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// Validated listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListQuery {
    page: u32,
    limit: u32,
    role: Option<Role>,
    search: Option<String>,
}

/// Errors raised for out-of-range listing parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserListQueryError {
    #[error("Page must be at least 1")]
    PageTooSmall,
    #[error("Limit must be between 1 and {max}")]
    LimitOutOfRange { max: u32 },
    #[error("Role must be one of: user, admin")]
    UnassignableRole,
}

impl UserListQueryError {
    /// Name of the query parameter the error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::PageTooSmall => "page",
            Self::LimitOutOfRange { .. } => "limit",
            Self::UnassignableRole => "role",
        }
    }
}

impl Default for UserListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            role: None,
            search: None,
        }
    }
}

impl UserListQuery {
    /// Build a query, applying defaults to omitted values.
    ///
    /// Blank search terms are treated as absent.
    pub fn new(
        page: Option<u32>,
        limit: Option<u32>,
        role: Option<Role>,
        search: Option<&str>,
    ) -> Result<Self, UserListQueryError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(UserListQueryError::PageTooSmall);
        }
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 || limit > MAX_LIMIT {
            return Err(UserListQueryError::LimitOutOfRange { max: MAX_LIMIT });
        }
        if role.is_some_and(|r| !r.is_assignable()) {
            return Err(UserListQueryError::UnassignableRole);
        }
        let search = search
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_owned);
        Ok(Self {
            page,
            limit,
            role,
            search,
        })
    }

    /// One-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Page size.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Role filter.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Case-insensitive substring matched against name or email.
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Whether `user` satisfies the role filter and search term.
    pub fn matches(&self, user: &User) -> bool {
        let role_ok = self.role.is_none_or(|role| role == user.role());
        let search_ok = self.search.as_deref().is_none_or(|term| {
            let needle = term.to_lowercase();
            user.name().as_ref().to_lowercase().contains(&needle)
                || user.email().as_ref().contains(&needle)
        });
        role_ok && search_ok
    }
}

/// One page of accounts plus the total number of matches.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: u64,
}

/// Pagination metadata returned alongside a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Derive page counts for `query` given `total` matches.
    ///
    /// # Examples
    /// ```
    /// use warden::domain::{Pagination, UserListQuery};
    ///
    /// let query = UserListQuery::new(Some(2), Some(10), None, None).expect("valid query");
    /// let meta = Pagination::new(&query, 25);
    /// assert_eq!(meta.total_pages, 3);
    /// assert!(meta.has_next && meta.has_prev);
    /// ```
    pub fn new(query: &UserListQuery, total: u64) -> Self {
        let limit = u64::from(query.limit());
        let total_pages = total.div_ceil(limit);
        let page = u64::from(query.page());
        Self {
            page: query.page(),
            limit: query.limit(),
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}
