use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One "banner was disabled" event. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerDisableRecord {
    pub id: i64,
    pub banner_id: i64,
    pub banner_name: Option<String>,
    pub account_name: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub spend: Option<f64>,
    pub clicks: i64,
    pub shows: i64,
    /// Percent. None when the banner had no shows.
    pub ctr: Option<f64>,
    pub conversions: i64,
    /// Opaque, passed through unchanged. None means "not computable", not zero.
    pub roi: Option<f64>,
    pub reason: Option<String>,
}

/// A disable event as submitted by the disabling workflow, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDisableRecord {
    pub banner_id: i64,
    #[serde(default)]
    pub banner_name: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    /// Defaults to the time the writer receives the record.
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub spend: Option<f64>,
    #[serde(default)]
    pub clicks: i64,
    #[serde(default)]
    pub shows: i64,
    #[serde(default)]
    pub ctr: Option<f64>,
    #[serde(default)]
    pub conversions: i64,
    #[serde(default)]
    pub roi: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    BannerId,
    Spend,
    Clicks,
    Shows,
    Ctr,
    Conversions,
    Roi,
}

impl SortField {
    pub const ALL: [SortField; 8] = [
        SortField::CreatedAt,
        SortField::BannerId,
        SortField::Spend,
        SortField::Clicks,
        SortField::Shows,
        SortField::Ctr,
        SortField::Conversions,
        SortField::Roi,
    ];

    /// The field after this one, wrapping around. Drives the sort selector.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SortField::CreatedAt => "created_at",
            SortField::BannerId => "banner_id",
            SortField::Spend => "spend",
            SortField::Clicks => "clicks",
            SortField::Shows => "shows",
            SortField::Ctr => "ctr",
            SortField::Conversions => "conversions",
            SortField::Roi => "roi",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// The full parameter set of one logical query. Equal specs are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuerySpec {
    pub account_filter: Option<String>,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
}

impl QuerySpec {
    /// The account filter, with an empty string treated as "no filter".
    pub fn effective_account(&self) -> Option<&str> {
        self.account_filter.as_deref().filter(|a| !a.is_empty())
    }
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            account_filter: None,
            sort_field: SortField::default(),
            sort_order: SortOrder::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Wire form of a [`QuerySpec`]: the `/disabled` query string. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<SortField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

impl QueryParams {
    /// Apply defaults and validate. `page_size` above [`MAX_PAGE_SIZE`] is clamped.
    pub fn into_spec(self) -> Result<QuerySpec> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::BadRequest("page must be >= 1".to_string()));
        }
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(AppError::BadRequest("page_size must be > 0".to_string()));
        }
        Ok(QuerySpec {
            account_filter: self.account_filter.filter(|a| !a.is_empty()),
            sort_field: self.sort_field.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
            page,
            page_size: page_size.min(MAX_PAGE_SIZE),
        })
    }
}

impl From<&QuerySpec> for QueryParams {
    fn from(spec: &QuerySpec) -> Self {
        Self {
            page: Some(spec.page),
            page_size: Some(spec.page_size),
            account_filter: spec.effective_account().map(str::to_string),
            sort_field: Some(spec.sort_field),
            sort_order: Some(spec.sort_order),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Aggregates over the entire filtered set, never just one page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_spend: f64,
    pub total_clicks: i64,
    pub total_shows: i64,
    pub total_conversions: i64,
    pub total_banners: u64,
    /// Ratio of sums, in percent. 0 when there are no shows.
    pub avg_ctr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    #[serde(rename = "disabled")]
    pub rows: Vec<BannerDisableRecord>,
    #[serde(rename = "total")]
    pub total_count: u64,
    pub total_pages: u32,
    pub page: u32,
    pub page_size: u32,
    pub summary: SummaryStats,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountList {
    pub accounts: Vec<String>,
}
