use sqlx::SqlitePool;

use crate::db::models::DisabledBannerRow;
use crate::error::Result;
use crate::query::sort_collated;
use crate::types::{BannerDisableRecord, NewDisableRecord};

const SELECT_COLUMNS: &str = r#"
    SELECT id, banner_id, banner_name, account_name, created_at,
           spend, clicks, shows, ctr, conversions, roi, reason
    FROM disabled_banners
"#;

/// Append-only store of disable events.
///
/// Every read is a single statement, so each call sees one consistent snapshot.
/// Two calls for the same query may drift by whatever was appended in between.
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All records, or only those whose `account_name` matches exactly.
    pub async fn snapshot(&self, account: Option<&str>) -> Result<Vec<BannerDisableRecord>> {
        let rows = match account {
            Some(account) => {
                sqlx::query_as::<_, DisabledBannerRow>(&format!(
                    "{SELECT_COLUMNS} WHERE account_name = ?"
                ))
                .bind(account)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DisabledBannerRow>(SELECT_COLUMNS)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(BannerDisableRecord::from).collect())
    }

    /// Distinct non-empty account names, collated.
    pub async fn accounts(&self) -> Result<Vec<String>> {
        let mut names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT account_name
            FROM disabled_banners
            WHERE account_name IS NOT NULL AND account_name <> ''
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        sort_collated(&mut names);
        Ok(names)
    }

    /// Append one record. `created_at` and `ctr` must already be resolved by the caller.
    pub async fn insert(&self, rec: &NewDisableRecord, created_at: i64, ctr: Option<f64>) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO disabled_banners (
                banner_id, banner_name, account_name, created_at,
                spend, clicks, shows, ctr, conversions, roi, reason
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(rec.banner_id)
        .bind(&rec.banner_name)
        .bind(&rec.account_name)
        .bind(created_at)
        .bind(rec.spend)
        .bind(rec.clicks)
        .bind(rec.shows)
        .bind(ctr)
        .bind(rec.conversions)
        .bind(rec.roi)
        .bind(&rec.reason)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}
