use crate::types::BannerDisableRecord;

/// Row type for the `disabled_banners` table.
#[derive(Debug, sqlx::FromRow)]
pub struct DisabledBannerRow {
    pub id: i64,
    pub banner_id: i64,
    pub banner_name: Option<String>,
    pub account_name: Option<String>,
    pub created_at: i64,
    pub spend: Option<f64>,
    pub clicks: i64,
    pub shows: i64,
    pub ctr: Option<f64>,
    pub conversions: i64,
    pub roi: Option<f64>,
    pub reason: Option<String>,
}

impl From<DisabledBannerRow> for BannerDisableRecord {
    fn from(r: DisabledBannerRow) -> Self {
        Self {
            id: r.id,
            banner_id: r.banner_id,
            banner_name: r.banner_name,
            account_name: r.account_name,
            created_at: r.created_at,
            spend: r.spend,
            clicks: r.clicks,
            shows: r.shows,
            ctr: r.ctr,
            conversions: r.conversions,
            roi: r.roi,
            reason: r.reason,
        }
    }
}
