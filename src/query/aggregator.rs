use crate::query::planner::metric;
use crate::types::{BannerDisableRecord, SummaryStats};

/// Summary over every record in the filtered set, before pagination.
///
/// Float sums depend on addition order, so spend is summed in ascending `id` order
/// whatever order the caller sorted the records in.
pub fn aggregate(records: &[BannerDisableRecord]) -> SummaryStats {
    let mut spends: Vec<(i64, f64)> = records.iter().map(|r| (r.id, metric(r.spend))).collect();
    spends.sort_unstable_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut stats = SummaryStats {
        total_spend: spends.iter().fold(0.0, |acc, &(_, spend)| acc + spend),
        ..SummaryStats::default()
    };
    for r in records {
        stats.total_clicks = stats.total_clicks.saturating_add(r.clicks);
        stats.total_shows = stats.total_shows.saturating_add(r.shows);
        stats.total_conversions = stats.total_conversions.saturating_add(r.conversions);
    }
    stats.total_banners = records.len() as u64;
    stats.avg_ctr = ctr_percent(stats.total_clicks, stats.total_shows);
    stats
}

/// Clicks over shows, in percent. Zero shows yields 0.
///
/// Summary CTR must be computed from summed clicks and shows, never as a mean of
/// per-row CTRs: the mean over-weights low-traffic banners.
pub fn ctr_percent(clicks: i64, shows: i64) -> f64 {
    if shows > 0 {
        clicks as f64 / shows as f64 * 100.0
    } else {
        0.0
    }
}
