use std::cmp::Ordering;

use feruca::Collator;

use crate::types::{BannerDisableRecord, QuerySpec, SortField, SortOrder};

/// Filter a store snapshot by the query's account filter and sort it into a deterministic total order.
///
/// Ties on the primary field always fall back to ascending `id`, in both directions, so
/// page boundaries stay put across polls that only append rows.
pub fn plan(snapshot: Vec<BannerDisableRecord>, spec: &QuerySpec) -> Vec<BannerDisableRecord> {
    let mut rows: Vec<BannerDisableRecord> = match spec.effective_account() {
        Some(account) => snapshot
            .into_iter()
            .filter(|r| r.account_name.as_deref() == Some(account))
            .collect(),
        None => snapshot,
    };
    rows.sort_by(|a, b| compare(a, b, spec.sort_field, spec.sort_order));
    rows
}

pub fn compare(
    a: &BannerDisableRecord,
    b: &BannerDisableRecord,
    field: SortField,
    order: SortOrder,
) -> Ordering {
    let primary = match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::BannerId => a.banner_id.cmp(&b.banner_id),
        SortField::Spend => metric(a.spend).total_cmp(&metric(b.spend)),
        SortField::Clicks => a.clicks.cmp(&b.clicks),
        SortField::Shows => a.shows.cmp(&b.shows),
        SortField::Ctr => metric(a.ctr).total_cmp(&metric(b.ctr)),
        SortField::Conversions => a.conversions.cmp(&b.conversions),
        SortField::Roi => metric(a.roi).total_cmp(&metric(b.roi)),
    };
    let primary = match order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Missing metrics are zero for sorting and summing. NaN is treated as missing and
/// `-0.0` is folded into `0.0` so `total_cmp` cannot split them.
#[inline]
pub fn metric(value: Option<f64>) -> f64 {
    match value {
        Some(v) if !v.is_nan() => v + 0.0,
        _ => 0.0,
    }
}

/// Sort names with the Unicode Collation Algorithm over the CLDR root tailoring.
/// Case and accents only matter once the base letters tie, so `Ёлка` files
/// next to `Елка` rather than after `Я`.
pub fn sort_collated(names: &mut [String]) {
    let mut collator = Collator::default();
    names.sort_by(|a, b| collator.collate(a.as_str(), b.as_str()));
}
