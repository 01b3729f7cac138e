//! Disabled-banner query engine: filter + sort, aggregate, paginate.
//! Everything here is synchronous and pure over a store snapshot.

pub mod aggregator;
pub mod pagination;
pub mod planner;

pub use aggregator::{aggregate, ctr_percent};
pub use pagination::{paginate, Paginated};
pub use planner::{plan, sort_collated};

use crate::types::{BannerDisableRecord, QuerySpec, ResultPage};

/// Answer one query against a snapshot. The summary covers the whole filtered set,
/// the rows only the requested page.
pub fn evaluate(snapshot: Vec<BannerDisableRecord>, spec: &QuerySpec) -> ResultPage {
    let ordered = plan(snapshot, spec);
    let summary = aggregate(&ordered);
    let Paginated { rows, total_count, total_pages } = paginate(ordered, spec.page, spec.page_size);

    ResultPage {
        rows,
        total_count,
        total_pages,
        page: spec.page,
        page_size: spec.page_size,
        summary,
    }
}
