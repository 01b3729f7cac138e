/// One page sliced out of an ordered result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub rows: Vec<T>,
    pub total_count: u64,
    pub total_pages: u32,
}

/// Slice rows `[(page-1)*page_size, page*page_size)` out of `ordered`.
///
/// `total_pages` is at least 1 even for an empty set. A page past the end yields no
/// rows but still reports the real counts; clamping is the caller's job.
pub fn paginate<T>(ordered: Vec<T>, page: u32, page_size: u32) -> Paginated<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_count = ordered.len() as u64;
    let total_pages = u32::try_from(total_count.div_ceil(u64::from(page_size)))
        .unwrap_or(u32::MAX)
        .max(1);

    let start = (u64::from(page) - 1).saturating_mul(u64::from(page_size));
    let rows = if start >= total_count {
        Vec::new()
    } else {
        ordered
            .into_iter()
            .skip(start as usize)
            .take(page_size as usize)
            .collect()
    };

    Paginated { rows, total_count, total_pages }
}
