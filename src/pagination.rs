use serde::Serialize;

/// Number of the last page, `ceil(total / per_page)`.
pub fn last_page(total: usize, per_page: usize) -> usize {
    total.div_ceil(per_page.max(1))
}

fn get_pages(
    total_pages: usize,
    current_page: usize,
    left_edge: usize,
    left_current: usize,
    right_current: usize,
    right_edge: usize,
) -> Vec<Option<usize>> {
    let last_page = total_pages;

    if last_page == 0 {
        return vec![];
    }

    let current_page = current_page.min(last_page);
    let mut pages = Vec::new();

    let left_end = (1 + left_edge).min(last_page + 1);
    pages.extend((1..left_end).map(Some));

    let mid_start = left_end.max(current_page.saturating_sub(left_current));
    let mid_end = current_page
        .saturating_add(right_current)
        .saturating_add(1)
        .min(last_page + 1);

    if mid_start > left_end {
        pages.push(None);
    }
    pages.extend((mid_start..mid_end).map(Some));

    let right_start = mid_end.max(last_page.saturating_sub(right_edge) + 1);

    if right_start > mid_end {
        pages.push(None);
    }
    pages.extend((right_start..=last_page).map(Some));

    pages
}

/// One page of results plus the numbers a pager should render.
///
/// `None` entries in `pages` stand for an ellipsis.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub last_page: usize,
    pub pages: Vec<Option<usize>>,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, current_page: usize, total: usize, per_page: usize) -> Self {
        let current_page = if current_page == 0 { 1 } else { current_page };
        let total_pages = last_page(total, per_page);

        let pages = get_pages(total_pages, current_page, 2, 2, 4, 2);

        Self {
            items,
            total,
            page: current_page,
            last_page: total_pages,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_rounds_up() {
        assert_eq!(last_page(0, 50), 0);
        assert_eq!(last_page(50, 50), 1);
        assert_eq!(last_page(51, 50), 2);
        assert_eq!(last_page(7, 0), 7);
    }

    #[test]
    fn pager_collapses_distant_pages() {
        let page = Paginated::new(Vec::<u8>::new(), 10, 1000, 50);
        assert_eq!(page.last_page, 20);
        assert_eq!(
            page.pages,
            vec![
                Some(1),
                Some(2),
                None,
                Some(8),
                Some(9),
                Some(10),
                Some(11),
                Some(12),
                Some(13),
                Some(14),
                None,
                Some(19),
                Some(20)
            ]
        );
    }

    #[test]
    fn small_result_lists_every_page() {
        let page = Paginated::new(vec![1, 2, 3], 1, 3, 2);
        assert_eq!(page.pages, vec![Some(1), Some(2)]);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn page_far_past_the_end_keeps_edges() {
        let page = Paginated::new(vec![0u8; 0], usize::MAX, 3, 1);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.pages, vec![Some(1), Some(2), Some(3)]);
    }
}
