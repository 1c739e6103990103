//! Page arithmetic and page-link lists.

use crate::config::TableConfig;
use crate::types::{PageLink, PageLinkKind};

/// Number of pages for `rows` rows; an empty table still has one page.
pub fn page_count(rows: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 1;
    }
    rows.div_ceil(per_page).max(1)
}

/// Half-open row index range `[start, end)` shown on `page` (1-based),
/// clamped to `rows`.
pub fn page_bounds(page: usize, per_page: usize, rows: usize) -> (usize, usize) {
    let start = page.saturating_sub(1).saturating_mul(per_page);
    let end = page.saturating_mul(per_page).min(rows);
    (start.min(end), end)
}

/// Numbered links around `current`, with ellipsis markers for omitted runs.
///
/// Pages 1 and `total` are always present, as is every page within `delta`
/// of `current`. Near either edge the window is widened so it keeps the same
/// size. A single omitted page is listed instead of an ellipsis.
pub fn truncated_links(
    current: usize,
    total: usize,
    delta: usize,
    ellipsis: &str,
) -> Vec<PageLink> {
    let span = delta.saturating_mul(2);
    let mut left = current.saturating_sub(delta);
    let mut right = current.saturating_add(delta);

    if current < delta.saturating_add(4) {
        right = span.saturating_add(3);
    } else if current.saturating_add(delta).saturating_add(3) > total {
        left = total.saturating_sub(span.saturating_add(2));
    }

    let mut included = vec![1];
    included.extend(left.max(2)..=right.min(total.saturating_sub(1)));
    if total > 1 {
        included.push(total);
    }

    let mut links = Vec::with_capacity(included.len() + 2);
    let mut last: Option<usize> = None;
    for page in included {
        if let Some(prev) = last {
            match page - prev {
                1 => {}
                2 => links.push(PageLink::page(prev + 1, current)),
                _ => links.push(PageLink::ellipsis(ellipsis)),
            }
        }
        links.push(PageLink::page(page, current));
        last = Some(page);
    }
    links
}

/// Every page from 1 to `total`.
pub fn all_links(current: usize, total: usize) -> Vec<PageLink> {
    (1..=total).map(|page| PageLink::page(page, current)).collect()
}

/// Pager settings taken from the table configuration.
#[derive(Debug, Clone)]
pub struct Pager {
    pub truncate: bool,
    pub delta: usize,
    pub next_prev: bool,
    pub first_last: bool,
    pub prev_text: String,
    pub next_text: String,
    pub first_text: String,
    pub last_text: String,
    pub ellipsis_text: String,
}

impl From<&TableConfig> for Pager {
    fn from(config: &TableConfig) -> Self {
        Self {
            truncate: config.truncate_pager,
            delta: config.pager_delta,
            next_prev: config.next_prev,
            first_last: config.first_last,
            prev_text: config.prev_text.clone(),
            next_text: config.next_text.clone(),
            first_text: config.first_text.clone(),
            last_text: config.last_text.clone(),
            ellipsis_text: config.ellipsis_text.clone(),
        }
    }
}

impl Pager {
    /// Full link list for the pager; empty when there is a single page.
    pub fn render(&self, current: usize, total: usize) -> Vec<PageLink> {
        if total <= 1 {
            return Vec::new();
        }

        let prev = if current <= 1 { 1 } else { current - 1 };
        let next = if current >= total { total } else { current + 1 };

        let mut links = Vec::new();
        if self.first_last {
            links.push(PageLink::control(PageLinkKind::First, 1, &self.first_text));
        }
        if self.next_prev {
            links.push(PageLink::control(PageLinkKind::Prev, prev, &self.prev_text));
        }

        if self.truncate {
            links.extend(truncated_links(current, total, self.delta, &self.ellipsis_text));
        } else {
            links.extend(all_links(current, total));
        }

        if self.next_prev {
            links.push(PageLink::control(PageLinkKind::Next, next, &self.next_text));
        }
        if self.first_last {
            links.push(PageLink::control(PageLinkKind::Last, total, &self.last_text));
        }
        links
    }
}

/// Whether `page` exists in a table of `total` pages.
pub fn is_valid_page(page: usize, total: usize) -> bool {
    page > 0 && page <= total
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    /// Compact form: page numbers, `0` for an ellipsis.
    fn pages(links: &[PageLink]) -> Vec<usize> {
        links.iter().map(|l| l.page).collect()
    }

    #[test_case(0, 5, 1 ; "empty table")]
    #[test_case(5, 5, 1 ; "exact fit")]
    #[test_case(12, 5, 3 ; "partial last page")]
    #[test_case(1, 5, 1 ; "single row")]
    #[test_case(100, 10, 10 ; "even split")]
    fn test_page_count(rows: usize, per_page: usize, expected: usize) {
        assert_eq!(page_count(rows, per_page), expected);
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(1, 5, 12), (0, 5));
        assert_eq!(page_bounds(3, 5, 12), (10, 12));
        assert_eq!(page_bounds(4, 5, 12), (12, 12));
        assert_eq!(page_bounds(1, 5, 0), (0, 0));
    }

    #[test]
    fn test_window_in_the_middle() {
        let links = truncated_links(5, 10, 2, "...");
        assert_eq!(pages(&links), vec![1, 2, 3, 4, 5, 6, 7, 0, 10]);
        assert!(links[4].active);
        assert_eq!(links.iter().filter(|l| l.active).count(), 1);
        assert_eq!(links[7].label, "...");
    }

    #[test]
    fn test_window_far_from_edges() {
        let links = truncated_links(10, 20, 2, "...");
        assert_eq!(pages(&links), vec![1, 0, 8, 9, 10, 11, 12, 0, 20]);
    }

    #[test]
    fn test_window_at_left_edge_keeps_its_size() {
        assert_eq!(
            pages(&truncated_links(1, 10, 2, "...")),
            vec![1, 2, 3, 4, 5, 6, 7, 0, 10]
        );
    }

    #[test]
    fn test_window_at_right_edge_keeps_its_size() {
        assert_eq!(
            pages(&truncated_links(10, 10, 2, "...")),
            vec![1, 0, 4, 5, 6, 7, 8, 9, 10]
        );
    }

    #[test]
    fn test_small_totals_list_everything() {
        assert_eq!(pages(&truncated_links(2, 3, 2, "...")), vec![1, 2, 3]);
        assert_eq!(pages(&truncated_links(1, 2, 0, "...")), vec![1, 2]);
    }

    #[test]
    fn test_truncation_invariants() {
        for delta in 0..=3 {
            for total in 2..=30 {
                for current in 1..=total {
                    let links = truncated_links(current, total, delta, "...");
                    assert_eq!(links.first().map(|l| l.page), Some(1));
                    assert_eq!(links.last().map(|l| l.page), Some(total));
                    assert!(
                        links.windows(2).all(|w| !(w[0].is_ellipsis() && w[1].is_ellipsis())),
                        "double ellipsis at current={current} total={total} delta={delta}"
                    );
                    let numbered: Vec<usize> = links
                        .iter()
                        .filter(|l| !l.is_ellipsis())
                        .map(|l| l.page)
                        .collect();
                    assert!(numbered.windows(2).all(|w| w[0] < w[1]));
                    assert!(numbered.contains(&current));
                }
            }
        }
    }

    #[test]
    fn test_huge_delta_lists_every_page() {
        assert_eq!(
            pages(&truncated_links(3, 5, usize::MAX, "...")),
            vec![1, 2, 3, 4, 5]
        );
        assert_eq!(
            pages(&truncated_links(20, 20, usize::MAX, "...")),
            (1..=20).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_render_single_page_is_empty() {
        let pager = Pager::from(&TableConfig::default());
        assert!(pager.render(1, 1).is_empty());
    }

    #[test]
    fn test_render_wraps_with_controls() {
        let config = TableConfig {
            first_last: true,
            truncate_pager: false,
            ..TableConfig::default()
        };
        let links = Pager::from(&config).render(1, 3);
        let kinds: Vec<PageLinkKind> = links.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PageLinkKind::First,
                PageLinkKind::Prev,
                PageLinkKind::Page,
                PageLinkKind::Page,
                PageLinkKind::Page,
                PageLinkKind::Next,
                PageLinkKind::Last,
            ]
        );
        assert_eq!(links[1].page, 1);
        assert_eq!(links[5].page, 2);
        assert_eq!(links[6].page, 3);
        assert!(links[2].active);
    }

    #[test]
    fn test_is_valid_page() {
        assert!(!is_valid_page(0, 3));
        assert!(is_valid_page(3, 3));
        assert!(!is_valid_page(4, 3));
    }
}
