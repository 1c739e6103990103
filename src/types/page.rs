use serde::{Deserialize, Serialize};

/// What a pager entry does when activated.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PageLinkKind {
    First,
    Prev,
    Page,
    Ellipsis,
    Next,
    Last,
}

/// One entry of the pager, turned into markup by the renderer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageLink {
    pub kind: PageLinkKind,
    /// Target page (1-based); 0 for ellipsis markers
    pub page: usize,
    pub label: String,
    /// True for the current page's numbered link
    pub active: bool,
}

impl PageLink {
    pub fn page(page: usize, current: usize) -> Self {
        Self {
            kind: PageLinkKind::Page,
            page,
            label: page.to_string(),
            active: page == current,
        }
    }

    pub fn ellipsis(label: &str) -> Self {
        Self {
            kind: PageLinkKind::Ellipsis,
            page: 0,
            label: label.to_string(),
            active: false,
        }
    }

    pub fn control(kind: PageLinkKind, page: usize, label: &str) -> Self {
        Self {
            kind,
            page,
            label: label.to_string(),
            active: false,
        }
    }

    pub fn is_ellipsis(&self) -> bool {
        self.kind == PageLinkKind::Ellipsis
    }
}
