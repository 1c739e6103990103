//! What the controller hands to a rendering surface.

use serde::Serialize;

use crate::format::FormattedRow;
use crate::types::{PageLink, SortDirection};

/// One complete refresh: the row window plus the metadata around it.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderFrame {
    pub header: FormattedRow,
    pub rows: Vec<FormattedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<FormattedRow>,
    /// Pager links; empty with a single page
    pub pages: Vec<PageLink>,
    pub info: String,
    /// "No rows" message when the window is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub current_page: usize,
    pub page_count: usize,
    pub per_page: usize,
    /// Page-size choices for the host's selector; empty hides it
    pub per_page_select: Vec<usize>,
    /// Whether the host shows a search input
    pub searchable: bool,
    pub sort_column: Option<usize>,
    pub sort_direction: SortDirection,
    pub search_query: Option<String>,
    pub is_searching: bool,
    pub data_count: usize,
    pub data_count_total: usize,
}

/// Receives frames; materializing them is up to the implementation.
pub trait RenderSurface {
    fn present(&mut self, frame: &RenderFrame);
}

/// Keeps every presented frame.
#[derive(Debug, Default)]
pub struct FrameLog {
    pub frames: Vec<RenderFrame>,
}

impl FrameLog {
    pub fn last(&self) -> Option<&RenderFrame> {
        self.frames.last()
    }
}

impl RenderSurface for FrameLog {
    fn present(&mut self, frame: &RenderFrame) {
        self.frames.push(frame.clone());
    }
}
