use crate::db::cursor;
use crate::models::asset::{AssetNode, Edge, Page, PageInfo};

/// Wrap surviving nodes into a page.
///
/// `fetched` is the raw row count including the look-ahead row, so drops never
/// hide a next page. The next cursor is the nominal `offset + page_size`,
/// independent of how many nodes survived.
pub fn assemble(nodes: Vec<AssetNode>, fetched: usize, offset: u64, page_size: usize) -> Page {
    let has_next_page = fetched > page_size;
    let end_cursor = has_next_page.then(|| cursor::encode(offset.saturating_add(page_size as u64)));
    Page {
        edges: nodes.into_iter().map(|node| Edge { node }).collect(),
        page_info: PageInfo { has_next_page, end_cursor },
    }
}
