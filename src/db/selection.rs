//! Compiles a [`Filter`] into a conjunctive predicate with positional
//! parameters and the fixed most-recent-first ordering.
//!
//! The output only names catalog columns; executing it is left to the store.

use crate::error::Result;
use crate::models::asset::{MEDIA_TYPE_IMAGE, MEDIA_TYPE_VIDEO};
use crate::models::filter::{AssetKind, Filter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Text(String),
    Int(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub expr: &'static str,
    pub descending: bool,
}

/// Creation time (ms) with the added-at fallback, then modification time.
/// `id` makes the order total when both timestamps tie.
pub const SORT_ORDER: &[SortKey] = &[
    SortKey { expr: "COALESCE(date_taken, date_added * 1000)", descending: true },
    SortKey { expr: "date_modified", descending: true },
    SortKey { expr: "id", descending: true },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub conditions: Vec<String>,
    pub params: Vec<Param>,
    pub order: &'static [SortKey],
}

impl Selection {
    fn base() -> Self {
        Self { conditions: vec!["1".to_string()], params: Vec::new(), order: SORT_ORDER }
    }

    pub fn where_sql(&self) -> String {
        self.conditions.join(" AND ")
    }

    pub fn order_sql(&self) -> String {
        self.order
            .iter()
            .map(|k| format!("{} {}", k.expr, if k.descending { "DESC" } else { "ASC" }))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn push_kind(&mut self, kind: AssetKind) {
        let cond = match kind {
            AssetKind::Photos => format!("media_type = {}", MEDIA_TYPE_IMAGE),
            AssetKind::Videos => format!("media_type = {}", MEDIA_TYPE_VIDEO),
            AssetKind::All => format!("media_type IN ({},{})", MEDIA_TYPE_VIDEO, MEDIA_TYPE_IMAGE),
        };
        self.conditions.push(cond);
    }
}

/// Condition order is fixed: group, kind, mime types, lower bound, upper bound.
pub fn compile(filter: &Filter) -> Result<Selection> {
    filter.validate()?;
    let mut sel = Selection::base();

    if let Some(group) = filter.effective_group() {
        sel.conditions.push("bucket_display_name = ?".to_string());
        sel.params.push(Param::Text(group.to_string()));
    }

    sel.push_kind(filter.asset_kind);

    if let Some(mimes) = filter.effective_mime_types() {
        let placeholders = vec!["?"; mimes.len()].join(",");
        sel.conditions.push(format!("mime_type IN ({})", placeholders));
        sel.params.extend(mimes.iter().cloned().map(Param::Text));
    }

    // date_taken is in ms, date_added in seconds
    if let Some(from) = filter.from_time {
        sel.conditions.push("(date_taken > ? OR (date_taken IS NULL AND date_added > ?))".to_string());
        sel.params.push(Param::Int(from));
        sel.params.push(Param::Int(from / 1000));
    }
    if let Some(to) = filter.to_time {
        sel.conditions.push("(date_taken <= ? OR (date_taken IS NULL AND date_added <= ?))".to_string());
        sel.params.push(Param::Int(to));
        sel.params.push(Param::Int(to / 1000));
    }

    Ok(sel)
}

/// Kind-only selection, used to list albums.
pub fn compile_kind(kind: AssetKind) -> Selection {
    let mut sel = Selection::base();
    sel.push_kind(kind);
    sel
}
