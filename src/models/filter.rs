use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{LibraryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AssetKind {
    Photos,
    Videos,
    #[default]
    All,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Photos => "Photos",
            AssetKind::Videos => "Videos",
            AssetKind::All => "All",
        }
    }
}

impl FromStr for AssetKind {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Photos" => Ok(AssetKind::Photos),
            "Videos" => Ok(AssetKind::Videos),
            "All" => Ok(AssetKind::All),
            other => Err(LibraryError::InvalidFilter(format!(
                "Invalid filter option: '{}'. Expected one of 'Photos', 'Videos' or 'All'.",
                other
            ))),
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional per-node derivations. Each one costs extra work per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Filename,
    FileSize,
    FileExtension,
    Location,
    ImageSize,
    PlayableDuration,
    Orientation,
    Albums,
}

impl MetadataField {
    pub const ALL: [MetadataField; 8] = [
        MetadataField::Filename,
        MetadataField::FileSize,
        MetadataField::FileExtension,
        MetadataField::Location,
        MetadataField::ImageSize,
        MetadataField::PlayableDuration,
        MetadataField::Orientation,
        MetadataField::Albums,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataField::Filename => "filename",
            MetadataField::FileSize => "fileSize",
            MetadataField::FileExtension => "fileExtension",
            MetadataField::Location => "location",
            MetadataField::ImageSize => "imageSize",
            MetadataField::PlayableDuration => "playableDuration",
            MetadataField::Orientation => "orientation",
            MetadataField::Albums => "albums",
        }
    }
}

impl FromStr for MetadataField {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        MetadataField::ALL.iter().copied().find(|f| f.as_str() == s).ok_or(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeSet(HashSet<MetadataField>);

impl IncludeSet {
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse include names as sent over the bridge. Unknown names are skipped.
    pub fn parse_lenient<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut set = HashSet::new();
        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            match name.parse::<MetadataField>() {
                Ok(field) => {
                    set.insert(field);
                }
                Err(()) => debug!(include = name, "ignoring unknown include field"),
            }
        }
        Self(set)
    }

    pub fn contains(&self, field: MetadataField) -> bool {
        self.0.contains(&field)
    }

}

impl FromIterator<MetadataField> for IncludeSet {
    fn from_iter<T: IntoIterator<Item = MetadataField>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Query criteria shared by photo pages and album listings.
///
/// Times are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filter {
    pub asset_kind: AssetKind,
    pub group_name: Option<String>,
    pub mime_types: Option<Vec<String>>,
    pub from_time: Option<i64>,
    pub to_time: Option<i64>,
}

impl Filter {
    pub fn new(asset_kind: AssetKind) -> Self {
        Self { asset_kind, ..Default::default() }
    }

    pub fn group_name(mut self, name: impl Into<String>) -> Self {
        self.group_name = Some(name.into());
        self
    }

    pub fn mime_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mime_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn from_time(mut self, ms: i64) -> Self {
        self.from_time = Some(ms);
        self
    }

    pub fn to_time(mut self, ms: i64) -> Self {
        self.to_time = Some(ms);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.from_time, self.to_time) {
            if from > to {
                return Err(LibraryError::InvalidFilter(format!(
                    "fromTime ({}) must not be after toTime ({})",
                    from, to
                )));
            }
        }
        Ok(())
    }

    /// Group name if set and non-empty.
    pub fn effective_group(&self) -> Option<&str> {
        self.group_name.as_deref().filter(|g| !g.is_empty())
    }

    /// Mime types if set and non-empty.
    pub fn effective_mime_types(&self) -> Option<&[String]> {
        self.mime_types.as_deref().filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub filter: Filter,
    pub page_size: usize,
    pub cursor: Option<String>,
    pub include: IncludeSet,
}

impl PageRequest {
    pub fn new(filter: Filter, page_size: usize) -> Self {
        Self { filter, page_size, cursor: None, include: IncludeSet::none() }
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn include<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = MetadataField>,
    {
        self.include = fields.into_iter().collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(LibraryError::InvalidPageSize(self.page_size.to_string()));
        }
        self.filter.validate()
    }
}
