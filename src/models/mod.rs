pub mod asset;
pub mod filter;

pub use asset::{Album, AssetNode, Edge, ImageInfo, Location, Page, PageInfo, RawRow};
pub use filter::{AssetKind, Filter, IncludeSet, MetadataField, PageRequest};
