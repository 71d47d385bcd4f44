//! Client-side list state for the FCinema back-office: page windows for
//! catalog views, curated movie rankings with deferred remote saves, and
//! sortable tables.

pub mod collection;
pub mod error;
pub mod pagination;
pub mod ranked_list;
pub mod sortable;

pub use collection::{CuratedCollection, RankedStore};
pub use error::{CurationError, Result};
pub use pagination::{PaginationEngine, PaginationOptions};
pub use ranked_list::{validate_ordered, Keyed, RankedItem, RankedList};
pub use sortable::{SortConfig, SortField, SortableData};
