use serde::{Deserialize, Serialize};

use crate::domain::{CollectionKind, MovieId, MovieSummary};

/// One entry of a rendered page-number strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum PageToken {
    Page(i64),
    Ellipsis,
}

impl PageToken {
    pub fn page(self) -> Option<i64> {
        match self {
            PageToken::Page(page) => Some(page),
            PageToken::Ellipsis => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub current_page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub start_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<i64>,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub visible_pages: Vec<PageToken>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoviePageQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoviePage {
    pub movies: Vec<MovieSummary>,
    pub page: PageInfo,
}

/// Wire form of a ranked entry: the id plus its 1-indexed position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderedRankedItem<K> {
    pub id: K,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMovie {
    pub rank: u32,
    pub movie: MovieSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCollection {
    pub kind: CollectionKind,
    pub entries: Vec<RankedMovie>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceCollectionRequest {
    pub items: Vec<OrderedRankedItem<MovieId>>,
}
