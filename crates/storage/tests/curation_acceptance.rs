use async_trait::async_trait;
use curation::{CuratedCollection, PaginationEngine, PaginationOptions, RankedStore};
use shared::{
    domain::{CollectionKind, MovieId, MovieSummary, NewMovie},
    protocol::{OrderedRankedItem, PageToken},
};
use storage::Storage;

struct SqliteCollection {
    storage: Storage,
    kind: CollectionKind,
}

#[async_trait]
impl RankedStore<MovieSummary> for SqliteCollection {
    async fn load(&self) -> anyhow::Result<Vec<MovieSummary>> {
        Ok(self
            .storage
            .load_collection(self.kind)
            .await?
            .into_iter()
            .map(|entry| entry.movie)
            .collect())
    }

    async fn save(&self, items: &[OrderedRankedItem<MovieId>]) -> anyhow::Result<()> {
        self.storage.replace_collection(self.kind, items).await
    }
}

async fn add_movies(storage: &Storage, count: usize) -> Vec<MovieSummary> {
    let mut movies = Vec::new();
    for index in 0..count {
        movies.push(
            storage
                .create_movie(&NewMovie {
                    title: format!("acceptance-{index}"),
                    genre: None,
                    duration_minutes: 120,
                    release_date: None,
                })
                .await
                .expect("movie"),
        );
    }
    movies
}

#[tokio::test]
async fn curated_ranking_survives_reload_and_movie_removal() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let movies = add_movies(&storage, 4).await;

    let editor = CuratedCollection::new(SqliteCollection {
        storage: storage.clone(),
        kind: CollectionKind::Spotlight,
    });
    for movie in &movies {
        editor.add(movie.clone()).expect("add");
    }
    editor.move_item(&movies[3].movie_id, 1).expect("move");
    editor.remove(&movies[0].movie_id).expect("remove");
    editor.save().await.expect("save");
    assert!(!editor.is_dirty());

    storage
        .delete_movie(movies[1].movie_id)
        .await
        .expect("delete");

    let reloaded = CuratedCollection::new(SqliteCollection {
        storage: storage.clone(),
        kind: CollectionKind::Spotlight,
    });
    assert_eq!(reloaded.load().await.expect("load"), 2);
    let ranked: Vec<(u32, MovieId)> = reloaded
        .items()
        .iter()
        .map(|entry| (entry.rank(), entry.item().movie_id))
        .collect();
    assert_eq!(
        ranked,
        vec![(1, movies[3].movie_id), (2, movies[2].movie_id)]
    );
}

#[tokio::test]
async fn paging_engine_drives_catalog_queries() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let movies = add_movies(&storage, 23).await;

    let mut engine = PaginationEngine::new(
        PaginationOptions::new(storage.count_movies().await.expect("count"), 2),
    )
    .expect("engine");
    assert!(engine.go_to_last_page());

    let last_page = storage
        .list_movies(engine.start_index(), engine.page_size())
        .await
        .expect("page");
    assert_eq!(engine.current_page(), 12);
    assert_eq!(last_page.len(), 1);
    assert_eq!(last_page[0].movie_id, movies[22].movie_id);
    assert_eq!(engine.end_index(), Some(22));
    assert_eq!(
        engine.visible_pages(),
        vec![
            PageToken::Page(1),
            PageToken::Ellipsis,
            PageToken::Page(10),
            PageToken::Page(11),
            PageToken::Page(12),
        ]
    );
}
