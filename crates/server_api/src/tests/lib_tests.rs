use super::*;
use shared::protocol::{OrderedRankedItem, PageToken};

async fn setup(movies: usize) -> (ApiContext, Vec<MovieId>) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let ctx = ApiContext {
        storage,
        paging: PagingDefaults {
            default_page_size: 2,
            max_page_size: 5,
            max_visible_pages: 5,
        },
    };
    let mut ids = Vec::new();
    for index in 0..movies {
        let movie = create_movie(
            &ctx,
            NewMovie {
                title: format!("movie {index}"),
                genre: None,
                duration_minutes: 100,
                release_date: None,
            },
        )
        .await
        .expect("movie");
        ids.push(movie.movie_id);
    }
    (ctx, ids)
}

fn ranked(ids: &[MovieId]) -> ReplaceCollectionRequest {
    ReplaceCollectionRequest {
        items: ids
            .iter()
            .enumerate()
            .map(|(index, id)| OrderedRankedItem {
                id: *id,
                rank: index as u32 + 1,
            })
            .collect(),
    }
}

#[tokio::test]
async fn list_movies_uses_default_page_size_and_window() {
    let (ctx, ids) = setup(7).await;

    let page = list_movies(&ctx, MoviePageQuery::default())
        .await
        .expect("page");
    assert_eq!(page.page.current_page, 1);
    assert_eq!(page.page.page_size, 2);
    assert_eq!(page.page.total_pages, 4);
    assert_eq!(
        page.movies.iter().map(|m| m.movie_id).collect::<Vec<_>>(),
        ids[0..2].to_vec()
    );
    assert_eq!(
        page.page.visible_pages,
        (1..=4).map(PageToken::Page).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn list_movies_clamps_out_of_range_page() {
    let (ctx, ids) = setup(5).await;

    let page = list_movies(
        &ctx,
        MoviePageQuery {
            page: Some(42),
            page_size: Some(2),
        },
    )
    .await
    .expect("page");
    assert_eq!(page.page.current_page, 3);
    assert_eq!(page.page.start_index, 4);
    assert_eq!(page.page.end_index, Some(4));
    assert!(!page.page.has_next_page);
    assert_eq!(page.movies.len(), 1);
    assert_eq!(page.movies[0].movie_id, ids[4]);
}

#[tokio::test]
async fn list_movies_on_empty_catalog() {
    let (ctx, _) = setup(0).await;
    let page = list_movies(&ctx, MoviePageQuery::default())
        .await
        .expect("page");
    assert!(page.movies.is_empty());
    assert_eq!(page.page.total_pages, 1);
    assert_eq!(page.page.end_index, None);
}

#[tokio::test]
async fn list_movies_rejects_page_size_outside_limits() {
    let (ctx, _) = setup(1).await;
    for page_size in [0, -3, 6] {
        let err = list_movies(
            &ctx,
            MoviePageQuery {
                page: None,
                page_size: Some(page_size),
            },
        )
        .await
        .expect_err("invalid page size");
        assert_eq!(err.code, ErrorCode::Validation);
    }
}

#[tokio::test]
async fn create_movie_validates_input() {
    let (ctx, _) = setup(0).await;
    let blank = create_movie(
        &ctx,
        NewMovie {
            title: "   ".into(),
            genre: None,
            duration_minutes: 90,
            release_date: None,
        },
    )
    .await
    .expect_err("blank title");
    assert_eq!(blank.code, ErrorCode::Validation);

    let zero = create_movie(
        &ctx,
        NewMovie {
            title: "Short".into(),
            genre: None,
            duration_minutes: 0,
            release_date: None,
        },
    )
    .await
    .expect_err("zero duration");
    assert_eq!(zero.code, ErrorCode::Validation);

    let trimmed = create_movie(
        &ctx,
        NewMovie {
            title: "  Heat ".into(),
            genre: Some("Crime".into()),
            duration_minutes: 170,
            release_date: None,
        },
    )
    .await
    .expect("created");
    assert_eq!(trimmed.title, "Heat");
}

#[tokio::test]
async fn delete_unknown_movie_is_not_found() {
    let (ctx, ids) = setup(1).await;
    delete_movie(&ctx, ids[0]).await.expect("delete");
    let err = delete_movie(&ctx, ids[0]).await.expect_err("gone");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn replace_collection_round_trips_through_storage() {
    let (ctx, ids) = setup(3).await;

    let stored = replace_collection(&ctx, CollectionKind::Trending, ranked(&[ids[2], ids[0]]))
        .await
        .expect("replace");
    assert_eq!(stored.kind, CollectionKind::Trending);
    assert_eq!(
        stored
            .entries
            .iter()
            .map(|entry| (entry.movie.movie_id, entry.rank))
            .collect::<Vec<_>>(),
        vec![(ids[2], 1), (ids[0], 2)]
    );

    let fetched = get_collection(&ctx, CollectionKind::Trending)
        .await
        .expect("fetch");
    assert_eq!(fetched, stored);
}

#[tokio::test]
async fn replace_collection_rejects_bad_rankings() {
    let (ctx, ids) = setup(2).await;

    let gap = ReplaceCollectionRequest {
        items: vec![
            OrderedRankedItem { id: ids[0], rank: 1 },
            OrderedRankedItem { id: ids[1], rank: 3 },
        ],
    };
    let err = replace_collection(&ctx, CollectionKind::Spotlight, gap)
        .await
        .expect_err("gap");
    assert_eq!(err.code, ErrorCode::Validation);

    let err = replace_collection(&ctx, CollectionKind::Spotlight, ranked(&[ids[0], ids[0]]))
        .await
        .expect_err("duplicate");
    assert_eq!(err.code, ErrorCode::Validation);

    let err = replace_collection(
        &ctx,
        CollectionKind::Spotlight,
        ranked(&[ids[0], MovieId(999)]),
    )
    .await
    .expect_err("unknown movie");
    assert_eq!(err.code, ErrorCode::NotFound);
    assert!(err.message.contains("999"));

    assert!(get_collection(&ctx, CollectionKind::Spotlight)
        .await
        .expect("fetch")
        .entries
        .is_empty());
}
