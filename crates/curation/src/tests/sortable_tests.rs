use super::*;
use chrono::NaiveDate;
use shared::domain::MovieId;

fn movie(id: i64, title: &str, minutes: i64, released: Option<(i32, u32, u32)>) -> MovieSummary {
    MovieSummary {
        movie_id: MovieId(id),
        title: title.to_string(),
        genre: None,
        duration_minutes: minutes,
        release_date: released.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
    }
}

fn catalog() -> Vec<MovieSummary> {
    vec![
        movie(1, "dune", 155, Some((2021, 10, 22))),
        movie(2, "Arrival", 116, Some((2016, 11, 11))),
        movie(3, "Coco", 105, None),
        movie(4, "Blade Runner", 117, Some((1982, 6, 25))),
    ]
}

fn ids(view: &[&MovieSummary]) -> Vec<i64> {
    view.iter().map(|movie| movie.movie_id.0).collect()
}

#[test]
fn unsorted_view_keeps_original_order() {
    let data: SortableData<_, MovieSortField> = SortableData::new(catalog());
    assert_eq!(ids(&data.sorted()), vec![1, 2, 3, 4]);
    assert_eq!(data.sort_config(), None);
}

#[test]
fn repeated_request_toggles_direction() {
    let mut data = SortableData::new(catalog());

    let config = data.request_sort(MovieSortField::Title);
    assert_eq!(config.direction, SortDirection::Ascending);
    assert_eq!(ids(&data.sorted()), vec![2, 4, 3, 1]);

    let config = data.request_sort(MovieSortField::Title);
    assert_eq!(config.direction, SortDirection::Descending);
    assert_eq!(ids(&data.sorted()), vec![1, 3, 4, 2]);

    let config = data.request_sort(MovieSortField::Title);
    assert_eq!(config.direction, SortDirection::Ascending);
}

#[test]
fn switching_columns_restarts_ascending() {
    let mut data = SortableData::new(catalog());
    data.request_sort(MovieSortField::Duration);
    data.request_sort(MovieSortField::Duration);
    let config = data.request_sort(MovieSortField::ReleaseDate);
    assert_eq!(
        config,
        SortConfig {
            field: MovieSortField::ReleaseDate,
            direction: SortDirection::Ascending
        }
    );
    assert_eq!(ids(&data.sorted()), vec![3, 4, 2, 1]);
}

#[test]
fn sort_is_stable_for_equal_keys() {
    let mut data = SortableData::new(vec![
        movie(1, "A", 90, None),
        movie(2, "B", 90, None),
        movie(3, "C", 80, None),
    ]);
    data.request_sort(MovieSortField::Duration);
    assert_eq!(ids(&data.sorted()), vec![3, 1, 2]);
}

#[test]
fn clearing_sort_and_replacing_items() {
    let mut data = SortableData::with_sort(catalog(), MovieSortField::Duration, SortDirection::Descending);
    assert_eq!(ids(&data.sorted()), vec![1, 4, 2, 3]);

    data.set_items(vec![movie(8, "Up", 96, None)]);
    assert_eq!(ids(&data.sorted()), vec![8]);

    data.clear_sort();
    assert_eq!(data.sort_config(), None);
    assert_eq!(data.items().len(), 1);
}

#[test]
fn active_descending_column_flips_back_to_ascending() {
    let mut data = SortableData::with_sort(catalog(), MovieSortField::Duration, SortDirection::Descending);
    let config = data.request_sort(MovieSortField::Duration);
    assert_eq!(config.direction, SortDirection::Ascending);
    assert_eq!(ids(&data.sorted()), vec![3, 2, 4, 1]);
}
