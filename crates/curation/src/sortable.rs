use std::cmp::Ordering;

use shared::domain::{MovieSortField, MovieSummary, SortDirection};

/// A column of `T` that a table can be sorted by.
pub trait SortField<T>: Copy + Eq {
    fn compare(self, a: &T, b: &T) -> Ordering;
}

impl SortField<MovieSummary> for MovieSortField {
    fn compare(self, a: &MovieSummary, b: &MovieSummary) -> Ordering {
        match self {
            MovieSortField::Title => a
                .title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.title.cmp(&b.title)),
            // `None` orders before any date.
            MovieSortField::ReleaseDate => a.release_date.cmp(&b.release_date),
            MovieSortField::Duration => a.duration_minutes.cmp(&b.duration_minutes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig<F> {
    pub field: F,
    pub direction: SortDirection,
}

/// Items plus the column a table is currently sorted by.
#[derive(Debug, Clone)]
pub struct SortableData<T, F> {
    items: Vec<T>,
    config: Option<SortConfig<F>>,
}

impl<T, F: SortField<T>> SortableData<T, F> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            config: None,
        }
    }

    pub fn with_sort(items: Vec<T>, field: F, direction: SortDirection) -> Self {
        Self {
            items,
            config: Some(SortConfig { field, direction }),
        }
    }

    pub fn sort_config(&self) -> Option<SortConfig<F>> {
        self.config
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
    }

    pub fn clear_sort(&mut self) {
        self.config = None;
    }

    /// Column-header click: the active column flips direction, any other
    /// column sorts ascending.
    pub fn request_sort(&mut self, field: F) -> SortConfig<F> {
        let direction = match self.config {
            Some(active) if active.field == field => active.direction.toggled(),
            _ => SortDirection::Ascending,
        };
        let config = SortConfig { field, direction };
        self.config = Some(config);
        config
    }

    /// Stable-sorted view of the items; original order when unsorted.
    pub fn sorted(&self) -> Vec<&T> {
        let mut view: Vec<&T> = self.items.iter().collect();
        if let Some(SortConfig { field, direction }) = self.config {
            view.sort_by(|a, b| {
                let ordering = field.compare(a, b);
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }
        view
    }
}

#[cfg(test)]
#[path = "tests/sortable_tests.rs"]
mod tests;
