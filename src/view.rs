//! Client-side table state: search, sort and pagination over the fetched
//! collection. Everything here is pure; the derived [`Page`] is recomputed
//! from scratch on every render.

use std::cmp::Ordering;
use std::fmt;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::TodoError;
use crate::types::Todo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Title,
    Status,
    User,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Title, SortKey::Status, SortKey::User];

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Title => "Title",
            SortKey::Status => "Status",
            SortKey::User => "Assigned To",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Rows per page. Only the sizes offered by the pagination control exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    Five,
    Ten,
    TwentyFive,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::Five, PageSize::Ten, PageSize::TwentyFive];

    pub fn rows(self) -> usize {
        match self {
            PageSize::Five => 5,
            PageSize::Ten => 10,
            PageSize::TwentyFive => 25,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PageSize::Five => PageSize::Ten,
            PageSize::Ten | PageSize::TwentyFive => PageSize::TwentyFive,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            PageSize::Five | PageSize::Ten => PageSize::Five,
            PageSize::TwentyFive => PageSize::Ten,
        }
    }
}

impl TryFrom<usize> for PageSize {
    type Error = TodoError;

    fn try_from(rows: usize) -> Result<Self, Self::Error> {
        PageSize::ALL
            .into_iter()
            .find(|size| size.rows() == rows)
            .ok_or_else(|| {
                TodoError::Config(format!("page size must be one of 5, 10, 25 (got {})", rows))
            })
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rows())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub search_term: String,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub page_index: usize,
    pub page_size: PageSize,
}

impl ViewState {
    pub fn with_page_size(page_size: PageSize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    /// Replaces the search term. The page index is left alone, so a
    /// narrowing search can land on a page past the end.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Same key flips the direction; a new key keeps the current direction.
    pub fn set_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.sort_direction = self.sort_direction.flip();
        } else {
            self.sort_key = key;
        }
    }

    pub fn set_page_index(&mut self, index: usize) {
        self.page_index = index;
    }

    pub fn set_page_size(&mut self, size: PageSize) {
        self.page_size = size;
        self.page_index = 0;
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size.rows())
    }

    /// Pagination control: advance only while a following page exists.
    pub fn next_page(&mut self, total: usize) {
        let next = self.page_index.saturating_add(1);
        if next < self.page_count(total) {
            self.set_page_index(next);
        }
    }

    pub fn prev_page(&mut self) {
        self.set_page_index(self.page_index.saturating_sub(1));
    }

    pub fn first_page(&mut self) {
        self.set_page_index(0);
    }

    pub fn last_page(&mut self, total: usize) {
        self.set_page_index(self.page_count(total).saturating_sub(1));
    }
}

/// One rendered window of the filtered, sorted collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a> {
    pub rows: Vec<&'a Todo>,
    /// Filtered count, before paging
    pub total: usize,
    pub page_index: usize,
    pub page_size: usize,
    /// Blank rows to reserve so the table keeps its height on the last page
    pub empty_rows: usize,
}

impl Page<'_> {
    pub fn has_prev(&self) -> bool {
        self.page_index > 0
    }

    pub fn has_next(&self) -> bool {
        self.page_index
            .saturating_add(1)
            .saturating_mul(self.page_size)
            < self.total
    }

    /// "1–5 of 12" style label for the pagination footer
    pub fn range_label(&self) -> String {
        let start = self.page_index.saturating_mul(self.page_size);
        let from = if self.total == 0 {
            0
        } else {
            start.saturating_add(1)
        };
        let to = start.saturating_add(self.page_size).min(self.total);
        format!("{}–{} of {}", from, to, self.total)
    }
}

pub fn matches(todo: &Todo, term: &str) -> bool {
    let needle = term.to_lowercase();
    todo.title.to_lowercase().contains(&needle)
        || todo.user_name().to_lowercase().contains(&needle)
}

pub fn filter<'a>(todos: &'a [Todo], term: &str) -> Vec<&'a Todo> {
    todos.iter().filter(|todo| matches(todo, term)).collect()
}

/// Stable sort; ties keep their incoming order in either direction.
pub fn sort(rows: &mut [&Todo], key: SortKey, direction: SortDirection) {
    rows.sort_by(|a, b| direction.apply(compare(a, b, key)));
}

fn compare(a: &Todo, b: &Todo, key: SortKey) -> Ordering {
    match key {
        SortKey::Title => collate(&a.title, &b.title),
        // false < true puts pending ahead of completed
        SortKey::Status => a.completed.cmp(&b.completed),
        SortKey::User => collate(a.user_name(), b.user_name()),
    }
}

/// Collation in three levels: base letters (accents and case folded away),
/// then accents (unaccented first), then case (lowercase first).
pub fn collate(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| a.to_lowercase().nfd().cmp(b.to_lowercase().nfd()))
        .then_with(|| case_key(a).cmp(case_key(b)))
}

fn base_letters(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn case_key(s: &str) -> impl Iterator<Item = (bool, char)> + '_ {
    s.chars().map(|c| (c.is_uppercase(), c))
}

pub fn derive<'a>(todos: &'a [Todo], state: &ViewState) -> Page<'a> {
    let mut rows = filter(todos, &state.search_term);
    sort(&mut rows, state.sort_key, state.sort_direction);

    let total = rows.len();
    let page_size = state.page_size.rows();
    let start = state.page_index.saturating_mul(page_size).min(total);
    let end = (start + page_size).min(total);
    let rows: Vec<&Todo> = rows[start..end].to_vec();
    let empty_rows = page_size - rows.len();

    Page {
        rows,
        total,
        page_index: state.page_index,
        page_size,
        empty_rows,
    }
}
