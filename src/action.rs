use crate::error::TodoError;
use crate::types::Todo;
use crate::view::SortKey;

#[derive(Debug, Clone)]
pub enum Action {
    Quit,

    // Fetching
    Load,
    Refresh,
    TodosLoaded(Vec<Todo>, u64),
    LoadFailed(String, u64),

    // Search
    EnterSearchMode,
    ExitSearchMode,
    SearchInput(char),
    SearchBackspace,
    ClearSearch,

    // Sort
    Sort(SortKey),

    // Pagination
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    LargerPageSize,
    SmallerPageSize,

    Tick,
    None,
}

impl Action {
    pub fn load_failed(err: TodoError, load_id: u64) -> Self {
        Action::LoadFailed(err.to_string(), load_id)
    }
}
