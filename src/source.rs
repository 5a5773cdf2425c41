use async_trait::async_trait;

use crate::error::Result;
use crate::types::Todo;

/// Where the todo collection comes from. The view only sees the outcome of
/// `fetch_todos`; transport, caching and error wording live behind it.
#[async_trait]
pub trait TodoSource: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;
    fn endpoint(&self) -> &str;

    /// Fetch the whole collection. Each success replaces whatever the
    /// caller held before; there is no incremental merge.
    async fn fetch_todos(&self) -> Result<Vec<Todo>>;

    /// Last collection fetched successfully, for sources that keep one.
    fn cached(&self) -> Option<Vec<Todo>> {
        None
    }
}

/// What the view can observe about the current fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Pending,
    Failed(String),
    Succeeded(Vec<Todo>),
}

impl FetchState {
    pub fn todos(&self) -> Option<&[Todo]> {
        match self {
            FetchState::Succeeded(todos) => Some(todos),
            _ => None,
        }
    }
}
