use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::Result;
use crate::source::TodoSource;
use crate::types::Todo;

/// In-memory cache in front of a source. A successful fetch replaces the
/// cached collection wholesale; failures leave it as it was.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    last: RwLock<Option<Vec<Todo>>>,
}

impl<S: TodoSource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            last: RwLock::new(None),
        }
    }

    fn replace(&self, todos: &[Todo]) {
        if let Ok(mut guard) = self.last.write() {
            *guard = Some(todos.to_vec());
        }
    }
}

#[async_trait]
impl<S: TodoSource> TodoSource for CachedSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }

    async fn fetch_todos(&self) -> Result<Vec<Todo>> {
        let todos = self.inner.fetch_todos().await?;
        self.replace(&todos);
        Ok(todos)
    }

    fn cached(&self) -> Option<Vec<Todo>> {
        self.last.read().ok().and_then(|guard| guard.clone())
    }
}
