use std::sync::Arc;

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::action::Action;
use crate::event::Event;
use crate::source::{FetchState, TodoSource};
use crate::view::{self, Page, SortKey, ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
}

pub struct App {
    pub fetch: FetchState,
    pub view: ViewState,
    pub mode: InputMode,
    /// A refetch is in flight while rows from the previous fetch are shown
    pub refreshing: bool,
    pub fetched_at: Option<DateTime<Local>>,
    pub ticks: usize,
    pub should_quit: bool,
    load_id: u64,
    source: Arc<dyn TodoSource>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    pub fn new(
        source: Arc<dyn TodoSource>,
        view: ViewState,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            fetch: FetchState::Pending,
            view,
            mode: InputMode::Normal,
            refreshing: false,
            fetched_at: None,
            ticks: 0,
            should_quit: false,
            load_id: 0,
            source,
            action_tx,
        }
    }

    pub fn source(&self) -> &dyn TodoSource {
        self.source.as_ref()
    }

    /// Current window over the fetched collection, if there is one.
    pub fn page(&self) -> Option<Page<'_>> {
        self.fetch.todos().map(|todos| view::derive(todos, &self.view))
    }

    fn filtered_count(&self) -> usize {
        self.fetch
            .todos()
            .map(|todos| view::filter(todos, &self.view.search_term).len())
            .unwrap_or(0)
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => Action::Load,
            Event::Tick => Action::Tick,
            Event::Key(key) => match self.mode {
                InputMode::Normal => self.handle_key(key),
                InputMode::Search => self.handle_search_key(key),
            },
            _ => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('/') => Action::EnterSearchMode,
            KeyCode::Char('x') => Action::ClearSearch,
            KeyCode::Char('r') => Action::Refresh,

            KeyCode::Char('t') | KeyCode::Char('1') => Action::Sort(SortKey::Title),
            KeyCode::Char('s') | KeyCode::Char('2') => Action::Sort(SortKey::Status),
            KeyCode::Char('u') | KeyCode::Char('3') => Action::Sort(SortKey::User),

            KeyCode::Char('l') | KeyCode::Char('n') | KeyCode::Right => Action::NextPage,
            KeyCode::Char('h') | KeyCode::Char('p') | KeyCode::Left => Action::PrevPage,
            KeyCode::Char('g') | KeyCode::Home => Action::FirstPage,
            KeyCode::Char('G') | KeyCode::End => Action::LastPage,
            KeyCode::Char('+') | KeyCode::Char('=') => Action::LargerPageSize,
            KeyCode::Char('-') => Action::SmallerPageSize,
            _ => Action::None,
        }
    }

    fn handle_search_key(&self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => Action::ExitSearchMode,
            KeyCode::Backspace => Action::SearchBackspace,
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Action::ClearSearch
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                Action::SearchInput(c)
            }
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        match action {
            Action::Quit => {
                self.should_quit = true;
            }

            Action::Load | Action::Refresh => {
                self.load_id += 1;
                if self.fetch.todos().is_some() {
                    self.refreshing = true;
                } else if let Some(cached) = self.source.cached() {
                    self.fetch = FetchState::Succeeded(cached);
                    self.refreshing = true;
                } else {
                    self.fetch = FetchState::Pending;
                }
                self.spawn_load(self.load_id);
            }
            Action::TodosLoaded(todos, load_id) => {
                if load_id != self.load_id {
                    tracing::debug!(load_id, current = self.load_id, "dropping stale todos");
                    return;
                }
                self.fetch = FetchState::Succeeded(todos);
                self.refreshing = false;
                self.fetched_at = Some(Local::now());
            }
            Action::LoadFailed(msg, load_id) => {
                if load_id != self.load_id {
                    tracing::debug!(load_id, current = self.load_id, "dropping stale error");
                    return;
                }
                tracing::debug!(error = %msg, "fetch failed");
                self.fetch = FetchState::Failed(msg);
                self.refreshing = false;
            }

            // Search
            Action::EnterSearchMode => {
                self.mode = InputMode::Search;
            }
            Action::ExitSearchMode => {
                self.mode = InputMode::Normal;
            }
            Action::SearchInput(c) => {
                let mut term = self.view.search_term.clone();
                term.push(c);
                self.view.set_search_term(term);
            }
            Action::SearchBackspace => {
                let mut term = self.view.search_term.clone();
                term.pop();
                self.view.set_search_term(term);
            }
            Action::ClearSearch => {
                self.view.set_search_term(String::new());
            }

            Action::Sort(key) => {
                self.view.set_sort(key);
            }

            // Pagination
            Action::NextPage => {
                let total = self.filtered_count();
                self.view.next_page(total);
            }
            Action::PrevPage => {
                self.view.prev_page();
            }
            Action::FirstPage => {
                self.view.first_page();
            }
            Action::LastPage => {
                let total = self.filtered_count();
                self.view.last_page(total);
            }
            Action::LargerPageSize => {
                let size = self.view.page_size.next();
                if size != self.view.page_size {
                    self.view.set_page_size(size);
                }
            }
            Action::SmallerPageSize => {
                let size = self.view.page_size.prev();
                if size != self.view.page_size {
                    self.view.set_page_size(size);
                }
            }

            Action::Tick => {
                self.ticks = self.ticks.wrapping_add(1);
            }
            Action::None => {}
        }
    }

    fn spawn_load(&self, load_id: u64) {
        let tx = self.action_tx.clone();
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            match source.fetch_todos().await {
                Ok(todos) => {
                    tx.send(Action::TodosLoaded(todos, load_id)).ok();
                }
                Err(e) => {
                    tx.send(Action::load_failed(e, load_id)).ok();
                }
            }
        });
    }

    #[cfg(test)]
    pub(crate) fn with_todos(
        source: Arc<dyn TodoSource>,
        todos: Vec<crate::types::Todo>,
    ) -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = Self::new(source, ViewState::default(), tx);
        app.fetch = FetchState::Succeeded(todos);
        app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachedSource;
    use crate::error::{Result, TodoError};
    use crate::types::{Todo, User};
    use crate::view::{PageSize, SortDirection};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Scripted(Mutex<Vec<Result<Vec<Todo>>>>);

    #[async_trait]
    impl TodoSource for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn endpoint(&self) -> &str {
            "memory://"
        }

        async fn fetch_todos(&self) -> Result<Vec<Todo>> {
            self.0.lock().unwrap().remove(0)
        }
    }

    fn scripted(responses: Vec<Result<Vec<Todo>>>) -> Arc<dyn TodoSource> {
        Arc::new(Scripted(Mutex::new(responses)))
    }

    fn sample() -> Vec<Todo> {
        vec![
            Todo {
                id: "1".to_string(),
                title: "Buy milk".to_string(),
                completed: false,
                user: Some(User {
                    id: "a".to_string(),
                    name: "Alice".to_string(),
                }),
            },
            Todo {
                id: "2".to_string(),
                title: "Walk dog".to_string(),
                completed: true,
                user: Some(User {
                    id: "b".to_string(),
                    name: "Bob".to_string(),
                }),
            },
        ]
    }

    fn numbered(n: usize) -> Vec<Todo> {
        (0..n)
            .map(|i| Todo {
                id: i.to_string(),
                title: format!("Task {:02}", i),
                completed: false,
                user: None,
            })
            .collect()
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn load_round_trip_through_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(scripted(vec![Ok(sample())]), ViewState::default(), tx);

        app.update(app.handle_event(Event::Init));
        assert_eq!(app.fetch, FetchState::Pending);

        let action = rx.recv().await.unwrap();
        app.update(action);
        assert_eq!(app.fetch.todos().unwrap().len(), 2);
        assert!(app.fetched_at.is_some());
        assert!(!app.refreshing);
    }

    #[tokio::test]
    async fn failed_load_surfaces_message() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(
            scripted(vec![Err(TodoError::Network("connection refused".to_string()))]),
            ViewState::default(),
            tx,
        );
        app.update(Action::Load);
        let action = rx.recv().await.unwrap();
        app.update(action);
        assert_eq!(
            app.fetch,
            FetchState::Failed("Network error: connection refused".to_string())
        );
        assert!(app.page().is_none());
    }

    #[tokio::test]
    async fn refresh_keeps_rows_until_replaced() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(
            scripted(vec![Ok(sample()), Ok(numbered(3))]),
            ViewState::default(),
            tx,
        );
        app.update(Action::Load);
        let action = rx.recv().await.unwrap();
        app.update(action);

        app.update(app.handle_event(key(KeyCode::Char('r'))));
        assert!(app.refreshing);
        assert_eq!(app.fetch.todos().unwrap().len(), 2);

        let action = rx.recv().await.unwrap();
        app.update(action);
        assert!(!app.refreshing);
        assert_eq!(app.fetch.todos().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn refresh_after_failure_shows_cached_rows() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let source = Arc::new(CachedSource::new(Scripted(Mutex::new(vec![
            Ok(sample()),
            Err(TodoError::Network("offline".to_string())),
            Ok(numbered(1)),
        ]))));
        let mut app = App::new(source, ViewState::default(), tx);

        app.update(Action::Load);
        let action = rx.recv().await.unwrap();
        app.update(action);
        app.update(Action::Refresh);
        let action = rx.recv().await.unwrap();
        app.update(action);
        assert!(matches!(app.fetch, FetchState::Failed(_)));

        app.update(Action::Refresh);
        assert!(app.refreshing);
        assert_eq!(app.fetch.todos().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn stale_results_are_dropped() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(
            scripted(vec![Ok(Vec::new()), Ok(Vec::new())]),
            ViewState::default(),
            tx,
        );
        app.update(Action::Load);
        app.update(Action::Refresh);

        app.update(Action::TodosLoaded(sample(), 1));
        assert_eq!(app.fetch, FetchState::Pending);
        app.update(Action::LoadFailed("late".to_string(), 1));
        assert_eq!(app.fetch, FetchState::Pending);

        app.update(Action::TodosLoaded(numbered(4), 2));
        assert_eq!(app.fetch.todos().unwrap().len(), 4);
    }

    #[test]
    fn fetch_failure_is_not_written_at_default_level() {
        let mut app = App::with_todos(scripted(Vec::new()), sample());
        let load_id = app.load_id;
        let ((), logs) = crate::test_log::logged_at_default_level(|| {
            app.update(Action::LoadFailed("Network error".to_string(), load_id));
        });
        assert_eq!(app.fetch, FetchState::Failed("Network error".to_string()));
        assert!(logs.is_empty(), "{logs}");
    }

    #[test]
    fn search_mode_captures_typing() {
        let mut app = App::with_todos(scripted(Vec::new()), sample());
        app.update(app.handle_event(key(KeyCode::Char('/'))));
        assert_eq!(app.mode, InputMode::Search);

        for c in "BOB".chars() {
            app.update(app.handle_event(key(KeyCode::Char(c))));
        }
        // 'q' is text while searching, not quit
        app.update(app.handle_event(key(KeyCode::Char('q'))));
        assert!(!app.should_quit);
        app.update(app.handle_event(key(KeyCode::Backspace)));
        assert_eq!(app.view.search_term, "BOB");

        let page = app.page().unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].title, "Walk dog");

        app.update(app.handle_event(key(KeyCode::Enter)));
        assert_eq!(app.mode, InputMode::Normal);
        assert_eq!(app.view.search_term, "BOB");

        app.update(app.handle_event(key(KeyCode::Char('x'))));
        assert_eq!(app.view.search_term, "");
    }

    #[test]
    fn ctrl_u_clears_search() {
        let mut app = App::with_todos(scripted(Vec::new()), sample());
        app.update(Action::EnterSearchMode);
        app.update(Action::SearchInput('a'));
        let action = app.handle_event(Event::Key(KeyEvent::new(
            KeyCode::Char('u'),
            KeyModifiers::CONTROL,
        )));
        app.update(action);
        assert_eq!(app.view.search_term, "");
        assert_eq!(app.mode, InputMode::Search);
    }

    #[test]
    fn sort_keys_toggle_direction() {
        let mut app = App::with_todos(scripted(Vec::new()), sample());
        app.update(app.handle_event(key(KeyCode::Char('s'))));
        assert_eq!(app.view.sort_key, SortKey::Status);
        assert_eq!(app.view.sort_direction, SortDirection::Ascending);

        app.update(app.handle_event(key(KeyCode::Char('2'))));
        assert_eq!(app.view.sort_direction, SortDirection::Descending);
        let titles: Vec<&str> = app
            .page()
            .unwrap()
            .rows
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Walk dog", "Buy milk"]);
    }

    #[test]
    fn paging_keys_respect_filtered_count() {
        let mut app = App::with_todos(scripted(Vec::new()), numbered(12));
        for _ in 0..5 {
            app.update(app.handle_event(key(KeyCode::Right)));
        }
        assert_eq!(app.view.page_index, 2);

        app.update(app.handle_event(key(KeyCode::Char('g'))));
        assert_eq!(app.view.page_index, 0);
        app.update(app.handle_event(key(KeyCode::Char('G'))));
        assert_eq!(app.view.page_index, 2);
        app.update(app.handle_event(key(KeyCode::Left)));
        assert_eq!(app.view.page_index, 1);

        app.update(app.handle_event(key(KeyCode::Char('+'))));
        assert_eq!(app.view.page_size, PageSize::Ten);
        assert_eq!(app.view.page_index, 0);

        app.update(app.handle_event(key(KeyCode::Char('G'))));
        assert_eq!(app.view.page_index, 1);

        app.update(app.handle_event(key(KeyCode::Char('-'))));
        assert_eq!(app.view.page_size, PageSize::Five);
        app.update(Action::NextPage);
        // Smallest size already: the page index survives
        app.update(Action::SmallerPageSize);
        assert_eq!(app.view.page_index, 1);
    }

    #[test]
    fn quit_keys() {
        let app = App::with_todos(scripted(Vec::new()), Vec::new());
        assert!(matches!(app.handle_event(key(KeyCode::Char('q'))), Action::Quit));
        assert!(matches!(app.handle_event(key(KeyCode::Esc)), Action::Quit));
        assert!(Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)).is_quit());
    }
}
