use thiserror::Error;

use crate::connection::{ConnectionError, ConnectionProvider, DatabaseBackend};
use crate::pager::{parse_limit, turn_page, PageStep, ParseError};
use crate::result_table::RenderedTable;
use crate::session::{Session, Task};
use crate::sql_generator::{
    filtered_select_sql, offset_page_sql, preview_select_sql, BoundQuery, SqlGenerationError,
};

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error(transparent)]
    Database(#[from] ConnectionError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("invalid query: {0}")]
    Sql(#[from] SqlGenerationError),
    #[error("no table selected; press Ctrl+R to load the table list")]
    NoTableSelected,
}

/// Runs session tasks against a database and writes the outcome, table or
/// error text, into the output panel.
#[derive(Debug)]
pub struct Browser<B: DatabaseBackend> {
    provider: ConnectionProvider<B>,
}

impl<B: DatabaseBackend> Browser<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            provider: ConnectionProvider::new(backend),
        }
    }

    #[cfg(test)]
    pub(crate) fn provider(&self) -> &ConnectionProvider<B> {
        &self.provider
    }

    pub async fn perform(&self, task: Task, session: &mut Session) {
        log::info!("running {task:?}");
        let outcome = match task {
            Task::RefreshTables => self.refresh_tables(session).await,
            Task::PreviewTable => self.preview_table(session).await,
            Task::RunFiltered => self.run_filtered(session).await,
            Task::TurnPage(step) => self.turn_page(session, step).await,
        };

        if let Err(error) = outcome {
            log::warn!("{task:?} failed: {error}");
            session.show_output(error.to_string());
        }
    }

    async fn refresh_tables(&self, session: &mut Session) -> Result<(), BrowserError> {
        let names = self.provider.list_tables(&session.descriptor()).await?;
        log::debug!("loaded {} table names", names.len());
        session.set_tables(names);
        Ok(())
    }

    async fn preview_table(&self, session: &mut Session) -> Result<(), BrowserError> {
        let table = selected_table(session)?;
        let limit = parse_limit(session.limit_text())?;
        let query = preview_select_sql(&table, limit)?;
        self.show_query(session, &query).await
    }

    async fn run_filtered(&self, session: &mut Session) -> Result<(), BrowserError> {
        let table = selected_table(session)?;
        let limit = parse_limit(session.limit_text())?;
        let query = filtered_select_sql(&table, session.filter_text(), limit)?;
        self.show_query(session, &query).await
    }

    async fn turn_page(&self, session: &mut Session, step: PageStep) -> Result<(), BrowserError> {
        let table = selected_table(session)?;
        let request = turn_page(session.limit_text(), session.page_text(), step)?;
        session.set_page(request.page);

        let query = offset_page_sql(&table, request.limit, request.offset())?;
        self.show_query(session, &query).await
    }

    async fn show_query(
        &self,
        session: &mut Session,
        query: &BoundQuery,
    ) -> Result<(), BrowserError> {
        let result = self.provider.fetch(&session.descriptor(), query).await?;
        log::debug!(
            "query returned {} rows over {} columns",
            result.rows.len(),
            result.columns.len()
        );
        session.show_output(RenderedTable::from_result_set(&result).render());
        Ok(())
    }
}

fn selected_table(session: &Session) -> Result<String, BrowserError> {
    session
        .tables()
        .selected()
        .map(str::to_string)
        .ok_or(BrowserError::NoTableSelected)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::Browser;
    use crate::connection::{BackendError, ConnectionDescriptor, DatabaseBackend};
    use crate::pager::PageStep;
    use crate::result_table::ResultSet;
    use crate::session::{Command, Direction, Panel, Session, Task};
    use crate::sql_generator::BoundQuery;

    #[derive(Debug, Default)]
    struct FakeDatabase {
        tables: Vec<String>,
        result: ResultSet,
        executed: Mutex<Vec<BoundQuery>>,
        connects: AtomicUsize,
        disconnects: AtomicUsize,
        refuse_connections: bool,
        fail_queries: bool,
    }

    impl FakeDatabase {
        fn with_users() -> Self {
            Self {
                tables: vec!["orders".to_string(), "users".to_string()],
                result: ResultSet::new(
                    vec!["id".to_string(), "name".to_string()],
                    vec![
                        vec![Some(b"1".to_vec()), Some(b"a".to_vec())],
                        vec![Some(b"2".to_vec()), None],
                    ],
                ),
                ..Self::default()
            }
        }

        fn executed(&self) -> Vec<BoundQuery> {
            self.executed.lock().expect("lock poisoned").clone()
        }
    }

    #[async_trait::async_trait]
    impl DatabaseBackend for FakeDatabase {
        type Connection = ();

        async fn connect(&self, _descriptor: &ConnectionDescriptor) -> Result<(), BackendError> {
            if self.refuse_connections {
                return Err(BackendError::new("Access denied for user 'sail'"));
            }
            self.connects.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn disconnect(&self, _connection: ()) -> Result<(), BackendError> {
            self.disconnects.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn list_tables(&self, _connection: &mut ()) -> Result<Vec<String>, BackendError> {
            Ok(self.tables.clone())
        }

        async fn fetch(
            &self,
            _connection: &mut (),
            query: &BoundQuery,
        ) -> Result<ResultSet, BackendError> {
            self.executed.lock().expect("lock poisoned").push(query.clone());
            if self.fail_queries {
                return Err(BackendError::new("Unknown column 'nope' in 'where clause'"));
            }
            Ok(self.result.clone())
        }
    }

    async fn loaded_session(browser: &Browser<FakeDatabase>) -> Session {
        let mut session = Session::default();
        browser.perform(Task::RefreshTables, &mut session).await;
        session.handle(Command::CycleFocus);
        session.handle(Command::Navigate(Direction::Down));
        session
    }

    const USERS_TABLE: &str = "\
+----+------+
| id | name |
+----+------+
| 1  | a    |
+----+------+
| 2  | null |
+----+------+";

    #[tokio::test]
    async fn refresh_loads_table_names() {
        let browser = Browser::new(FakeDatabase::with_users());
        let session = loaded_session(&browser).await;

        assert_eq!(session.tables().names(), &["orders", "users"]);
        assert_eq!(session.tables().selected(), Some("users"));
        assert_eq!(session.focus(), Panel::Tables);
    }

    #[tokio::test]
    async fn preview_renders_selected_table_with_bound_limit() {
        let browser = Browser::new(FakeDatabase::with_users());
        let mut session = loaded_session(&browser).await;

        browser.perform(Task::PreviewTable, &mut session).await;

        assert_eq!(session.output().text(), USERS_TABLE);
        let executed = browser.provider().backend().executed();
        assert_eq!(executed[0].sql(), "SELECT * FROM `users` LIMIT ?");
        assert_eq!(executed[0].params(), &[30]);
    }

    #[tokio::test]
    async fn filtered_query_uses_where_field() {
        let browser = Browser::new(FakeDatabase::with_users());
        let mut session = loaded_session(&browser).await;
        session.handle(Command::CycleFocus);
        session.handle(Command::CycleFocus);
        for ch in "name IS NULL".chars() {
            session.handle(Command::Insert(ch));
        }

        browser.perform(Task::RunFiltered, &mut session).await;

        let executed = browser.provider().backend().executed();
        assert_eq!(
            executed[0].sql(),
            "SELECT * FROM `users` WHERE name IS NULL ORDER BY `id` LIMIT ?"
        );
        assert_eq!(session.output().text(), USERS_TABLE);
    }

    #[tokio::test]
    async fn paging_writes_page_back_and_binds_offset() {
        let browser = Browser::new(FakeDatabase::with_users());
        let mut session = loaded_session(&browser).await;

        browser
            .perform(Task::TurnPage(PageStep::Next), &mut session)
            .await;
        assert_eq!(session.page_text(), "2");
        browser
            .perform(Task::TurnPage(PageStep::Next), &mut session)
            .await;
        assert_eq!(session.page_text(), "3");
        browser
            .perform(Task::TurnPage(PageStep::Previous), &mut session)
            .await;
        assert_eq!(session.page_text(), "2");

        let offsets = browser
            .provider()
            .backend()
            .executed()
            .iter()
            .map(|query| query.params().to_vec())
            .collect::<Vec<_>>();
        assert_eq!(offsets, vec![vec![30, 30], vec![30, 60], vec![30, 30]]);
    }

    #[tokio::test]
    async fn previous_on_first_page_stays_on_first_page() {
        let browser = Browser::new(FakeDatabase::with_users());
        let mut session = loaded_session(&browser).await;

        browser
            .perform(Task::TurnPage(PageStep::Previous), &mut session)
            .await;

        assert_eq!(session.page_text(), "1");
        let executed = browser.provider().backend().executed();
        assert_eq!(executed[0].sql(), "SELECT * FROM `users` LIMIT ? OFFSET ?");
        assert_eq!(executed[0].params(), &[30, 0]);
    }

    #[tokio::test]
    async fn page_is_written_back_even_when_query_fails() {
        let browser = Browser::new(FakeDatabase {
            fail_queries: true,
            ..FakeDatabase::with_users()
        });
        let mut session = loaded_session(&browser).await;

        browser
            .perform(Task::TurnPage(PageStep::Next), &mut session)
            .await;

        assert_eq!(session.page_text(), "2");
        assert_eq!(
            session.output().text(),
            "query error: Unknown column 'nope' in 'where clause'"
        );
    }

    #[tokio::test]
    async fn malformed_limit_is_reported_without_querying() {
        let browser = Browser::new(FakeDatabase::with_users());
        let mut session = loaded_session(&browser).await;
        for _ in 0..3 {
            session.handle(Command::CycleFocus);
        }
        assert_eq!(session.focus(), Panel::Limit);
        session.handle(Command::Insert('x'));

        browser
            .perform(Task::TurnPage(PageStep::Next), &mut session)
            .await;

        assert_eq!(session.page_text(), "1");
        assert_eq!(
            session.output().text(),
            "parse error: limit `30x` is not a non-negative integer"
        );
        assert!(browser.provider().backend().executed().is_empty());
    }

    #[tokio::test]
    async fn connection_failure_is_shown_and_tables_kept() {
        let browser = Browser::new(FakeDatabase {
            refuse_connections: true,
            ..FakeDatabase::with_users()
        });
        let mut session = Session::default();
        session.set_tables(vec!["stale".to_string()]);

        browser.perform(Task::RefreshTables, &mut session).await;

        assert_eq!(session.tables().names(), &["stale"]);
        assert_eq!(
            session.output().text(),
            "connection error: Access denied for user 'sail'"
        );
    }

    #[tokio::test]
    async fn selecting_without_tables_reports_missing_selection() {
        let browser = Browser::new(FakeDatabase::default());
        let mut session = Session::default();

        browser.perform(Task::PreviewTable, &mut session).await;

        assert!(session.output().text().starts_with("no table selected"));
        assert_eq!(browser.provider().backend().connects.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn rerunning_a_query_renders_identical_output() {
        let browser = Browser::new(FakeDatabase::with_users());
        let mut session = loaded_session(&browser).await;

        browser.perform(Task::PreviewTable, &mut session).await;
        let first = session.output().text().to_string();
        browser.perform(Task::PreviewTable, &mut session).await;

        assert_eq!(session.output().text(), first);
    }

    #[tokio::test]
    async fn every_task_closes_its_connection() {
        let browser = Browser::new(FakeDatabase {
            fail_queries: true,
            ..FakeDatabase::with_users()
        });
        let mut session = loaded_session(&browser).await;
        browser.perform(Task::PreviewTable, &mut session).await;
        browser.perform(Task::RunFiltered, &mut session).await;

        let backend = browser.provider().backend();
        assert_eq!(backend.connects.load(Ordering::Relaxed), 3);
        assert_eq!(backend.disconnects.load(Ordering::Relaxed), 3);
    }
}
