use async_trait::async_trait;

use super::domain::{LoginLog, LoginLogQuery, NewLoginLog};
use crate::errors::RepositoryError;
use crate::member::domain::MemberId;
use crate::pagination::PageRequest;

/// Append-only store of login events. Listings are newest first and return the filtered total.
#[async_trait]
pub trait LoginLogRepository: Send + Sync {
    async fn create(&self, log: NewLoginLog) -> Result<LoginLog, RepositoryError>;
    async fn find_by_user_id(&self, user_id: MemberId, page: PageRequest) -> Result<(Vec<LoginLog>, u64), RepositoryError>;
    async fn paginate(&self, page: PageRequest, query: LoginLogQuery) -> Result<(Vec<LoginLog>, u64), RepositoryError>;
}

/// In-memory mock for tests
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, MutexGuard};

    use chrono::{DateTime, Utc};

    use crate::login_log::domain::LoginEvent;

    #[derive(Default)]
    pub struct MockLoginLogRepository {
        rows: Mutex<Vec<LoginLog>>,
        failing: AtomicBool,
    }

    impl MockLoginLogRepository {
        pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

        /// Insert a row with an explicit timestamp, bypassing `created_at = now`.
        pub fn seed(&self, event: LoginEvent, created_at: DateTime<Utc>) -> LoginLog {
            let mut rows = self.rows();
            let log = Self::row(rows.len() as i64 + 1, event, created_at);
            rows.push(log.clone());
            log
        }

        pub fn len(&self) -> usize { self.rows().len() }

        pub fn is_empty(&self) -> bool { self.rows().is_empty() }

        fn rows(&self) -> MutexGuard<'_, Vec<LoginLog>> { self.rows.lock().expect("mock lock") }

        fn row(id: i64, e: LoginEvent, created_at: DateTime<Utc>) -> LoginLog {
            LoginLog {
                id,
                user_id: e.user_id,
                username: e.username,
                ip: e.ip,
                user_agent: e.user_agent,
                device_id: e.device_id,
                city: e.city,
                country: e.country,
                created_at,
            }
        }

        fn check(&self) -> Result<(), RepositoryError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(RepositoryError::Db("mock storage unavailable".into()));
            }
            Ok(())
        }

        fn select(&self, page: PageRequest, query: &LoginLogQuery) -> (Vec<LoginLog>, u64) {
            let rows = self.rows();
            let mut matching: Vec<&LoginLog> = rows.iter().filter(|l| query.matches(l)).collect();
            matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            let total = matching.len() as u64;
            let items = matching
                .into_iter()
                .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
                .take(page.per_page as usize)
                .cloned()
                .collect();
            (items, total)
        }
    }

    #[async_trait]
    impl LoginLogRepository for MockLoginLogRepository {
        async fn create(&self, log: NewLoginLog) -> Result<LoginLog, RepositoryError> {
            self.check()?;
            Ok(self.seed(log.event, log.created_at))
        }

        async fn find_by_user_id(&self, user_id: MemberId, page: PageRequest) -> Result<(Vec<LoginLog>, u64), RepositoryError> {
            self.check()?;
            Ok(self.select(page, &LoginLogQuery { user_id: Some(user_id), ..Default::default() }))
        }

        async fn paginate(&self, page: PageRequest, query: LoginLogQuery) -> Result<(Vec<LoginLog>, u64), RepositoryError> {
            self.check()?;
            Ok(self.select(page, &query))
        }
    }
}
