use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument};

use super::domain::{ListPageInput, LoginEvent, LoginLog, LoginLogQuery, NewLoginLog};
use super::repository::LoginLogRepository;
use crate::errors::{MemberError, RepositoryError};
use crate::member::domain::MemberId;
use crate::pagination::Pagination;
use crate::runtime::Deadline;

/// Records successful logins and pages through them.
pub struct LoginLogService<R: LoginLogRepository + ?Sized> {
    repo: Arc<R>,
    deadline: Deadline,
}

fn storage_failure(op: &'static str) -> impl FnOnce(RepositoryError) -> MemberError {
    move |e| {
        error!(op, error = %e, "login log storage call failed");
        MemberError::Database(e)
    }
}

impl<R: LoginLogRepository + ?Sized> LoginLogService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo, deadline: Deadline::none() }
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Append one entry stamped with the current time.
    #[instrument(skip(self, event), fields(member_id = event.user_id))]
    pub async fn record_login(&self, event: LoginEvent) -> Result<LoginLog, MemberError> {
        let log = self
            .deadline
            .run(self.repo.create(NewLoginLog { event, created_at: Utc::now() }))
            .await
            .map_err(storage_failure("create"))?;
        info!(login_log_id = log.id, "login_recorded");
        Ok(log)
    }

    /// Filtered listing, newest first.
    #[instrument(skip(self))]
    pub async fn list_page(&self, input: ListPageInput) -> Result<(Vec<LoginLog>, u64), MemberError> {
        let page = Pagination::new(input.page, input.page_size).normalize();
        let query = LoginLogQuery::from_input(&input);
        self.deadline
            .run(self.repo.paginate(page, query))
            .await
            .map_err(storage_failure("paginate"))
    }

    /// One member's logins, newest first.
    #[instrument(skip(self))]
    pub async fn get_by_user_id(&self, user_id: MemberId, page: i64, page_size: i64) -> Result<(Vec<LoginLog>, u64), MemberError> {
        let page = Pagination::new(page, page_size).normalize();
        self.deadline
            .run(self.repo.find_by_user_id(user_id, page))
            .await
            .map_err(storage_failure("find_by_user_id"))
    }
}
