use async_trait::async_trait;

use super::domain::{Member, MemberId, NewMember};
use crate::errors::RepositoryError;
use crate::pagination::PageRequest;

/// Repository abstraction for member persistence.
///
/// Every query ignores soft-deleted rows. "Not found" is `Ok(None)`, never an error.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn create(&self, member: NewMember) -> Result<Member, RepositoryError>;
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<Member>, RepositoryError>;
    /// Full-row save of an existing member.
    async fn update(&self, member: &Member) -> Result<(), RepositoryError>;
    /// Soft delete: sets `deleted_at`, keeps the row.
    async fn delete(&self, id: MemberId) -> Result<(), RepositoryError>;
    /// Newest id first; `keyword` (if non-empty) matches name or email as a substring.
    /// Returns the page and the total size of the filtered set.
    async fn paginate(&self, page: PageRequest, keyword: &str) -> Result<(Vec<Member>, u64), RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>, RepositoryError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Member>, RepositoryError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Mutex, MutexGuard};
    use std::time::Duration;

    use chrono::Utc;

    /// Behaves like the SeaORM repository, including the live-email unique index.
    /// Knobs let tests inject storage failures and latency.
    #[derive(Default)]
    pub struct MockMemberRepository {
        rows: Mutex<BTreeMap<MemberId, Member>>, // includes soft-deleted rows
        next_id: Mutex<MemberId>,
        failing: AtomicBool,
        latency: Mutex<Option<Duration>>,
        writes: AtomicUsize,
    }

    impl MockMemberRepository {
        /// Every subsequent call fails with [`RepositoryError::Db`].
        pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

        /// Every subsequent call sleeps this long first.
        pub fn set_latency(&self, latency: Option<Duration>) { *self.latency.lock().expect("mock lock") = latency; }

        /// Number of successful create/update/delete calls.
        pub fn write_count(&self) -> usize { self.writes.load(Ordering::SeqCst) }

        /// Raw row lookup that bypasses the soft-delete filter.
        pub fn raw(&self, id: MemberId) -> Option<Member> { self.rows().get(&id).cloned() }

        fn rows(&self) -> MutexGuard<'_, BTreeMap<MemberId, Member>> { self.rows.lock().expect("mock lock") }

        async fn gate(&self) -> Result<(), RepositoryError> {
            let latency = *self.latency.lock().expect("mock lock");
            if let Some(d) = latency {
                tokio::time::sleep(d).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(RepositoryError::Db("mock storage unavailable".into()));
            }
            Ok(())
        }

        fn live_email_taken(rows: &BTreeMap<MemberId, Member>, email: &str, except: Option<MemberId>) -> bool {
            rows.values()
                .any(|m| m.deleted_at.is_none() && m.email == email && Some(m.id) != except)
        }
    }

    #[async_trait]
    impl MemberRepository for MockMemberRepository {
        async fn create(&self, member: NewMember) -> Result<Member, RepositoryError> {
            self.gate().await?;
            let mut rows = self.rows();
            if Self::live_email_taken(&rows, &member.email, None) {
                return Err(RepositoryError::UniqueViolation("uniq_member_email_live".into()));
            }
            let id = {
                let mut next = self.next_id.lock().expect("mock lock");
                *next += 1;
                *next
            };
            let created = Member {
                id,
                name: member.name,
                email: member.email,
                password_hash: member.password_hash,
                age: member.age,
                phone: member.phone,
                avatar: member.avatar,
                status: member.status,
                created_at: member.created_at,
                updated_at: member.updated_at,
                deleted_at: None,
            };
            rows.insert(id, created.clone());
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(created)
        }

        async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, RepositoryError> {
            self.gate().await?;
            Ok(self.rows().get(&id).filter(|m| m.deleted_at.is_none()).cloned())
        }

        async fn find_all(&self) -> Result<Vec<Member>, RepositoryError> {
            self.gate().await?;
            Ok(self.rows().values().filter(|m| m.deleted_at.is_none()).cloned().collect())
        }

        async fn update(&self, member: &Member) -> Result<(), RepositoryError> {
            self.gate().await?;
            let mut rows = self.rows();
            if Self::live_email_taken(&rows, &member.email, Some(member.id)) {
                return Err(RepositoryError::UniqueViolation("uniq_member_email_live".into()));
            }
            match rows.get_mut(&member.id) {
                Some(row) if row.deleted_at.is_none() => *row = member.clone(),
                _ => return Err(RepositoryError::Db(format!("member {} not updated", member.id))),
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete(&self, id: MemberId) -> Result<(), RepositoryError> {
            self.gate().await?;
            if let Some(row) = self.rows().get_mut(&id).filter(|m| m.deleted_at.is_none()) {
                row.deleted_at = Some(Utc::now());
                self.writes.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }

        async fn paginate(&self, page: PageRequest, keyword: &str) -> Result<(Vec<Member>, u64), RepositoryError> {
            self.gate().await?;
            let rows = self.rows();
            let matching: Vec<&Member> = rows
                .values()
                .rev()
                .filter(|m| m.deleted_at.is_none())
                .filter(|m| keyword.is_empty() || m.name.contains(keyword) || m.email.contains(keyword))
                .collect();
            let total = matching.len() as u64;
            let items = matching
                .into_iter()
                .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
                .take(page.per_page as usize)
                .cloned()
                .collect();
            Ok((items, total))
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<Member>, RepositoryError> {
            self.gate().await?;
            Ok(self.rows().values().find(|m| m.deleted_at.is_none() && m.email == email).cloned())
        }

        async fn find_by_name(&self, name: &str) -> Result<Option<Member>, RepositoryError> {
            self.gate().await?;
            Ok(self.rows().values().find(|m| m.deleted_at.is_none() && m.name == name).cloned())
        }

        async fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError> {
            self.gate().await?;
            Ok(Self::live_email_taken(&self.rows(), email, None))
        }
    }
}
