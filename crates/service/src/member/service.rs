use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use super::domain::{CreateMemberInput, Member, MemberId, NewMember, UpdateMemberInput};
use super::events::{RegistrationNotifier, UserRegistered};
use super::password;
use super::repository::MemberRepository;
use crate::errors::{MemberError, RepositoryError};
use crate::pagination::Pagination;
use crate::runtime::Deadline;

/// Account lifecycle service: registration, lookup, merge-patch update and soft deletion.
///
/// Stateless apart from its collaborators; safe to share behind an `Arc` across tasks.
pub struct MemberService<R: MemberRepository + ?Sized> {
    repo: Arc<R>,
    notifier: Option<Arc<dyn RegistrationNotifier>>,
    deadline: Deadline,
}

/// Log a storage failure and wrap it.
fn storage_failure(op: &'static str) -> impl FnOnce(RepositoryError) -> MemberError {
    move |e| {
        error!(op, error = %e, "member storage call failed");
        MemberError::Database(e)
    }
}

/// Like [`storage_failure`], but a unique violation is the storage-level email guard firing
/// after our own existence check lost a race.
fn write_failure(op: &'static str) -> impl FnOnce(RepositoryError) -> MemberError {
    move |e| match e {
        RepositoryError::UniqueViolation(constraint) => {
            warn!(op, %constraint, "email uniqueness enforced by storage");
            MemberError::EmailExists
        }
        other => storage_failure(op)(other),
    }
}

impl<R: MemberRepository + ?Sized> MemberService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo, notifier: None, deadline: Deadline::none() }
    }

    /// Announce successful registrations through `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn RegistrationNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Bound every repository call by `deadline`.
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Register a new member.
    ///
    /// # Examples
    /// ```
    /// use service::member::{MemberService, domain::CreateMemberInput, repository::mock::MockMemberRepository};
    /// use std::sync::Arc;
    /// let svc = MemberService::new(Arc::new(MockMemberRepository::default()));
    /// let input = CreateMemberInput { name: "Alice".into(), email: "a@x.com".into(), password: Some("secret".into()), ..Default::default() };
    /// let member = tokio_test::block_on(svc.create(input)).unwrap();
    /// assert!(member.is_active());
    /// assert!(member.has_password());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create(&self, input: CreateMemberInput) -> Result<Member, MemberError> {
        let exists = self
            .deadline
            .run(self.repo.exists_by_email(&input.email))
            .await
            .map_err(storage_failure("exists_by_email"))?;
        if exists {
            debug!("email already registered");
            return Err(MemberError::EmailExists);
        }

        let password_hash = match input.password.as_deref() {
            Some(raw) if !raw.is_empty() => password::hash_password(raw).map_err(|e| {
                error!(error = %e, "password hashing failed");
                MemberError::Internal(e.to_string())
            })?,
            _ => String::new(),
        };

        let now = Utc::now();
        let new = NewMember {
            name: input.name,
            email: input.email,
            password_hash,
            age: input.age.unwrap_or(0),
            phone: input.phone.filter(|p| !p.is_empty()),
            avatar: input.avatar.filter(|a| !a.is_empty()),
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        let member = self
            .deadline
            .run(self.repo.create(new))
            .await
            .map_err(write_failure("create"))?;

        info!(member_id = member.id, email = %member.email, "member_created");
        self.announce(&member).await;
        Ok(member)
    }

    async fn announce(&self, member: &Member) {
        let Some(notifier) = &self.notifier else { return };
        if let Err(e) = notifier.user_registered(UserRegistered::from(member)).await {
            warn!(member_id = member.id, error = %e, "registration notification not delivered");
        }
    }

    /// Fetch a live member; soft-deleted and unknown ids are [`MemberError::NotFound`].
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: MemberId) -> Result<Member, MemberError> {
        self.deadline
            .run(self.repo.find_by_id(id))
            .await
            .map_err(storage_failure("find_by_id"))?
            .ok_or(MemberError::NotFound(id))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Member>, MemberError> {
        self.deadline
            .run(self.repo.find_by_email(email))
            .await
            .map_err(storage_failure("find_by_email"))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Member>, MemberError> {
        self.deadline
            .run(self.repo.find_by_name(name))
            .await
            .map_err(storage_failure("find_by_name"))
    }

    pub async fn list_all(&self) -> Result<Vec<Member>, MemberError> {
        self.deadline
            .run(self.repo.find_all())
            .await
            .map_err(storage_failure("find_all"))
    }

    /// Page through live members, newest id first. Returns the page and the filtered total.
    #[instrument(skip(self))]
    pub async fn paginate(&self, pagination: Pagination, keyword: &str) -> Result<(Vec<Member>, u64), MemberError> {
        let page = pagination.normalize();
        self.deadline
            .run(self.repo.paginate(page, keyword))
            .await
            .map_err(storage_failure("paginate"))
    }

    /// Apply a merge patch. Absent fields stay as they are; `updated_at` is always bumped.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: MemberId, input: UpdateMemberInput) -> Result<Member, MemberError> {
        let mut member = self.get_by_id(id).await?;

        if let Some(email) = input.email {
            if email != member.email {
                let taken = self
                    .deadline
                    .run(self.repo.exists_by_email(&email))
                    .await
                    .map_err(storage_failure("exists_by_email"))?;
                if taken {
                    debug!(member_id = id, "new email already registered");
                    return Err(MemberError::EmailExists);
                }
                member.email = email;
            }
        }
        if let Some(name) = input.name {
            member.name = name;
        }
        if let Some(age) = input.age {
            member.age = age;
        }
        if let Some(phone) = input.phone {
            member.phone = if phone.is_empty() { None } else { Some(phone) };
        }
        if let Some(avatar) = input.avatar {
            member.avatar = if avatar.is_empty() { None } else { Some(avatar) };
        }
        if let Some(status) = input.status {
            member.status = status;
        }
        member.updated_at = Utc::now();

        self.deadline
            .run(self.repo.update(&member))
            .await
            .map_err(write_failure("update"))?;

        info!(member_id = id, "member_updated");
        Ok(member)
    }

    /// Soft-delete a live member. Unknown or already deleted ids are [`MemberError::NotFound`].
    #[instrument(skip(self))]
    pub async fn delete(&self, id: MemberId) -> Result<(), MemberError> {
        self.get_by_id(id).await?;
        self.deadline
            .run(self.repo.delete(id))
            .await
            .map_err(storage_failure("delete"))?;
        info!(member_id = id, "member_deleted");
        Ok(())
    }

    /// Delete ids one by one, stopping at the first failure.
    ///
    /// Not transactional: ids before the failing one stay deleted. Callers that need per-id
    /// outcomes should call [`delete`](Self::delete) themselves.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn batch_delete(&self, ids: &[MemberId]) -> Result<(), MemberError> {
        for (done, id) in ids.iter().enumerate() {
            if let Err(e) = self.delete(*id).await {
                warn!(member_id = id, deleted = done, error = %e, "batch delete aborted");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Check an email/password pair for the authentication layer.
    ///
    /// Unknown emails, members without a password and wrong passwords all answer
    /// [`MemberError::InvalidCredentials`]; a correct password on a disabled account answers
    /// [`MemberError::AccountDisabled`].
    #[instrument(skip(self, raw_password))]
    pub async fn verify_credentials(&self, email: &str, raw_password: &str) -> Result<Member, MemberError> {
        let member = match self.get_by_email(email).await? {
            Some(m) if m.has_password() => m,
            _ => {
                password::verify_dummy(raw_password);
                return Err(MemberError::InvalidCredentials);
            }
        };
        let matches = password::verify_password(raw_password, &member.password_hash).map_err(|e| {
            error!(member_id = member.id, error = %e, "stored password hash unreadable");
            MemberError::Internal(e.to_string())
        })?;
        if !matches {
            return Err(MemberError::InvalidCredentials);
        }
        if member.is_disabled() {
            return Err(MemberError::AccountDisabled);
        }
        Ok(member)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::member::domain::MemberStatus;
    use crate::member::events::BroadcastNotifier;
    use crate::member::repository::mock::MockMemberRepository;
    use crate::pagination::PageRequest;

    fn svc() -> (Arc<MockMemberRepository>, MemberService<MockMemberRepository>) {
        let repo = Arc::new(MockMemberRepository::default());
        (repo.clone(), MemberService::new(repo))
    }

    fn alice() -> CreateMemberInput {
        CreateMemberInput {
            name: "Alice".into(),
            email: "a@x.com".into(),
            password: Some("secret".into()),
            ..Default::default()
        }
    }

    fn named(name: &str, email: &str) -> CreateMemberInput {
        CreateMemberInput { name: name.into(), email: email.into(), ..Default::default() }
    }

    #[tokio::test]
    async fn create_get_delete_scenario() {
        let (_, svc) = svc();
        let created = svc.create(alice()).await.unwrap();
        assert_eq!(created.status, MemberStatus::Active);
        assert!(created.has_password());
        assert_ne!(created.password_hash, "secret");

        let fetched = svc.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.email, "a@x.com");
        assert_eq!(fetched.name, "Alice");

        let dup = svc.create(alice()).await.unwrap_err();
        assert!(matches!(dup, MemberError::EmailExists));

        svc.delete(created.id).await.unwrap();
        let gone = svc.get_by_id(created.id).await.unwrap_err();
        assert!(matches!(gone, MemberError::NotFound(id) if id == created.id));
    }

    #[tokio::test]
    async fn duplicate_email_performs_no_write() {
        let (repo, svc) = svc();
        svc.create(alice()).await.unwrap();
        let writes = repo.write_count();
        assert!(matches!(svc.create(alice()).await, Err(MemberError::EmailExists)));
        assert_eq!(repo.write_count(), writes);
    }

    #[tokio::test]
    async fn create_defaults_and_normalization() {
        let (_, svc) = svc();
        let m = svc
            .create(CreateMemberInput { phone: Some(String::new()), password: Some(String::new()), ..named("Bob", "b@x.com") })
            .await
            .unwrap();
        assert_eq!(m.phone, None);
        assert_eq!(m.age, 0);
        assert!(!m.has_password());
        assert!(m.is_active());
        assert_eq!(m.created_at, m.updated_at);

        let d = svc
            .create(CreateMemberInput { status: Some(MemberStatus::Disabled), phone: Some("555".into()), ..named("Dan", "d@x.com") })
            .await
            .unwrap();
        assert!(d.is_disabled());
        assert_eq!(d.phone.as_deref(), Some("555"));
    }

    #[tokio::test]
    async fn email_reusable_after_soft_delete() {
        let (repo, svc) = svc();
        let first = svc.create(alice()).await.unwrap();
        svc.delete(first.id).await.unwrap();
        assert!(repo.raw(first.id).unwrap().deleted_at.is_some());
        let second = svc.create(alice()).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn update_without_fields_only_touches_timestamp() {
        let (_, svc) = svc();
        let before = svc
            .create(CreateMemberInput { phone: Some("123".into()), age: Some(40), ..alice() })
            .await
            .unwrap();
        let after = svc.update(before.id, UpdateMemberInput::default()).await.unwrap();
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(Member { updated_at: before.updated_at, ..after.clone() }, before);
        assert_eq!(svc.get_by_id(before.id).await.unwrap(), after);
    }

    #[tokio::test]
    async fn update_phone_clear_versus_omit() {
        let (_, svc) = svc();
        let m = svc.create(CreateMemberInput { phone: Some("123".into()), ..alice() }).await.unwrap();

        let kept = svc
            .update(m.id, UpdateMemberInput { name: Some("Alicia".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(kept.phone.as_deref(), Some("123"));
        assert_eq!(kept.name, "Alicia");

        let cleared = svc
            .update(m.id, UpdateMemberInput { phone: Some(String::new()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(cleared.phone, None);
        assert_eq!(cleared.name, "Alicia");
    }

    #[tokio::test]
    async fn avatar_follows_phone_rules() {
        let (_, svc) = svc();
        let blank = svc
            .create(CreateMemberInput { avatar: Some(String::new()), ..named("Bob", "b@x.com") })
            .await
            .unwrap();
        assert_eq!(blank.avatar, None);

        let m = svc
            .create(CreateMemberInput { avatar: Some("https://cdn/a.png".into()), ..alice() })
            .await
            .unwrap();
        assert_eq!(m.avatar.as_deref(), Some("https://cdn/a.png"));

        let kept = svc.update(m.id, UpdateMemberInput { age: Some(33), ..Default::default() }).await.unwrap();
        assert_eq!(kept.avatar.as_deref(), Some("https://cdn/a.png"));

        let swapped = svc
            .update(m.id, UpdateMemberInput { avatar: Some("https://cdn/b.png".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(swapped.avatar.as_deref(), Some("https://cdn/b.png"));

        let cleared = svc
            .update(m.id, UpdateMemberInput { avatar: Some(String::new()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(cleared.avatar, None);
        assert_eq!(svc.get_by_id(m.id).await.unwrap().avatar, None);
    }

    #[tokio::test]
    async fn update_email_checks_uniqueness() {
        let (_, svc) = svc();
        let a = svc.create(alice()).await.unwrap();
        svc.create(named("Bob", "b@x.com")).await.unwrap();

        let err = svc
            .update(a.id, UpdateMemberInput { email: Some("b@x.com".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, MemberError::EmailExists));

        // same email is not a conflict with itself
        let same = svc
            .update(a.id, UpdateMemberInput { email: Some("a@x.com".into()), age: Some(31), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(same.age, 31);

        let moved = svc
            .update(a.id, UpdateMemberInput { email: Some("new@x.com".into()), status: Some(MemberStatus::Disabled), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(moved.email, "new@x.com");
        assert!(moved.is_disabled());
    }

    #[tokio::test]
    async fn update_unknown_member_is_not_found() {
        let (_, svc) = svc();
        let err = svc.update(42, UpdateMemberInput::default()).await.unwrap_err();
        assert!(matches!(err, MemberError::NotFound(42)));
    }

    #[tokio::test]
    async fn delete_is_not_idempotent() {
        let (_, svc) = svc();
        let m = svc.create(alice()).await.unwrap();
        svc.delete(m.id).await.unwrap();
        assert!(matches!(svc.delete(m.id).await, Err(MemberError::NotFound(_))));
        assert!(matches!(svc.delete(999).await, Err(MemberError::NotFound(999))));
    }

    #[tokio::test]
    async fn batch_delete_stops_at_first_failure() {
        let (repo, svc) = svc();
        let one = svc.create(named("One", "1@x.com")).await.unwrap();
        let two = svc.create(named("Two", "2@x.com")).await.unwrap();
        let three = svc.create(named("Three", "3@x.com")).await.unwrap();
        assert_eq!((one.id, two.id), (1, 2));

        let err = svc.batch_delete(&[1, 2, 999, three.id]).await.unwrap_err();
        assert!(matches!(err, MemberError::NotFound(999)));
        assert!(repo.raw(1).unwrap().deleted_at.is_some());
        assert!(repo.raw(2).unwrap().deleted_at.is_some());
        // ids after the failure are left alone
        assert!(svc.get_by_id(three.id).await.is_ok());
    }

    #[tokio::test]
    async fn paginate_normalizes_and_filters() {
        let (_, svc) = svc();
        for i in 0..25 {
            svc.create(named(&format!("user{i}"), &format!("u{i}@x.com"))).await.unwrap();
        }
        svc.create(named("Zed", "zed@other.org")).await.unwrap();

        for size in [0, 1000] {
            let (page, total) = svc.paginate(Pagination::new(1, size), "").await.unwrap();
            assert_eq!(page.len(), 10);
            assert_eq!(total, 26);
        }

        let (page, _) = svc.paginate(Pagination::new(0, 5), "").await.unwrap();
        let ids: Vec<_> = page.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![26, 25, 24, 23, 22]);

        let (page, total) = svc.paginate(Pagination::new(3, 10), "").await.unwrap();
        assert_eq!(page.len(), 6);
        assert_eq!(total, 26);

        let (page, total) = svc.paginate(Pagination::default(), "other.org").await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].name, "Zed");

        let (_, total) = svc.paginate(Pagination::default(), "user1").await.unwrap();
        assert_eq!(total, 11); // user1, user10..user19
    }

    #[tokio::test]
    async fn lookups_by_email_and_name() {
        let (_, svc) = svc();
        let a = svc.create(alice()).await.unwrap();
        assert_eq!(svc.get_by_email("a@x.com").await.unwrap().map(|m| m.id), Some(a.id));
        assert_eq!(svc.get_by_name("Alice").await.unwrap().map(|m| m.id), Some(a.id));
        assert!(svc.get_by_email("nobody@x.com").await.unwrap().is_none());
        assert_eq!(svc.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn storage_failures_are_database_errors() {
        let (repo, svc) = svc();
        let m = svc.create(alice()).await.unwrap();
        repo.set_failing(true);
        assert!(matches!(svc.get_by_id(m.id).await, Err(MemberError::Database(_))));
        assert!(matches!(svc.create(named("B", "b@x.com")).await, Err(MemberError::Database(_))));
        assert!(matches!(svc.paginate(Pagination::default(), "").await, Err(MemberError::Database(_))));
        assert!(matches!(svc.delete(m.id).await, Err(MemberError::Database(_))));
    }

    #[tokio::test]
    async fn deadline_turns_slow_storage_into_database_error() {
        let repo = Arc::new(MockMemberRepository::default());
        let svc = MemberService::new(repo.clone()).with_deadline(Deadline::after(Duration::from_millis(20)));
        repo.set_latency(Some(Duration::from_millis(500)));
        let err = svc.get_by_id(1).await.unwrap_err();
        assert!(err.is_timeout());
    }

    /// Existence check always says "free", as if another writer raced us.
    struct RacingRepo(MockMemberRepository);

    #[async_trait]
    impl MemberRepository for RacingRepo {
        async fn create(&self, m: NewMember) -> Result<Member, RepositoryError> { self.0.create(m).await }
        async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, RepositoryError> { self.0.find_by_id(id).await }
        async fn find_all(&self) -> Result<Vec<Member>, RepositoryError> { self.0.find_all().await }
        async fn update(&self, m: &Member) -> Result<(), RepositoryError> { self.0.update(m).await }
        async fn delete(&self, id: MemberId) -> Result<(), RepositoryError> { self.0.delete(id).await }
        async fn paginate(&self, p: PageRequest, k: &str) -> Result<(Vec<Member>, u64), RepositoryError> { self.0.paginate(p, k).await }
        async fn find_by_email(&self, e: &str) -> Result<Option<Member>, RepositoryError> { self.0.find_by_email(e).await }
        async fn find_by_name(&self, n: &str) -> Result<Option<Member>, RepositoryError> { self.0.find_by_name(n).await }
        async fn exists_by_email(&self, _e: &str) -> Result<bool, RepositoryError> { Ok(false) }
    }

    #[tokio::test]
    async fn storage_unique_violation_maps_to_email_exists() {
        let svc = MemberService::new(Arc::new(RacingRepo(MockMemberRepository::default())));
        let a = svc.create(alice()).await.unwrap();
        assert!(matches!(svc.create(alice()).await, Err(MemberError::EmailExists)));

        let b = svc.create(named("Bob", "b@x.com")).await.unwrap();
        let err = svc
            .update(b.id, UpdateMemberInput { email: Some(a.email.clone()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, MemberError::EmailExists));
    }

    #[tokio::test]
    async fn registration_is_announced() {
        let bus = Arc::new(BroadcastNotifier::new(4));
        let mut rx = bus.subscribe();
        let svc = MemberService::new(Arc::new(MockMemberRepository::default())).with_notifier(bus);
        let m = svc.create(alice()).await.unwrap();
        let ev = rx.recv().await.unwrap();
        assert_eq!((ev.user_id, ev.user_name.as_str(), ev.email.as_str()), (m.id, "Alice", "a@x.com"));
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_create() {
        // no subscribers: every send fails
        let bus = Arc::new(BroadcastNotifier::new(4));
        let svc = MemberService::new(Arc::new(MockMemberRepository::default())).with_notifier(bus);
        assert!(svc.create(alice()).await.is_ok());
    }

    #[tokio::test]
    async fn verify_credentials_outcomes() {
        let (_, svc) = svc();
        let a = svc.create(alice()).await.unwrap();
        assert_eq!(svc.verify_credentials("a@x.com", "secret").await.unwrap().id, a.id);
        assert!(matches!(svc.verify_credentials("a@x.com", "nope").await, Err(MemberError::InvalidCredentials)));
        assert!(matches!(svc.verify_credentials("x@x.com", "secret").await, Err(MemberError::InvalidCredentials)));

        svc.create(named("NoPass", "np@x.com")).await.unwrap();
        assert!(matches!(svc.verify_credentials("np@x.com", "").await, Err(MemberError::InvalidCredentials)));

        svc.update(a.id, UpdateMemberInput { status: Some(MemberStatus::Disabled), ..Default::default() })
            .await
            .unwrap();
        assert!(matches!(svc.verify_credentials("a@x.com", "secret").await, Err(MemberError::AccountDisabled)));
        assert!(matches!(svc.verify_credentials("a@x.com", "nope").await, Err(MemberError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn unreadable_stored_hash_is_internal() {
        let (repo, svc) = svc();
        let a = svc.create(alice()).await.unwrap();
        repo.update(&Member { password_hash: "garbage".into(), ..a }).await.unwrap();

        let err = svc.verify_credentials("a@x.com", "secret").await.unwrap_err();
        assert!(matches!(err, MemberError::Internal(_)));
        assert_eq!(err.kind(), crate::error_catalog::ErrorKind::InternalError);
    }
}
