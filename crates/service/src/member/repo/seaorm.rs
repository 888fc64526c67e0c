use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
};

use models::member::{self, Column, Entity};

use crate::errors::RepositoryError;
use crate::member::domain::{Member, MemberId, MemberStatus, NewMember};
use crate::member::repository::MemberRepository;
use crate::pagination::PageRequest;

pub struct SeaOrmMemberRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmMemberRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

/// Rows that have not been soft-deleted.
fn live() -> Select<Entity> {
    Entity::find().filter(Column::DeletedAt.is_null())
}

fn to_domain(m: member::Model) -> Result<Member, RepositoryError> {
    let status = MemberStatus::from_i16(m.status)
        .ok_or_else(|| RepositoryError::Db(format!("member {} has unknown status {}", m.id, m.status)))?;
    let age = u16::try_from(m.age)
        .map_err(|_| RepositoryError::Db(format!("member {} has out of range age {}", m.id, m.age)))?;
    Ok(Member {
        id: m.id,
        name: m.name,
        email: m.email,
        password_hash: m.password_hash,
        age,
        phone: m.phone,
        avatar: m.avatar,
        status,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
        deleted_at: m.deleted_at.map(|d| d.with_timezone(&Utc)),
    })
}

#[async_trait]
impl MemberRepository for SeaOrmMemberRepository {
    async fn create(&self, m: NewMember) -> Result<Member, RepositoryError> {
        let am = member::ActiveModel {
            name: Set(m.name),
            email: Set(m.email),
            password_hash: Set(m.password_hash),
            age: Set(i32::from(m.age)),
            phone: Set(m.phone),
            avatar: Set(m.avatar),
            status: Set(m.status.as_i16()),
            created_at: Set(m.created_at.into()),
            updated_at: Set(m.updated_at.into()),
            deleted_at: Set(None),
            ..Default::default()
        };
        to_domain(am.insert(&self.db).await?)
    }

    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, RepositoryError> {
        live().filter(Column::Id.eq(id)).one(&self.db).await?.map(to_domain).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Member>, RepositoryError> {
        live()
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn update(&self, m: &Member) -> Result<(), RepositoryError> {
        let am = member::ActiveModel {
            name: Set(m.name.clone()),
            email: Set(m.email.clone()),
            password_hash: Set(m.password_hash.clone()),
            age: Set(i32::from(m.age)),
            phone: Set(m.phone.clone()),
            avatar: Set(m.avatar.clone()),
            status: Set(m.status.as_i16()),
            updated_at: Set(m.updated_at.into()),
            ..Default::default()
        };
        let res = Entity::update_many()
            .set(am)
            .filter(Column::Id.eq(m.id))
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Err(RepositoryError::Db(format!("member {} not updated", m.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: MemberId) -> Result<(), RepositoryError> {
        let am = member::ActiveModel {
            deleted_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };
        Entity::update_many()
            .set(am)
            .filter(Column::Id.eq(id))
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn paginate(&self, page: PageRequest, keyword: &str) -> Result<(Vec<Member>, u64), RepositoryError> {
        let mut query = live();
        if !keyword.is_empty() {
            query = query.filter(
                Condition::any()
                    .add(Column::Name.contains(keyword))
                    .add(Column::Email.contains(keyword)),
            );
        }
        let query = query.order_by_desc(Column::Id);
        let total = query.clone().count(&self.db).await?;
        let rows = query.limit(page.per_page).offset(page.offset()).all(&self.db).await?;
        let items = rows.into_iter().map(to_domain).collect::<Result<Vec<_>, _>>()?;
        Ok((items, total))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>, RepositoryError> {
        live().filter(Column::Email.eq(email)).one(&self.db).await?.map(to_domain).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Member>, RepositoryError> {
        live()
            .filter(Column::Name.eq(name))
            .order_by_asc(Column::Id)
            .one(&self.db)
            .await?
            .map(to_domain)
            .transpose()
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError> {
        Ok(live().filter(Column::Email.eq(email)).count(&self.db).await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    use super::*;
    use crate::pagination::Pagination;
    use crate::test_support::{try_db, unique_email};

    fn new_member(name: &str, email: &str) -> NewMember {
        let now = Utc::now();
        NewMember {
            name: name.into(),
            email: email.into(),
            password_hash: String::new(),
            age: 21,
            phone: Some("555-0100".into()),
            avatar: Some("https://cdn.example/a.png".into()),
            status: MemberStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn crud_round_trip_against_postgres() {
        let Some(db) = try_db().await else { return };
        let repo = SeaOrmMemberRepository::new(db);
        let email = unique_email("repo");

        let created = repo.create(new_member("Repo User", &email)).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.age, 21);
        assert_eq!(created.avatar.as_deref(), Some("https://cdn.example/a.png"));
        assert!(repo.exists_by_email(&email).await.unwrap());

        let mut changed = created.clone();
        changed.phone = None;
        changed.avatar = None;
        changed.status = MemberStatus::Disabled;
        repo.update(&changed).await.unwrap();
        let fetched = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.phone, None);
        assert_eq!(fetched.avatar, None);
        assert!(fetched.is_disabled());

        repo.delete(created.id).await.unwrap();
        assert!(repo.find_by_id(created.id).await.unwrap().is_none());
        assert!(repo.find_by_email(&email).await.unwrap().is_none());
        assert!(!repo.exists_by_email(&email).await.unwrap());
    }

    #[tokio::test]
    async fn live_email_is_unique_but_reusable_after_delete() {
        let Some(db) = try_db().await else { return };
        let repo = SeaOrmMemberRepository::new(db);
        let email = unique_email("uniq");

        let first = repo.create(new_member("First", &email)).await.unwrap();
        let err = repo.create(new_member("Second", &email)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueViolation(_)));

        repo.delete(first.id).await.unwrap();
        let again = repo.create(new_member("Third", &email)).await.unwrap();
        assert_ne!(again.id, first.id);
    }

    #[tokio::test]
    async fn paginate_filters_by_keyword() {
        let Some(db) = try_db().await else { return };
        let repo = SeaOrmMemberRepository::new(db);
        let tag = uuid::Uuid::new_v4().simple().to_string();
        for i in 0..3 {
            repo.create(new_member(&format!("kw-{tag}-{i}"), &unique_email("kw"))).await.unwrap();
        }
        let (items, total) = repo.paginate(PageRequest { page: 1, per_page: 2 }, &tag).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(items.len(), 2);
        assert!(items[0].id > items[1].id);
    }

    #[tokio::test]
    async fn paginate_far_past_the_end_is_empty() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[BTreeMap::from([("num_items", Value::BigInt(Some(3)))])]])
            .append_query_results([Vec::<member::Model>::new()])
            .into_connection();
        let repo = SeaOrmMemberRepository::new(db);

        let (items, total) = repo.paginate(Pagination::new(i64::MAX, 10).normalize(), "").await.unwrap();
        assert!(items.is_empty());
        assert_eq!(total, 3);

        let log = format!("{:?}", repo.db.into_transaction_log());
        assert!(log.contains(&i64::MAX.to_string()));
    }
}
