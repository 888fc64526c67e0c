use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Select, Set,
};

use models::member_login_log::{self, Column, Entity};

use crate::errors::RepositoryError;
use crate::login_log::domain::{LoginLog, LoginLogQuery, NewLoginLog};
use crate::login_log::repository::LoginLogRepository;
use crate::member::domain::MemberId;
use crate::pagination::PageRequest;

pub struct SeaOrmLoginLogRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmLoginLogRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    async fn page(&self, query: Select<Entity>, page: PageRequest) -> Result<(Vec<LoginLog>, u64), RepositoryError> {
        let query = query.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);
        let total = query.clone().count(&self.db).await?;
        let rows = query.limit(page.per_page).offset(page.offset()).all(&self.db).await?;
        Ok((rows.into_iter().map(to_domain).collect(), total))
    }
}

fn to_domain(m: member_login_log::Model) -> LoginLog {
    LoginLog {
        id: m.id,
        user_id: m.user_id,
        username: m.username,
        ip: m.ip,
        user_agent: m.user_agent,
        device_id: m.device_id,
        city: m.city,
        country: m.country,
        created_at: m.created_at.with_timezone(&Utc),
    }
}

#[async_trait]
impl LoginLogRepository for SeaOrmLoginLogRepository {
    async fn create(&self, log: NewLoginLog) -> Result<LoginLog, RepositoryError> {
        let e = log.event;
        let am = member_login_log::ActiveModel {
            user_id: Set(e.user_id),
            username: Set(e.username),
            ip: Set(e.ip),
            user_agent: Set(e.user_agent),
            device_id: Set(e.device_id),
            city: Set(e.city),
            country: Set(e.country),
            created_at: Set(log.created_at.into()),
            ..Default::default()
        };
        Ok(to_domain(am.insert(&self.db).await?))
    }

    async fn find_by_user_id(&self, user_id: MemberId, page: PageRequest) -> Result<(Vec<LoginLog>, u64), RepositoryError> {
        self.page(Entity::find().filter(Column::UserId.eq(user_id)), page).await
    }

    async fn paginate(&self, page: PageRequest, query: LoginLogQuery) -> Result<(Vec<LoginLog>, u64), RepositoryError> {
        let mut select = Entity::find();
        if let Some(user_id) = query.user_id {
            select = select.filter(Column::UserId.eq(user_id));
        }
        if let Some(from) = query.created_from {
            select = select.filter(Column::CreatedAt.gte(from));
        }
        if let Some(before) = query.created_before {
            select = select.filter(Column::CreatedAt.lt(before));
        }
        self.page(select, page).await
    }
}
