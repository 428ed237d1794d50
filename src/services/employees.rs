use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{DatabaseAccess, DbPool},
    entities::{employee, Employee},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewEmployee {
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(length(min = 1, max = 60))]
    pub role: String,
    #[validate(length(max = 60))]
    pub section: Option<String>,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    pub hired_on: Option<NaiveDate>,
}

/// Service for the personnel registry
#[derive(Clone)]
pub struct EmployeeService {
    db: DatabaseAccess,
    event_sender: EventSender,
}

impl EmployeeService {
    /// Creates a new employee service instance
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db: DatabaseAccess::new(db),
            event_sender,
        }
    }

    #[instrument(skip(self, new), fields(name = %new.full_name))]
    pub async fn create_employee(&self, new: NewEmployee) -> Result<employee::Model, ServiceError> {
        new.validate()?;

        let created = self
            .db
            .execute("employee.create", |db| async move {
                let now = Utc::now();
                employee::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    full_name: Set(new.full_name),
                    role: Set(new.role),
                    section: Set(new.section),
                    phone: Set(new.phone),
                    hired_on: Set(new.hired_on),
                    active: Set(true),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(db.as_ref())
                .await
            })
            .await?;

        self.event_sender
            .send(Event::EmployeeCreated(created.id))
            .await
            .map_err(ServiceError::EventError)?;

        info!(employee_id = %created.id, "employee registered");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_employee(&self, id: Uuid) -> Result<employee::Model, ServiceError> {
        self.db
            .execute("employee.get", |db| async move {
                Employee::find_by_id(id).one(db.as_ref()).await
            })
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", id)))
    }

    /// Registry listing, ordered by name.
    #[instrument(skip(self))]
    pub async fn list_employees(
        &self,
        page: u64,
        limit: u64,
        active_only: bool,
    ) -> Result<(Vec<employee::Model>, u64), ServiceError> {
        self.db
            .execute("employee.list", |db| async move {
                let mut query = Employee::find().order_by_asc(employee::Column::FullName);
                if active_only {
                    query = query.filter(employee::Column::Active.eq(true));
                }
                let paginator = query.paginate(db.as_ref(), limit.max(1));
                let total = paginator.num_items().await?;
                let employees = paginator.fetch_page(page.saturating_sub(1)).await?;
                Ok((employees, total))
            })
            .await
    }
}
