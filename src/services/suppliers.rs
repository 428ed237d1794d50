use std::sync::Arc;

use chrono::Utc;
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
    entities::{supplier, Supplier},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewSupplier {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 120))]
    pub contact_name: Option<String>,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    #[validate(length(max = 60))]
    pub collection_route: Option<String>,
}

/// Service for managing the milk supplier directory
#[derive(Clone)]
pub struct SupplierService {
    db: DatabaseAccess,
    event_sender: EventSender,
}

impl SupplierService {
    /// Creates a new supplier service instance
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db: DatabaseAccess::new(db),
            event_sender,
        }
    }

    /// Registers a supplier. Names are unique across the directory.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_supplier(&self, new: NewSupplier) -> Result<supplier::Model, ServiceError> {
        new.validate()?;

        let created = self
            .db
            .transaction::<_, supplier::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let duplicate = Supplier::find()
                        .filter(supplier::Column::Name.eq(new.name.as_str()))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    if duplicate.is_some() {
                        return Err(ServiceError::Conflict(format!(
                            "A supplier named {} already exists",
                            new.name
                        )));
                    }

                    let now = Utc::now();
                    supplier::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        name: Set(new.name),
                        contact_name: Set(new.contact_name),
                        phone: Set(new.phone),
                        collection_route: Set(new.collection_route),
                        active: Set(true),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)
                })
            })
            .await?;

        self.event_sender
            .send(Event::SupplierCreated(created.id))
            .await
            .map_err(ServiceError::EventError)?;

        info!(supplier_id = %created.id, "supplier registered");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_supplier(&self, id: Uuid) -> Result<supplier::Model, ServiceError> {
        self.db
            .execute("supplier.get", |db| async move {
                Supplier::find_by_id(id).one(db.as_ref()).await
            })
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", id)))
    }

    /// Directory listing, ordered by name.
    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        page: u64,
        limit: u64,
        active_only: bool,
    ) -> Result<(Vec<supplier::Model>, u64), ServiceError> {
        self.db
            .execute("supplier.list", |db| async move {
                let mut query = Supplier::find().order_by_asc(supplier::Column::Name);
                if active_only {
                    query = query.filter(supplier::Column::Active.eq(true));
                }
                let paginator = query.paginate(db.as_ref(), limit.max(1));
                let total = paginator.num_items().await?;
                let suppliers = paginator.fetch_page(page.saturating_sub(1)).await?;
                Ok((suppliers, total))
            })
            .await
    }
}
