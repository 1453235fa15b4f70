use crate::{
    db::{self, DbPool},
    entities::{
        company, deleted_item,
        enums::{ItemType, OwnerType, UserType},
        item::{self, Dimensions, Entity as ItemEntity},
        item_owner, user,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    sync::{ItemChanges, ItemRecord},
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, OnConflict},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Upper bound for `GET /api/items/all`.
pub const ALL_ITEMS_LIMIT: u64 = 1000;

fn validate_dimensions(dimensions: &Dimensions) -> Result<(), ValidationError> {
    if dimensions.is_valid() {
        Ok(())
    } else {
        Err(ValidationError::new("dimensions_must_be_non_negative"))
    }
}

fn validate_weight(weight: &Decimal) -> Result<(), ValidationError> {
    if weight.is_sign_negative() && !weight.is_zero() {
        Err(ValidationError::new("weight_must_be_non_negative"))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 50, message = "Item name must be 1-50 characters"))]
    pub item_name: String,
    pub item_type: Option<ItemType>,
    #[validate(length(max = 100))]
    pub item_brand: Option<String>,
    #[validate(length(max = 100))]
    pub item_model: Option<String>,
    #[validate(length(max = 100))]
    pub item_barcode: Option<String>,
    #[validate(custom = "validate_dimensions")]
    pub dimensions: Option<Dimensions>,
    #[validate(custom = "validate_weight")]
    pub weight_grams: Option<Decimal>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    pub owner_id: Option<Uuid>,
    pub owner_type: Option<OwnerType>,
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 50, message = "Item name must be 1-50 characters"))]
    pub item_name: Option<String>,
    pub item_type: Option<ItemType>,
    #[validate(length(max = 100))]
    pub item_brand: Option<String>,
    #[validate(length(max = 100))]
    pub item_model: Option<String>,
    #[validate(length(max = 100))]
    pub item_barcode: Option<String>,
    #[validate(custom = "validate_dimensions")]
    pub dimensions: Option<Dimensions>,
    #[validate(custom = "validate_weight")]
    pub weight_grams: Option<Decimal>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    pub owner_id: Option<Uuid>,
    pub owner_type: Option<OwnerType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ItemListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub search: Option<String>,
    pub item_type: Option<ItemType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemPage {
    pub items: Vec<ItemRecord>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// A selectable owner for the item form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerOption {
    pub owner_id: Uuid,
    pub owner_type: OwnerType,
    pub display_name: String,
}

/// Maps a client sort key onto a column; unknown keys sort by item number.
fn sort_column(key: Option<&str>) -> item::Column {
    match key {
        Some("itemName") => item::Column::ItemName,
        Some("itemType") => item::Column::ItemType,
        Some("itemBrand") => item::Column::ItemBrand,
        Some("itemModel") => item::Column::ItemModel,
        Some("itemBarcode") => item::Column::ItemBarcode,
        Some("createdAt") => item::Column::CreatedAt,
        Some("updatedAt") => item::Column::UpdatedAt,
        _ => item::Column::ItemNumber,
    }
}

fn search_condition(term: &str) -> Condition {
    let pattern = format!("%{}%", term.to_lowercase());
    [
        item::Column::ItemName,
        item::Column::ItemBarcode,
        item::Column::ItemBrand,
        item::Column::ItemModel,
    ]
    .into_iter()
    .fold(Condition::any(), |cond, col| {
        cond.add(Expr::expr(Func::lower(Expr::col(col))).like(pattern.clone()))
    })
}

fn owner_pair(
    owner_id: Option<Uuid>,
    owner_type: Option<OwnerType>,
) -> Result<Option<(Uuid, OwnerType)>, ServiceError> {
    match (owner_id, owner_type) {
        (Some(id), Some(kind)) => Ok(Some((id, kind))),
        (None, None) => Ok(None),
        _ => Err(ServiceError::ValidationError(
            "ownerId and ownerType must be provided together".to_string(),
        )),
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Service for items and the server side of delta sync
#[derive(Clone)]
pub struct ItemService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ItemService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(event).await;
        }
    }

    /// Creates an item and, when given, its owner link in one transaction.
    #[instrument(skip(self, request), fields(created_by = %created_by))]
    pub async fn create_item(
        &self,
        created_by: Uuid,
        request: CreateItemRequest,
    ) -> Result<ItemRecord, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(format!("Failed to create item: {}", e)))?;
        let owner = owner_pair(request.owner_id, request.owner_type)?;

        let txn = self.db_pool.begin().await?;
        if let Some((owner_id, owner_type)) = owner {
            ensure_owner_exists(&txn, owner_id, owner_type).await?;
        }

        let item_number =
            db::next_sequence_number::<ItemEntity, _>(&txn, item::Column::ItemNumber).await?;

        let model = item::ActiveModel {
            item_id: Set(Uuid::new_v4()),
            item_number: Set(item_number),
            item_name: Set(request.item_name.trim().to_string()),
            item_type: Set(request.item_type),
            item_brand: Set(trimmed(request.item_brand)),
            item_model: Set(trimmed(request.item_model)),
            item_barcode: Set(trimmed(request.item_barcode)),
            dimensions: Set(request.dimensions),
            weight_grams: Set(request.weight_grams),
            notes: Set(trimmed(request.notes)),
            created_by: Set(created_by),
            is_deleted: Set(false),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, "failed to insert item");
            ServiceError::from(e)
        })?;

        if let Some((owner_id, owner_type)) = owner {
            item_owner::ActiveModel {
                item_id: Set(model.item_id),
                owner_id: Set(owner_id),
                owner_type: Set(owner_type),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        info!(item_id = %model.item_id, item_number, "item created");
        self.emit(Event::ItemCreated(model.item_id)).await;

        Ok(ItemRecord::from(model).with_owner(owner))
    }

    /// Live item by id.
    #[instrument(skip(self))]
    pub async fn get_item(&self, item_id: Uuid) -> Result<ItemRecord, ServiceError> {
        let db = &*self.db_pool;
        let model = find_live(db, item_id).await?;
        let mut records = with_owners(db, vec![model]).await?;
        records.pop().ok_or_else(|| ServiceError::not_found("Item"))
    }

    /// Filtered, sorted and paginated live items.
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        query: ItemListQuery,
        default_limit: u64,
        max_limit: u64,
    ) -> Result<ItemPage, ServiceError> {
        let db = &*self.db_pool;
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(default_limit).clamp(1, max_limit.max(1));

        let mut select = ItemEntity::find().filter(item::Column::IsDeleted.eq(false));
        if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            select = select.filter(search_condition(term));
        }
        if let Some(item_type) = query.item_type {
            select = select.filter(item::Column::ItemType.eq(item_type));
        }

        let column = sort_column(query.sort_by.as_deref());
        select = match query.sort_order.unwrap_or_default() {
            SortOrder::Asc => select.order_by_asc(column),
            SortOrder::Desc => select.order_by_desc(column),
        };
        if !matches!(column, item::Column::ItemNumber) {
            select = select.order_by_asc(item::Column::ItemNumber);
        }

        let paginator = select.paginate(db, limit);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page - 1).await?;
        let total_pages = total.div_ceil(limit);

        Ok(ItemPage {
            items: with_owners(db, models).await?,
            total,
            page,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        })
    }

    /// Every live item by item number, capped at [`ALL_ITEMS_LIMIT`].
    #[instrument(skip(self))]
    pub async fn all_items(&self) -> Result<Vec<ItemRecord>, ServiceError> {
        let db = &*self.db_pool;
        let models = ItemEntity::find()
            .filter(item::Column::IsDeleted.eq(false))
            .order_by_asc(item::Column::ItemNumber)
            .limit(ALL_ITEMS_LIMIT)
            .all(db)
            .await?;
        with_owners(db, models).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_item(
        &self,
        item_id: Uuid,
        request: UpdateItemRequest,
    ) -> Result<ItemRecord, ServiceError> {
        request.validate()?;
        let owner = owner_pair(request.owner_id, request.owner_type)?;

        let txn = self.db_pool.begin().await?;
        let existing = find_live(&txn, item_id).await?;
        let mut active = existing.into_active_model();

        if let Some(name) = request.item_name {
            active.item_name = Set(name.trim().to_string());
        }
        if let Some(item_type) = request.item_type {
            active.item_type = Set(Some(item_type));
        }
        if request.item_brand.is_some() {
            active.item_brand = Set(trimmed(request.item_brand));
        }
        if request.item_model.is_some() {
            active.item_model = Set(trimmed(request.item_model));
        }
        if request.item_barcode.is_some() {
            active.item_barcode = Set(trimmed(request.item_barcode));
        }
        if let Some(dimensions) = request.dimensions {
            active.dimensions = Set(Some(dimensions));
        }
        if let Some(weight) = request.weight_grams {
            active.weight_grams = Set(Some(weight));
        }
        if request.notes.is_some() {
            active.notes = Set(trimmed(request.notes));
        }
        // Force an UPDATE even when only the owner changed so updated_at moves.
        active.updated_at = Set(db::now());
        let model = active.update(&txn).await?;

        if let Some((owner_id, owner_type)) = owner {
            ensure_owner_exists(&txn, owner_id, owner_type).await?;
            item_owner::Entity::delete_many()
                .filter(item_owner::Column::ItemId.eq(item_id))
                .exec(&txn)
                .await?;
            item_owner::ActiveModel {
                item_id: Set(item_id),
                owner_id: Set(owner_id),
                owner_type: Set(owner_type),
            }
            .insert(&txn)
            .await?;
        }

        let mut records = with_owners(&txn, vec![model]).await?;
        txn.commit().await?;

        info!(%item_id, "item updated");
        self.emit(Event::ItemUpdated(item_id)).await;
        records.pop().ok_or_else(|| ServiceError::not_found("Item"))
    }

    /// Soft delete: flag the row, bump `updated_at` and upsert the tombstone.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, item_id: Uuid, deleted_by: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let existing = find_live(&txn, item_id).await?;
        let now = db::now();

        let mut active = existing.into_active_model();
        active.is_deleted = Set(true);
        active.updated_at = Set(now);
        active.update(&txn).await?;

        deleted_item::Entity::insert(deleted_item::ActiveModel {
            item_id: Set(item_id),
            deleted_by: Set(Some(deleted_by)),
            deleted_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(deleted_item::Column::ItemId)
                .update_columns([deleted_item::Column::DeletedAt, deleted_item::Column::DeletedBy])
                .to_owned(),
        )
        .exec(&txn)
        .await?;

        txn.commit().await?;
        info!(%item_id, %deleted_by, "item moved to trash");
        self.emit(Event::ItemDeleted(item_id)).await;
        Ok(())
    }

    /// Delta sync: everything that changed after `since` (ms epoch).
    ///
    /// `server_time` is read before querying and lowered by one millisecond so
    /// a write landing in the same millisecond is delivered again next round
    /// instead of being skipped.
    #[instrument(skip(self))]
    pub async fn changes_since(&self, since: i64) -> Result<ItemChanges, ServiceError> {
        let db = &*self.db_pool;
        let server_time = db::now().timestamp_millis() - 1;

        if since <= 0 {
            let models = ItemEntity::find()
                .filter(item::Column::IsDeleted.eq(false))
                .order_by_asc(item::Column::ItemNumber)
                .all(db)
                .await?;
            return Ok(ItemChanges {
                new_items: with_owners(db, models).await?,
                updated_items: Vec::new(),
                deleted_ids: Vec::new(),
                server_time,
                is_full_refresh: true,
            });
        }

        let cursor = db::from_millis(since);

        let new_models = ItemEntity::find()
            .filter(item::Column::IsDeleted.eq(false))
            .filter(item::Column::CreatedAt.gt(cursor))
            .order_by_asc(item::Column::ItemNumber)
            .all(db)
            .await?;

        let updated_models = ItemEntity::find()
            .filter(item::Column::IsDeleted.eq(false))
            .filter(item::Column::UpdatedAt.gt(cursor))
            .filter(item::Column::CreatedAt.lte(cursor))
            .order_by_asc(item::Column::ItemNumber)
            .all(db)
            .await?;

        let deleted_ids = deleted_item::Entity::find()
            .filter(deleted_item::Column::DeletedAt.gt(cursor))
            .order_by_asc(deleted_item::Column::DeletedAt)
            .all(db)
            .await?
            .into_iter()
            .map(|d| d.item_id)
            .collect();

        Ok(ItemChanges {
            new_items: with_owners(db, new_models).await?,
            updated_items: with_owners(db, updated_models).await?,
            deleted_ids,
            server_time,
            is_full_refresh: false,
        })
    }

    /// Customer users and companies, ordered by display name.
    #[instrument(skip(self))]
    pub async fn owner_options(&self) -> Result<Vec<OwnerOption>, ServiceError> {
        let db = &*self.db_pool;

        let customers = user::Entity::find()
            .filter(user::Column::UserType.eq(UserType::Customer))
            .all(db)
            .await?;
        let companies = company::Entity::find()
            .order_by_asc(company::Column::CompanyNumber)
            .all(db)
            .await?;

        let mut options: Vec<OwnerOption> = customers
            .into_iter()
            .map(|u| OwnerOption {
                owner_id: u.user_id,
                owner_type: OwnerType::Customer,
                display_name: u.full_name(),
            })
            .chain(companies.into_iter().map(|c| OwnerOption {
                owner_id: c.company_id,
                owner_type: OwnerType::Company,
                display_name: c.company_name,
            }))
            .collect();
        options.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(options)
    }
}

async fn find_live<C: ConnectionTrait>(conn: &C, item_id: Uuid) -> Result<item::Model, ServiceError> {
    ItemEntity::find_by_id(item_id)
        .filter(item::Column::IsDeleted.eq(false))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Item"))
}

async fn ensure_owner_exists<C: ConnectionTrait>(
    conn: &C,
    owner_id: Uuid,
    owner_type: OwnerType,
) -> Result<(), ServiceError> {
    let exists = match owner_type {
        OwnerType::Company => company::Entity::find_by_id(owner_id)
            .one(conn)
            .await?
            .is_some(),
        OwnerType::Customer => user::Entity::find_by_id(owner_id)
            .filter(user::Column::UserType.eq(UserType::Customer))
            .one(conn)
            .await?
            .is_some(),
    };
    if exists {
        Ok(())
    } else {
        Err(ServiceError::BadRequest("Owner not found".to_string()))
    }
}

/// Attaches owners with one lookup for the whole batch.
async fn with_owners<C: ConnectionTrait>(
    conn: &C,
    models: Vec<item::Model>,
) -> Result<Vec<ItemRecord>, ServiceError> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = models.iter().map(|m| m.item_id).collect();
    let owners: HashMap<Uuid, (Uuid, OwnerType)> = item_owner::Entity::find()
        .filter(item_owner::Column::ItemId.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|o| (o.item_id, (o.owner_id, o.owner_type)))
        .collect();

    Ok(models
        .into_iter()
        .map(|m| {
            let owner = owners.get(&m.item_id).copied();
            ItemRecord::from(m).with_owner(owner)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("itemName"), item::Column::ItemName)]
    #[case(Some("updatedAt"), item::Column::UpdatedAt)]
    #[case(Some("item_name; DROP TABLE items"), item::Column::ItemNumber)]
    #[case(None, item::Column::ItemNumber)]
    fn sort_whitelist(#[case] key: Option<&str>, #[case] expected: item::Column) {
        assert_eq!(format!("{:?}", sort_column(key)), format!("{:?}", expected));
    }

    #[test]
    fn owner_fields_come_in_pairs() {
        assert!(owner_pair(None, None).unwrap().is_none());
        assert!(owner_pair(Some(Uuid::new_v4()), None).is_err());
        assert!(owner_pair(None, Some(OwnerType::Company)).is_err());
    }

    #[test]
    fn negative_weight_and_dimensions_fail_validation() {
        let mut request = CreateItemRequest {
            item_name: "Crate".into(),
            item_type: None,
            item_brand: None,
            item_model: None,
            item_barcode: None,
            dimensions: Some(Dimensions {
                width: 1.0,
                height: -1.0,
                length: 1.0,
            }),
            weight_grams: None,
            notes: None,
            owner_id: None,
            owner_type: None,
        };
        assert!(request.validate().is_err());

        request.dimensions = None;
        request.weight_grams = Some(Decimal::new(-5, 0));
        assert!(request.validate().is_err());

        request.weight_grams = Some(Decimal::ZERO);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        let request = UpdateItemRequest {
            item_name: Some(String::new()),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }
}
