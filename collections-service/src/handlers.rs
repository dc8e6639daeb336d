use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use bson::oid::ObjectId;
use serde_json::{json, Value};
use shared::json::{document_to_json, documents_to_json};
use shared::validation::product_id_literal;
use shared::{
    InventoryAdjustment, Order, OrderRequest, ProductUpdate, SearchQuery, SortRequest,
    ValidationError,
};
use tracing::info;

use crate::api::{route_not_found, AppState, CollectionHandle};
use crate::error::ApiError;
use crate::repository::StoreError;

/// # GET /collections/:name
pub async fn list_documents(
    Extension(collection): Extension<CollectionHandle>,
) -> Result<Json<Value>, ApiError> {
    let documents = collection.find_all().await?;
    info!("Retrieved {} documents from {}", documents.len(), collection.name());
    Ok(Json(documents_to_json(documents)))
}

/// # GET /collections/:name/:max/:sort_aspect/:sort_order
pub async fn sorted_documents(
    Extension(collection): Extension<CollectionHandle>,
    Path((_, max, sort_aspect, sort_order)): Path<(String, String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    let request = SortRequest::parse(&max, &sort_aspect, &sort_order)?;
    let total = collection.count().await?;
    request.check_total(total)?;

    let documents = request.apply(collection.find_all().await?);
    Ok(Json(documents_to_json(documents)))
}

/// # GET /collections/:name/:id
pub async fn get_document(
    Extension(collection): Extension<CollectionHandle>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let object_id = parse_object_id(&id)?;
    let document = collection.find_by_object_id(object_id).await?.ok_or_else(|| {
        ApiError::NotFound(format!(
            "Document with id {} not found in collection {}",
            id,
            collection.name()
        ))
    })?;
    Ok(Json(document_to_json(document)))
}

/// # GET /collections/:name/search/:query
///
/// A query matching nothing answers `200` with an empty array.
pub async fn search_documents(
    Extension(collection): Extension<CollectionHandle>,
    Path((_, query)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let query = SearchQuery::new(query);
    let documents = collection.aggregate(query.pipeline()).await?;
    info!(
        "Search for {:?} in {} matched {} documents",
        query.term(),
        collection.name(),
        documents.len()
    );
    Ok(Json(documents_to_json(documents)))
}

/// # POST /collections/:name
///
/// Reserves stock for every line, then inserts the order.
pub async fn place_order(
    State(state): State<AppState>,
    Extension(collection): Extension<CollectionHandle>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = OrderRequest::from_json(&json_body(body)?)?;
    state.inventory.reserve(&request.lines).await?;

    let mut order = Order::new(request);
    let document = order.to_document().map_err(StoreError::from)?;
    order.id = collection.insert_one(document).await?.as_object_id();
    info!("Placed order {:?} in {}", order.id, collection.name());

    let created = order.to_document().map_err(StoreError::from)?;
    Ok((StatusCode::CREATED, Json(document_to_json(created))).into_response())
}

/// # PUT /collections/products
pub async fn adjust_inventory(
    State(state): State<AppState>,
    Extension(collection): Extension<CollectionHandle>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    if collection.name() != state.products_collection {
        return Ok(route_not_found().await);
    }

    let adjustment = InventoryAdjustment::from_json(&json_body(body)?)?;
    let outcome = state.inventory.adjust(&adjustment).await?;
    Ok(Json(outcome).into_response())
}

/// # PUT /collections/products/:id
pub async fn update_product(
    State(state): State<AppState>,
    Extension(collection): Extension<CollectionHandle>,
    Path((_, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    if collection.name() != state.products_collection {
        return Ok(route_not_found().await);
    }

    let object_id = parse_object_id(&id)?;
    let update = ProductUpdate::from_json(&json_body(body)?)?;
    let product_not_found = || ApiError::NotFound(format!("Product with id {id} not found"));

    if !state.products.update_by_object_id(object_id, update).await? {
        return Err(product_not_found());
    }
    info!("Updated product {}", id);

    let product = collection
        .find_by_object_id(object_id)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(Json(document_to_json(product)).into_response())
}

/// # PUT /collections/products/:productId/restore
pub async fn restore_inventory(
    State(state): State<AppState>,
    Extension(collection): Extension<CollectionHandle>,
    Path((_, product_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    if collection.name() != state.products_collection {
        return Ok(route_not_found().await);
    }

    let product_id = product_id_literal(&product_id)?;
    let restored = state.inventory.restore_reservations(product_id).await?;
    Ok(Json(json!({ "productId": product_id, "restored": restored })).into_response())
}

fn parse_object_id(id: &str) -> Result<ObjectId, ValidationError> {
    ObjectId::parse_str(id).map_err(|_| ValidationError::InvalidObjectId(id.to_string()))
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ValidationError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ValidationError::MalformedBody(rejection.body_text()))
}
