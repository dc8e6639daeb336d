use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    handler::HandlerWithoutStateExt,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Router,
};
use bson::{oid::ObjectId, Bson, Document};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::handlers;
use crate::inventory::InventoryManager;
use crate::repository::{DocumentStore, ProductRepository, StoreResult};

#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentStore>,
    pub products: Arc<dyn ProductRepository>,
    pub inventory: InventoryManager,
    pub products_collection: String,
}

/// A named collection bound to the request by [`resolve_collection`].
///
/// No existence check is made: an unknown name reads as an empty collection.
#[derive(Clone)]
pub struct CollectionHandle {
    name: String,
    store: Arc<dyn DocumentStore>,
}

impl CollectionHandle {
    pub fn new(name: impl Into<String>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn find_all(&self) -> StoreResult<Vec<Document>> {
        self.store.find_all(&self.name).await
    }

    pub async fn count(&self) -> StoreResult<u64> {
        self.store.count(&self.name).await
    }

    pub async fn find_by_object_id(&self, id: ObjectId) -> StoreResult<Option<Document>> {
        self.store.find_by_object_id(&self.name, id).await
    }

    pub async fn aggregate(&self, pipeline: Vec<Document>) -> StoreResult<Vec<Document>> {
        self.store.aggregate(&self.name, pipeline).await
    }

    pub async fn insert_one(&self, document: Document) -> StoreResult<Bson> {
        self.store.insert_one(&self.name, document).await
    }
}

/// Binds the collection named by the `:name` path segment to the request.
pub async fn resolve_collection(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(name) = params.get("name") {
        request
            .extensions_mut()
            .insert(CollectionHandle::new(name.as_str(), state.documents.clone()));
    }
    next.run(request).await
}

pub fn create_router(state: AppState, static_dir: &FsPath) -> Router {
    let collections = Router::new()
        .route(
            "/collections/:name",
            get(handlers::list_documents)
                .post(handlers::place_order)
                .put(handlers::adjust_inventory)
                .fallback(route_not_found),
        )
        .route(
            "/collections/:name/search/:query",
            get(handlers::search_documents).fallback(route_not_found),
        )
        .route(
            "/collections/:name/:key",
            get(handlers::get_document)
                .put(handlers::update_product)
                .fallback(route_not_found),
        )
        .route(
            "/collections/:name/:key/restore",
            put(handlers::restore_inventory).fallback(route_not_found),
        )
        .route(
            "/collections/:name/:key/:sort_aspect/:sort_order",
            get(handlers::sorted_documents).fallback(route_not_found),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), resolve_collection));

    // Non-GET requests outside the API get the same 404 as missing files.
    let images = ServeDir::new(static_dir.join("images"))
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(route_not_found.into_service());
    let assets = ServeDir::new(static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(route_not_found.into_service());

    Router::new()
        .route("/health", get(health_check).fallback(route_not_found))
        .merge(collections)
        .nest_service("/images", images)
        .fallback_service(assets)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

pub async fn route_not_found() -> Response {
    (StatusCode::NOT_FOUND, "Route not found").into_response()
}

pub async fn health_check() -> &'static str {
    "OK"
}
