//! Axum server and routes.
//!
//! Every zone handler runs the same pipeline: decode body, authorize token,
//! validate fields, resolve namespace, call the store, wrap in an envelope.

use crate::auth::Authorizer;
use crate::batch::{self, ValueMap};
use crate::bindings::MemoryBindings;
use crate::error::ApiError;
use crate::extract::ZoneBody;
use axum::{
    extract::State,
    http::{Method, Uri},
    routing::{delete, get, post},
    Json, Router,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use zone_types::{
    ApiResponse, FieldError, KeyRequest, KeysRequest, KvStore, MDeleteRequest, MGetRequest,
    MSetRequest, RequestBody, SetRequest, ValueContent, ZoneRequest,
};

pub struct AppState {
    pub authorizer: Authorizer,
    pub bindings: MemoryBindings,
    /// Upper bound for the store phase of a request. `None` waits indefinitely.
    pub store_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(authorizer: Authorizer, bindings: MemoryBindings) -> Self {
        Self {
            authorizer,
            bindings,
            store_timeout: None,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Authorize, validate, and resolve. Authorization runs before validation so
    /// an unauthorized caller learns nothing about fields or namespaces.
    async fn admit<R>(&self, body: &RequestBody) -> Result<(R, Arc<dyn KvStore>), ApiError>
    where
        R: ZoneRequest + for<'a> TryFrom<&'a RequestBody, Error = FieldError>,
    {
        self.authorizer.require(body.token()).await?;
        let req = R::try_from(body)?;
        let store = self
            .bindings
            .resolve(req.memory())
            .ok_or_else(|| ApiError::MemoryNotFound(req.memory().to_string()))?;
        Ok((req, store))
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        match self.store_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| ApiError::Timeout(limit))?,
            None => fut.await,
        }
    }
}

type Envelope<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn router(state: Arc<AppState>) -> Router {
    let zone = Router::new()
        .route("/get", post(handle_get).fallback(handle_wrong_method))
        .route("/set", post(handle_set).fallback(handle_wrong_method))
        .route("/delete", delete(handle_delete).fallback(handle_wrong_method))
        .route("/exists", post(handle_exists).fallback(handle_wrong_method))
        .route("/mget", post(handle_mget).fallback(handle_wrong_method))
        .route("/mset", post(handle_mset).fallback(handle_wrong_method))
        .route("/keys", post(handle_keys).fallback(handle_wrong_method))
        .route("/mdelete", delete(handle_mdelete).fallback(handle_wrong_method));

    Router::new()
        .route("/", get(handle_health).fallback(handle_wrong_method))
        .nest("/v1/zone", zone)
        .fallback(handle_unknown_route)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_unknown_route(method: Method, uri: Uri) -> ApiError {
    ApiError::UnknownRoute(format!("{} {}", method, uri.path()))
}

async fn handle_wrong_method(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method.to_string())
}

async fn handle_get(
    State(state): State<Arc<AppState>>,
    ZoneBody(body): ZoneBody,
) -> Envelope<ValueContent> {
    state
        .bounded(async {
            let (req, kv) = state.admit::<KeyRequest>(&body).await?;
            let value = kv.get(&req.key).await?;
            tracing::debug!(memory = %req.memory, key = %req.key, hit = value.is_some(), "get");
            Ok(match value {
                Some(value) => Json(ApiResponse::success(ValueContent { value: Some(value) })),
                None => Json(ApiResponse::noop(ValueContent { value: None })),
            })
        })
        .await
}

async fn handle_set(
    State(state): State<Arc<AppState>>,
    ZoneBody(body): ZoneBody,
) -> Envelope<ValueContent> {
    state
        .bounded(async {
            let (req, kv) = state.admit::<SetRequest>(&body).await?;
            kv.put(&req.key, &req.value).await?;
            tracing::debug!(memory = %req.memory, key = %req.key, "set");
            Ok(Json(ApiResponse::success(ValueContent {
                value: Some(req.value),
            })))
        })
        .await
}

async fn handle_delete(
    State(state): State<Arc<AppState>>,
    ZoneBody(body): ZoneBody,
) -> Envelope<()> {
    state
        .bounded(async {
            let (req, kv) = state.admit::<KeyRequest>(&body).await?;
            kv.delete(&req.key).await?;
            tracing::debug!(memory = %req.memory, key = %req.key, "delete");
            Ok(Json(ApiResponse::success(())))
        })
        .await
}

async fn handle_exists(
    State(state): State<Arc<AppState>>,
    ZoneBody(body): ZoneBody,
) -> Envelope<bool> {
    state
        .bounded(async {
            let (req, kv) = state.admit::<KeyRequest>(&body).await?;
            let present = kv.get(&req.key).await?.is_some();
            Ok(Json(ApiResponse::success(present)))
        })
        .await
}

async fn handle_mget(
    State(state): State<Arc<AppState>>,
    ZoneBody(body): ZoneBody,
) -> Envelope<ValueMap> {
    state
        .bounded(async {
            let (req, kv) = state.admit::<MGetRequest>(&body).await?;
            let values = batch::get_many(kv.as_ref(), &req.keys).await?;
            tracing::debug!(memory = %req.memory, keys = req.keys.len(), "mget");
            Ok(Json(ApiResponse::success(values)))
        })
        .await
}

async fn handle_mset(
    State(state): State<Arc<AppState>>,
    ZoneBody(body): ZoneBody,
) -> Envelope<()> {
    state
        .bounded(async {
            let (req, kv) = state.admit::<MSetRequest>(&body).await?;
            batch::put_many(kv.as_ref(), &req.entries).await?;
            tracing::debug!(memory = %req.memory, keys = req.entries.len(), "mset");
            Ok(Json(ApiResponse::success(())))
        })
        .await
}

async fn handle_keys(
    State(state): State<Arc<AppState>>,
    ZoneBody(body): ZoneBody,
) -> Envelope<ValueMap> {
    state
        .bounded(async {
            let (req, kv) = state.admit::<KeysRequest>(&body).await?;
            let values = batch::scan_all(kv.as_ref()).await?;
            tracing::debug!(memory = %req.memory, keys = values.len(), "keys");
            Ok(Json(ApiResponse::success(values)))
        })
        .await
}

async fn handle_mdelete(
    State(state): State<Arc<AppState>>,
    ZoneBody(body): ZoneBody,
) -> Envelope<()> {
    state
        .bounded(async {
            let (req, kv) = state.admit::<MDeleteRequest>(&body).await?;
            batch::delete_many(kv.as_ref(), &req.keys).await?;
            tracing::debug!(memory = %req.memory, keys = req.keys.len(), "mdelete");
            Ok(Json(ApiResponse::success(())))
        })
        .await
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "version": "v1" }))
}
