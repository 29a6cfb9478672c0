//! # HTTP API
//!
//! Thin axum facade over the workflow engine. Handlers translate JSON
//! requests into engine calls and engine errors into status codes; no
//! business rule lives here. The real clock enters at this boundary -
//! everything below takes `now` as a parameter.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use sakip_core::{
    Achievement, Action, Actor, AssessmentId, DataId, Decimal2, EntityKind, EvidenceId,
    IndicatorId, InstansiId, Quarter, TargetId, UserId, WorkflowEngine, WorkflowError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared engine handle.
pub type AppState = Arc<WorkflowEngine>;

/// Build the application router.
pub fn router(engine: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/authz/check", post(authz_check))
        .route("/achievement", post(compute_achievement))
        .route("/data/{id}/transition", post(transition_data))
        .route("/targets/{id}/transition", post(transition_target))
        .route("/evidence/{id}/transition", post(transition_evidence))
        .route("/assessments/{id}/transition", post(transition_assessment))
        .route("/assessments/{id}/recompute", post(recompute_score))
        .route("/quarterly/aggregate", post(aggregate_quarter))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// Engine errors carried to HTTP with a stable status mapping.
#[derive(Debug)]
pub enum ApiError {
    Engine(WorkflowError),
    /// Request named an action the entity kind does not have.
    UnknownAction { kind: EntityKind, verb: String },
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        Self::Engine(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::UnknownAction { kind, verb } => (
                StatusCode::BAD_REQUEST,
                format!("unknown action `{verb}` for {}", kind.label()),
            ),
            Self::Engine(err) => {
                let status = match &err {
                    WorkflowError::Forbidden { .. } => StatusCode::FORBIDDEN,
                    WorkflowError::NotFound { .. } => StatusCode::NOT_FOUND,
                    WorkflowError::IllegalTransition { .. }
                    | WorkflowError::LockedEntity { .. }
                    | WorkflowError::DuplicateRecord { .. }
                    | WorkflowError::DeletionRestricted { .. } => StatusCode::CONFLICT,
                    WorkflowError::DeadlineExceeded { .. }
                    | WorkflowError::NoData
                    | WorkflowError::InvalidField { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    WorkflowError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
        };
        tracing::debug!(%status, %message, "request rejected");
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

// =============================================================================
// REQUEST / RESPONSE BODIES
// =============================================================================

/// The acting identity, as the request layer resolved it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorBody {
    pub user: u64,
    #[serde(default)]
    pub instansi: Option<u64>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub superuser: bool,
}

impl ActorBody {
    fn into_actor(self) -> Actor {
        Actor {
            user: UserId(self.user),
            instansi: self.instansi.map(InstansiId),
            permissions: self.permissions.into_iter().collect(),
            superuser: self.superuser,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    pub actor: ActorBody,
    /// Verb within the entity's lifecycle, e.g. `submit` or `validate`.
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthzCheckBody {
    pub actor: ActorBody,
    pub kind: EntityKind,
    pub action: String,
    #[serde(default)]
    pub entity: Option<EntityBody>,
}

/// Authorization view of a target record, supplied by the caller when the
/// record is not stored (or not yet stored).
#[derive(Debug, Deserialize)]
pub struct EntityBody {
    pub id: u64,
    #[serde(default)]
    pub instansi: Option<u64>,
    pub status: String,
    #[serde(default)]
    pub owner: Option<u64>,
    #[serde(default)]
    pub superuser: bool,
}

#[derive(Debug, Deserialize)]
pub struct AchievementBody {
    pub actual: Decimal2,
    #[serde(default)]
    pub target: Option<Decimal2>,
    #[serde(default)]
    pub minimum: Option<Decimal2>,
}

#[derive(Debug, Deserialize)]
pub struct AggregateBody {
    pub actor: ActorBody,
    pub indicator: u64,
    pub instansi: u64,
    pub year: i32,
    pub quarter: Quarter,
}

fn parse_action(kind: EntityKind, verb: &str) -> Result<Action, ApiError> {
    Action::parse(kind, verb).ok_or_else(|| ApiError::UnknownAction {
        kind,
        verb: verb.to_string(),
    })
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn authz_check(
    State(engine): State<AppState>,
    Json(body): Json<AuthzCheckBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let action = parse_action(body.kind, &body.action)?;
    let actor = body.actor.into_actor();

    // Statuses arrive as free strings here; intern against the known label
    // set so the evaluator keeps its static-str view.
    let entity = body.entity.map(|e| sakip_core::EntityRef {
        kind: body.kind,
        id: e.id,
        instansi: e.instansi.map(InstansiId),
        status: intern_status(&e.status),
        owner: e.owner.map(UserId),
        target_is_superuser: e.superuser,
    });

    let allowed = engine.can_perform(&actor, action, entity.as_ref());
    Ok(Json(serde_json::json!({ "allowed": allowed })))
}

fn intern_status(status: &str) -> &'static str {
    const KNOWN: [&str; 12] = [
        "draft",
        "submitted",
        "validated",
        "rejected",
        "audited",
        "pending",
        "in_review",
        "completed",
        "approved",
        "revised",
        "active",
        "deleted",
    ];
    KNOWN.iter().find(|k| **k == status).copied().unwrap_or("")
}

async fn compute_achievement(
    State(engine): State<AppState>,
    Json(body): Json<AchievementBody>,
) -> Json<Achievement> {
    Json(engine.achievement(body.actual, body.target, body.minimum))
}

async fn transition_data(
    State(engine): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<TransitionBody>,
) -> Result<Response, ApiError> {
    let action = parse_action(EntityKind::PerformanceData, &body.action)?;
    let actor = body.actor.into_actor();
    let record = engine.transition_data(&actor, DataId(id), action, Utc::now())?;
    Ok(Json(record).into_response())
}

async fn transition_target(
    State(engine): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<TransitionBody>,
) -> Result<Response, ApiError> {
    let action = parse_action(EntityKind::Target, &body.action)?;
    let actor = body.actor.into_actor();
    let record = engine.transition_target(&actor, TargetId(id), action, Utc::now())?;
    Ok(Json(record).into_response())
}

async fn transition_evidence(
    State(engine): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<TransitionBody>,
) -> Result<Response, ApiError> {
    let action = parse_action(EntityKind::EvidenceDocument, &body.action)?;
    let actor = body.actor.into_actor();
    let record = engine.transition_evidence(&actor, EvidenceId(id), action, Utc::now())?;
    Ok(Json(record).into_response())
}

async fn transition_assessment(
    State(engine): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<TransitionBody>,
) -> Result<Response, ApiError> {
    let action = parse_action(EntityKind::Assessment, &body.action)?;
    let actor = body.actor.into_actor();
    let record = engine.transition_assessment(&actor, AssessmentId(id), action, Utc::now())?;
    Ok(Json(record).into_response())
}

async fn recompute_score(
    State(engine): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let score = engine.recompute_assessment_score(AssessmentId(id))?;
    Ok(Json(serde_json::json!({ "overall_score": score })))
}

async fn aggregate_quarter(
    State(engine): State<AppState>,
    Json(body): Json<AggregateBody>,
) -> Result<Response, ApiError> {
    let actor = body.actor.into_actor();
    let report = engine.aggregate_quarter(
        &actor,
        IndicatorId(body.indicator),
        InstansiId(body.instansi),
        body.year,
        body.quarter,
        Utc::now(),
    )?;
    Ok(Json(report).into_response())
}
