//! REST API for the loading planner.
//!
//! Uses Axum as the web framework and supports CORS.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, PlannerSettings};
use crate::model::{Crate, CrateId, LoadingInstruction, Truck};
use crate::planner::{LoadingPlan, LoadingPlanner, PlanError, PlannerConfig};

#[derive(Clone)]
struct ApiState {
    planner_settings: PlannerSettings,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>truck-loader API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request structure for the planning endpoints.
#[derive(Deserialize, Clone, ToSchema)]
#[schema(
    example = json!({
        "truck": { "width": 2, "height": 1, "length": 1 },
        "crates": [
            { "id": 1, "width": 1, "height": 1, "length": 2 }
        ],
        "allow_turns": true
    })
)]
pub struct PlanRequest {
    pub truck: Truck,
    pub crates: Vec<Crate>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub allow_turns: Option<bool>,
}

impl PlanRequest {
    fn crate_count(&self) -> usize {
        self.crates.len()
    }

    /// Applies the request-level turn override to the configured defaults.
    fn planner_config(&self, defaults: PlannerConfig) -> PlannerConfig {
        let mut config = defaults;
        if let Some(allow_turns) = self.allow_turns {
            config.allow_turns = allow_turns;
        }
        config
    }
}

/// Response structure for a successful plan.
///
/// # Fields
/// * `instructions` - One instruction per crate, keyed by crate id
/// * `steps` - The same instructions in loading order
/// * `utilization_percent` - Share of the truck volume in use
#[derive(Serialize, ToSchema)]
pub struct PlanResponse {
    #[schema(value_type = Object)]
    pub instructions: BTreeMap<CrateId, LoadingInstruction>,
    pub steps: Vec<LoadingInstruction>,
    pub utilization_percent: f64,
}

impl PlanResponse {
    pub fn from_plan(plan: LoadingPlan, truck: &Truck) -> Self {
        let steps = plan.instructions_in_loading_order();
        let utilization_percent = plan.utilization_percent(truck);
        Self {
            instructions: plan.into_instructions(),
            steps,
            utilization_percent,
        }
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i64>)]
    crate_id: Option<CrateId>,
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
    crate_id: Option<CrateId>,
) -> Response {
    let body = ErrorResponse {
        error: error.into(),
        details: details.into(),
        crate_id,
    };
    (status, Json(body)).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
        None,
    )
}

fn plan_error_response(err: PlanError) -> Response {
    match &err {
        PlanError::PlacementFailure { crate_id } => error_response(
            StatusCode::CONFLICT,
            "Placement failure",
            err.to_string(),
            Some(*crate_id),
        ),
        PlanError::InvalidInput(_) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid input data",
            err.to_string(),
            err.crate_id(),
        ),
    }
}

/// Unwraps the JSON body. Truck and crate data are validated by the planner.
fn parse_plan_request(
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<PlanRequest, Response> {
    payload
        .map(|Json(request)| request)
        .map_err(json_deserialize_error)
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_plan, handle_plan_stream),
    components(
        schemas(
            PlanRequest,
            PlanResponse,
            ErrorResponse,
            Truck,
            Crate,
            LoadingInstruction
        )
    ),
    tags((name = "loading", description = "Endpoints for truck loading plans"))
)]
struct ApiDoc;

fn router(planner_settings: PlannerSettings) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/plan", post(handle_plan))
        .route("/plan_stream", post(handle_plan_stream))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(ApiState { planner_settings })
}

/// Starts the API server and blocks until it terminates.
pub async fn start_api_server(
    config: ApiConfig,
    planner_settings: PlannerSettings,
) -> std::io::Result<()> {
    let app = router(planner_settings);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        "Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        info!("Local access: http://localhost:{}", config.port());
    }
    info!("API endpoints: POST /plan, POST /plan_stream, GET /docs, GET /docs/openapi.json");

    axum::serve(listener, app).await.inspect_err(|err| {
        error!("API server terminated with an error: {err}");
    })
}

/// Handler for POST /plan endpoint.
///
/// Computes a loading plan for all crates, or reports the first crate that
/// could not be placed.
#[utoipa::path(
    post,
    path = "/plan",
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Every crate was placed", body = PlanResponse),
        (status = CONFLICT, description = "A crate could not be placed", body = ErrorResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid truck or crate data",
            body = ErrorResponse
        )
    ),
    tag = "loading"
)]
async fn handle_plan(
    State(state): State<ApiState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Response {
    let request = match parse_plan_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(
        "New plan request: {} crates, truck {}x{}x{}",
        request.crate_count(),
        request.truck.width,
        request.truck.height,
        request.truck.length
    );
    let config = request.planner_config(state.planner_settings.planner_config());
    let truck = request.truck;

    let result =
        LoadingPlanner::new(truck, config).and_then(|mut planner| planner.plan(&request.crates));
    match result {
        Ok(plan) => (StatusCode::OK, Json(PlanResponse::from_plan(plan, &truck))).into_response(),
        Err(err) => plan_error_response(err),
    }
}

/// Handler for POST /plan_stream endpoint (SSE).
///
/// Streams planning events as Server-Sent Events (text/event-stream).
#[utoipa::path(
    post,
    path = "/plan_stream",
    request_body = PlanRequest,
    responses(
        (
            status = 200,
            description = "Streams planning events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid truck data; invalid crates are reported as an InputRejected event",
            body = ErrorResponse
        )
    ),
    tag = "loading"
)]
async fn handle_plan_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Response {
    let request = match parse_plan_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let config = request.planner_config(state.planner_settings.planner_config());
    let mut planner = match LoadingPlanner::new(request.truck, config) {
        Ok(planner) => planner,
        Err(err) => return plan_error_response(err),
    };
    let crates = request.crates;

    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::task::spawn_blocking(move || {
        let _ = planner.plan_with_progress(&crates, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // A closed receiver only means the client went away.
                let _ = tx.blocking_send(json);
            }
        });
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
