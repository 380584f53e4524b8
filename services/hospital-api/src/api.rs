use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{NaiveDate, Utc};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use uuid::Uuid;

use hospitalkit::models::{
    parse_id, DepartmentUpdate, HospitalUpdate, NewDepartment, NewHospital, NewPatient,
    NewStaff, PatientUpdate, StaffUpdate,
};
use hospitalkit::repositories::Repository;
use hospitalkit::{HospitalError, Registry, ScyllaConnection};

pub struct AppState {
    registry: Registry,
    connection: Arc<ScyllaConnection>,
}

impl AppState {
    pub fn new(registry: Registry, connection: Arc<ScyllaConnection>) -> Self {
        Self {
            registry,
            connection,
        }
    }
}

type SharedState = Arc<AppState>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/metrics", get(handle_metrics))
        .route("/stats", get(handle_stats))
        .route("/hospitals", get(list_hospitals).post(create_hospital))
        .route(
            "/hospitals/:hospital_id",
            get(get_hospital).patch(update_hospital).delete(delete_hospital),
        )
        .route(
            "/hospitals/:hospital_id/departments",
            get(list_hospital_departments).post(create_department),
        )
        .route(
            "/hospitals/:hospital_id/departments/:department_id",
            get(get_department).patch(update_department).delete(delete_department),
        )
        .route("/departments", get(list_departments))
        .route("/departments/:department_id", get(find_department))
        .route(
            "/departments/:department_id/patients",
            get(list_department_patients).post(create_patient),
        )
        .route(
            "/departments/:department_id/patients/:patient_id",
            get(get_patient).patch(update_patient).delete(delete_patient),
        )
        .route(
            "/departments/:department_id/staff",
            get(list_department_staff).post(create_staff),
        )
        .route(
            "/departments/:department_id/staff/:staff_id",
            get(get_staff).patch(update_staff).delete(delete_staff),
        )
        .route("/patients", get(list_patients))
        .route("/patients/:patient_id", get(find_patient))
        .route("/staff", get(list_staff))
        .route("/staff/:staff_id", get(find_staff))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

pub async fn start_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Hospital(HospitalError),
}

impl From<HospitalError> for ApiError {
    fn from(err: HospitalError) -> Self {
        ApiError::Hospital(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Hospital(HospitalError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Hospital(HospitalError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Hospital(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::NotFound => "not found".to_string(),
            ApiError::Hospital(err) => err.to_string(),
        };
        if status.is_server_error() {
            error!("Request failed: {}", message);
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn path_id(raw: &str) -> ApiResult<Uuid> {
    parse_id(raw).ok_or(ApiError::NotFound)
}

fn found<T: Serialize>(record: Option<T>) -> ApiResult<Json<T>> {
    record.map(Json).ok_or(ApiError::NotFound)
}

fn created(id: Uuid) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::CREATED, Json(json!({ "id": id })))
}

fn changed(applied: bool) -> ApiResult<StatusCode> {
    if applied {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// Patient intake body. `age` is derived from the date of birth when absent.
#[derive(Debug, Deserialize)]
pub struct PatientRequest {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub age: Option<i32>,
    pub phone: String,
    #[serde(default)]
    pub medical_record: Option<String>,
}

impl PatientRequest {
    pub fn into_new_patient(self, today: NaiveDate) -> NewPatient {
        NewPatient::born_on(
            self.first_name,
            self.last_name,
            self.date_of_birth,
            self.phone,
            today,
        )
        .with_stated_age(self.age)
        .with_medical_record(self.medical_record)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NameQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl NameQuery {
    fn is_empty(&self) -> bool {
        [&self.first_name, &self.last_name]
            .iter()
            .all(|name| name.as_deref().map_or(true, |n| n.trim().is_empty()))
    }
}

/// Patient listing filters. A non-blank `phone` wins over the names.
#[derive(Debug, Default, Deserialize)]
pub struct PatientQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl PatientQuery {
    fn phone(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    fn names(&self) -> NameQuery {
        NameQuery {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

async fn handle_health(State(state): State<SharedState>) -> impl IntoResponse {
    let (status, health) = match state.connection.health_check().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
    };
    (
        status,
        Json(json!({
            "status": health,
            "service": "hospital-api",
            "keyspace": state.connection.keyspace(),
            "timestamp": Utc::now(),
        })),
    )
}

async fn handle_metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    match String::from_utf8(buffer) {
        Ok(body) => body.into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn handle_stats(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.registry.overview().await)
}

// Hospitals

async fn list_hospitals(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.registry.hospitals.get_all().await)
}

async fn create_hospital(
    State(state): State<SharedState>,
    Json(request): Json<NewHospital>,
) -> ApiResult<impl IntoResponse> {
    let id = state.registry.hospitals.create(request).await?;
    Ok(created(id))
}

async fn get_hospital(
    State(state): State<SharedState>,
    Path(hospital_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    found(state.registry.hospitals.find_by_id_str(&hospital_id, None).await)
}

async fn update_hospital(
    State(state): State<SharedState>,
    Path(hospital_id): Path<String>,
    Json(changes): Json<Vec<HospitalUpdate>>,
) -> ApiResult<StatusCode> {
    let hospital_id = path_id(&hospital_id)?;
    changed(state.registry.hospitals.update(hospital_id, changes).await?)
}

async fn delete_hospital(
    State(state): State<SharedState>,
    Path(hospital_id): Path<String>,
) -> ApiResult<StatusCode> {
    let hospital_id = path_id(&hospital_id)?;
    changed(state.registry.hospitals.delete(hospital_id).await?)
}

// Departments

async fn list_hospital_departments(
    State(state): State<SharedState>,
    Path(hospital_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let hospital_id = path_id(&hospital_id)?;
    Ok(Json(state.registry.departments.find_by_hospital(hospital_id).await))
}

async fn create_department(
    State(state): State<SharedState>,
    Path(hospital_id): Path<String>,
    Json(request): Json<NewDepartment>,
) -> ApiResult<impl IntoResponse> {
    let hospital_id = path_id(&hospital_id)?;
    let id = state.registry.add_department(hospital_id, request).await?;
    Ok(created(id))
}

async fn get_department(
    State(state): State<SharedState>,
    Path((hospital_id, department_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    found(
        state
            .registry
            .departments
            .find_by_id_str(&department_id, Some(&hospital_id))
            .await,
    )
}

async fn update_department(
    State(state): State<SharedState>,
    Path((hospital_id, department_id)): Path<(String, String)>,
    Json(changes): Json<Vec<DepartmentUpdate>>,
) -> ApiResult<StatusCode> {
    let (hospital_id, department_id) = (path_id(&hospital_id)?, path_id(&department_id)?);
    changed(
        state
            .registry
            .departments
            .update(hospital_id, department_id, changes)
            .await?,
    )
}

async fn delete_department(
    State(state): State<SharedState>,
    Path((hospital_id, department_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let (hospital_id, department_id) = (path_id(&hospital_id)?, path_id(&department_id)?);
    changed(state.registry.departments.delete(hospital_id, department_id).await?)
}

async fn list_departments(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.registry.departments.get_all().await)
}

async fn find_department(
    State(state): State<SharedState>,
    Path(department_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    found(state.registry.departments.find_by_id_str(&department_id, None).await)
}

// Patients

async fn list_department_patients(
    State(state): State<SharedState>,
    Path(department_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let department_id = path_id(&department_id)?;
    Ok(Json(state.registry.patients.find_by_department(department_id).await))
}

async fn create_patient(
    State(state): State<SharedState>,
    Path(department_id): Path<String>,
    Json(request): Json<PatientRequest>,
) -> ApiResult<impl IntoResponse> {
    let department_id = path_id(&department_id)?;
    let patient = request.into_new_patient(Utc::now().date_naive());
    let id = state.registry.add_patient(department_id, patient).await?;
    Ok(created(id))
}

async fn get_patient(
    State(state): State<SharedState>,
    Path((department_id, patient_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    found(
        state
            .registry
            .patients
            .find_by_id_str(&patient_id, Some(&department_id))
            .await,
    )
}

async fn update_patient(
    State(state): State<SharedState>,
    Path((department_id, patient_id)): Path<(String, String)>,
    Json(changes): Json<Vec<PatientUpdate>>,
) -> ApiResult<StatusCode> {
    let (department_id, patient_id) = (path_id(&department_id)?, path_id(&patient_id)?);
    changed(
        state
            .registry
            .patients
            .update(department_id, patient_id, changes)
            .await?,
    )
}

async fn delete_patient(
    State(state): State<SharedState>,
    Path((department_id, patient_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let (department_id, patient_id) = (path_id(&department_id)?, path_id(&patient_id)?);
    changed(state.registry.patients.delete(department_id, patient_id).await?)
}

async fn list_patients(
    State(state): State<SharedState>,
    Query(query): Query<PatientQuery>,
) -> impl IntoResponse {
    let names = query.names();
    let patients = if let Some(phone) = query.phone() {
        state.registry.patients.find_by_phone(phone).await
    } else if names.is_empty() {
        state.registry.patients.get_all().await
    } else {
        state
            .registry
            .patients
            .find_by_name(names.first_name.as_deref(), names.last_name.as_deref())
            .await
    };
    Json(patients)
}

async fn find_patient(
    State(state): State<SharedState>,
    Path(patient_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    found(state.registry.patients.find_by_id_str(&patient_id, None).await)
}

// Staff

async fn list_department_staff(
    State(state): State<SharedState>,
    Path(department_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let department_id = path_id(&department_id)?;
    Ok(Json(state.registry.staff.find_by_department(department_id).await))
}

async fn create_staff(
    State(state): State<SharedState>,
    Path(department_id): Path<String>,
    Json(request): Json<NewStaff>,
) -> ApiResult<impl IntoResponse> {
    let department_id = path_id(&department_id)?;
    let id = state.registry.add_staff(department_id, request).await?;
    Ok(created(id))
}

async fn get_staff(
    State(state): State<SharedState>,
    Path((department_id, staff_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    found(
        state
            .registry
            .staff
            .find_by_id_str(&staff_id, Some(&department_id))
            .await,
    )
}

async fn update_staff(
    State(state): State<SharedState>,
    Path((department_id, staff_id)): Path<(String, String)>,
    Json(changes): Json<Vec<StaffUpdate>>,
) -> ApiResult<StatusCode> {
    let (department_id, staff_id) = (path_id(&department_id)?, path_id(&staff_id)?);
    changed(state.registry.staff.update(department_id, staff_id, changes).await?)
}

async fn delete_staff(
    State(state): State<SharedState>,
    Path((department_id, staff_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let (department_id, staff_id) = (path_id(&department_id)?, path_id(&staff_id)?);
    changed(state.registry.staff.delete(department_id, staff_id).await?)
}

async fn list_staff(
    State(state): State<SharedState>,
    Query(query): Query<NameQuery>,
) -> impl IntoResponse {
    let staff = if query.is_empty() {
        state.registry.staff.get_all().await
    } else {
        state
            .registry
            .staff
            .find_by_name(query.first_name.as_deref(), query.last_name.as_deref())
            .await
    };
    Json(staff)
}

async fn find_staff(
    State(state): State<SharedState>,
    Path(staff_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    found(state.registry.staff.find_by_id_str(&staff_id, None).await)
}
