//! In-memory stand-in for the clinic REST API.
//!
//! Serves the routes the dashboard talks to under `/api`, seeded with a few
//! demo records. Every route except `POST /api/login` and
//! `POST /api/register` needs
//! `Authorization: Bearer <token>` with a token issued by login: a missing
//! header is a 401, an unknown token a 422. Collections come back wrapped in
//! `{ "success": true, "data": [...] }` except `GET /api/programs`, which
//! returns the bare array, so clients have to cope with both shapes.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

pub const DEMO_EMAIL: &str = "admin@clinic.test";
pub const DEMO_PASSWORD: &str = "admin123";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClientRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub gender: Gender,
    pub email: String,
    pub phone_number: String,
    pub programs: Vec<String>,
}

#[derive(Deserialize)]
pub struct NewClient {
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub gender: Gender,
    pub email: String,
    pub phone_number: String,
}

#[derive(Deserialize)]
pub struct Enrollment {
    pub program_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Deserialize)]
pub struct NewProgram {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub client_id: String,
    pub client_name: String,
    pub program: String,
    pub requested_at: NaiveDate,
    pub status: AppointmentStatus,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecordStatus {
    Active,
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthRecord {
    pub id: String,
    pub client_id: String,
    pub client_name: String,
    pub program: String,
    pub date: NaiveDate,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Profile fields beyond the listed ones are kept as sent.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status: bool,
    #[serde(flatten)]
    pub profile: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
pub struct SupplierInput {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "active")]
    pub status: bool,
    #[serde(flatten)]
    pub profile: BTreeMap<String, serde_json::Value>,
}

fn active() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct TeamMemberInput {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub role: String,
    pub password: Option<String>,
}

/// Everything the server knows. Maps are keyed by id so listings are stable.
#[derive(Default)]
pub struct Store {
    pub clients: BTreeMap<String, ClientRecord>,
    pub programs: BTreeMap<String, Program>,
    pub appointments: BTreeMap<String, Appointment>,
    pub health_records: BTreeMap<String, HealthRecord>,
    pub suppliers: BTreeMap<String, Supplier>,
    pub team: BTreeMap<String, TeamMember>,
    /// Account email to password.
    pub users: HashMap<String, String>,
    pub tokens: HashSet<String>,
    next_client: u32,
    next_program: u32,
    next_supplier: u32,
    next_member: u32,
}

impl Store {
    /// Demo data matching what the dashboard shipped with.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();

        store
            .users
            .insert(DEMO_EMAIL.to_string(), DEMO_PASSWORD.to_string());

        for (id, name, email, phone, status) in [
            ("S001", "MediSupply Co.", "contact@medisupply.com", "+254 712 345 678", true),
            ("S002", "LabEquip Ltd.", "info@labequip.com", "+254 723 456 789", false),
        ] {
            store.suppliers.insert(
                id.to_string(),
                Supplier {
                    id: id.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                    phone: phone.to_string(),
                    status,
                    profile: BTreeMap::new(),
                },
            );
        }
        store.next_supplier = 2;

        for (id, name, email, phone_number, role) in [
            ("T001", "Dr. John Smith", "john.smith@hospital.com", "123-456-7890", "Doctor"),
            ("T002", "Nurse Emily Brown", "emily.brown@hospital.com", "234-567-8901", "Nurse"),
            ("T003", "Admin Sarah Davis", "sarah.davis@hospital.com", "345-678-9012", "Administrator"),
            ("T004", "Dr. Michael Lee", "michael.lee@hospital.com", "456-789-0123", "Doctor"),
        ] {
            store.team.insert(
                id.to_string(),
                TeamMember {
                    id: id.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                    phone_number: phone_number.to_string(),
                    role: role.to_string(),
                },
            );
        }
        store.next_member = 4;

        for (id, name, description) in [
            ("P001", "TB Control", "Tuberculosis screening and treatment"),
            ("P002", "Malaria Prevention", "Bed nets and prophylaxis"),
            ("P003", "HIV Care", "Testing, counselling and ART"),
        ] {
            store.programs.insert(
                id.to_string(),
                Program {
                    id: id.to_string(),
                    name: name.to_string(),
                    description: description.to_string(),
                },
            );
        }
        store.next_program = 3;

        for (id, first, last, dob, gender, programs) in [
            ("C001", "Jane", "Doe", date(1990, 5, 14), Gender::Female, vec!["TB Control"]),
            ("C002", "John", "Smith", date(1985, 1, 2), Gender::Male, vec!["Malaria Prevention"]),
            ("C003", "Emily", "Brown", date(1998, 11, 30), Gender::Female, vec![]),
        ] {
            store.clients.insert(
                id.to_string(),
                ClientRecord {
                    id: id.to_string(),
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    dob,
                    gender,
                    email: format!("{}@example.com", first.to_lowercase()),
                    phone_number: "0700000000".to_string(),
                    programs: programs.into_iter().map(str::to_string).collect(),
                },
            );
        }
        store.next_client = 3;

        for (id, client_id, client_name, program, day, status) in [
            ("A001", "C001", "Jane Doe", "TB Control", 20, AppointmentStatus::Pending),
            ("A002", "C002", "John Smith", "Malaria Prevention", 21, AppointmentStatus::Pending),
            ("A003", "C003", "Emily Brown", "HIV Care", 22, AppointmentStatus::Approved),
        ] {
            store.appointments.insert(
                id.to_string(),
                Appointment {
                    id: id.to_string(),
                    client_id: client_id.to_string(),
                    client_name: client_name.to_string(),
                    program: program.to_string(),
                    requested_at: date(2025, 4, day),
                    status,
                },
            );
        }

        for (id, client_id, client_name, program, day, status, notes) in [
            ("R001", "C001", "Jane Doe", "TB Control", 20, RecordStatus::Active, None),
            (
                "R002",
                "C002",
                "John Smith",
                "Malaria Prevention",
                21,
                RecordStatus::Completed,
                Some("Patient completed program"),
            ),
        ] {
            store.health_records.insert(
                id.to_string(),
                HealthRecord {
                    id: id.to_string(),
                    client_id: client_id.to_string(),
                    client_name: client_name.to_string(),
                    program: program.to_string(),
                    date: date(2025, 4, day),
                    status,
                    notes: notes.map(str::to_string),
                },
            );
        }

        store
    }

    /// Mint a token as if the demo user had logged in.
    pub fn issue_token(&mut self) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone());
        token
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Error body in the shape the dashboard expects.
#[derive(Debug)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub message: String,
}

impl ApiFailure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(what: &str, id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} {id} not found"))
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "success": false,
            "message": self.message,
            "status": self.status.as_u16(),
        });
        (self.status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

fn wrap<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}

type ApiResult<T> = Result<T, ApiFailure>;

pub fn app() -> Router {
    app_with(Arc::new(RwLock::new(Store::seeded())))
}

/// Router over a caller-owned store, so tests can inspect or pre-seed it.
pub fn app_with(db: Db) -> Router {
    let api = Router::new()
        .route("/login", post(login))
        .route("/register", post(register_user))
        .route("/clients", get(list_clients).post(register_client))
        .route("/clients/{id}", get(get_client))
        .route("/clients/{id}/programs", post(enroll_client))
        .route("/programs", get(list_programs).post(create_program))
        .route("/programs/{id}", delete(delete_program))
        .route("/appointments", get(list_appointments))
        .route("/appointments/{id}/approve", patch(approve_appointment))
        .route("/appointments/{id}/reject", patch(reject_appointment))
        .route("/health-records", get(list_health_records))
        .route("/health-records/{id}/complete", patch(complete_health_record))
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route("/suppliers/{id}", put(update_supplier).delete(delete_supplier))
        .route("/team", get(list_team).post(create_team_member))
        .route("/team/{id}", put(update_team_member).delete(delete_team_member));

    Router::new().nest("/api", api).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn authorize(headers: &HeaderMap, store: &Store) -> ApiResult<()> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(ApiFailure::new(
            StatusCode::UNAUTHORIZED,
            "Missing Authorization Header",
        ));
    };
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    match token {
        Some(token) if store.tokens.contains(token) => Ok(()),
        _ => {
            warn!("rejected bearer token");
            Err(ApiFailure::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Signature verification failed",
            ))
        }
    }
}

/// `local@domain.tld` with no whitespace.
fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !email.contains(char::is_whitespace)
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

async fn register_user(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    if !looks_like_email(&input.email) {
        return Err(ApiFailure::new(
            StatusCode::BAD_REQUEST,
            "Please enter a valid email address",
        ));
    }
    if input.password.is_empty() {
        return Err(ApiFailure::new(StatusCode::BAD_REQUEST, "Password is required"));
    }
    let mut store = db.write().await;
    if store.users.contains_key(&input.email) {
        return Err(ApiFailure::new(
            StatusCode::CONFLICT,
            "User with this email already exists",
        ));
    }
    store.users.insert(input.email.clone(), input.password);
    info!(email = %input.email, "registered user");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "message": "User registered successfully" })),
    ))
}

async fn login(State(db): State<Db>, Json(input): Json<Credentials>) -> ApiResult<Response> {
    let mut store = db.write().await;
    if store.users.get(&input.email) != Some(&input.password) {
        return Err(ApiFailure::new(StatusCode::UNAUTHORIZED, "Invalid email or password"));
    }
    let token = store.issue_token();
    info!(email = %input.email, "issued access token");
    Ok(wrap(serde_json::json!({ "access_token": token })).into_response())
}

async fn list_clients(
    State(db): State<Db>,
    headers: HeaderMap,
) -> ApiResult<Json<Envelope<Vec<ClientRecord>>>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    Ok(wrap(store.clients.values().cloned().collect()))
}

async fn get_client(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<ClientRecord>>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    store
        .clients
        .get(&id)
        .cloned()
        .map(wrap)
        .ok_or_else(|| ApiFailure::not_found("Client", &id))
}

async fn register_client(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<NewClient>,
) -> ApiResult<(StatusCode, Json<Envelope<ClientRecord>>)> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;

    let id = match input.id.filter(|id| !id.trim().is_empty()) {
        Some(id) if store.clients.contains_key(&id) => {
            return Err(ApiFailure::new(
                StatusCode::CONFLICT,
                format!("Client {id} already exists"),
            ));
        }
        Some(id) => id,
        None => loop {
            store.next_client += 1;
            let candidate = format!("C{:03}", store.next_client);
            if !store.clients.contains_key(&candidate) {
                break candidate;
            }
        },
    };

    let client = ClientRecord {
        id: id.clone(),
        first_name: input.first_name,
        last_name: input.last_name,
        dob: input.dob,
        gender: input.gender,
        email: input.email,
        phone_number: input.phone_number,
        programs: Vec::new(),
    };
    store.clients.insert(id.clone(), client.clone());
    info!(id = %id, "registered client");
    Ok((StatusCode::CREATED, wrap(client)))
}

async fn enroll_client(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<Enrollment>,
) -> ApiResult<Json<Envelope<ClientRecord>>> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;

    let program = store
        .programs
        .get(&input.program_id)
        .map(|p| p.name.clone())
        .ok_or_else(|| ApiFailure::not_found("Program", &input.program_id))?;
    let client = store
        .clients
        .get_mut(&id)
        .ok_or_else(|| ApiFailure::not_found("Client", &id))?;
    if !client.programs.contains(&program) {
        client.programs.push(program);
    }
    Ok(wrap(client.clone()))
}

async fn list_programs(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Vec<Program>>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    Ok(Json(store.programs.values().cloned().collect()))
}

async fn create_program(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<NewProgram>,
) -> ApiResult<(StatusCode, Json<Envelope<Program>>)> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    if input.name.trim().is_empty() {
        return Err(ApiFailure::new(
            StatusCode::BAD_REQUEST,
            "Program name is required",
        ));
    }
    store.next_program += 1;
    let program = Program {
        id: format!("P{:03}", store.next_program),
        name: input.name,
        description: input.description,
    };
    store.programs.insert(program.id.clone(), program.clone());
    Ok((StatusCode::CREATED, wrap(program)))
}

async fn delete_program(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    store
        .programs
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiFailure::not_found("Program", &id))
}

async fn list_appointments(
    State(db): State<Db>,
    headers: HeaderMap,
) -> ApiResult<Json<Envelope<Vec<Appointment>>>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    Ok(wrap(store.appointments.values().cloned().collect()))
}

async fn decide_appointment(
    db: Db,
    headers: HeaderMap,
    id: String,
    status: AppointmentStatus,
) -> ApiResult<Json<Envelope<Appointment>>> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    let appointment = store
        .appointments
        .get_mut(&id)
        .ok_or_else(|| ApiFailure::not_found("Appointment", &id))?;
    appointment.status = status;
    Ok(wrap(appointment.clone()))
}

async fn approve_appointment(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Appointment>>> {
    decide_appointment(db, headers, id, AppointmentStatus::Approved).await
}

async fn reject_appointment(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Appointment>>> {
    decide_appointment(db, headers, id, AppointmentStatus::Rejected).await
}

async fn list_health_records(
    State(db): State<Db>,
    headers: HeaderMap,
) -> ApiResult<Json<Envelope<Vec<HealthRecord>>>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    Ok(wrap(store.health_records.values().cloned().collect()))
}

async fn complete_health_record(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<HealthRecord>>> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    let record = store
        .health_records
        .get_mut(&id)
        .ok_or_else(|| ApiFailure::not_found("Health record", &id))?;
    record.status = RecordStatus::Completed;
    Ok(wrap(record.clone()))
}

async fn list_suppliers(
    State(db): State<Db>,
    headers: HeaderMap,
) -> ApiResult<Json<Envelope<Vec<Supplier>>>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    Ok(wrap(store.suppliers.values().cloned().collect()))
}

fn supplier_from(id: String, input: SupplierInput) -> ApiResult<Supplier> {
    if input.name.trim().is_empty() {
        return Err(ApiFailure::new(
            StatusCode::BAD_REQUEST,
            "Supplier name is required",
        ));
    }
    let mut profile = input.profile;
    profile.remove("id");
    Ok(Supplier {
        id,
        name: input.name,
        email: input.email,
        phone: input.phone,
        status: input.status,
        profile,
    })
}

async fn create_supplier(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<SupplierInput>,
) -> ApiResult<(StatusCode, Json<Envelope<Supplier>>)> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    let id = format!("S{:03}", store.next_supplier + 1);
    let supplier = supplier_from(id, input)?;
    store.next_supplier += 1;
    store.suppliers.insert(supplier.id.clone(), supplier.clone());
    info!(id = %supplier.id, "added supplier");
    Ok((StatusCode::CREATED, wrap(supplier)))
}

async fn update_supplier(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<SupplierInput>,
) -> ApiResult<Json<Envelope<Supplier>>> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    if !store.suppliers.contains_key(&id) {
        return Err(ApiFailure::not_found("Supplier", &id));
    }
    let supplier = supplier_from(id, input)?;
    store.suppliers.insert(supplier.id.clone(), supplier.clone());
    Ok(wrap(supplier))
}

async fn delete_supplier(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    store
        .suppliers
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiFailure::not_found("Supplier", &id))
}

async fn list_team(
    State(db): State<Db>,
    headers: HeaderMap,
) -> ApiResult<Json<Envelope<Vec<TeamMember>>>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    Ok(wrap(store.team.values().cloned().collect()))
}

fn member_from(id: String, input: TeamMemberInput) -> ApiResult<TeamMember> {
    if input.name.trim().is_empty() {
        return Err(ApiFailure::new(StatusCode::BAD_REQUEST, "Name is required"));
    }
    let role = if input.role.trim().is_empty() {
        "No Role Assigned".to_string()
    } else {
        input.role
    };
    Ok(TeamMember {
        id,
        name: input.name,
        email: input.email,
        phone_number: input.phone_number,
        role,
    })
}

async fn create_team_member(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<TeamMemberInput>,
) -> ApiResult<(StatusCode, Json<Envelope<TeamMember>>)> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    let password = input.password.clone().filter(|p| !p.is_empty());
    let id = format!("T{:03}", store.next_member + 1);
    let member = member_from(id, input)?;
    store.next_member += 1;
    if let Some(password) = password {
        store.users.insert(member.email.clone(), password);
    }
    store.team.insert(member.id.clone(), member.clone());
    info!(id = %member.id, role = %member.role, "added team member");
    Ok((StatusCode::CREATED, wrap(member)))
}

async fn update_team_member(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<TeamMemberInput>,
) -> ApiResult<Json<Envelope<TeamMember>>> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    if !store.team.contains_key(&id) {
        return Err(ApiFailure::not_found("Team member", &id));
    }
    let member = member_from(id, input)?;
    store.team.insert(member.id.clone(), member.clone());
    Ok(wrap(member))
}

async fn delete_team_member(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    store
        .team
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiFailure::not_found("Team member", &id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        headers
    }

    #[test]
    fn seeded_store_has_demo_data() {
        let store = Store::seeded();
        assert_eq!(store.clients.len(), 3);
        assert_eq!(store.programs.len(), 3);
        assert_eq!(store.clients["C001"].programs, vec!["TB Control"]);
        assert!(store.clients["C003"].programs.is_empty());
    }

    #[test]
    fn authorize_distinguishes_missing_and_bad_tokens() {
        let mut store = Store::seeded();
        let token = store.issue_token();

        let err = authorize(&HeaderMap::new(), &store).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        let err = authorize(&bearer("forged"), &store).unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        assert!(authorize(&bearer(&token), &store).is_ok());
    }

    #[test]
    fn client_record_serializes_wire_shape() {
        let store = Store::seeded();
        let json = serde_json::to_value(&store.clients["C002"]).unwrap();
        assert_eq!(json["dob"], "1985-01-02");
        assert_eq!(json["gender"], "Male");
        assert_eq!(json["programs"][0], "Malaria Prevention");
    }

    #[test]
    fn new_client_id_is_optional() {
        let input: NewClient = serde_json::from_str(
            r#"{"first_name":"A","last_name":"B","dob":"2000-01-01","gender":"Other",
                "email":"a@b.c","phone_number":"1"}"#,
        )
        .unwrap();
        assert!(input.id.is_none());
    }

    #[test]
    fn email_shape_check() {
        assert!(looks_like_email("nurse@clinic.test"));
        assert!(!looks_like_email("nurse.clinic.test"));
        assert!(!looks_like_email("@clinic.test"));
        assert!(!looks_like_email("nurse@clinic"));
        assert!(!looks_like_email("nurse @clinic.test"));
    }

    #[test]
    fn supplier_keeps_profile_fields() {
        let input: SupplierInput = serde_json::from_str(
            r#"{"id":"ignored","name":"MediSupply Co.","city":"Nairobi","certifications":"ISO 13485"}"#,
        )
        .unwrap();
        let supplier = supplier_from("S009".to_string(), input).unwrap();
        assert!(supplier.status);
        assert_eq!(supplier.profile["city"], "Nairobi");
        assert!(!supplier.profile.contains_key("id"));
        let json = serde_json::to_value(&supplier).unwrap();
        assert_eq!(json["id"], "S009");
        assert_eq!(json["certifications"], "ISO 13485");
    }

    #[test]
    fn failure_body_matches_error_envelope() {
        let response = ApiFailure::new(StatusCode::UNPROCESSABLE_ENTITY, "bad").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
