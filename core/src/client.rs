//! Stateless HTTP request builder and response parser for the clinic API.
//!
//! # Design
//! `ClinicClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Authenticated endpoints take the bearer token as an argument; where the
//! token lives is the caller's business (see [`crate::session`]).

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::envelope::unwrap_data;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    Appointment, ClientRecord, Credentials, DashboardData, Enrollment, HealthRecord, LoginGrant,
    NewClient, NewProgram, Program, Supplier, SupplierInput, TeamMember, TeamMemberInput,
};

#[derive(Debug, Clone)]
pub struct ClinicClient {
    base_url: String,
}

impl ClinicClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // --- auth ---

    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/login", None, credentials)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<LoginGrant, ApiError> {
        parse_body(&response, &[200])
    }

    /// Create a staff account. Sign in with [`Self::build_login`] afterwards.
    pub fn build_register_user(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/register", None, credentials)
    }

    pub fn parse_register_user(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200, 201])
    }

    // --- clients ---

    pub fn build_list_clients(&self, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Get, "/clients", token)
    }

    pub fn parse_list_clients(&self, response: HttpResponse) -> Result<Vec<ClientRecord>, ApiError> {
        parse_body(&response, &[200])
    }

    pub fn build_get_client(&self, id: &str, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/clients/{id}"), token)
    }

    pub fn parse_get_client(&self, response: HttpResponse) -> Result<ClientRecord, ApiError> {
        parse_body(&response, &[200])
    }

    pub fn build_register_client(
        &self,
        input: &NewClient,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/clients", token, input)
    }

    pub fn parse_register_client(&self, response: HttpResponse) -> Result<ClientRecord, ApiError> {
        parse_body(&response, &[200, 201])
    }

    pub fn build_enroll_client(
        &self,
        client_id: &str,
        program_id: &str,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let body = Enrollment {
            program_id: program_id.to_string(),
        };
        self.json_request(
            HttpMethod::Post,
            &format!("/clients/{client_id}/programs"),
            token,
            &body,
        )
    }

    pub fn parse_enroll_client(&self, response: HttpResponse) -> Result<ClientRecord, ApiError> {
        parse_body(&response, &[200, 201])
    }

    // --- programs ---

    pub fn build_list_programs(&self, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Get, "/programs", token)
    }

    pub fn parse_list_programs(&self, response: HttpResponse) -> Result<Vec<Program>, ApiError> {
        parse_body(&response, &[200])
    }

    pub fn build_create_program(
        &self,
        input: &NewProgram,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/programs", token, input)
    }

    pub fn parse_create_program(&self, response: HttpResponse) -> Result<Program, ApiError> {
        parse_body(&response, &[200, 201])
    }

    pub fn build_delete_program(&self, id: &str, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/programs/{id}"), token)
    }

    pub fn parse_delete_program(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200, 204])
    }

    // --- appointments ---

    pub fn build_list_appointments(&self, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Get, "/appointments", token)
    }

    pub fn parse_list_appointments(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<Appointment>, ApiError> {
        parse_body(&response, &[200])
    }

    pub fn build_approve_appointment(&self, id: &str, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Patch, &format!("/appointments/{id}/approve"), token)
    }

    pub fn build_reject_appointment(&self, id: &str, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Patch, &format!("/appointments/{id}/reject"), token)
    }

    /// Parses the response of both approve and reject.
    pub fn parse_appointment_decision(
        &self,
        response: HttpResponse,
    ) -> Result<Appointment, ApiError> {
        parse_body(&response, &[200])
    }

    // --- health records ---

    pub fn build_list_health_records(&self, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Get, "/health-records", token)
    }

    pub fn parse_list_health_records(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<HealthRecord>, ApiError> {
        parse_body(&response, &[200])
    }

    pub fn build_complete_health_record(&self, id: &str, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Patch, &format!("/health-records/{id}/complete"), token)
    }

    pub fn parse_complete_health_record(
        &self,
        response: HttpResponse,
    ) -> Result<HealthRecord, ApiError> {
        parse_body(&response, &[200])
    }

    // --- suppliers ---

    pub fn build_list_suppliers(&self, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Get, "/suppliers", token)
    }

    pub fn parse_list_suppliers(&self, response: HttpResponse) -> Result<Vec<Supplier>, ApiError> {
        parse_body(&response, &[200])
    }

    pub fn build_create_supplier(
        &self,
        input: &SupplierInput,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/suppliers", token, input)
    }

    pub fn build_update_supplier(
        &self,
        id: &str,
        input: &SupplierInput,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/suppliers/{id}"), token, input)
    }

    /// Parses the response of both create and update.
    pub fn parse_supplier(&self, response: HttpResponse) -> Result<Supplier, ApiError> {
        parse_body(&response, &[200, 201])
    }

    pub fn build_delete_supplier(&self, id: &str, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/suppliers/{id}"), token)
    }

    pub fn parse_delete_supplier(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200, 204])
    }

    // --- team ---

    pub fn build_list_team(&self, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Get, "/team", token)
    }

    pub fn parse_list_team(&self, response: HttpResponse) -> Result<Vec<TeamMember>, ApiError> {
        parse_body(&response, &[200])
    }

    pub fn build_create_team_member(
        &self,
        input: &TeamMemberInput,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/team", token, input)
    }

    pub fn build_update_team_member(
        &self,
        id: &str,
        input: &TeamMemberInput,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/team/{id}"), token, input)
    }

    /// Parses the response of both create and update.
    pub fn parse_team_member(&self, response: HttpResponse) -> Result<TeamMember, ApiError> {
        parse_body(&response, &[200, 201])
    }

    pub fn build_delete_team_member(&self, id: &str, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/team/{id}"), token)
    }

    pub fn parse_delete_team_member(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200, 204])
    }

    // --- dashboard ---

    /// The two requests behind the dashboard: appointments, then health
    /// records. They are independent and may be executed concurrently.
    pub fn build_dashboard(&self, token: Option<&str>) -> [HttpRequest; 2] {
        [
            self.build_list_appointments(token),
            self.build_list_health_records(token),
        ]
    }

    /// Fails with the first error if either response is unusable.
    pub fn parse_dashboard(
        &self,
        appointments: HttpResponse,
        health_records: HttpResponse,
    ) -> Result<DashboardData, ApiError> {
        Ok(DashboardData {
            appointments: self.parse_list_appointments(appointments)?,
            health_records: self.parse_list_health_records(health_records)?,
        })
    }

    fn request(&self, method: HttpMethod, path: &str, token: Option<&str>) -> HttpRequest {
        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if let Some(token) = token {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers,
            body: None,
        }
    }

    fn json_request<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        token: Option<&str>,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut req = self.request(method, path, token);
        req.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        req.body = Some(body);
        Ok(req)
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: &[u16]) -> Result<(), ApiError> {
    if expected.contains(&response.status) {
        return Ok(());
    }
    Err(ApiError::from_status(response.status, &response.body))
}

fn parse_body<T: DeserializeOwned>(response: &HttpResponse, expected: &[u16]) -> Result<T, ApiError> {
    check_status(response, expected)?;
    unwrap_data(&response.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Gender;
    use chrono::NaiveDate;

    const CLIENTS_JSON: &str = r#"[{"id":"C001","first_name":"Jane","last_name":"Doe",
        "dob":"1990-05-14","gender":"Female","email":"jane@example.com",
        "phone_number":"0700000001","programs":["TB Control"]}]"#;

    fn client() -> ClinicClient {
        ClinicClient::new("http://localhost:3000/api")
    }

    #[test]
    fn build_list_clients_without_token() {
        let req = client().build_list_clients(None);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/api/clients");
        assert!(req.body.is_none());
        assert!(req.header("authorization").is_none());
        assert_eq!(req.header("Accept"), Some("application/json"));
    }

    #[test]
    fn build_list_clients_attaches_bearer_token() {
        let req = client().build_list_clients(Some("tok-123"));
        assert_eq!(req.header("Authorization"), Some("Bearer tok-123"));
    }

    #[test]
    fn build_register_client_serializes_body() {
        let input = NewClient {
            id: Some("C009".to_string()),
            first_name: "Amina".to_string(),
            last_name: "Otieno".to_string(),
            dob: NaiveDate::from_ymd_opt(2001, 3, 9).unwrap(),
            gender: Gender::Female,
            email: "amina@example.com".to_string(),
            phone_number: "0711000000".to_string(),
        };
        let req = client().build_register_client(&input, Some("t")).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/api/clients");
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["id"], "C009");
        assert_eq!(body["dob"], "2001-03-09");
    }

    #[test]
    fn build_enroll_client_targets_client_programs() {
        let req = client().build_enroll_client("C001", "P002", None).unwrap();
        assert_eq!(req.path, "http://localhost:3000/api/clients/C001/programs");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["program_id"], "P002");
    }

    #[test]
    fn build_appointment_decisions_use_patch() {
        let approve = client().build_approve_appointment("A001", None);
        assert_eq!(approve.method, HttpMethod::Patch);
        assert_eq!(approve.path, "http://localhost:3000/api/appointments/A001/approve");

        let reject = client().build_reject_appointment("A001", None);
        assert_eq!(reject.path, "http://localhost:3000/api/appointments/A001/reject");
    }

    #[test]
    fn parse_list_clients_bare_array() {
        let clients = client()
            .parse_list_clients(HttpResponse::new(200, CLIENTS_JSON))
            .unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].programs, vec!["TB Control"]);
    }

    #[test]
    fn parse_list_clients_enveloped() {
        let body = format!(r#"{{"success":true,"data":{CLIENTS_JSON}}}"#);
        let clients = client()
            .parse_list_clients(HttpResponse::new(200, body))
            .unwrap();
        assert_eq!(clients[0].id, "C001");
    }

    #[test]
    fn parse_list_clients_422_is_unauthorized() {
        let response = HttpResponse::new(
            422,
            r#"{"success":false,"message":"Signature verification failed","status":422}"#,
        );
        let err = client().parse_list_clients(response).unwrap_err();
        assert_eq!(
            err,
            ApiError::Unauthorized {
                status: 422,
                message: Some("Signature verification failed".to_string())
            }
        );
    }

    #[test]
    fn parse_get_client_not_found() {
        let err = client()
            .parse_get_client(HttpResponse::new(404, ""))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[test]
    fn parse_register_client_accepts_201() {
        let body = r#"{"id":"C002","first_name":"John","last_name":"Smith","dob":"1985-01-02",
            "gender":"Male","email":"john@example.com","phone_number":"0700000002"}"#;
        let created = client()
            .parse_register_client(HttpResponse::new(201, body))
            .unwrap();
        assert_eq!(created.id, "C002");
    }

    #[test]
    fn parse_delete_program_accepts_204() {
        assert!(client()
            .parse_delete_program(HttpResponse::new(204, ""))
            .is_ok());
    }

    #[test]
    fn parse_login_reads_token() {
        let grant = client()
            .parse_login(HttpResponse::new(
                200,
                r#"{"success":true,"data":{"access_token":"abc"}}"#,
            ))
            .unwrap();
        assert_eq!(grant.access_token, "abc");
    }

    #[test]
    fn parse_list_clients_bad_json() {
        let err = client()
            .parse_list_clients(HttpResponse::new(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn build_register_user_is_unauthenticated() {
        let credentials = Credentials {
            email: "nurse@clinic.test".to_string(),
            password: "s3cret".to_string(),
        };
        let req = client().build_register_user(&credentials).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/api/register");
        assert!(req.header("authorization").is_none());
    }

    #[test]
    fn parse_register_user_conflict() {
        let err = client()
            .parse_register_user(HttpResponse::new(
                409,
                r#"{"success":false,"message":"User with this email already exists","status":409}"#,
            ))
            .unwrap_err();
        assert_eq!(err.status(), 409);
        assert_eq!(err.user_message("x"), "User with this email already exists");
    }

    #[test]
    fn build_update_supplier_uses_put() {
        let input = SupplierInput {
            name: "MediSupply Co.".to_string(),
            email: "contact@medisupply.com".to_string(),
            phone: "+254 712 345 678".to_string(),
            status: false,
            details: Default::default(),
        };
        let req = client()
            .build_update_supplier("S001", &input, Some("t"))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:3000/api/suppliers/S001");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["status"], false);
    }

    #[test]
    fn build_team_requests() {
        let input = TeamMemberInput {
            name: "Dr. Michael Lee".to_string(),
            email: "michael.lee@hospital.com".to_string(),
            phone_number: "456-789-0123".to_string(),
            role: "Doctor".to_string(),
            password: None,
        };
        let update = client().build_update_team_member("T004", &input, None).unwrap();
        assert_eq!(update.method, HttpMethod::Put);
        assert_eq!(update.path, "http://localhost:3000/api/team/T004");
        let body: serde_json::Value =
            serde_json::from_str(update.body.as_deref().unwrap()).unwrap();
        assert!(body.get("password").is_none());

        let delete = client().build_delete_team_member("T004", None);
        assert_eq!(delete.method, HttpMethod::Delete);
    }

    #[test]
    fn parse_dashboard_accepts_mixed_shapes() {
        let appointments = r#"{"success":true,"data":[{"id":"A001","client_id":"C001",
            "client_name":"Jane Doe","program":"TB Control","requested_at":"2025-04-20",
            "status":"Pending"}]}"#;
        let records = r#"[{"id":"R001","client_id":"C001","client_name":"Jane Doe",
            "program":"TB Control","date":"2025-04-20","status":"Active"}]"#;
        let data = client()
            .parse_dashboard(
                HttpResponse::new(200, appointments),
                HttpResponse::new(200, records),
            )
            .unwrap();
        assert_eq!(data.pending_appointments(), 1);
        assert_eq!(data.active_health_records(), 1);
    }

    #[test]
    fn parse_dashboard_fails_if_either_half_fails() {
        let err = client()
            .parse_dashboard(HttpResponse::new(200, "[]"), HttpResponse::new(500, ""))
            .unwrap_err();
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = ClinicClient::new("http://localhost:3000/api/");
        assert_eq!(
            client.build_list_programs(None).path,
            "http://localhost:3000/api/programs"
        );
    }
}
