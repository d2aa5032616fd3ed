//! Domain DTOs for the clinic API.
//!
//! # Design
//! These mirror the backend's JSON but are defined independently from the
//! mock-server crate; the integration tests catch schema drift between the
//! two. Identifiers are strings because the backend accepts user-entered
//! client ids (`"C001"`) as well as generated ones.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// A registered client as returned by `GET /clients`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub gender: Gender,
    pub email: String,
    pub phone_number: String,
    /// Names of the programs the client is enrolled in, in enrollment order.
    #[serde(default)]
    pub programs: Vec<String>,
}

impl ClientRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Registration payload for `POST /clients`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClient {
    /// Omit to let the server assign one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub gender: Gender,
    pub email: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub program_id: String,
}

/// A health program clients can be enrolled in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Program {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProgram {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Rejected,
}

/// An appointment request awaiting staff approval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appointment {
    pub id: String,
    pub client_id: String,
    pub client_name: String,
    pub program: String,
    pub requested_at: NaiveDate,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecordStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthRecord {
    pub id: String,
    pub client_id: String,
    pub client_name: String,
    pub program: String,
    pub date: NaiveDate,
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn active() -> bool {
    true
}

/// Optional supplier profile collected by the multi-step supplier form.
/// Dates stay strings: the form submits them as entered, possibly empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certifications: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_delivery_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// `true` while the supplier is active.
    #[serde(default = "active")]
    pub status: bool,
    #[serde(flatten)]
    pub details: SupplierDetails,
}

/// Body of `POST /suppliers` and `PUT /suppliers/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default = "active")]
    pub status: bool,
    #[serde(flatten)]
    pub details: SupplierDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub role: String,
}

/// Body of `POST /team` and `PUT /team/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberInput {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub role: String,
    /// Only sent when creating a member who can sign in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Appointments and health records fetched together for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardData {
    pub appointments: Vec<Appointment>,
    pub health_records: Vec<HealthRecord>,
}

impl DashboardData {
    pub fn pending_appointments(&self) -> usize {
        self.appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Pending)
            .count()
    }

    pub fn active_health_records(&self) -> usize {
        self.health_records
            .iter()
            .filter(|r| r.status == RecordStatus::Active)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Successful `POST /login` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginGrant {
    pub access_token: String,
}
