//! Client core for the clinic administration API.
//!
//! # Overview
//! Two layers:
//! - A stateless request builder / response parser ([`ClinicClient`]) that
//!   never touches the network (host-does-IO). Envelope handling and error
//!   classification live here, so every transport gets them for free.
//! - A [`FetchController`] that loads the client list through an injected
//!   [`ClientDirectory`], retrying connectivity failures a bounded number of
//!   times on an injected [`Scheduler`] and publishing [`FetchState`] for a
//!   view to render.
//!
//! # Design
//! - Nothing reads ambient global state: the bearer token comes from a
//!   [`CredentialStore`], I/O from a [`Transport`], timers from a
//!   [`Scheduler`].
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod controller;
pub mod directory;
pub mod envelope;
pub mod error;
pub mod http;
pub mod scheduler;
pub mod search;
pub mod session;
pub mod transport;
pub mod types;

pub use client::ClinicClient;
pub use config::{ClientConfig, ConfigError};
pub use controller::{FetchController, FetchPhase, FetchState, RetryPolicy};
pub use directory::{ClientDirectory, HttpClientDirectory};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use scheduler::{ManualScheduler, ScheduledTask, Scheduler, TokioScheduler};
pub use session::{CredentialStore, MemoryCredentialStore};
pub use transport::{Transport, UreqTransport};
pub use types::{
    Appointment, AppointmentStatus, ClientRecord, Credentials, DashboardData, Gender,
    HealthRecord, LoginGrant, NewClient, NewProgram, Program, RecordStatus, Supplier,
    SupplierDetails, SupplierInput, TeamMember, TeamMemberInput,
};
