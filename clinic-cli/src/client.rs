//! HTTP client for the collaborator API.
//!
//! Login, appointment listing, confirmation, and health are plain
//! request/response calls outside the chat core. Failures here are
//! transient notifications to the user; retry is always a manual action,
//! never automatic.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use clinic_common::config::ApiConfig;

/// Collaborator API paths, relative to the configured base URL.
pub mod endpoints {
    pub const LOGIN: &str = "/auth/login";
    pub const APPOINTMENTS_TODAY: &str = "/appointments/today";
    pub const HEALTH: &str = "/health";

    pub fn confirm(id: &str) -> String {
        format!("/appointments/{id}/confirm")
    }
}

/// One appointment record as the collaborator API returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    /// Record identifier used by the confirm endpoint.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub address: String,
    pub phone_number: String,
    pub doctor: String,
    pub visited: bool,
    pub confirmed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    receptionist_id: &'a str,
    password: &'a str,
}

/// Health check payload.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Typed client for the collaborator REST API.
pub struct ClinicApi {
    base_url: String,
    http: reqwest::Client,
}

impl ClinicApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Authenticate a receptionist.
    ///
    /// Rejected credentials return `Ok(false)`; no token or session object
    /// is retained either way. Transport and server failures are errors.
    pub async fn login(&self, receptionist_id: &str, password: &str) -> Result<bool> {
        let url = format!("{}{}", self.base_url, endpoints::LOGIN);
        let response = self
            .http
            .post(&url)
            .json(&LoginRequest {
                receptionist_id,
                password,
            })
            .send()
            .await
            .context("Login request failed")?;

        if response.status().is_success() {
            return Ok(true);
        }
        if response.status().is_client_error() {
            return Ok(false);
        }
        bail!("Login endpoint returned {}", response.status())
    }

    /// Fetch today's appointments, in the order the server returns them.
    pub async fn today_appointments(&self) -> Result<Vec<Appointment>> {
        let url = format!("{}{}", self.base_url, endpoints::APPOINTMENTS_TODAY);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("Appointment request failed")?
            .error_for_status()
            .context("Appointment request rejected")?;

        response.json().await.context("Invalid appointment payload")
    }

    /// Confirm one appointment; returns the updated record.
    pub async fn confirm_appointment(&self, id: &str) -> Result<Appointment> {
        let url = format!("{}{}", self.base_url, endpoints::confirm(id));
        let response = self
            .http
            .put(&url)
            .send()
            .await
            .context("Confirm request failed")?
            .error_for_status()
            .context("Confirm request rejected")?;

        response.json().await.context("Invalid confirm payload")
    }

    /// Check collaborator API health.
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = format!("{}{}", self.base_url, endpoints::HEALTH);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("Health request failed")?
            .error_for_status()
            .context("Health request rejected")?;

        response.json().await.context("Invalid health payload")
    }
}
