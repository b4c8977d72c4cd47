use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Specialization;

/// Doctor row joined with the owning user's profile.
///
/// Authoritative for every field a recommendation displays; the ranking
/// oracle only contributes score, reason and priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub specialization: Specialization,
    pub experience_years: u32,
    /// 0.0–5.0
    pub rating: f64,
    pub is_available: bool,
    pub rare_cases_handled: u32,
    pub total_patients_handled: u32,
    pub bio: Option<String>,
    pub consultation_fee: Option<f64>,
    pub qualifications: Vec<String>,
}

impl DoctorRecord {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("Unknown")
    }
}
