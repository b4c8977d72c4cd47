use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity row shared by every role (admin, doctor, patient).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}
