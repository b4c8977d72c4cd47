//! Fixtures shared by unit tests across modules.

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{assign_role, insert_doctor, insert_patient, insert_profile};
use crate::models::*;

const SPECIALIZATIONS: [Specialization; 5] = [
    Specialization::Cardiology,
    Specialization::Neurology,
    Specialization::Oncology,
    Specialization::GeneralMedicine,
    Specialization::Pediatrics,
];

fn email_for(name: &str, id: &Uuid) -> String {
    let slug: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    format!("{slug}-{}@portal.test", &id.simple().to_string()[..8])
}

pub fn seed_user(conn: &Connection, name: &str, role: AppRole) -> Profile {
    let id = Uuid::new_v4();
    let profile = Profile {
        id,
        full_name: name.to_string(),
        email: email_for(name, &id),
    };
    insert_profile(conn, &profile).unwrap();
    assign_role(conn, &id, role).unwrap();
    profile
}

/// Doctor record not yet persisted; join fields left empty.
pub fn make_doctor(user_id: Uuid, name: &str, specialization: Specialization) -> DoctorRecord {
    DoctorRecord {
        id: Uuid::new_v4(),
        user_id,
        full_name: Some(name.to_string()),
        email: None,
        specialization,
        experience_years: 12,
        rating: 4.5,
        is_available: true,
        rare_cases_handled: 3,
        total_patients_handled: 800,
        bio: Some(format!("{name} practices {}.", specialization.label())),
        consultation_fee: Some(120.0),
        qualifications: vec!["MD".to_string()],
    }
}

/// Persist a doctor with its profile and role; returns the record as the store reads it.
pub fn seed_doctor(conn: &Connection, name: &str, specialization: Specialization) -> DoctorRecord {
    let profile = seed_user(conn, name, AppRole::Doctor);
    let mut doctor = make_doctor(profile.id, name, specialization);
    insert_doctor(conn, &doctor).unwrap();
    doctor.email = Some(profile.email);
    doctor
}

pub fn seed_patient(conn: &Connection, name: &str, conditions: &[&str]) -> Patient {
    let profile = seed_user(conn, name, AppRole::Patient);
    let patient = Patient {
        id: Uuid::new_v4(),
        user_id: profile.id,
        current_conditions: conditions.iter().map(|c| c.to_string()).collect(),
        allergies: vec!["penicillin".to_string()],
        blood_type: Some("O+".to_string()),
        date_of_birth: chrono::NaiveDate::from_ymd_opt(1984, 3, 9),
        medical_history: None,
    };
    insert_patient(conn, &patient).unwrap();
    patient
}

/// In-memory doctor list with distinct, index-identifiable values.
///
/// Doctor `i` has `experience_years == 10 + i` and name "Dr. Doctor{i}";
/// odd indices are unavailable.
pub fn sample_doctors(count: usize) -> Vec<DoctorRecord> {
    (0..count)
        .map(|i| {
            let name = format!("Dr. Doctor{i}");
            let mut doctor = make_doctor(
                Uuid::new_v4(),
                &name,
                SPECIALIZATIONS[i % SPECIALIZATIONS.len()],
            );
            doctor.experience_years = 10 + i as u32;
            doctor.rating = (3.0 + (i as f64) * 0.4).min(5.0);
            doctor.is_available = i % 2 == 0;
            doctor.rare_cases_handled = (i as u32) * 2;
            doctor
        })
        .collect()
}
