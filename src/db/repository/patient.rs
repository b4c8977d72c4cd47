use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{encode_string_list, parse_string_list, parse_uuid_column};
use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_SELECT: &str = "SELECT id, user_id, current_conditions, allergies, blood_type,
        date_of_birth, medical_history
     FROM patients";

type PatientRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn read_row(row: &Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn into_patient(row: PatientRow) -> Result<Patient, DatabaseError> {
    let (id, user_id, conditions, allergies, blood_type, dob, history) = row;
    Ok(Patient {
        id: parse_uuid_column("patients.id", &id)?,
        user_id: parse_uuid_column("patients.user_id", &user_id)?,
        current_conditions: parse_string_list("patients.current_conditions", conditions)?,
        allergies: parse_string_list("patients.allergies", allergies)?,
        blood_type,
        date_of_birth: dob.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        medical_history: history,
    })
}

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, user_id, current_conditions, allergies, blood_type,
            date_of_birth, medical_history)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            patient.id.to_string(),
            patient.user_id.to_string(),
            encode_string_list(&patient.current_conditions),
            encode_string_list(&patient.allergies),
            patient.blood_type,
            patient.date_of_birth.map(|d| d.to_string()),
            patient.medical_history,
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    conn.query_row(
        &format!("{PATIENT_SELECT} WHERE id = ?1"),
        params![id.to_string()],
        read_row,
    )
    .optional()?
    .map(into_patient)
    .transpose()
}

pub fn get_patient_by_user(conn: &Connection, user_id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    conn.query_row(
        &format!("{PATIENT_SELECT} WHERE user_id = ?1"),
        params![user_id.to_string()],
        read_row,
    )
    .optional()?
    .map(into_patient)
    .transpose()
}

pub fn update_patient_conditions(
    conn: &Connection,
    id: &Uuid,
    conditions: &[String],
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET current_conditions = ?1 WHERE id = ?2",
        params![encode_string_list(conditions), id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
