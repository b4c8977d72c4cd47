use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{encode_string_list, parse_string_list, parse_uuid_column};
use crate::db::DatabaseError;
use crate::models::*;

const DOCTOR_SELECT: &str = "SELECT d.id, d.user_id, p.full_name, p.email, d.specialization,
        d.experience_years, d.rating, d.is_available, d.rare_cases_handled,
        d.total_patients_handled, d.bio, d.consultation_fee, d.qualifications
     FROM doctors d
     INNER JOIN profiles p ON p.id = d.user_id";

/// Raw column values; converted to `DoctorRecord` outside the rusqlite closure
/// so enum and uuid failures surface as `DatabaseError`.
struct DoctorRow {
    id: String,
    user_id: String,
    full_name: Option<String>,
    email: Option<String>,
    specialization: String,
    experience_years: Option<i64>,
    rating: Option<f64>,
    is_available: Option<bool>,
    rare_cases_handled: Option<i64>,
    total_patients_handled: Option<i64>,
    bio: Option<String>,
    consultation_fee: Option<f64>,
    qualifications: Option<String>,
}

impl DoctorRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            full_name: row.get(2)?,
            email: row.get(3)?,
            specialization: row.get(4)?,
            experience_years: row.get(5)?,
            rating: row.get(6)?,
            is_available: row.get(7)?,
            rare_cases_handled: row.get(8)?,
            total_patients_handled: row.get(9)?,
            bio: row.get(10)?,
            consultation_fee: row.get(11)?,
            qualifications: row.get(12)?,
        })
    }

    fn into_record(self) -> Result<DoctorRecord, DatabaseError> {
        Ok(DoctorRecord {
            id: parse_uuid_column("doctors.id", &self.id)?,
            user_id: parse_uuid_column("doctors.user_id", &self.user_id)?,
            full_name: self.full_name,
            email: self.email,
            specialization: self.specialization.parse()?,
            experience_years: non_negative(self.experience_years),
            rating: self.rating.unwrap_or(0.0).clamp(0.0, 5.0),
            is_available: self.is_available.unwrap_or(false),
            rare_cases_handled: non_negative(self.rare_cases_handled),
            total_patients_handled: non_negative(self.total_patients_handled),
            bio: self.bio.filter(|b| !b.trim().is_empty()),
            consultation_fee: self.consultation_fee,
            qualifications: parse_string_list("doctors.qualifications", self.qualifications)?,
        })
    }
}

fn non_negative(value: Option<i64>) -> u32 {
    value
        .unwrap_or(0)
        .clamp(0, i64::from(u32::MAX))
        .try_into()
        .unwrap_or(0)
}

/// Insert the doctor row. The profile referenced by `user_id` must exist;
/// `full_name`/`email` on the record are read-side join fields and ignored here.
pub fn insert_doctor(conn: &Connection, doctor: &DoctorRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (id, user_id, specialization, experience_years, rating,
            is_available, rare_cases_handled, total_patients_handled, bio,
            consultation_fee, qualifications)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            doctor.id.to_string(),
            doctor.user_id.to_string(),
            doctor.specialization.as_str(),
            doctor.experience_years,
            doctor.rating,
            doctor.is_available,
            doctor.rare_cases_handled,
            doctor.total_patients_handled,
            doctor.bio,
            doctor.consultation_fee,
            encode_string_list(&doctor.qualifications),
        ],
    )?;
    Ok(())
}

/// Every doctor joined with its profile, in insertion order.
///
/// The order is the positional contract between the ranking prompt and
/// suggestion resolution; callers must use one snapshot for both.
pub fn get_all_doctor_records(conn: &Connection) -> Result<Vec<DoctorRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{DOCTOR_SELECT} ORDER BY d.rowid ASC"))?;
    let rows = stmt.query_map([], DoctorRow::from_row)?;

    rows.map(|r| r.map_err(DatabaseError::from).and_then(DoctorRow::into_record))
        .collect()
}

pub fn get_doctor_record(conn: &Connection, id: &Uuid) -> Result<Option<DoctorRecord>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("{DOCTOR_SELECT} WHERE d.id = ?1"),
            params![id.to_string()],
            DoctorRow::from_row,
        )
        .optional()?;

    row.map(DoctorRow::into_record).transpose()
}

pub fn set_doctor_availability(
    conn: &Connection,
    id: &Uuid,
    is_available: bool,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctors SET is_available = ?1 WHERE id = ?2",
        params![is_available, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "doctor".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::test_support::{make_doctor, seed_doctor};

    #[test]
    fn empty_store_returns_no_doctors() {
        let conn = open_memory_database().unwrap();
        assert!(get_all_doctor_records(&conn).unwrap().is_empty());
    }

    #[test]
    fn records_join_profile_fields() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn, "Dr. Lena Hart", Specialization::Neurology);

        let all = get_all_doctor_records(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], doctor);
        assert_eq!(all[0].display_name(), "Dr. Lena Hart");
        assert!(all[0].email.as_deref().unwrap().ends_with("@portal.test"));
    }

    #[test]
    fn records_keep_insertion_order() {
        let conn = open_memory_database().unwrap();
        let names = ["Dr. A", "Dr. B", "Dr. C", "Dr. D", "Dr. E"];
        let seeded: Vec<_> = names
            .iter()
            .map(|n| seed_doctor(&conn, n, Specialization::Cardiology))
            .collect();

        let all = get_all_doctor_records(&conn).unwrap();
        let ids: Vec<_> = all.iter().map(|d| d.id).collect();
        let expected: Vec<_> = seeded.iter().map(|d| d.id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn null_columns_map_to_defaults() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn, "Dr. Null", Specialization::Oncology);
        conn.execute(
            "UPDATE doctors SET rating = NULL, is_available = NULL, rare_cases_handled = NULL,
                total_patients_handled = NULL, bio = '', qualifications = NULL
             WHERE id = ?1",
            params![doctor.id.to_string()],
        )
        .unwrap();

        let loaded = get_doctor_record(&conn, &doctor.id).unwrap().unwrap();
        assert_eq!(loaded.rating, 0.0);
        assert!(!loaded.is_available);
        assert_eq!(loaded.rare_cases_handled, 0);
        assert_eq!(loaded.total_patients_handled, 0);
        assert!(loaded.bio.is_none());
        assert!(loaded.qualifications.is_empty());
    }

    #[test]
    fn unknown_specialization_is_invalid_enum() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn, "Dr. Odd", Specialization::Dermatology);
        conn.execute(
            "UPDATE doctors SET specialization = 'astrology' WHERE id = ?1",
            params![doctor.id.to_string()],
        )
        .unwrap();

        let err = get_all_doctor_records(&conn).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn doctor_without_profile_rejected() {
        let conn = open_memory_database().unwrap();
        let orphan = make_doctor(Uuid::new_v4(), "Dr. Orphan", Specialization::Pediatrics);
        assert!(insert_doctor(&conn, &orphan).is_err());
    }

    #[test]
    fn availability_toggle() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn, "Dr. Busy", Specialization::Psychiatry);
        set_doctor_availability(&conn, &doctor.id, false).unwrap();
        let loaded = get_doctor_record(&conn, &doctor.id).unwrap().unwrap();
        assert!(!loaded.is_available);

        let missing = set_doctor_availability(&conn, &Uuid::new_v4(), true);
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }
}
