use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::parse_uuid_column;
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_profile(conn: &Connection, profile: &Profile) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO profiles (id, full_name, email) VALUES (?1, ?2, ?3)",
        params![profile.id.to_string(), profile.full_name, profile.email],
    )?;
    Ok(())
}

pub fn get_profile(conn: &Connection, id: &Uuid) -> Result<Option<Profile>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, full_name, email FROM profiles WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, full_name, email)| {
        Ok(Profile {
            id: parse_uuid_column("profiles.id", &id)?,
            full_name,
            email,
        })
    })
    .transpose()
}

/// Set the user's single role, replacing any previous one.
pub fn assign_role(conn: &Connection, user_id: &Uuid, role: AppRole) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO user_roles (user_id, role) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET role = excluded.role",
        params![user_id.to_string(), role.as_str()],
    )?;
    Ok(())
}

pub fn get_role(conn: &Connection, user_id: &Uuid) -> Result<Option<AppRole>, DatabaseError> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT role FROM user_roles WHERE user_id = ?1",
            params![user_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    raw.map(|r| r.parse::<AppRole>()).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn sample_profile() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            full_name: "Amara Okafor".into(),
            email: "amara@example.org".into(),
        }
    }

    #[test]
    fn insert_and_get_profile() {
        let conn = open_memory_database().unwrap();
        let profile = sample_profile();
        insert_profile(&conn, &profile).unwrap();

        let loaded = get_profile(&conn, &profile.id).unwrap().unwrap();
        assert_eq!(loaded, profile);
        assert!(get_profile(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn duplicate_email_rejected() {
        let conn = open_memory_database().unwrap();
        let profile = sample_profile();
        insert_profile(&conn, &profile).unwrap();
        let clash = Profile {
            id: Uuid::new_v4(),
            ..profile
        };
        assert!(insert_profile(&conn, &clash).is_err());
    }

    #[test]
    fn assign_role_replaces_previous() {
        let conn = open_memory_database().unwrap();
        let profile = sample_profile();
        insert_profile(&conn, &profile).unwrap();

        assert_eq!(get_role(&conn, &profile.id).unwrap(), None);
        assign_role(&conn, &profile.id, AppRole::Patient).unwrap();
        assert_eq!(get_role(&conn, &profile.id).unwrap(), Some(AppRole::Patient));
        assign_role(&conn, &profile.id, AppRole::Admin).unwrap();
        assert_eq!(get_role(&conn, &profile.id).unwrap(), Some(AppRole::Admin));
    }
}
