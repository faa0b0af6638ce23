use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::ConciergeProfile;

pub fn get_profile(conn: &Connection, user_id: &str) -> anyhow::Result<Option<ConciergeProfile>> {
    let result = conn.query_row(
        "SELECT user_id, model, api_key, custom_instructions, updated_at
         FROM profiles WHERE user_id = ?1",
        params![user_id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        },
    );

    match result {
        Ok((user_id, model, api_key, custom_instructions, updated_at_str)) => {
            let updated_at =
                NaiveDateTime::parse_from_str(&updated_at_str, "%Y-%m-%d %H:%M:%S")
                    .unwrap_or_else(|_| Utc::now().naive_utc());
            Ok(Some(ConciergeProfile {
                user_id,
                model,
                api_key,
                custom_instructions,
                updated_at,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_profile(conn: &Connection, profile: &ConciergeProfile) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO profiles (user_id, model, api_key, custom_instructions)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id) DO UPDATE SET
           model = excluded.model,
           api_key = excluded.api_key,
           custom_instructions = excluded.custom_instructions,
           updated_at = datetime('now')",
        params![
            profile.user_id,
            profile.model,
            profile.api_key,
            profile.custom_instructions,
        ],
    )?;
    Ok(())
}
