use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Denormalized copy of an entity, stored inline as JSON text.
///
/// Written once when the owning row is created and read back as-is; the
/// live row it was copied from is never consulted again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<T>(pub T);

impl<T> Snapshot<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize> ToSql for Snapshot<T> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let json = serde_json::to_string(&self.0)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        Ok(ToSqlOutput::from(json))
    }
}

impl<T: DeserializeOwned> FromSql for Snapshot<T> {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        serde_json::from_str(text)
            .map(Snapshot)
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::models::User;
    use rusqlite::Connection;

    #[test]
    fn stored_as_json_text() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT)").unwrap();

        let user = User {
            id: 1,
            name: "srgold78".into(),
            about: "Влад Младший".into(),
        };
        conn.execute("INSERT INTO t (v) VALUES (?1)", [Snapshot(&user)])
            .unwrap();

        let id: i64 = conn
            .query_row("SELECT json_extract(v, '$.id') FROM t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(id, 1);

        let back: Snapshot<User> = conn.query_row("SELECT v FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(back.into_inner(), user);
    }

    #[test]
    fn malformed_json_is_a_conversion_error() {
        let conn = Connection::open_in_memory().unwrap();
        let res: rusqlite::Result<Snapshot<User>> =
            conn.query_row("SELECT '{not json'", [], |r| r.get(0));
        assert!(res.is_err());
    }
}
