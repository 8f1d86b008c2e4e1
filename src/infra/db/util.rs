use crate::application::repos::RepoError;

/// Translate driver errors into the repository error taxonomy.
pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match &err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::duplicate(db.constraint().unwrap_or("unique").to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            RepoError::integrity(db.message().to_string())
        }
        _ => RepoError::from_persistence(err),
    }
}
