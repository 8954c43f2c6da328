//! Category repository.

use tally_core::entities::Category;
use tally_core::enums::{AuditAction, EntityType};
use tally_core::ids::PREFIX_CATEGORY;

use crate::error::DatabaseError;
use crate::helpers::require_text;
use crate::repos::audit::insert_audit;
use crate::service::TallyService;

const SELECT_COLS: &str = "id, name";

fn row_to_category(row: &libsql::Row) -> Result<Category, DatabaseError> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

pub(crate) async fn category_exists(
    conn: &libsql::Connection,
    id: &str,
) -> Result<bool, DatabaseError> {
    let mut rows = conn
        .query("SELECT 1 FROM categories WHERE id = ?1", [id])
        .await?;
    Ok(rows.next().await?.is_some())
}

impl TallyService {
    /// Create a category. Names are unique, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for a blank or duplicate name.
    pub async fn create_category(
        &self,
        actor_id: &str,
        name: &str,
    ) -> Result<Category, DatabaseError> {
        let name = require_text("name", name)?;

        let _guard = self.write_guard().await;
        let tx = self.begin().await?;
        let outcome: Result<Category, DatabaseError> = async {
            let mut existing = tx
                .query(
                    "SELECT 1 FROM categories WHERE name = ?1 COLLATE NOCASE",
                    [name],
                )
                .await?;
            if existing.next().await?.is_some() {
                return Err(DatabaseError::Validation(format!(
                    "category \"{name}\" already exists"
                )));
            }

            let id = self.db().generate_id(PREFIX_CATEGORY).await?;
            tx.execute(
                "INSERT INTO categories (id, name) VALUES (?1, ?2)",
                libsql::params![id.as_str(), name],
            )
            .await?;

            let entry = self
                .new_audit(
                    Some(actor_id),
                    AuditAction::AddCategory,
                    Some((EntityType::Category, &id)),
                    format!("Created new category: \"{name}\""),
                    None,
                )
                .await?;
            insert_audit(&tx, &entry).await?;

            Ok(Category {
                id,
                name: name.to_string(),
            })
        }
        .await;
        let category = self.finish_catalog(tx, outcome).await?;

        tracing::info!(category_id = %category.id, name = %category.name, "category created");
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown ID.
    pub async fn get_category(&self, id: &str) -> Result<Category, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM categories WHERE id = ?1"),
                [id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => row_to_category(&row),
            None => Err(DatabaseError::not_found(EntityType::Category, id)),
        }
    }

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM categories ORDER BY name COLLATE NOCASE, id"),
                (),
            )
            .await?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next().await? {
            categories.push(row_to_category(&row)?);
        }
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_service;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn create_and_list() {
        let svc = test_service().await;
        svc.create_category("usr-1", "Sports").await.unwrap();
        svc.create_category("usr-1", "academics").await.unwrap();
        svc.create_category("usr-1", "Music").await.unwrap();

        let names: Vec<_> = svc
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["academics", "Music", "Sports"]);
    }

    #[tokio::test]
    async fn duplicate_name_is_validation_error() {
        let svc = test_service().await;
        svc.create_category("usr-1", "Music").await.unwrap();
        let err = svc.create_category("usr-1", "MUSIC").await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert_eq!(svc.list_categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn get_unknown_is_not_found() {
        let svc = test_service().await;
        let err = svc.get_category("cat-nope").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn create_invalidates_catalog() {
        let svc = test_service().await;
        svc.list_events_by_category().await.unwrap();
        assert!(svc.catalog_is_cached().await);
        svc.create_category("usr-1", "Dance").await.unwrap();
        assert!(!svc.catalog_is_cached().await);
    }
}
