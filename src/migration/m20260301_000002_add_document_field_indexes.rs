use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Expression indexes for the fields moderation and stats filter on.
const INDEXES: &[(&str, &str)] = &[
    ("idx_documents_status", "(data->>'status')"),
    // range filters and ordering on createdAt compare under the C collation
    ("idx_documents_created_at_field", "((data->>'createdAt') COLLATE \"C\")"),
    ("idx_documents_role", "(data->>'role')"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for (name, expr) in INDEXES {
            db.execute_unprepared(&format!(
                "CREATE INDEX IF NOT EXISTS {} ON documents(collection, {})",
                name, expr
            ))
            .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for (name, _) in INDEXES {
            db.execute_unprepared(&format!("DROP INDEX IF EXISTS {}", name))
                .await?;
        }
        Ok(())
    }
}
