//! PostgreSQL document store: one JSONB row per document.

use super::{
    merge_fields, new_document_id, Direction, Document, DocumentStore, Fields, Filter, Op, Query,
    StoreError, StoreResult, WriteBatch, WriteOp,
};
use async_trait::async_trait;
use sea_orm::{
    sea_query::{Expr, NullOrdering, OnConflict, Order, SimpleExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
};
use serde_json::Value;

pub mod collection {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "collections")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub name: String,
        pub created_at: DateTime,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod document {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "documents")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub collection: String,
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub data: Json,
        pub created_at: DateTime,
        pub updated_at: DateTime,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Clone)]
pub struct PgDocumentStore {
    db: DatabaseConnection,
}

impl PgDocumentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn require_collection(&self, name: &str) -> StoreResult<()> {
        let found = collection::Entity::find_by_id(name.to_string())
            .one(&self.db)
            .await?;
        match found {
            Some(_) => Ok(()),
            None => Err(StoreError::CollectionMissing(name.to_string())),
        }
    }
}

fn into_document(model: document::Model) -> Document {
    let fields = match model.data {
        Value::Object(map) => map,
        other => {
            tracing::warn!(
                "document {}/{} holds non-object data ({}), reading as empty",
                model.collection,
                model.id,
                other
            );
            Fields::new()
        }
    };
    Document::new(model.id, fields)
}

/// Field names are spliced into SQL text, so only identifier characters
/// are accepted.
fn json_field(field: &str) -> StoreResult<&str> {
    if !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(field)
    } else {
        Err(StoreError::Backend(anyhow::anyhow!(
            "unsupported field name '{}'",
            field
        )))
    }
}

fn sql_operator(op: Op) -> &'static str {
    match op {
        Op::Eq => "=",
        Op::Ne => "<>",
        Op::Gt => ">",
        Op::Gte => ">=",
        Op::Lt => "<",
        Op::Lte => "<=",
    }
}

/// SQL form of a filter with the same matching rules as `Filter::matches`.
/// String comparisons go through `data->>'field'` so the expression indexes
/// apply; `COLLATE "C"` keeps range order bytewise like Rust's `str` order.
fn filter_expr(filter: &Filter) -> StoreResult<SimpleExpr> {
    let f = json_field(&filter.field)?;
    let expr = match (filter.op, &filter.value) {
        (Op::Eq, Value::String(s)) => Expr::cust_with_values(
            format!("((data->>'{f}') = ? AND jsonb_typeof(data->'{f}') = 'string')"),
            [s.clone()],
        ),
        (Op::Eq, value) => {
            Expr::cust_with_values(format!("((data->'{f}') = ?::jsonb)"), [value.clone()])
        }
        (Op::Ne, value) => Expr::cust_with_values(
            format!("((data->'{f}') IS DISTINCT FROM ?::jsonb)"),
            [value.clone()],
        ),
        (op, Value::String(s)) => Expr::cust_with_values(
            format!(
                "(jsonb_typeof(data->'{f}') = 'string' AND (data->>'{f}') COLLATE \"C\" {} ?)",
                sql_operator(op)
            ),
            [s.clone()],
        ),
        (op, value @ (Value::Number(_) | Value::Bool(_))) => {
            let kind = if value.is_number() { "number" } else { "boolean" };
            Expr::cust_with_values(
                format!(
                    "(jsonb_typeof(data->'{f}') = '{kind}' AND (data->'{f}') {} ?::jsonb)",
                    sql_operator(op)
                ),
                [value.clone()],
            )
        }
        // ranges over null, arrays or objects never match
        _ => Expr::cust("FALSE"),
    };
    Ok(expr)
}

/// LIMIT and OFFSET are bound as BIGINT.
fn sql_bound(n: usize) -> u64 {
    (n as u64).min(i64::MAX as u64)
}

fn filtered(collection: &str, filters: &[Filter]) -> StoreResult<Select<document::Entity>> {
    let mut select = document::Entity::find().filter(document::Column::Collection.eq(collection));
    for filter in filters {
        select = select.filter(filter_expr(filter)?);
    }
    Ok(select)
}

/// Full SELECT for a query. Ordering compares the field's text form, which
/// matches `Query::apply` for the string fields listings sort on. Missing
/// and null values come first ascending and last descending; ties keep
/// insertion order.
fn select_documents(collection: &str, query: &Query) -> StoreResult<Select<document::Entity>> {
    let mut select = filtered(collection, &query.filters)?;

    if let Some(order) = &query.order_by {
        let key = Expr::cust(format!("(data->>'{}') COLLATE \"C\"", json_field(&order.field)?));
        select = match order.direction {
            Direction::Asc => select.order_by_with_nulls(key, Order::Asc, NullOrdering::First),
            Direction::Desc => select.order_by_with_nulls(key, Order::Desc, NullOrdering::Last),
        };
    }
    select = select
        .order_by_asc(document::Column::CreatedAt)
        .order_by_asc(document::Column::Id);

    if query.offset > 0 {
        select = select.offset(sql_bound(query.offset));
    }
    if let Some(limit) = query.limit {
        select = select.limit(sql_bound(limit));
    }
    Ok(select)
}

async fn register_collection<C: ConnectionTrait>(conn: &C, name: &str) -> StoreResult<()> {
    let row = collection::ActiveModel {
        name: sea_orm::ActiveValue::Set(name.to_string()),
        created_at: sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc()),
    };
    collection::Entity::insert(row)
        .on_conflict(
            OnConflict::column(collection::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

async fn apply_op<C: ConnectionTrait>(conn: &C, op: WriteOp) -> StoreResult<()> {
    let now = chrono::Utc::now().naive_utc();
    match op {
        WriteOp::Insert {
            collection,
            id,
            fields,
        } => {
            register_collection(conn, &collection).await?;
            let row = document::ActiveModel {
                collection: sea_orm::ActiveValue::Set(collection),
                id: sea_orm::ActiveValue::Set(id),
                data: sea_orm::ActiveValue::Set(Value::Object(fields)),
                created_at: sea_orm::ActiveValue::Set(now),
                updated_at: sea_orm::ActiveValue::Set(now),
            };
            document::Entity::insert(row)
                .on_conflict(
                    OnConflict::columns([document::Column::Collection, document::Column::Id])
                        .update_columns([document::Column::Data, document::Column::UpdatedAt])
                        .to_owned(),
                )
                .exec_without_returning(conn)
                .await?;
        }
        WriteOp::Update {
            collection,
            id,
            fields,
        } => {
            let existing = document::Entity::find_by_id((collection.clone(), id.clone()))
                .one(conn)
                .await?
                .ok_or_else(|| StoreError::not_found(&collection, &id))?;

            let mut data = match existing.data.clone() {
                Value::Object(map) => map,
                _ => Fields::new(),
            };
            merge_fields(&mut data, fields);

            let mut active: document::ActiveModel = existing.into();
            active.data = sea_orm::ActiveValue::Set(Value::Object(data));
            active.updated_at = sea_orm::ActiveValue::Set(now);
            active.update(conn).await?;
        }
        WriteOp::Delete { collection, id } => {
            document::Entity::delete_by_id((collection, id))
                .exec(conn)
                .await?;
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn collections(&self) -> StoreResult<Vec<String>> {
        let rows = collection::Entity::find()
            .order_by_asc(collection::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|r| r.name).collect())
    }

    async fn ensure_collection(&self, collection: &str) -> StoreResult<()> {
        register_collection(&self.db, collection).await
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        self.require_collection(collection).await?;
        let rows = select_documents(collection, query)?.all(&self.db).await?;
        Ok(rows.into_iter().map(into_document).collect())
    }

    async fn count(&self, collection: &str, query: &Query) -> StoreResult<u64> {
        self.require_collection(collection).await?;
        Ok(filtered(collection, &query.filters)?.count(&self.db).await?)
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.require_collection(collection).await?;
        let row = document::Entity::find_by_id((collection.to_string(), id.to_string()))
            .one(&self.db)
            .await?;
        Ok(row.map(into_document))
    }

    async fn insert(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: Fields,
    ) -> StoreResult<String> {
        let id = id.map(str::to_string).unwrap_or_else(new_document_id);
        apply_op(
            &self.db,
            WriteOp::Insert {
                collection: collection.to_string(),
                id: id.clone(),
                fields,
            },
        )
        .await?;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        apply_op(
            &self.db,
            WriteOp::Update {
                collection: collection.to_string(),
                id: id.to_string(),
                fields,
            },
        )
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        apply_op(
            &self.db,
            WriteOp::Delete {
                collection: collection.to_string(),
                id: id.to_string(),
            },
        )
        .await
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let txn = self.db.begin().await?;
        for op in batch.into_ops() {
            // dropping the transaction on error rolls it back
            apply_op(&txn, op).await?;
        }
        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    fn sql(query: &Query) -> String {
        select_documents("reports", query)
            .unwrap()
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn filters_order_and_paging_run_in_sql() {
        let statement = sql(&Query::new()
            .filter(Filter::eq("status", "pending"))
            .filter(Filter::gte("createdAt", "2026-10-01T00:00:00.000Z"))
            .order_by_desc("createdAt")
            .offset(20)
            .limit(10));

        assert!(statement.contains("(data->>'status') = 'pending'"));
        assert!(statement.contains("jsonb_typeof(data->'status') = 'string'"));
        assert!(statement
            .contains("(data->>'createdAt') COLLATE \"C\" >= '2026-10-01T00:00:00.000Z'"));
        assert!(statement.contains("(data->>'createdAt') COLLATE \"C\" DESC NULLS LAST"));
        assert!(statement.contains("LIMIT 10"));
        assert!(statement.contains("OFFSET 20"));
    }

    #[test]
    fn ascending_order_puts_missing_values_first() {
        let statement = sql(&Query::new().order_by_asc("joinedAt"));
        assert!(statement.contains("(data->>'joinedAt') COLLATE \"C\" ASC NULLS FIRST"));
        assert!(!statement.contains("LIMIT"));
    }

    #[test]
    fn range_over_null_never_matches() {
        let statement = sql(&Query::new().filter(Filter::gte("n", Value::Null)));
        assert!(statement.contains("FALSE"));
    }

    #[test]
    fn huge_offsets_are_clamped_to_bigint() {
        let statement = sql(&Query::new().offset(usize::MAX).limit(20));
        assert!(statement.contains(&format!("OFFSET {}", i64::MAX)));
    }

    #[test]
    fn field_names_outside_identifiers_are_rejected() {
        let query = Query::new().filter(Filter::eq("status') OR TRUE --", "x"));
        assert!(select_documents("reports", &query).is_err());

        let query = Query::new().order_by_asc("created At");
        assert!(select_documents("reports", &query).is_err());
    }
}
