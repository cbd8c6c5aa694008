use sea_orm::entity::prelude::*;

/// Conversation memory for one scope, stored as a JSON array of entries.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "memory_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub scope: String,
    #[sea_orm(column_type = "Text")]
    pub entries: String,
    /// Compare-and-swap guard, bumped on every write.
    pub revision: i64,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
