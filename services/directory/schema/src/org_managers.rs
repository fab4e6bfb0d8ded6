use sea_orm::entity::prelude::*;

/// Org-manager assignment: `manager_id` manages `department_id` within
/// `org_id`. A manager may hold several assignments.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "org_managers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub manager_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub department_id: Uuid,
    pub org_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
