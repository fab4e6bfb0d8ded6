use sea_orm::entity::prelude::*;

/// Department node in the organization tree.
///
/// `path` is the authoritative tree position: the slash-delimited chain of
/// ancestor ids ending in the node's own id. Subtree and ancestor lookups
/// run as prefix queries against it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub org_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    #[sea_orm(unique)]
    pub path: String,
    pub manager_id: Option<Uuid>,
    /// 0 = active, 1 = disabled.
    pub status: i16,
    pub is_root: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::department_users::Entity")]
    DepartmentUsers,
}

impl Related<super::department_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DepartmentUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
