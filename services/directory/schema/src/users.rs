use sea_orm::entity::prelude::*;

/// Directory user account.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// Personal space quota in bytes; summed per manager for derived quotas.
    pub space_quota: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::department_users::Entity")]
    DepartmentUsers,
    #[sea_orm(has_many = "super::user_organizations::Entity")]
    UserOrganizations,
}

impl Related<super::department_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DepartmentUsers.def()
    }
}

impl Related<super::user_organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserOrganizations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
