use sea_orm::entity::prelude::*;

/// Contactor list: a named set of users used as a distribution target.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "contactors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::contactor_members::Entity")]
    ContactorMembers,
}

impl Related<super::contactor_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContactorMembers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
