use sea_orm::entity::prelude::*;

/// Membership relation between a user and a contactor list.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "contactor_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub contactor_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contactors::Entity",
        from = "Column::ContactorId",
        to = "super::contactors::Column::Id"
    )]
    Contactor,
}

impl Related<super::contactors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contactor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
