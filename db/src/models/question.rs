use sea_orm::entity::prelude::*;
use serde::Serialize;

/// One question of a test.
///
/// `order_index` defines both presentation order and answer addressing:
/// answers are keyed by a question's position in the ordered sequence, not
/// by its ID.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the test this question belongs to.
    pub test_id: i64,
    /// Question text.
    pub text: String,
    /// Position within the test's question sequence.
    pub order_index: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::test::Entity",
        from = "Column::TestId",
        to = "super::test::Column::Id"
    )]
    Test,

    #[sea_orm(has_many = "super::variant::Entity")]
    Variant,
}

impl Related<super::test::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Test.def()
    }
}

impl Related<super::variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
