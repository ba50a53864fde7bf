use sea_orm::entity::prelude::*;
use serde::Serialize;

/// One candidate answer for a question, carrying a correctness flag.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "variants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the question this variant answers.
    pub question_id: i64,
    /// Variant text.
    pub text: String,
    /// Whether choosing this variant is the correct answer.
    pub is_correct: bool,
    /// Position within the question's variant sequence.
    pub order_index: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::question::Entity",
        from = "Column::QuestionId",
        to = "super::question::Column::Id"
    )]
    Question,
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
