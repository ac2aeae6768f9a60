use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{db::schema, model};

#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Identifiable,
    Queryable,
    Selectable,
    Associations,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = schema::account)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::role::Role, foreign_key = role_id))]
pub struct Account {
    pub id: uuid::Uuid,
    pub username: String,
    pub email: String,
    pub is_locked: bool,
    pub role_id: Option<uuid::Uuid>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::account)]
pub struct NewAccount<'a> {
    pub id: uuid::Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub is_locked: bool,
    pub role_id: Option<uuid::Uuid>,
}
