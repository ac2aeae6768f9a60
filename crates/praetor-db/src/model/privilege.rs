use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

use crate::db::schema;

/// A grantable (area, controller, action) triple.
///
/// The triple is the natural key; `id` only links the row to roles.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = schema::privilege)]
#[diesel(check_for_backend(Pg))]
pub struct Privilege {
    pub id: uuid::Uuid,
    pub area: Option<String>,
    pub controller: String,
    pub action: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::privilege)]
pub struct NewPrivilege<'a> {
    pub id: uuid::Uuid,
    pub area: Option<&'a str>,
    pub controller: &'a str,
    pub action: &'a str,
}
