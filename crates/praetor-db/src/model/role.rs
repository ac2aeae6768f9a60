use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{db::schema, model};

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = schema::role)]
#[diesel(check_for_backend(Pg))]
pub struct Role {
    pub id: uuid::Uuid,
    pub title: String,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::role)]
pub struct NewRole<'a> {
    pub id: uuid::Uuid,
    pub title: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = schema::role_privilege)]
#[diesel(check_for_backend(Pg))]
#[diesel(primary_key(role_id, privilege_id))]
#[diesel(belongs_to(Role, foreign_key = role_id))]
#[diesel(belongs_to(model::privilege::Privilege, foreign_key = privilege_id))]
pub struct RolePrivilege {
    pub role_id: uuid::Uuid,
    pub privilege_id: uuid::Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Insertable)]
#[diesel(table_name = schema::role_privilege)]
pub struct NewRolePrivilege {
    pub role_id: uuid::Uuid,
    pub privilege_id: uuid::Uuid,
}

/// A role together with every privilege granted through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleWithPrivileges {
    #[serde(flatten)]
    pub role: Role,
    pub privileges: Vec<model::privilege::Privilege>,
}
