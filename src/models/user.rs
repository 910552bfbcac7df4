//! Diesel models representing CRM users.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::auth::Role;
use crate::domain::types::{EmailAddress, PersonName, TypeConstraintError, UserId};
use crate::domain::user::{CrmUser as DomainCrmUser, NewCrmUser as DomainNewCrmUser, decode_sources};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::crm_users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
/// Diesel model for [`crate::domain::user::CrmUser`].
pub struct CrmUser {
    pub id: i32,
    pub email: String,
    pub real_name: String,
    pub role: String,
    pub team_leader_id: Option<i32>,
    pub allowed_sources: String,
    pub is_synced: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::crm_users)]
/// Insertable form of [`CrmUser`].
pub struct NewCrmUser<'a> {
    pub email: &'a str,
    pub real_name: &'a str,
    pub role: &'a str,
}

impl TryFrom<CrmUser> for DomainCrmUser {
    type Error = TypeConstraintError;

    fn try_from(user: CrmUser) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::try_from(user.id)?,
            email: EmailAddress::new(user.email)?,
            real_name: PersonName::new(user.real_name)?,
            role: user.role.parse::<Role>()?,
            team_leader_id: user.team_leader_id.map(UserId::try_from).transpose()?,
            allowed_sources: decode_sources(&user.allowed_sources)?,
            is_synced: user.is_synced,
            created_at: user.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewCrmUser> for NewCrmUser<'a> {
    fn from(user: &'a DomainNewCrmUser) -> Self {
        Self {
            email: user.email.as_str(),
            real_name: user.real_name.as_str(),
            role: user.role.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn from_db_user_into_domain() {
        let db = CrmUser {
            id: 4,
            email: "Lead@Example.com".into(),
            real_name: "Lena".into(),
            role: "team_leader".into(),
            team_leader_id: None,
            allowed_sources: r#"["a.csv","b, c.csv"]"#.into(),
            is_synced: false,
            created_at: Utc::now().naive_utc(),
        };
        let user = DomainCrmUser::try_from(db).expect("valid user");
        assert_eq!(user.id.get(), 4);
        assert_eq!(user.email.as_str(), "lead@example.com");
        assert_eq!(user.role, Role::TeamLeader);
        assert_eq!(user.allowed_sources.len(), 2);
        assert_eq!(user.allowed_sources[1].as_str(), "b, c.csv");
    }

    #[test]
    fn unknown_role_in_database_is_rejected() {
        let db = CrmUser {
            id: 1,
            email: "a@b.cd".into(),
            real_name: "A".into(),
            role: "root".into(),
            team_leader_id: None,
            allowed_sources: String::new(),
            is_synced: false,
            created_at: Utc::now().naive_utc(),
        };
        assert!(DomainCrmUser::try_from(db).is_err());
    }
}
