//! Team administration payloads.

use serde::Deserialize;
use validator::Validate;

use crate::domain::auth::Role;
use crate::domain::types::{EmailAddress, PersonName, SourceFolder, UserId};
use crate::domain::user::NewCrmUser;
use crate::forms::FormError;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserForm {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub real_name: String,
    pub role: String,
}

impl TryFrom<CreateUserForm> for NewCrmUser {
    type Error = FormError;

    fn try_from(form: CreateUserForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(NewCrmUser {
            email: EmailAddress::new(form.email).map_err(|_| FormError::InvalidEmail)?,
            real_name: PersonName::new(form.real_name).map_err(|_| FormError::InvalidName)?,
            // Unlike session tokens, an unknown role here is a typo, not a default.
            role: form.role.parse::<Role>().map_err(|_| FormError::InvalidRole)?,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct TeamAgentsForm {
    #[validate(length(min = 1))]
    pub agent_ids: Vec<i32>,
}

impl TryFrom<TeamAgentsForm> for Vec<UserId> {
    type Error = FormError;

    fn try_from(form: TeamAgentsForm) -> Result<Self, Self::Error> {
        form.validate()?;
        let mut ids = form
            .agent_ids
            .into_iter()
            .map(|id| UserId::new(id).map_err(|_| FormError::InvalidUserId))
            .collect::<Result<Vec<_>, _>>()?;
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}

#[derive(Debug, Deserialize)]
pub struct GrantSourcesForm {
    #[serde(default)]
    pub folders: Vec<String>,
}

impl From<GrantSourcesForm> for Vec<SourceFolder> {
    fn from(form: GrantSourcesForm) -> Self {
        let mut folders = form
            .folders
            .into_iter()
            .filter_map(|folder| SourceFolder::new(folder).ok())
            .collect::<Vec<_>>();
        folders.sort_unstable();
        folders.dedup();
        folders
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_rejects_unknown_roles() {
        let form = CreateUserForm {
            email: "Agent@Example.com".to_string(),
            real_name: "Agent".to_string(),
            role: "superuser".to_string(),
        };
        assert!(matches!(
            NewCrmUser::try_from(form),
            Err(FormError::InvalidRole)
        ));

        let form = CreateUserForm {
            email: "Agent@Example.com".to_string(),
            real_name: " Agent ".to_string(),
            role: "retention".to_string(),
        };
        let user = NewCrmUser::try_from(form).unwrap();
        assert_eq!(user.email.as_str(), "agent@example.com");
        assert_eq!(user.role, Role::Retention);
    }

    #[test]
    fn granted_folders_are_sorted_and_unique() {
        let folders: Vec<SourceFolder> = GrantSourcesForm {
            folders: vec!["b.csv".into(), " ".into(), "a.csv".into(), "b.csv".into()],
        }
        .into();
        let names: Vec<&str> = folders.iter().map(SourceFolder::as_str).collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
    }
}
