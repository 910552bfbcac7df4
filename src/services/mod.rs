//! Business workflows shared by the HTTP routes and the workers.
//!
//! Every service is a plain function generic over the repository traits it
//! needs, so tests can drive it with [`crate::repository::mock`].

use thiserror::Error;

use crate::domain::auth::{AuthenticatedUser, Feature, Role};
use crate::domain::types::UserId;
use crate::forms::FormError;
use crate::repository::errors::RepositoryError;

pub mod chat;
pub mod leads;
pub mod notes;
pub mod notifications;
pub mod session;
pub mod statuses;
pub mod team;
pub mod trading;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Form(String),

    #[error("invalid value: {0}")]
    TypeConstraint(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("upstream service failed: {0}")]
    Upstream(String),

    #[error("repository error: {0}")]
    Repository(RepositoryError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::InsufficientFunds => ServiceError::InsufficientFunds,
            RepositoryError::ConstraintViolation(message) => ServiceError::Conflict(message),
            RepositoryError::ValidationError(message) => ServiceError::TypeConstraint(message),
            other => ServiceError::Repository(other),
        }
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        ServiceError::Form(err.to_string())
    }
}

/// Fails with [`ServiceError::Unauthorized`] unless the caller has one of `roles`.
pub fn ensure_role(user: &AuthenticatedUser, roles: &[Role]) -> ServiceResult<()> {
    if user.has_role(roles) {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized)
    }
}

pub fn ensure_feature(user: &AuthenticatedUser, feature: Feature) -> ServiceResult<()> {
    if user.role.has_feature(feature) {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized)
    }
}

/// CRM id of the caller; a token with a malformed subject is not a session.
pub fn current_user_id(user: &AuthenticatedUser) -> ServiceResult<UserId> {
    user.user_id().map_err(|err| {
        log::error!("Session subject {} is not a user id: {err}", user.sub);
        ServiceError::Unauthorized
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use crate::domain::auth::{AuthenticatedUser, Role};
    use crate::domain::lead::{KycStatus, Lead};
    use crate::domain::status::LeadStatus;
    use crate::domain::types::{
        EmailAddress, HexColor, LeadId, PersonName, StatusId, StatusLabel, UserId,
    };
    use crate::domain::user::CrmUser;

    pub fn user_with_role(id: i32, role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: id.to_string(),
            email: format!("{role}{id}@example.com"),
            name: format!("{role} {id}"),
            role,
            exp: 0,
        }
    }

    pub fn crm_user(id: i32, role: Role) -> CrmUser {
        CrmUser {
            id: UserId::new(id).expect("valid user id"),
            email: EmailAddress::new(format!("user{id}@example.com")).expect("valid email"),
            real_name: PersonName::new(format!("User {id}")).expect("valid name"),
            role,
            team_leader_id: None,
            allowed_sources: Vec::new(),
            is_synced: false,
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn lead(id: i32, assigned_to: Option<i32>) -> Lead {
        let now = Utc::now().naive_utc();
        Lead {
            id: LeadId::new(id).expect("valid lead id"),
            name: PersonName::new(format!("Lead {id}")).expect("valid name"),
            surname: None,
            email: None,
            phone: None,
            country: None,
            status: StatusLabel::new("New").expect("valid label"),
            kyc_status: KycStatus::Pending,
            source_file: None,
            assigned_to: assigned_to.map(|id| UserId::new(id).expect("valid user id")),
            trading_account_id: None,
            note_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(id: i32, label: &str, is_active: bool) -> LeadStatus {
        LeadStatus {
            id: StatusId::new(id).expect("valid status id"),
            label: StatusLabel::new(label).expect("valid label"),
            hex_color: HexColor::new("#336699").expect("valid color"),
            order_index: id,
            is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::user_with_role;
    use super::*;

    #[test]
    fn repository_errors_map_onto_service_errors() {
        assert!(matches!(
            ServiceError::from(RepositoryError::NotFound),
            ServiceError::NotFound
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::InsufficientFunds),
            ServiceError::InsufficientFunds
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::ConstraintViolation("dup".into())),
            ServiceError::Conflict(message) if message == "dup"
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::DatabaseError("io".into())),
            ServiceError::Repository(_)
        ));
    }

    #[test]
    fn role_and_feature_checks() {
        let compliance = user_with_role(3, Role::Compliance);
        assert!(ensure_role(&compliance, &[Role::Admin, Role::Compliance]).is_ok());
        assert!(matches!(
            ensure_role(&compliance, &[Role::Admin]),
            Err(ServiceError::Unauthorized)
        ));
        assert!(ensure_feature(&compliance, Feature::Kyc).is_ok());
        assert!(ensure_feature(&compliance, Feature::Leads).is_err());
    }

    #[test]
    fn malformed_subject_is_unauthorized() {
        let mut user = user_with_role(1, Role::Admin);
        assert_eq!(current_user_id(&user).unwrap().get(), 1);
        user.sub = "not-a-number".to_string();
        assert!(matches!(
            current_user_id(&user),
            Err(ServiceError::Unauthorized)
        ));
    }
}
