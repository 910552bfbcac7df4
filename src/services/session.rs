use crate::domain::auth::AuthenticatedUser;
use crate::dto::session::SessionInfo;
use crate::services::{ServiceResult, current_user_id};

/// Describes the signed-in user and the navigation their role unlocks.
pub fn session_info(user: &AuthenticatedUser) -> ServiceResult<SessionInfo> {
    Ok(SessionInfo {
        user_id: current_user_id(user)?,
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        features: user.role.features(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::{Feature, Role};
    use crate::services::test_support::user_with_role;

    #[test]
    fn compliance_session_lists_kyc_navigation() {
        let info = session_info(&user_with_role(4, Role::Compliance)).unwrap();

        assert_eq!(info.user_id.get(), 4);
        assert!(info.features.contains(&Feature::Kyc));
        assert!(!info.features.contains(&Feature::Leads));
    }
}
