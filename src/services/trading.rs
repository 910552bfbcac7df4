//! Trading platform registration and the wallet ledger of registered leads.

use crate::changes::{ChangePublisher, broadcast};
use crate::domain::auth::{AuthenticatedUser, Feature};
use crate::domain::change::{ChangeEvent, RowChange};
use crate::domain::trading::{
    LedgerTransaction, NewTradingAccount, NewTradingProfile, TradingAccount, TradingOverview,
    Transfer, TransferOutcome,
};
use crate::domain::types::{AccountName, Amount, Balance, LeadId, PlatformUserId};
use crate::dto::trading::{FundsAdded, PlatformRegistration};
use crate::forms::trading::{RegisterPlatformPayload, TransferPayload};
use crate::platform::{PlatformIdentityProvider, PlatformSignup, generate_password};
use crate::repository::{LeadReader, TradingReader, TradingWriter, UserReader};
use crate::services::leads::get_lead;
use crate::services::{ServiceError, ServiceResult, ensure_feature};

/// Platform identity of a visible lead; unregistered leads have no wallet.
fn platform_identity<R>(
    repo: &R,
    user: &AuthenticatedUser,
    lead_id: LeadId,
) -> ServiceResult<PlatformUserId>
where
    R: LeadReader + UserReader + ?Sized,
{
    ensure_feature(user, Feature::Trading)?;
    get_lead(repo, user, lead_id)?
        .trading_account_id
        .ok_or(ServiceError::NotFound)
}

/// Creates the lead's identity on the trading platform and opens its main
/// wallet with `initial_balance`.
///
/// A generated password is returned once and never stored.
pub async fn register_platform_account<R, P>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    platform: &P,
    initial_balance: Balance,
    user: &AuthenticatedUser,
    lead_id: LeadId,
    payload: RegisterPlatformPayload,
) -> ServiceResult<PlatformRegistration>
where
    R: LeadReader + UserReader + TradingWriter + ?Sized,
    P: PlatformIdentityProvider + ?Sized,
{
    ensure_feature(user, Feature::Trading)?;
    let lead = get_lead(repo, user, lead_id)?;

    if lead.trading_account_id.is_some() {
        return Err(ServiceError::Conflict(format!(
            "lead {lead_id} already has a trading account"
        )));
    }

    let email = payload
        .login
        .or_else(|| lead.email.clone())
        .ok_or_else(|| ServiceError::Form("a login email is required".to_string()))?;
    let (password, generated_password) = match payload.password {
        Some(password) => (password, None),
        None => {
            let password = generate_password();
            (password.clone(), Some(password))
        }
    };

    let signup = PlatformSignup {
        email: email.clone(),
        password,
        full_name: lead.display_name(),
    };
    let platform_user_id = platform.sign_up(&signup).await.map_err(|err| {
        log::error!("Platform signup for lead {lead_id} failed: {err}");
        ServiceError::Upstream(err.to_string())
    })?;

    let (lead, profile) = repo
        .link_trading_profile(
            lead_id,
            &NewTradingProfile {
                id: platform_user_id,
                email,
                balance: initial_balance,
            },
        )
        .map_err(|err| {
            log::error!("Failed to link trading profile to lead {lead_id}: {err}");
            err
        })?;
    log::info!("Registered lead {lead_id} on the platform as {}", profile.id);

    broadcast(publisher, ChangeEvent::Leads(RowChange::Updated(lead.clone())));
    broadcast(
        publisher,
        ChangeEvent::TradingProfiles(RowChange::Inserted(profile.clone())),
    );

    Ok(PlatformRegistration {
        lead,
        profile,
        generated_password,
    })
}

pub fn trading_overview<R>(
    repo: &R,
    user: &AuthenticatedUser,
    lead_id: LeadId,
) -> ServiceResult<TradingOverview>
where
    R: LeadReader + UserReader + TradingReader + ?Sized,
{
    let identity = platform_identity(repo, user, lead_id)?;
    let profile = repo
        .get_trading_profile(&identity)?
        .ok_or(ServiceError::NotFound)?;
    let accounts = repo.list_trading_accounts(&identity)?;

    Ok(TradingOverview::new(profile, accounts))
}

pub fn create_trading_account<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    lead_id: LeadId,
    name: AccountName,
) -> ServiceResult<TradingAccount>
where
    R: LeadReader + UserReader + TradingWriter + ?Sized,
{
    let identity = platform_identity(repo, user, lead_id)?;

    let account = repo
        .create_trading_account(&NewTradingAccount {
            profile_id: identity,
            name,
        })
        .map_err(|err| {
            log::error!("Failed to open trading account for lead {lead_id}: {err}");
            err
        })?;
    broadcast(
        publisher,
        ChangeEvent::TradingAccounts(RowChange::Inserted(account.clone())),
    );

    Ok(account)
}

/// Credits the main wallet and records an approved deposit.
pub fn add_main_funds<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    lead_id: LeadId,
    amount: Amount,
) -> ServiceResult<FundsAdded>
where
    R: LeadReader + UserReader + TradingWriter + ?Sized,
{
    let identity = platform_identity(repo, user, lead_id)?;

    let (profile, transaction) = repo.add_main_funds(&identity, amount).map_err(|err| {
        log::error!("Failed to add {amount} to main wallet of {identity}: {err}");
        err
    })?;
    broadcast(
        publisher,
        ChangeEvent::TradingProfiles(RowChange::Updated(profile.clone())),
    );

    Ok(FundsAdded {
        profile,
        transaction,
    })
}

/// Moves money between the main wallet and a sub-account.
///
/// Runs as one database transaction; an insufficient balance leaves both
/// wallets and the ledger untouched.
pub fn transfer<R>(
    repo: &R,
    publisher: &dyn ChangePublisher,
    user: &AuthenticatedUser,
    lead_id: LeadId,
    payload: TransferPayload,
) -> ServiceResult<TransferOutcome>
where
    R: LeadReader + UserReader + TradingWriter + ?Sized,
{
    let identity = platform_identity(repo, user, lead_id)?;

    let outcome = repo
        .transfer(&Transfer {
            profile_id: identity,
            account_id: payload.account_id,
            kind: payload.kind,
            amount: payload.amount,
        })
        .map_err(|err| {
            log::error!(
                "Transfer {} of {} for lead {lead_id} failed: {err}",
                payload.kind,
                payload.amount
            );
            err
        })?;

    broadcast(
        publisher,
        ChangeEvent::TradingProfiles(RowChange::Updated(outcome.profile.clone())),
    );
    broadcast(
        publisher,
        ChangeEvent::TradingAccounts(RowChange::Updated(outcome.account.clone())),
    );

    Ok(outcome)
}

/// Ledger records of a lead, newest first.
pub fn list_transactions<R>(
    repo: &R,
    user: &AuthenticatedUser,
    lead_id: LeadId,
) -> ServiceResult<Vec<LedgerTransaction>>
where
    R: LeadReader + UserReader + TradingReader + ?Sized,
{
    let identity = platform_identity(repo, user, lead_id)?;
    Ok(repo.list_ledger_transactions(&identity)?)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;
    use crate::changes::MemoryChangePublisher;
    use crate::domain::auth::Role;
    use crate::domain::trading::{TradingProfile, TransferKind};
    use crate::domain::types::{EmailAddress, TradingAccountId};
    use crate::platform::PlatformError;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{lead, user_with_role};

    struct FakePlatform {
        signups: Mutex<Vec<PlatformSignup>>,
        reject: bool,
    }

    impl FakePlatform {
        fn new(reject: bool) -> Self {
            Self {
                signups: Mutex::new(Vec::new()),
                reject,
            }
        }
    }

    impl PlatformIdentityProvider for FakePlatform {
        async fn sign_up(&self, signup: &PlatformSignup) -> Result<PlatformUserId, PlatformError> {
            self.signups.lock().unwrap().push(signup.clone());
            if self.reject {
                return Err(PlatformError::Rejected {
                    status: 422,
                    message: "already registered".to_string(),
                });
            }
            Ok(PlatformUserId::new("pu-1").unwrap())
        }
    }

    fn profile(cents: i64) -> TradingProfile {
        TradingProfile {
            id: PlatformUserId::new("pu-1").unwrap(),
            email: EmailAddress::new("lead@example.com").unwrap(),
            balance: Balance::from_cents(cents).unwrap(),
            created_at: Utc::now().naive_utc(),
        }
    }

    fn registered_lead(id: i32) -> crate::domain::lead::Lead {
        let mut registered = lead(id, Some(7));
        registered.trading_account_id = Some(PlatformUserId::new("pu-1").unwrap());
        registered
    }

    #[actix_web::test]
    async fn registration_generates_a_password_once() {
        let mut repo = MockRepository::new();
        repo.expect_list_leads_by_ids().returning(|_| {
            let mut unregistered = lead(1, Some(7));
            unregistered.email = Some(EmailAddress::new("lead@example.com").unwrap());
            Ok(vec![unregistered])
        });
        repo.expect_link_trading_profile()
            .withf(|_, new_profile| new_profile.balance.cents() == 1_000_000)
            .times(1)
            .returning(|lead_id, _| Ok((registered_lead(lead_id.get()), profile(1_000_000))));
        let platform = FakePlatform::new(false);
        let publisher = MemoryChangePublisher::new();

        let registration = register_platform_account(
            &repo,
            &publisher,
            &platform,
            Balance::from_cents(1_000_000).unwrap(),
            &user_with_role(7, Role::Conversion),
            LeadId::new(1).unwrap(),
            RegisterPlatformPayload {
                login: None,
                password: None,
            },
        )
        .await
        .unwrap();

        let signups = platform.signups.lock().unwrap();
        assert_eq!(signups[0].email.as_str(), "lead@example.com");
        assert_eq!(
            registration.generated_password.as_deref(),
            Some(signups[0].password.as_str())
        );
        assert_eq!(
            publisher.topics(),
            vec!["leads".to_string(), "trading:pu-1".to_string()]
        );
    }

    #[actix_web::test]
    async fn registered_leads_cannot_register_again() {
        let mut repo = MockRepository::new();
        repo.expect_list_leads_by_ids()
            .returning(|_| Ok(vec![registered_lead(1)]));
        let platform = FakePlatform::new(false);

        let result = register_platform_account(
            &repo,
            &MemoryChangePublisher::new(),
            &platform,
            Balance::ZERO,
            &user_with_role(1, Role::Admin),
            LeadId::new(1).unwrap(),
            RegisterPlatformPayload {
                login: None,
                password: Some("hunter22".to_string()),
            },
        )
        .await;

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
        assert!(platform.signups.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn platform_rejection_is_upstream_failure() {
        let mut repo = MockRepository::new();
        repo.expect_list_leads_by_ids()
            .returning(|_| Ok(vec![lead(1, None)]));
        repo.expect_link_trading_profile().times(0);

        let result = register_platform_account(
            &repo,
            &MemoryChangePublisher::new(),
            &FakePlatform::new(true),
            Balance::ZERO,
            &user_with_role(1, Role::Admin),
            LeadId::new(1).unwrap(),
            RegisterPlatformPayload {
                login: Some(EmailAddress::new("login@example.com").unwrap()),
                password: Some("hunter22".to_string()),
            },
        )
        .await;

        assert!(matches!(result, Err(ServiceError::Upstream(_))));
    }

    #[test]
    fn unregistered_leads_have_no_wallet() {
        let mut repo = MockRepository::new();
        repo.expect_list_leads_by_ids()
            .returning(|_| Ok(vec![lead(1, None)]));
        repo.expect_get_trading_profile().times(0);

        let result = trading_overview(
            &repo,
            &user_with_role(1, Role::Admin),
            LeadId::new(1).unwrap(),
        );

        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[test]
    fn insufficient_funds_publish_nothing() {
        let mut repo = MockRepository::new();
        repo.expect_list_leads_by_ids()
            .returning(|_| Ok(vec![registered_lead(1)]));
        repo.expect_transfer()
            .returning(|_| Err(RepositoryError::InsufficientFunds));
        let publisher = MemoryChangePublisher::new();

        let result = transfer(
            &repo,
            &publisher,
            &user_with_role(1, Role::Admin),
            LeadId::new(1).unwrap(),
            TransferPayload {
                kind: TransferKind::MainToAccount,
                account_id: TradingAccountId::new(3).unwrap(),
                amount: Amount::from_cents(500).unwrap(),
            },
        );

        assert!(matches!(result, Err(ServiceError::InsufficientFunds)));
        assert!(publisher.events().is_empty());
    }

    #[test]
    fn compliance_has_no_trading_access() {
        let repo = MockRepository::new();

        let result = list_transactions(
            &repo,
            &user_with_role(5, Role::Compliance),
            LeadId::new(1).unwrap(),
        );

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }
}
