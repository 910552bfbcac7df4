//! Trading wallet payloads. Amounts travel as decimal strings (`"12.50"`).

use serde::Deserialize;

use crate::domain::trading::TransferKind;
use crate::domain::types::{AccountName, Amount, EmailAddress, TradingAccountId};
use crate::forms::FormError;

/// Minimum length the platform accepts for a chosen password.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterPlatformForm {
    /// Login on the platform; the lead's email when omitted.
    pub login: Option<String>,
    /// Generated when omitted.
    pub password: Option<String>,
}

pub struct RegisterPlatformPayload {
    pub login: Option<EmailAddress>,
    pub password: Option<String>,
}

impl TryFrom<RegisterPlatformForm> for RegisterPlatformPayload {
    type Error = FormError;

    fn try_from(form: RegisterPlatformForm) -> Result<Self, Self::Error> {
        let login = form
            .login
            .filter(|login| !login.trim().is_empty())
            .map(|login| EmailAddress::new(login).map_err(|_| FormError::InvalidEmail))
            .transpose()?;

        let password = form.password.filter(|password| !password.is_empty());
        if password
            .as_ref()
            .is_some_and(|password| password.chars().count() < MIN_PASSWORD_LEN)
        {
            return Err(FormError::InvalidQuery(format!(
                "password must have at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        Ok(Self { login, password })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountForm {
    pub name: String,
}

impl TryFrom<CreateAccountForm> for AccountName {
    type Error = FormError;

    fn try_from(form: CreateAccountForm) -> Result<Self, Self::Error> {
        AccountName::new(form.name).map_err(|_| FormError::InvalidName)
    }
}

#[derive(Debug, Deserialize)]
pub struct AddFundsForm {
    pub amount: String,
}

impl TryFrom<AddFundsForm> for Amount {
    type Error = FormError;

    fn try_from(form: AddFundsForm) -> Result<Self, Self::Error> {
        form.amount.parse().map_err(|_| FormError::InvalidAmount)
    }
}

#[derive(Debug, Deserialize)]
pub struct TransferForm {
    pub kind: String,
    pub account_id: i32,
    pub amount: String,
}

pub struct TransferPayload {
    pub kind: TransferKind,
    pub account_id: TradingAccountId,
    pub amount: Amount,
}

impl TryFrom<TransferForm> for TransferPayload {
    type Error = FormError;

    fn try_from(form: TransferForm) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: form
                .kind
                .parse()
                .map_err(|_| FormError::InvalidTransferKind)?,
            account_id: TradingAccountId::new(form.account_id)
                .map_err(|_| FormError::InvalidAccountId)?,
            amount: form.amount.parse().map_err(|_| FormError::InvalidAmount)?,
        })
    }
}
