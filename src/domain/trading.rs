//! Trading wallet ledger: a main wallet per platform identity plus named
//! sub-accounts ("rooms").

use std::fmt::{Display, Formatter};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    AccountName, Amount, Balance, EmailAddress, PlatformUserId, TradingAccountId,
    TransactionId, TypeConstraintError,
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TradingProfile {
    pub id: PlatformUserId,
    pub email: EmailAddress,
    /// Main wallet.
    pub balance: Balance,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTradingProfile {
    pub id: PlatformUserId,
    pub email: EmailAddress,
    pub balance: Balance,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TradingAccount {
    pub id: TradingAccountId,
    pub profile_id: PlatformUserId,
    pub name: AccountName,
    pub balance: Balance,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTradingAccount {
    pub profile_id: PlatformUserId,
    pub name: AccountName,
}

macro_rules! str_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = TypeConstraintError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(TypeConstraintError::InvalidValue(other.to_string())),
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Direction of a ledger record relative to the main wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
}

str_enum!(TransactionKind {
    Deposit => "deposit",
    Withdraw => "withdraw",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Approved,
    Completed,
    Rejected,
    Pending,
}

str_enum!(TransactionStatus {
    Approved => "approved",
    Completed => "completed",
    Rejected => "rejected",
    Pending => "pending",
});

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerTransaction {
    pub id: TransactionId,
    pub profile_id: PlatformUserId,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub status: TransactionStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Injects funds into a sub-account; the main wallet is untouched.
    Deposit,
    MainToAccount,
    AccountToMain,
}

str_enum!(TransferKind {
    Deposit => "deposit",
    MainToAccount => "main_to_account",
    AccountToMain => "account_to_main",
});

impl TransferKind {
    /// New `(main, account)` balances after moving `amount`.
    pub fn apply(
        &self,
        main: Balance,
        account: Balance,
        amount: Amount,
    ) -> Result<(Balance, Balance), TypeConstraintError> {
        match self {
            TransferKind::Deposit => Ok((main, account.checked_credit(amount)?)),
            TransferKind::MainToAccount => {
                Ok((main.checked_debit(amount)?, account.checked_credit(amount)?))
            }
            TransferKind::AccountToMain => {
                Ok((main.checked_credit(amount)?, account.checked_debit(amount)?))
            }
        }
    }

    /// Ledger record kind written for this transfer.
    pub fn ledger_kind(&self) -> TransactionKind {
        match self {
            TransferKind::Deposit | TransferKind::AccountToMain => TransactionKind::Deposit,
            TransferKind::MainToAccount => TransactionKind::Withdraw,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub profile_id: PlatformUserId,
    pub account_id: TradingAccountId,
    pub kind: TransferKind,
    pub amount: Amount,
}

/// Balances after a committed transfer.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TransferOutcome {
    pub profile: TradingProfile,
    pub account: TradingAccount,
    pub transaction: LedgerTransaction,
}

/// Wallet summary of a registered lead.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TradingOverview {
    pub profile: TradingProfile,
    pub accounts: Vec<TradingAccount>,
    pub accounts_total: Balance,
    pub net_worth: Balance,
}

impl TradingOverview {
    pub fn new(profile: TradingProfile, accounts: Vec<TradingAccount>) -> Self {
        let accounts_total = accounts
            .iter()
            .map(|account| account.balance.cents())
            .sum::<i64>();
        let accounts_total = Balance::from_cents(accounts_total).unwrap_or_default();
        let net_worth = Balance::from_cents(profile.balance.cents() + accounts_total.cents())
            .unwrap_or_default();
        Self {
            profile,
            accounts,
            accounts_total,
            net_worth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(value: i64) -> Balance {
        Balance::from_cents(value).unwrap()
    }

    fn amount(value: i64) -> Amount {
        Amount::from_cents(value).unwrap()
    }

    #[test]
    fn deposit_leaves_main_wallet_untouched() {
        let (main, account) = TransferKind::Deposit
            .apply(cents(100), cents(0), amount(250))
            .unwrap();
        assert_eq!((main.cents(), account.cents()), (100, 250));
    }

    #[test]
    fn main_to_account_requires_main_funds() {
        let (main, account) = TransferKind::MainToAccount
            .apply(cents(1000), cents(5), amount(400))
            .unwrap();
        assert_eq!((main.cents(), account.cents()), (600, 405));

        assert_eq!(
            TransferKind::MainToAccount.apply(cents(100), cents(5_000), amount(101)),
            Err(TypeConstraintError::InsufficientFunds)
        );
    }

    #[test]
    fn account_to_main_requires_account_funds() {
        let (main, account) = TransferKind::AccountToMain
            .apply(cents(0), cents(300), amount(300))
            .unwrap();
        assert_eq!((main.cents(), account.cents()), (300, 0));

        assert_eq!(
            TransferKind::AccountToMain.apply(cents(9_999), cents(10), amount(11)),
            Err(TypeConstraintError::InsufficientFunds)
        );
    }

    #[test]
    fn kinds_parse_from_wire_names() {
        assert_eq!(
            "main_to_account".parse::<TransferKind>().unwrap(),
            TransferKind::MainToAccount
        );
        assert_eq!(
            "completed".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Completed
        );
        assert!("refund".parse::<TransactionKind>().is_err());
    }
}
