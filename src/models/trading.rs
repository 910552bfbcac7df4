//! Diesel models for wallets, sub-accounts and ledger records.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::trading::{
    LedgerTransaction as DomainLedgerTransaction, NewTradingAccount as DomainNewTradingAccount,
    NewTradingProfile as DomainNewTradingProfile, TradingAccount as DomainTradingAccount,
    TradingProfile as DomainTradingProfile, TransactionKind, TransactionStatus,
};
use crate::domain::types::{
    AccountName, Amount, Balance, EmailAddress, PlatformUserId, TradingAccountId, TransactionId,
    TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::trading_profiles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TradingProfile {
    pub id: String,
    pub email: String,
    pub balance: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::trading_profiles)]
pub struct NewTradingProfile<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub balance: i64,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::trading_accounts)]
#[diesel(belongs_to(TradingProfile, foreign_key = profile_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TradingAccount {
    pub id: i32,
    pub profile_id: String,
    pub name: String,
    pub balance: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::trading_accounts)]
pub struct NewTradingAccount<'a> {
    pub profile_id: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::ledger_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LedgerTransaction {
    pub id: i32,
    pub profile_id: String,
    pub kind: String,
    pub amount: i64,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::ledger_transactions)]
pub struct NewLedgerTransaction<'a> {
    pub profile_id: &'a str,
    pub kind: &'static str,
    pub amount: i64,
    pub status: &'static str,
    pub created_at: NaiveDateTime,
}

impl TryFrom<TradingProfile> for DomainTradingProfile {
    type Error = TypeConstraintError;

    fn try_from(profile: TradingProfile) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PlatformUserId::new(profile.id)?,
            email: EmailAddress::new(profile.email)?,
            balance: Balance::from_cents(profile.balance)?,
            created_at: profile.created_at,
        })
    }
}

impl TryFrom<TradingAccount> for DomainTradingAccount {
    type Error = TypeConstraintError;

    fn try_from(account: TradingAccount) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TradingAccountId::try_from(account.id)?,
            profile_id: PlatformUserId::new(account.profile_id)?,
            name: AccountName::new(account.name)?,
            balance: Balance::from_cents(account.balance)?,
            created_at: account.created_at,
        })
    }
}

impl TryFrom<LedgerTransaction> for DomainLedgerTransaction {
    type Error = TypeConstraintError;

    fn try_from(transaction: LedgerTransaction) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TransactionId::try_from(transaction.id)?,
            profile_id: PlatformUserId::new(transaction.profile_id)?,
            kind: transaction.kind.parse::<TransactionKind>()?,
            amount: Amount::from_cents(transaction.amount)?,
            status: transaction.status.parse::<TransactionStatus>()?,
            created_at: transaction.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewTradingProfile> for NewTradingProfile<'a> {
    fn from(profile: &'a DomainNewTradingProfile) -> Self {
        Self {
            id: profile.id.as_str(),
            email: profile.email.as_str(),
            balance: profile.balance.cents(),
        }
    }
}

impl<'a> From<&'a DomainNewTradingAccount> for NewTradingAccount<'a> {
    fn from(account: &'a DomainNewTradingAccount) -> Self {
        Self {
            profile_id: account.profile_id.as_str(),
            name: account.name.as_str(),
        }
    }
}
