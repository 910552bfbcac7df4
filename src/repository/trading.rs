use chrono::Utc;
use diesel::prelude::*;

use crate::domain::lead::Lead;
use crate::domain::trading::{
    LedgerTransaction, NewTradingAccount, NewTradingProfile, TradingAccount, TradingProfile,
    TransactionKind, TransactionStatus, Transfer, TransferOutcome,
};
use crate::domain::types::{Amount, Balance, LeadId, PlatformUserId};
use crate::models::lead::Lead as DbLead;
use crate::models::trading::{
    LedgerTransaction as DbLedgerTransaction, NewLedgerTransaction,
    NewTradingAccount as DbNewTradingAccount, NewTradingProfile as DbNewTradingProfile,
    TradingAccount as DbTradingAccount, TradingProfile as DbTradingProfile,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, TradingReader, TradingWriter};
use crate::schema::{leads, ledger_transactions, trading_accounts, trading_profiles};

fn record_transaction(
    conn: &mut SqliteConnection,
    profile_id: &PlatformUserId,
    kind: TransactionKind,
    amount: Amount,
    status: TransactionStatus,
) -> RepositoryResult<LedgerTransaction> {
    let row = diesel::insert_into(ledger_transactions::table)
        .values(&NewLedgerTransaction {
            profile_id: profile_id.as_str(),
            kind: kind.as_str(),
            amount: amount.cents(),
            status: status.as_str(),
            created_at: Utc::now().naive_utc(),
        })
        .get_result::<DbLedgerTransaction>(conn)?;

    Ok(LedgerTransaction::try_from(row)?)
}

fn set_profile_balance(
    conn: &mut SqliteConnection,
    profile_id: &PlatformUserId,
    balance: Balance,
) -> RepositoryResult<TradingProfile> {
    let row = diesel::update(trading_profiles::table.find(profile_id.as_str()))
        .set(trading_profiles::balance.eq(balance.cents()))
        .get_result::<DbTradingProfile>(conn)?;

    Ok(TradingProfile::try_from(row)?)
}

impl TradingReader for DieselRepository {
    fn get_trading_profile(&self, id: &PlatformUserId) -> RepositoryResult<Option<TradingProfile>> {
        let mut conn = self.conn()?;

        let profile = trading_profiles::table
            .find(id.as_str())
            .first::<DbTradingProfile>(&mut conn)
            .optional()?;

        Ok(profile.map(TradingProfile::try_from).transpose()?)
    }

    fn list_trading_accounts(&self, id: &PlatformUserId) -> RepositoryResult<Vec<TradingAccount>> {
        let mut conn = self.conn()?;

        let accounts = trading_accounts::table
            .filter(trading_accounts::profile_id.eq(id.as_str()))
            .order((trading_accounts::created_at.asc(), trading_accounts::id.asc()))
            .load::<DbTradingAccount>(&mut conn)?
            .into_iter()
            .map(TradingAccount::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    fn list_ledger_transactions(
        &self,
        id: &PlatformUserId,
    ) -> RepositoryResult<Vec<LedgerTransaction>> {
        let mut conn = self.conn()?;

        let transactions = ledger_transactions::table
            .filter(ledger_transactions::profile_id.eq(id.as_str()))
            .order((
                ledger_transactions::created_at.desc(),
                ledger_transactions::id.desc(),
            ))
            .load::<DbLedgerTransaction>(&mut conn)?
            .into_iter()
            .map(LedgerTransaction::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(transactions)
    }
}

impl TradingWriter for DieselRepository {
    fn link_trading_profile(
        &self,
        lead_id: LeadId,
        profile: &NewTradingProfile,
    ) -> RepositoryResult<(Lead, TradingProfile)> {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<_, RepositoryError, _>(|conn| {
            let linked = diesel::update(
                leads::table
                    .find(lead_id.get())
                    .filter(leads::trading_account_id.is_null()),
            )
            .set((
                leads::trading_account_id.eq(profile.id.as_str()),
                leads::updated_at.eq(Utc::now().naive_utc()),
            ))
            .get_result::<DbLead>(conn)
            .optional()?
            .ok_or_else(|| {
                RepositoryError::ConstraintViolation(
                    "lead is missing or already has a trading account".to_string(),
                )
            })?;

            let insertable: DbNewTradingProfile = profile.into();
            let created = diesel::insert_into(trading_profiles::table)
                .values(&insertable)
                .get_result::<DbTradingProfile>(conn)?;

            Ok((Lead::try_from(linked)?, TradingProfile::try_from(created)?))
        })
    }

    fn create_trading_account(
        &self,
        new_account: &NewTradingAccount,
    ) -> RepositoryResult<TradingAccount> {
        let mut conn = self.conn()?;

        let insertable: DbNewTradingAccount = new_account.into();
        let account = diesel::insert_into(trading_accounts::table)
            .values(&insertable)
            .get_result::<DbTradingAccount>(&mut conn)?;

        Ok(TradingAccount::try_from(account)?)
    }

    fn add_main_funds(
        &self,
        id: &PlatformUserId,
        amount: Amount,
    ) -> RepositoryResult<(TradingProfile, LedgerTransaction)> {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<_, RepositoryError, _>(|conn| {
            let profile = trading_profiles::table
                .find(id.as_str())
                .first::<DbTradingProfile>(conn)?;
            let profile = TradingProfile::try_from(profile)?;

            let balance = profile.balance.checked_credit(amount)?;
            let profile = set_profile_balance(conn, id, balance)?;
            let transaction = record_transaction(
                conn,
                id,
                TransactionKind::Deposit,
                amount,
                TransactionStatus::Approved,
            )?;

            Ok((profile, transaction))
        })
    }

    fn transfer(&self, transfer: &Transfer) -> RepositoryResult<TransferOutcome> {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<_, RepositoryError, _>(|conn| {
            let profile = trading_profiles::table
                .find(transfer.profile_id.as_str())
                .first::<DbTradingProfile>(conn)?;
            let profile = TradingProfile::try_from(profile)?;

            let account = trading_accounts::table
                .find(transfer.account_id.get())
                .filter(trading_accounts::profile_id.eq(transfer.profile_id.as_str()))
                .first::<DbTradingAccount>(conn)?;
            let account = TradingAccount::try_from(account)?;

            let (main_balance, account_balance) =
                transfer
                    .kind
                    .apply(profile.balance, account.balance, transfer.amount)?;

            let profile = if main_balance != profile.balance {
                set_profile_balance(conn, &transfer.profile_id, main_balance)?
            } else {
                profile
            };

            let account = diesel::update(trading_accounts::table.find(transfer.account_id.get()))
                .set(trading_accounts::balance.eq(account_balance.cents()))
                .get_result::<DbTradingAccount>(conn)?;
            let account = TradingAccount::try_from(account)?;

            let transaction = record_transaction(
                conn,
                &transfer.profile_id,
                transfer.kind.ledger_kind(),
                transfer.amount,
                TransactionStatus::Completed,
            )?;

            Ok(TransferOutcome {
                profile,
                account,
                transaction,
            })
        })
    }
}
