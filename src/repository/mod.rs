use chrono::{NaiveDateTime, Utc};

use crate::db::{DbConnection, DbPool, get_connection};
use crate::domain::chat::{DirectRoom, Message, MessageCursor, NewMessage, Room};
use crate::domain::lead::{KycStatus, Lead, LeadFilterValues, LeadScope, NewLead};
use crate::domain::lead_filter::LeadFilter;
use crate::domain::note::{NewNote, Note};
use crate::domain::notification::{NewNotification, Notification};
use crate::domain::status::{LeadStatus, NewLeadStatus};
use crate::domain::trading::{
    LedgerTransaction, NewTradingAccount, NewTradingProfile, TradingAccount, TradingProfile,
    Transfer, TransferOutcome,
};
use crate::domain::types::{
    Amount, EmailAddress, LeadId, MessageId, NoteId, NotificationId, PlatformUserId, RoomId,
    SourceFolder, StatusLabel, UserId,
};
use crate::domain::user::{CrmUser, NewCrmUser};
use crate::repository::errors::RepositoryResult;

pub mod chat;
pub mod errors;
pub mod lead;
#[cfg(feature = "test-mocks")]
pub mod mock;
pub mod note;
pub mod notification;
pub mod status;
pub mod trading;
pub mod user;

/// Diesel-backed implementation of every repository trait.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(get_connection(&self.pool)?)
    }
}

/// Lead list request already resolved against the caller's visibility.
#[derive(Debug, Clone)]
pub struct LeadListQuery {
    pub filter: LeadFilter,
    pub scope: LeadScope,
    /// Caller, used by the `mine` tab.
    pub viewer: UserId,
    /// Reference point for the date-range filter.
    pub now: NaiveDateTime,
}

impl LeadListQuery {
    pub fn new(filter: LeadFilter, scope: LeadScope, viewer: UserId) -> Self {
        Self {
            filter,
            scope,
            viewer,
            now: Utc::now().naive_utc(),
        }
    }
}

pub trait LeadReader {
    fn get_lead_by_id(&self, id: LeadId) -> RepositoryResult<Option<Lead>>;
    /// Returns the total number of matches and the requested page.
    fn list_leads(&self, query: &LeadListQuery) -> RepositoryResult<(usize, Vec<Lead>)>;
    fn list_leads_by_ids(&self, ids: &[LeadId]) -> RepositoryResult<Vec<Lead>>;
    fn lead_filter_values(&self, scope: &LeadScope) -> RepositoryResult<LeadFilterValues>;
    fn count_leads_by_status(&self, scope: &LeadScope) -> RepositoryResult<Vec<(String, usize)>>;
}

pub trait LeadWriter {
    fn create_leads(&self, new_leads: &[NewLead]) -> RepositoryResult<Vec<Lead>>;
    fn update_lead_status(
        &self,
        ids: &[LeadId],
        status: &StatusLabel,
    ) -> RepositoryResult<Vec<Lead>>;
    fn assign_leads(&self, ids: &[LeadId], agent: Option<UserId>) -> RepositoryResult<Vec<Lead>>;
    fn update_lead_kyc(&self, id: LeadId, kyc_status: KycStatus) -> RepositoryResult<Lead>;
    /// Deletes the leads and returns the rows as they were.
    fn delete_leads(&self, ids: &[LeadId]) -> RepositoryResult<Vec<Lead>>;
}

pub trait StatusReader {
    fn list_active_statuses(&self) -> RepositoryResult<Vec<LeadStatus>>;
    fn get_status_by_label(&self, label: &str) -> RepositoryResult<Option<LeadStatus>>;
}

pub trait StatusWriter {
    fn create_status(&self, new_status: &NewLeadStatus) -> RepositoryResult<LeadStatus>;
}

pub trait UserReader {
    fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<CrmUser>>;
    fn get_user_by_email(&self, email: &EmailAddress) -> RepositoryResult<Option<CrmUser>>;
    fn list_users(&self) -> RepositoryResult<Vec<CrmUser>>;
    fn list_users_by_ids(&self, ids: &[UserId]) -> RepositoryResult<Vec<CrmUser>>;
    /// Users with a lead-working role, ordered by name.
    fn list_agents(&self) -> RepositoryResult<Vec<CrmUser>>;
    fn list_team_agents(&self, leader_id: UserId) -> RepositoryResult<Vec<CrmUser>>;
}

pub trait UserWriter {
    fn create_user(&self, new_user: &NewCrmUser) -> RepositoryResult<CrmUser>;
    fn delete_user(&self, id: UserId) -> RepositoryResult<()>;
    fn set_team_leader(
        &self,
        agent_ids: &[UserId],
        leader_id: Option<UserId>,
    ) -> RepositoryResult<usize>;
    fn set_allowed_sources(
        &self,
        id: UserId,
        sources: &[SourceFolder],
    ) -> RepositoryResult<CrmUser>;
    fn mark_user_synced(&self, id: UserId) -> RepositoryResult<CrmUser>;
}

pub trait NoteReader {
    fn list_notes(&self, lead_id: LeadId) -> RepositoryResult<Vec<Note>>;
    fn get_note(&self, id: NoteId) -> RepositoryResult<Option<Note>>;
}

pub trait NoteWriter {
    fn create_note(&self, new_note: &NewNote) -> RepositoryResult<Note>;
    fn delete_note(&self, id: NoteId) -> RepositoryResult<Note>;
}

pub trait ChatReader {
    fn get_room(&self, id: RoomId) -> RepositoryResult<Option<Room>>;
    fn is_room_member(&self, room_id: RoomId, user_id: UserId) -> RepositoryResult<bool>;
    /// Newest `limit` messages strictly before `before`, oldest first.
    fn list_messages(
        &self,
        room_id: RoomId,
        before: Option<MessageCursor>,
        limit: usize,
    ) -> RepositoryResult<Vec<Message>>;
    fn get_message(&self, id: MessageId) -> RepositoryResult<Option<Message>>;
    fn list_direct_rooms(&self, user_id: UserId) -> RepositoryResult<Vec<DirectRoom>>;
}

pub trait ChatWriter {
    /// Returns the room shared by both users, creating it when missing.
    /// The flag tells whether a room was created.
    fn create_or_get_direct_room(
        &self,
        user_id: UserId,
        other_user_id: UserId,
    ) -> RepositoryResult<(Room, bool)>;
    fn create_message(&self, new_message: &NewMessage) -> RepositoryResult<Message>;
    fn mark_room_read(&self, room_id: RoomId, reader_id: UserId) -> RepositoryResult<usize>;
}

pub trait NotificationReader {
    fn list_notifications(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> RepositoryResult<Vec<Notification>>;
    fn count_unread_notifications(&self, user_id: UserId) -> RepositoryResult<usize>;
    fn get_notification(&self, id: NotificationId) -> RepositoryResult<Option<Notification>>;
}

pub trait NotificationWriter {
    fn create_notification(
        &self,
        new_notification: &NewNotification,
    ) -> RepositoryResult<Notification>;
    fn mark_notification_read(&self, id: NotificationId) -> RepositoryResult<Notification>;
    fn mark_all_notifications_read(&self, user_id: UserId) -> RepositoryResult<usize>;
    fn delete_notification(&self, id: NotificationId) -> RepositoryResult<Notification>;
}

pub trait TradingReader {
    fn get_trading_profile(&self, id: &PlatformUserId) -> RepositoryResult<Option<TradingProfile>>;
    /// Sub-accounts, oldest first.
    fn list_trading_accounts(&self, id: &PlatformUserId) -> RepositoryResult<Vec<TradingAccount>>;
    /// Ledger records, newest first.
    fn list_ledger_transactions(
        &self,
        id: &PlatformUserId,
    ) -> RepositoryResult<Vec<LedgerTransaction>>;
}

pub trait TradingWriter {
    /// Stores the platform identity on the lead and opens its main wallet.
    fn link_trading_profile(
        &self,
        lead_id: LeadId,
        profile: &NewTradingProfile,
    ) -> RepositoryResult<(Lead, TradingProfile)>;
    fn create_trading_account(
        &self,
        new_account: &NewTradingAccount,
    ) -> RepositoryResult<TradingAccount>;
    fn add_main_funds(
        &self,
        id: &PlatformUserId,
        amount: Amount,
    ) -> RepositoryResult<(TradingProfile, LedgerTransaction)>;
    /// Moves money in one transaction; nothing is written on failure.
    fn transfer(&self, transfer: &Transfer) -> RepositoryResult<TransferOutcome>;
}
