use serde::Serialize;

use crate::domain::lead::Lead;
use crate::domain::trading::{LedgerTransaction, TradingProfile};

/// Result of provisioning a platform identity for a lead.
#[derive(Debug, Serialize)]
pub struct PlatformRegistration {
    pub lead: Lead,
    pub profile: TradingProfile,
    /// Only set when the password was generated; it is not stored anywhere.
    pub generated_password: Option<String>,
}

/// Main wallet after a deposit, with the ledger record it produced.
#[derive(Debug, Serialize)]
pub struct FundsAdded {
    pub profile: TradingProfile,
    pub transaction: LedgerTransaction,
}
