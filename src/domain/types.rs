//! Strongly-typed value objects used by domain entities.
//!
//! These wrappers enforce basic invariants (e.g., positive identifiers,
//! normalized/validated email, non-negative balances) so that once a value
//! reaches the domain layer it can be treated as trusted.
use std::{ops::Deref, str::FromStr};

use ammonia;
use phonenumber::{Mode, parse};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;
use uuid::Uuid;
use validator::ValidateEmail;

/// Errors produced when attempting to construct a constrained value object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// Provided identifier is zero or negative.
    #[error("id must be greater than zero")]
    NonPositiveId,
    /// Provided email failed format validation.
    #[error("invalid email address")]
    InvalidEmail,
    /// Provided string contained no non-whitespace characters.
    #[error("value cannot be empty")]
    EmptyString,
    /// Provided value failed custom validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// Color is not a `#RRGGBB` hex triplet.
    #[error("invalid color, expected #RRGGBB")]
    InvalidColor,
    /// Money amount is malformed, non-positive or out of range.
    #[error("invalid amount")]
    InvalidAmount,
    /// Provided uuid failed format validation.
    #[error("invalid uuid value")]
    InvalidUuid,
    /// A debit would take a balance below zero.
    #[error("insufficient funds")]
    InsufficientFunds,
}

/// Normalizes and validates an email string.
fn normalize_email<S: Into<String>>(email: S) -> Result<String, TypeConstraintError> {
    let normalized = email.into().trim().to_lowercase();
    if normalized.validate_email() {
        Ok(normalized)
    } else {
        Err(TypeConstraintError::InvalidEmail)
    }
}

/// Macro to generate lightweight newtypes for positive identifiers.
macro_rules! id_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
        )]
        pub struct $name(i32);

        impl $name {
            /// Creates a new identifier ensuring it is greater than zero.
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NonPositiveId)
                }
            }

            /// Returns the raw `i32` backing this identifier.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = TypeConstraintError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| TypeConstraintError::InvalidValue(s.to_string()))?;
                Self::new(value)
            }
        }
    };
}

id_newtype!(LeadId, "Unique identifier for a lead.");
id_newtype!(UserId, "Unique identifier for a CRM user.");
id_newtype!(StatusId, "Unique identifier for a lead status definition.");
id_newtype!(NoteId, "Unique identifier for a lead note.");
id_newtype!(MessageId, "Unique identifier for a chat message.");
id_newtype!(NotificationId, "Unique identifier for a notification.");
id_newtype!(TradingAccountId, "Unique identifier for a trading sub-account.");
id_newtype!(TransactionId, "Unique identifier for a ledger transaction.");

/// Lower-cased and validated email address.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validates and normalizes an email string.
    pub fn new<S: Into<String>>(email: S) -> Result<Self, TypeConstraintError> {
        let normalized = normalize_email(email)?;
        Ok(Self(normalized))
    }

    /// Borrow the email as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the owned inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for EmailAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EmailAddress {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Wrapper for non-empty, trimmed strings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Trims whitespace and rejects empty inputs.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let trimmed = value.into().trim().to_string();
        if trimmed.is_empty() {
            return Err(TypeConstraintError::EmptyString);
        }
        Ok(Self(trimmed))
    }

    /// Borrow the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper returning the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for NonEmptyString {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

macro_rules! non_empty_string_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Constructs a trimmed, non-empty value.
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                let inner = NonEmptyString::new(value)?;
                Ok(Self(inner.into_inner()))
            }

            /// Borrow the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

non_empty_string_newtype!(PersonName, "Person name enforcing trimmed, non-empty values.");

non_empty_string_newtype!(
    StatusLabel,
    "Pipeline status label enforcing trimmed, non-empty values."
);

non_empty_string_newtype!(
    SourceFolder,
    "Import batch (source file) tag enforcing trimmed, non-empty values."
);

non_empty_string_newtype!(CountryName, "Country name enforcing trimmed, non-empty values.");

non_empty_string_newtype!(
    AccountName,
    "Trading sub-account name enforcing trimmed, non-empty values."
);

non_empty_string_newtype!(
    PlatformUserId,
    "Identity id issued by the trading platform's auth endpoint."
);

/// Sanitized free text; markup is stripped through `ammonia`.
macro_rules! sanitized_text_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Constructs a sanitized, trimmed, non-empty value.
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                let sanitized = ammonia::clean(&value.into());
                let inner = NonEmptyString::new(sanitized)?;
                Ok(Self(inner.into_inner()))
            }

            /// Borrow the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

sanitized_text_newtype!(MessageContent, "Chat message body.");
sanitized_text_newtype!(NoteContent, "Lead note body.");

/// `#rrggbb` color used to paint a status badge.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct HexColor(String);

impl HexColor {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let value = value.into().trim().to_lowercase();
        let digits = value
            .strip_prefix('#')
            .ok_or(TypeConstraintError::InvalidColor)?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeConstraintError::InvalidColor);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for HexColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalizes a phone number string to E.164 format.
pub fn normalize_phone_to_e164(value: &str) -> Option<String> {
    let parsed = parse(None, value).ok()?;
    Some(parsed.format().mode(Mode::E164).to_string())
}

/// Lead phone number.
///
/// Imported spreadsheets carry phones in every imaginable shape, so a value
/// that cannot be parsed is kept verbatim (trimmed) instead of being rejected.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct LeadPhone(String);

impl LeadPhone {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let raw = NonEmptyString::new(value)?;
        match normalize_phone_to_e164(raw.as_str()) {
            Some(normalized) => Ok(Self(normalized)),
            None => Ok(Self(raw.into_inner())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for LeadPhone {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat room identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomId(Uuid);

impl RoomId {
    /// The company-wide broadcast room every user belongs to.
    pub const GLOBAL: RoomId = RoomId(Uuid::nil());

    /// Generate a new random room id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn is_global(&self) -> bool {
        *self == Self::GLOBAL
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Display for RoomId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoomId {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(
            Uuid::parse_str(s.trim()).map_err(|_| TypeConstraintError::InvalidUuid)?,
        ))
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

/// Strictly positive money amount in minor units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(i64);

impl Amount {
    pub fn from_cents(cents: i64) -> Result<Self, TypeConstraintError> {
        if cents > 0 {
            Ok(Self(cents))
        } else {
            Err(TypeConstraintError::InvalidAmount)
        }
    }

    pub const fn cents(self) -> i64 {
        self.0
    }
}

/// Parses `"12"`, `"12.5"` or `"12.50"` into cents.
fn parse_cents(value: &str) -> Result<i64, TypeConstraintError> {
    let value = value.trim();
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (value, ""),
    };
    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty()
        || !digits_only(whole)
        || !digits_only(fraction)
        || fraction.len() > 2
        || (value.contains('.') && fraction.is_empty())
    {
        return Err(TypeConstraintError::InvalidAmount);
    }

    let whole = whole
        .parse::<i64>()
        .map_err(|_| TypeConstraintError::InvalidAmount)?;
    let fraction = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().unwrap_or(0) * 10,
        _ => fraction.parse::<i64>().unwrap_or(0),
    };

    whole
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(fraction))
        .ok_or(TypeConstraintError::InvalidAmount)
}

fn format_cents(cents: i64, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}.{:02}", cents / 100, cents % 100)
}

impl FromStr for Amount {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_cents(parse_cents(s)?)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        format_cents(self.0, f)
    }
}

/// Non-negative wallet balance in minor units (cents).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Balance(i64);

impl Balance {
    pub const ZERO: Balance = Balance(0);

    pub fn from_cents(cents: i64) -> Result<Self, TypeConstraintError> {
        if cents >= 0 {
            Ok(Self(cents))
        } else {
            Err(TypeConstraintError::InvalidAmount)
        }
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn checked_credit(self, amount: Amount) -> Result<Self, TypeConstraintError> {
        self.0
            .checked_add(amount.cents())
            .map(Self)
            .ok_or(TypeConstraintError::InvalidAmount)
    }

    pub fn checked_debit(self, amount: Amount) -> Result<Self, TypeConstraintError> {
        if amount.cents() > self.0 {
            return Err(TypeConstraintError::InsufficientFunds);
        }
        Ok(Self(self.0 - amount.cents()))
    }
}

impl FromStr for Balance {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_cents(parse_cents(s)?)
    }
}

impl Display for Balance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        format_cents(self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_reject_non_positive_values() {
        assert_eq!(LeadId::new(0), Err(TypeConstraintError::NonPositiveId));
        assert_eq!(UserId::new(-4), Err(TypeConstraintError::NonPositiveId));
        assert_eq!(LeadId::new(7).map(LeadId::get), Ok(7));
        assert_eq!("12".parse::<MessageId>().map(MessageId::get), Ok(12));
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let email = EmailAddress::new("  Agent@Example.COM ").expect("valid email");
        assert_eq!(email.as_str(), "agent@example.com");
        assert!(EmailAddress::new("not-an-email").is_err());
    }

    #[test]
    fn status_label_rejects_blank_input() {
        assert_eq!(
            StatusLabel::new("   "),
            Err(TypeConstraintError::EmptyString)
        );
        assert_eq!(StatusLabel::new(" New ").unwrap().as_str(), "New");
    }

    #[test]
    fn message_content_is_sanitized() {
        let content = MessageContent::new("hi <script>alert(1)</script>there").unwrap();
        assert_eq!(content.as_str(), "hi there");
        assert!(MessageContent::new("<script>x</script>").is_err());
    }

    #[test]
    fn hex_color_requires_six_digits() {
        assert_eq!(HexColor::new("#A1B2C3").unwrap().as_str(), "#a1b2c3");
        assert_eq!(HexColor::new("a1b2c3"), Err(TypeConstraintError::InvalidColor));
        assert_eq!(HexColor::new("#a1b2c"), Err(TypeConstraintError::InvalidColor));
    }

    #[test]
    fn lead_phone_keeps_unparseable_input() {
        assert_eq!(
            LeadPhone::new("+1 (415) 555-2671").unwrap().as_str(),
            "+14155552671"
        );
        assert_eq!(LeadPhone::new(" 555 12 ").unwrap().as_str(), "555 12");
        assert!(LeadPhone::new("  ").is_err());
    }

    #[test]
    fn global_room_is_nil_uuid() {
        assert_eq!(
            RoomId::GLOBAL.to_string(),
            "00000000-0000-0000-0000-000000000000"
        );
        let parsed: RoomId = "00000000-0000-0000-0000-000000000000".parse().unwrap();
        assert!(parsed.is_global());
        assert!(!RoomId::new().is_global());
    }

    #[test]
    fn amount_parses_decimal_strings() {
        assert_eq!("12.5".parse::<Amount>().map(Amount::cents), Ok(1250));
        assert_eq!("12".parse::<Amount>().map(Amount::cents), Ok(1200));
        assert_eq!("0.01".parse::<Amount>().map(Amount::cents), Ok(1));
        assert_eq!("7.05".parse::<Amount>().unwrap().to_string(), "7.05");
        for bad in ["0", "0.00", "-1", "1.234", "1.", ".5", "abc", ""] {
            assert_eq!(
                bad.parse::<Amount>(),
                Err(TypeConstraintError::InvalidAmount),
                "{bad}"
            );
        }
    }

    #[test]
    fn balance_debit_cannot_go_negative() {
        let balance = Balance::from_cents(500).unwrap();
        let small = Amount::from_cents(200).unwrap();
        let large = Amount::from_cents(501).unwrap();

        assert_eq!(balance.checked_debit(small).unwrap().cents(), 300);
        assert_eq!(
            balance.checked_debit(large),
            Err(TypeConstraintError::InsufficientFunds)
        );
        assert_eq!(balance.checked_credit(large).unwrap().cents(), 1001);
        assert_eq!("10000".parse::<Balance>().unwrap().cents(), 1_000_000);
    }
}
