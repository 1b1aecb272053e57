use crate::amount::Amount;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account flag: trustlines to this issuer's assets need authorization.
pub const AUTH_REQUIRED_FLAG: u32 = 0x1;
/// Account flag: the issuer may revoke authorization.
pub const AUTH_REVOCABLE_FLAG: u32 = 0x2;
/// Account flag: flags can never change and the account cannot be merged.
pub const AUTH_IMMUTABLE_FLAG: u32 = 0x4;
pub const MASK_ACCOUNT_FLAGS: u32 = 0x7;

/// Maximum number of signers on one account.
pub const MAX_SIGNERS: usize = 20;

/// Public account identifier (strkey form, e.g. `GA...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An asset: the native currency or an issued credit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Asset {
    Native,
    Credit { code: String, issuer: AccountId },
}

impl Asset {
    pub fn credit(code: impl Into<String>, issuer: AccountId) -> Self {
        Asset::Credit {
            code: code.into(),
            issuer,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    pub fn issuer(&self) -> Option<&AccountId> {
        match self {
            Asset::Native => None,
            Asset::Credit { issuer, .. } => Some(issuer),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Asset::Native => "native",
            Asset::Credit { code, .. } => code,
        }
    }

    /// Credit codes are 1-12 ASCII alphanumerics.
    pub fn is_valid(&self) -> bool {
        match self {
            Asset::Native => true,
            Asset::Credit { code, issuer } => {
                !code.is_empty()
                    && code.len() <= 12
                    && code.bytes().all(|b| b.is_ascii_alphanumeric())
                    && !issuer.as_str().is_empty()
            }
        }
    }
}

/// Offer price as a rational number of buying units per selling unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub n: i32,
    pub d: i32,
}

impl Price {
    pub fn is_positive(&self) -> bool {
        self.n > 0 && self.d > 0
    }
}

/// Business classification of an account.
///
/// Only `AnonymousUser` accounts are subject to spending and balance limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    AnonymousUser,
    RegisteredUser,
    Merchant,
    DistributionAgent,
    SettlementAgent,
    ExchangeAgent,
    Bank,
}

impl AccountType {
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            0 => AccountType::AnonymousUser,
            1 => AccountType::RegisteredUser,
            2 => AccountType::Merchant,
            3 => AccountType::DistributionAgent,
            4 => AccountType::SettlementAgent,
            5 => AccountType::ExchangeAgent,
            6 => AccountType::Bank,
            _ => return None,
        })
    }
}

/// Additional signer of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub key: AccountId,
    pub weight: u32,
}

/// Selling and buying obligations of open offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liabilities {
    pub buying: Amount,
    pub selling: Amount,
}

/// Account as mirrored from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub account_id: AccountId,
    pub balance: Amount,
    pub seq_num: i64,
    pub num_sub_entries: u32,
    pub inflation_dest: Option<AccountId>,
    pub flags: u32,
    pub home_domain: String,
    /// `[master weight, low, medium, high]`
    pub thresholds: [u8; 4],
    pub signers: Vec<Signer>,
    pub liabilities: Liabilities,
    pub account_type: AccountType,
}

impl AccountEntry {
    /// A fresh account as created by a create-account operation.
    pub fn new(account_id: AccountId, balance: Amount, seq_num: i64) -> Self {
        Self {
            account_id,
            balance,
            seq_num,
            num_sub_entries: 0,
            inflation_dest: None,
            flags: 0,
            home_domain: String::new(),
            thresholds: [1, 0, 0, 0],
            signers: Vec::new(),
            liabilities: Liabilities::default(),
            account_type: AccountType::AnonymousUser,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.account_type == AccountType::AnonymousUser
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    /// Balance the account has to keep: `(2 + sub entries) * base reserve`.
    pub fn minimum_balance(&self, base_reserve: Amount) -> Amount {
        let entries = 2 + self.num_sub_entries as i64;
        Amount::from_units(entries.saturating_mul(base_reserve.units()))
    }

    /// Native balance that can leave the account without breaking the reserve
    /// or open sell offers. Never negative.
    pub fn available_to_send(&self, base_reserve: Amount) -> Amount {
        let available = self
            .balance
            .saturating_sub(self.minimum_balance(base_reserve))
            .saturating_sub(self.liabilities.selling);
        available.max(Amount::ZERO)
    }

    /// Native balance the account can still receive.
    pub fn available_to_receive(&self) -> Amount {
        Amount::MAX
            .saturating_sub(self.balance)
            .saturating_sub(self.liabilities.buying)
            .max(Amount::ZERO)
    }

    /// Whether the balance covers one more reserve-consuming sub-entry.
    pub fn can_add_sub_entry(&self, base_reserve: Amount) -> bool {
        let needed = self
            .minimum_balance(base_reserve)
            .saturating_add(base_reserve)
            .saturating_add(self.liabilities.selling);
        self.balance >= needed
    }
}

/// An account's holding of a credit asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustLineEntry {
    pub account_id: AccountId,
    pub asset: Asset,
    pub balance: Amount,
    pub limit: Amount,
    pub authorized: bool,
    pub liabilities: Liabilities,
}

impl TrustLineEntry {
    pub fn available_to_send(&self) -> Amount {
        self.balance
            .saturating_sub(self.liabilities.selling)
            .max(Amount::ZERO)
    }

    pub fn available_to_receive(&self) -> Amount {
        self.limit
            .saturating_sub(self.balance)
            .saturating_sub(self.liabilities.buying)
            .max(Amount::ZERO)
    }
}

/// Open order book offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferEntry {
    pub seller_id: AccountId,
    pub offer_id: u64,
    pub selling: Asset,
    pub buying: Asset,
    pub amount: Amount,
    pub price: Price,
    pub passive: bool,
}

/// Named data attached to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEntry {
    pub account_id: AccountId,
    pub name: String,
    pub value: Vec<u8>,
}

/// The subset of the latest closed ledger header validation depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerHeader {
    pub sequence: u32,
    /// Close time, unix seconds.
    pub close_time: i64,
    pub base_fee: i64,
    pub base_reserve: Amount,
    pub inflation_seq: u32,
    pub max_tx_set_size: u32,
}

impl LedgerHeader {
    /// Sequence number an account created in the next ledger starts with.
    pub fn starting_sequence(&self) -> i64 {
        ((self.sequence as i64) + 1) << 32
    }
}

/// Per-account rollups of past payments, as of the last ingested ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalAggregate {
    pub account_id: AccountId,
    pub daily_outcome: Amount,
    pub monthly_outcome: Amount,
    pub annual_outcome: Amount,
    pub annual_income: Amount,
    pub updated_at: DateTime<Utc>,
    pub ledger: u32,
}

impl HistoricalAggregate {
    /// Aggregate of an account with no recorded history.
    pub fn empty(account_id: AccountId) -> Self {
        Self {
            account_id,
            daily_outcome: Amount::ZERO,
            monthly_outcome: Amount::ZERO,
            annual_outcome: Amount::ZERO,
            annual_income: Amount::ZERO,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            ledger: 0,
        }
    }

    /// Values as seen at `now`: windows whose calendar period has ended
    /// since `updated_at` count as zero.
    pub fn project(&self, now: DateTime<Utc>) -> HistoricalAggregate {
        let then = self.updated_at;
        let same_year = then.year() == now.year();
        let same_month = same_year && then.month() == now.month();
        let same_day = same_month && then.day() == now.day();

        let keep = |value: Amount, current: bool| if current { value } else { Amount::ZERO };

        HistoricalAggregate {
            account_id: self.account_id.clone(),
            daily_outcome: keep(self.daily_outcome, same_day),
            monthly_outcome: keep(self.monthly_outcome, same_month),
            annual_outcome: keep(self.annual_outcome, same_year),
            annual_income: keep(self.annual_income, same_year),
            updated_at: now,
            ledger: self.ledger,
        }
    }
}
