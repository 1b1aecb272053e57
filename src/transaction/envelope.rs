use crate::amount::Amount;
use crate::types::{AccountId, Asset, Price, Signer};
use serde::{Deserialize, Serialize};

/// Most operations one transaction may carry.
pub const MAX_OPERATIONS: usize = 100;
/// Longest memo text in bytes.
pub const MAX_MEMO_TEXT: usize = 28;
/// Longest data entry name or value in bytes.
pub const MAX_DATA_LENGTH: usize = 64;

/// Signed transaction as received, already decoded from its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    pub source_account: AccountId,
    pub fee: i64,
    pub seq_num: i64,
    #[serde(default)]
    pub time_bounds: Option<TimeBounds>,
    #[serde(default)]
    pub memo: Memo,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub signatures: Vec<DecoratedSignature>,
}

impl TransactionEnvelope {
    /// Structural limits a transaction must respect before anything is
    /// loaded for it.
    pub fn is_well_formed(&self) -> bool {
        if self.operations.len() > MAX_OPERATIONS {
            return false;
        }
        if let Memo::Text(text) = &self.memo {
            if text.len() > MAX_MEMO_TEXT {
                return false;
            }
        }
        !self.operations.iter().any(|op| {
            matches!(
                &op.body,
                OperationBody::ManageData(data)
                    if data.value.as_ref().is_some_and(|value| value.len() > MAX_DATA_LENGTH)
            )
        })
    }
}

/// Validity window in unix seconds. `max_time == 0` means no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    pub min_time: i64,
    pub max_time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Memo {
    #[default]
    None,
    Text(String),
    Id(u64),
    Hash(String),
}

/// Signature bytes with the hint of the key that produced them. Carried
/// through untouched, signature checking happens in the consensus node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedSignature {
    pub hint: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub source_account: Option<AccountId>,
    pub body: OperationBody,
}

impl Operation {
    pub fn new(body: OperationBody) -> Self {
        Self {
            source_account: None,
            body,
        }
    }

    pub fn with_source(mut self, source: AccountId) -> Self {
        self.source_account = Some(source);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationBody {
    CreateAccount(CreateAccountOp),
    Payment(PaymentOp),
    PathPayment(PathPaymentOp),
    ManageOffer(ManageOfferOp),
    CreatePassiveOffer(CreatePassiveOfferOp),
    SetOptions(SetOptionsOp),
    ChangeTrust(ChangeTrustOp),
    AllowTrust(AllowTrustOp),
    AccountMerge(AccountMergeOp),
    Inflation,
    ManageData(ManageDataOp),
    BumpSequence(BumpSequenceOp),
}

/// Discriminant of [`OperationBody`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    CreateAccount,
    Payment,
    PathPayment,
    ManageOffer,
    CreatePassiveOffer,
    SetOptions,
    ChangeTrust,
    AllowTrust,
    AccountMerge,
    Inflation,
    ManageData,
    BumpSequence,
}

impl OperationBody {
    pub fn kind(&self) -> OperationType {
        match self {
            OperationBody::CreateAccount(_) => OperationType::CreateAccount,
            OperationBody::Payment(_) => OperationType::Payment,
            OperationBody::PathPayment(_) => OperationType::PathPayment,
            OperationBody::ManageOffer(_) => OperationType::ManageOffer,
            OperationBody::CreatePassiveOffer(_) => OperationType::CreatePassiveOffer,
            OperationBody::SetOptions(_) => OperationType::SetOptions,
            OperationBody::ChangeTrust(_) => OperationType::ChangeTrust,
            OperationBody::AllowTrust(_) => OperationType::AllowTrust,
            OperationBody::AccountMerge(_) => OperationType::AccountMerge,
            OperationBody::Inflation => OperationType::Inflation,
            OperationBody::ManageData(_) => OperationType::ManageData,
            OperationBody::BumpSequence(_) => OperationType::BumpSequence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountOp {
    pub destination: AccountId,
    pub starting_balance: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOp {
    pub destination: AccountId,
    pub asset: Asset,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPaymentOp {
    pub send_asset: Asset,
    pub send_max: Amount,
    pub destination: AccountId,
    pub dest_asset: Asset,
    pub dest_amount: Amount,
    #[serde(default)]
    pub path: Vec<Asset>,
}

/// Create (`offer_id == 0`), update, or delete (`amount == 0`) an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManageOfferOp {
    pub selling: Asset,
    pub buying: Asset,
    pub amount: Amount,
    pub price: Price,
    #[serde(default)]
    pub offer_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePassiveOfferOp {
    pub selling: Asset,
    pub buying: Asset,
    pub amount: Amount,
    pub price: Price,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOptionsOp {
    #[serde(default)]
    pub inflation_dest: Option<AccountId>,
    #[serde(default)]
    pub clear_flags: Option<u32>,
    #[serde(default)]
    pub set_flags: Option<u32>,
    #[serde(default)]
    pub master_weight: Option<u32>,
    #[serde(default)]
    pub low_threshold: Option<u32>,
    #[serde(default)]
    pub med_threshold: Option<u32>,
    #[serde(default)]
    pub high_threshold: Option<u32>,
    #[serde(default)]
    pub home_domain: Option<String>,
    /// Weight 0 removes the signer.
    #[serde(default)]
    pub signer: Option<Signer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeTrustOp {
    pub line: Asset,
    /// Zero removes the trustline.
    pub limit: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowTrustOp {
    pub trustor: AccountId,
    pub asset_code: String,
    pub authorize: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMergeOp {
    pub destination: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManageDataOp {
    pub name: String,
    /// `None` deletes the entry.
    #[serde(default)]
    pub value: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BumpSequenceOp {
    pub bump_to: i64,
}
