//! SQLite Ledger Mirror
//!
//! Reads ledger state from the core node's database. Table layout follows the
//! core schema (one row per ledger entry); assets are stored as `native` or
//! `CODE:ISSUER` strings and thresholds as 8 hex digits.

use super::LedgerState;
use crate::amount::Amount;
use crate::error::StoreError;
use crate::types::{
    AccountEntry, AccountId, AccountType, Asset, DataEntry, LedgerHeader, Liabilities, OfferEntry,
    Price, Signer, TrustLineEntry,
};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::time::Duration;
use tracing::debug;

/// Trustline flag bit meaning "authorized".
const TRUSTLINE_AUTHORIZED: i64 = 0x1;
/// Offer flag bit meaning "passive".
const OFFER_PASSIVE: i64 = 0x1;

/// Tables of the core database the mirror reads.
pub const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS ledgerheaders (
        ledgerseq INTEGER PRIMARY KEY,
        closetime INTEGER NOT NULL,
        basefee INTEGER NOT NULL,
        basereserve INTEGER NOT NULL,
        inflationseq INTEGER NOT NULL DEFAULT 0,
        maxtxsetsize INTEGER NOT NULL DEFAULT 100
    )",
    "CREATE TABLE IF NOT EXISTS accounts (
        accountid TEXT PRIMARY KEY,
        balance INTEGER NOT NULL,
        seqnum INTEGER NOT NULL,
        numsubentries INTEGER NOT NULL DEFAULT 0,
        inflationdest TEXT,
        homedomain TEXT NOT NULL DEFAULT '',
        thresholds TEXT NOT NULL DEFAULT '01000000',
        flags INTEGER NOT NULL DEFAULT 0,
        buyingliabilities INTEGER NOT NULL DEFAULT 0,
        sellingliabilities INTEGER NOT NULL DEFAULT 0,
        accounttype INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS signers (
        accountid TEXT NOT NULL,
        publickey TEXT NOT NULL,
        weight INTEGER NOT NULL,
        PRIMARY KEY (accountid, publickey)
    )",
    "CREATE TABLE IF NOT EXISTS trustlines (
        accountid TEXT NOT NULL,
        issuer TEXT NOT NULL,
        assetcode TEXT NOT NULL,
        tlimit INTEGER NOT NULL,
        balance INTEGER NOT NULL,
        flags INTEGER NOT NULL DEFAULT 0,
        buyingliabilities INTEGER NOT NULL DEFAULT 0,
        sellingliabilities INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (accountid, issuer, assetcode)
    )",
    "CREATE TABLE IF NOT EXISTS offers (
        offerid INTEGER PRIMARY KEY,
        sellerid TEXT NOT NULL,
        sellingasset TEXT NOT NULL,
        buyingasset TEXT NOT NULL,
        amount INTEGER NOT NULL,
        pricen INTEGER NOT NULL,
        priced INTEGER NOT NULL,
        flags INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS accountdata (
        accountid TEXT NOT NULL,
        dataname TEXT NOT NULL,
        datavalue BLOB NOT NULL,
        PRIMARY KEY (accountid, dataname)
    )",
];

/// Ledger mirror backed by a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Opens a bounded pool over the mirrored ledger database
    ///
    /// # Arguments
    /// * `url` - sqlx connection string, e.g. `sqlite://core.db`
    /// * `max_connections` - Pool size shared by all validations
    /// * `acquire_timeout` - Waiting longer than this for a connection
    ///   surfaces as [`StoreError::Unavailable`]
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the tables if missing. Used for fresh databases and tests.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn signers(&self, id: &AccountId) -> Result<Vec<Signer>, StoreError> {
        let rows = sqlx::query("SELECT publickey, weight FROM signers WHERE accountid = ? ORDER BY publickey")
            .bind(id.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<Signer, StoreError> {
                Ok(Signer {
                    key: AccountId::new(row.try_get::<String, _>("publickey")?),
                    weight: row.try_get::<i64, _>("weight")? as u32,
                })
            })
            .collect()
    }
}

pub(crate) fn encode_asset(asset: &Asset) -> String {
    match asset {
        Asset::Native => "native".to_string(),
        Asset::Credit { code, issuer } => format!("{}:{}", code, issuer),
    }
}

pub(crate) fn decode_asset(table: &'static str, raw: &str) -> Result<Asset, StoreError> {
    if raw == "native" {
        return Ok(Asset::Native);
    }
    match raw.split_once(':') {
        Some((code, issuer)) if !code.is_empty() && !issuer.is_empty() => {
            Ok(Asset::credit(code, AccountId::new(issuer)))
        }
        _ => Err(StoreError::Corrupt {
            table,
            reason: format!("bad asset {:?}", raw),
        }),
    }
}

fn decode_thresholds(raw: &str) -> Result<[u8; 4], StoreError> {
    let corrupt = || StoreError::Corrupt {
        table: "accounts",
        reason: format!("bad thresholds {:?}", raw),
    };
    if raw.len() != 8 || !raw.is_ascii() {
        return Err(corrupt());
    }
    let mut out = [0u8; 4];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = u8::from_str_radix(&raw[i * 2..i * 2 + 2], 16).map_err(|_| corrupt())?;
    }
    Ok(out)
}

fn amount(row: &SqliteRow, column: &str) -> Result<Amount, StoreError> {
    Ok(Amount::from_units(row.try_get::<i64, _>(column)?))
}

#[async_trait]
impl LedgerState for SqliteLedger {
    async fn ledger_header(&self) -> Result<LedgerHeader, StoreError> {
        let row = sqlx::query(
            "SELECT ledgerseq, closetime, basefee, basereserve, inflationseq, maxtxsetsize
             FROM ledgerheaders ORDER BY ledgerseq DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::Query("no closed ledger in core database".to_string()))?;

        Ok(LedgerHeader {
            sequence: row.try_get::<i64, _>("ledgerseq")? as u32,
            close_time: row.try_get("closetime")?,
            base_fee: row.try_get("basefee")?,
            base_reserve: amount(&row, "basereserve")?,
            inflation_seq: row.try_get::<i64, _>("inflationseq")? as u32,
            max_tx_set_size: row.try_get::<i64, _>("maxtxsetsize")? as u32,
        })
    }

    async fn account(&self, id: &AccountId) -> Result<Option<AccountEntry>, StoreError> {
        debug!("Loading account {}", id);
        let row = sqlx::query(
            "SELECT balance, seqnum, numsubentries, inflationdest, homedomain, thresholds,
                    flags, buyingliabilities, sellingliabilities, accounttype
             FROM accounts WHERE accountid = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let type_code: i64 = row.try_get("accounttype")?;
        let account_type = AccountType::from_code(type_code).ok_or_else(|| StoreError::Corrupt {
            table: "accounts",
            reason: format!("unknown account type {}", type_code),
        })?;
        let thresholds: String = row.try_get("thresholds")?;

        Ok(Some(AccountEntry {
            account_id: id.clone(),
            balance: amount(&row, "balance")?,
            seq_num: row.try_get("seqnum")?,
            num_sub_entries: row.try_get::<i64, _>("numsubentries")? as u32,
            inflation_dest: row
                .try_get::<Option<String>, _>("inflationdest")?
                .map(AccountId::new),
            flags: row.try_get::<i64, _>("flags")? as u32,
            home_domain: row.try_get("homedomain")?,
            thresholds: decode_thresholds(&thresholds)?,
            signers: self.signers(id).await?,
            liabilities: Liabilities {
                buying: amount(&row, "buyingliabilities")?,
                selling: amount(&row, "sellingliabilities")?,
            },
            account_type,
        }))
    }

    async fn trustline(
        &self,
        account: &AccountId,
        asset: &Asset,
    ) -> Result<Option<TrustLineEntry>, StoreError> {
        let Asset::Credit { code, issuer } = asset else {
            return Ok(None);
        };

        let row = sqlx::query(
            "SELECT tlimit, balance, flags, buyingliabilities, sellingliabilities
             FROM trustlines WHERE accountid = ? AND issuer = ? AND assetcode = ?",
        )
        .bind(account.as_str())
        .bind(issuer.as_str())
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(TrustLineEntry {
            account_id: account.clone(),
            asset: asset.clone(),
            balance: amount(&row, "balance")?,
            limit: amount(&row, "tlimit")?,
            authorized: row.try_get::<i64, _>("flags")? & TRUSTLINE_AUTHORIZED != 0,
            liabilities: Liabilities {
                buying: amount(&row, "buyingliabilities")?,
                selling: amount(&row, "sellingliabilities")?,
            },
        }))
    }

    async fn offer(&self, offer_id: u64) -> Result<Option<OfferEntry>, StoreError> {
        let row = sqlx::query(
            "SELECT sellerid, sellingasset, buyingasset, amount, pricen, priced, flags
             FROM offers WHERE offerid = ?",
        )
        .bind(offer_id as i64)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let selling: String = row.try_get("sellingasset")?;
        let buying: String = row.try_get("buyingasset")?;

        Ok(Some(OfferEntry {
            seller_id: AccountId::new(row.try_get::<String, _>("sellerid")?),
            offer_id,
            selling: decode_asset("offers", &selling)?,
            buying: decode_asset("offers", &buying)?,
            amount: amount(&row, "amount")?,
            price: Price {
                n: row.try_get::<i64, _>("pricen")? as i32,
                d: row.try_get::<i64, _>("priced")? as i32,
            },
            passive: row.try_get::<i64, _>("flags")? & OFFER_PASSIVE != 0,
        }))
    }

    async fn data(&self, account: &AccountId, name: &str) -> Result<Option<DataEntry>, StoreError> {
        let row = sqlx::query("SELECT datavalue FROM accountdata WHERE accountid = ? AND dataname = ?")
            .bind(account.as_str())
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(row) => Some(DataEntry {
                account_id: account.clone(),
                name: name.to_string(),
                value: row.try_get("datavalue")?,
            }),
            None => None,
        })
    }
}
