//! Protocol result codes.
//!
//! One closed enum per operation kind. Numeric values match the consensus
//! protocol's wire codes; the string names are the ones the submission API
//! reports in `result_codes`.

use serde::{Deserialize, Serialize};

macro_rules! result_codes {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $code:literal => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// Numeric wire code.
            pub fn code(self) -> i32 {
                match self {
                    $($name::$variant => $code,)+
                }
            }

            /// Name reported to clients.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

result_codes! {
    /// Transaction-level result.
    pub enum TransactionResultCode {
        TxSuccess = 0 => "tx_success",
        TxFailed = -1 => "tx_failed",
        TxTooEarly = -2 => "tx_too_early",
        TxTooLate = -3 => "tx_too_late",
        TxMissingOperation = -4 => "tx_missing_operation",
        TxBadSeq = -5 => "tx_bad_seq",
        TxBadAuth = -6 => "tx_bad_auth",
        TxInsufficientBalance = -7 => "tx_insufficient_balance",
        TxNoAccount = -8 => "tx_no_source_account",
        TxInsufficientFee = -9 => "tx_insufficient_fee",
        TxBadAuthExtra = -10 => "tx_bad_auth_extra",
        TxInternalError = -11 => "tx_internal_error",
        TxMalformed = -16 => "tx_malformed",
    }
}

result_codes! {
    pub enum CreateAccountResultCode {
        Success = 0 => "op_success",
        Malformed = -1 => "op_malformed",
        Underfunded = -2 => "op_underfunded",
        LowReserve = -3 => "op_low_reserve",
        AlreadyExist = -4 => "op_already_exists",
    }
}

result_codes! {
    pub enum PaymentResultCode {
        Success = 0 => "op_success",
        Malformed = -1 => "op_malformed",
        Underfunded = -2 => "op_underfunded",
        SrcNoTrust = -3 => "op_src_no_trust",
        SrcNotAuthorized = -4 => "op_src_not_authorized",
        NoDestination = -5 => "op_no_destination",
        NoTrust = -6 => "op_no_trust",
        NotAuthorized = -7 => "op_not_authorized",
        LineFull = -8 => "op_line_full",
        NoIssuer = -9 => "op_no_issuer",
    }
}

result_codes! {
    pub enum PathPaymentResultCode {
        Success = 0 => "op_success",
        Malformed = -1 => "op_malformed",
        Underfunded = -2 => "op_underfunded",
        SrcNoTrust = -3 => "op_src_no_trust",
        SrcNotAuthorized = -4 => "op_src_not_authorized",
        NoDestination = -5 => "op_no_destination",
        NoTrust = -6 => "op_no_trust",
        NotAuthorized = -7 => "op_not_authorized",
        LineFull = -8 => "op_line_full",
        NoIssuer = -9 => "op_no_issuer",
        TooFewOffers = -10 => "op_too_few_offers",
        OfferCrossSelf = -11 => "op_cross_self",
        OverSendmax = -12 => "op_over_source_max",
    }
}

result_codes! {
    /// Shared by manage-offer and create-passive-offer.
    pub enum ManageOfferResultCode {
        Success = 0 => "op_success",
        Malformed = -1 => "op_malformed",
        SellNoTrust = -2 => "op_sell_no_trust",
        BuyNoTrust = -3 => "op_buy_no_trust",
        SellNotAuthorized = -4 => "op_sell_not_authorized",
        BuyNotAuthorized = -5 => "op_buy_not_authorized",
        LineFull = -6 => "op_line_full",
        Underfunded = -7 => "op_underfunded",
        CrossSelf = -8 => "op_cross_self",
        SellNoIssuer = -9 => "op_sell_no_issuer",
        BuyNoIssuer = -10 => "op_buy_no_issuer",
        NotFound = -11 => "op_offer_not_found",
        LowReserve = -12 => "op_low_reserve",
    }
}

result_codes! {
    pub enum SetOptionsResultCode {
        Success = 0 => "op_success",
        LowReserve = -1 => "op_low_reserve",
        TooManySigners = -2 => "op_too_many_signers",
        BadFlags = -3 => "op_invalid_flags",
        InvalidInflation = -4 => "op_invalid_inflation",
        CantChange = -5 => "op_cant_change",
        UnknownFlag = -6 => "op_unknown_flag",
        ThresholdOutOfRange = -7 => "op_threshold_out_of_range",
        BadSigner = -8 => "op_bad_signer",
        InvalidHomeDomain = -9 => "op_invalid_home_domain",
    }
}

result_codes! {
    pub enum ChangeTrustResultCode {
        Success = 0 => "op_success",
        Malformed = -1 => "op_malformed",
        NoIssuer = -2 => "op_no_issuer",
        InvalidLimit = -3 => "op_invalid_limit",
        LowReserve = -4 => "op_low_reserve",
        SelfNotAllowed = -5 => "op_self_not_allowed",
    }
}

result_codes! {
    pub enum AllowTrustResultCode {
        Success = 0 => "op_success",
        Malformed = -1 => "op_malformed",
        NoTrustLine = -2 => "op_no_trustline",
        TrustNotRequired = -3 => "op_not_required",
        CantRevoke = -4 => "op_cant_revoke",
        SelfNotAllowed = -5 => "op_self_not_allowed",
    }
}

result_codes! {
    pub enum AccountMergeResultCode {
        Success = 0 => "op_success",
        Malformed = -1 => "op_malformed",
        NoAccount = -2 => "op_no_account",
        ImmutableSet = -3 => "op_immutable_set",
        HasSubEntries = -4 => "op_has_sub_entries",
        SeqnumTooFar = -5 => "op_seq_num_too_far",
        DestFull = -6 => "op_dest_full",
    }
}

result_codes! {
    pub enum InflationResultCode {
        Success = 0 => "op_success",
        NotTime = -1 => "op_not_time",
    }
}

result_codes! {
    pub enum ManageDataResultCode {
        Success = 0 => "op_success",
        NotSupportedYet = -1 => "op_not_supported_yet",
        NameNotFound = -2 => "op_data_name_not_found",
        LowReserve = -3 => "op_low_reserve",
        InvalidName = -4 => "op_data_invalid_name",
    }
}

result_codes! {
    pub enum BumpSequenceResultCode {
        Success = 0 => "op_success",
        BadSeq = -1 => "op_bad_seq",
    }
}
