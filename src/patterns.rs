use chrono::NaiveDateTime;
use regex::{Captures, Regex};
use rust_decimal::Decimal;

use crate::extract::{parse_amount, parse_positive_amount, parse_timestamp, ExtractionError};
use crate::models::{PartyRole, UserType};

// ---------------------------------------------------------------------------
// Pattern kinds — enum dispatch over the seven known notification shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    IncomingTransfer,
    OutgoingTransfer,
    MerchantPayment,
    BankDeposit,
    AirtimePurchase,
    BundlePurchase,
    DataBundle,
}

/// Declared order is dispatch priority: the first structural match wins.
pub const CATALOG: &[PatternKind] = &[
    PatternKind::IncomingTransfer,
    PatternKind::OutgoingTransfer,
    PatternKind::MerchantPayment,
    PatternKind::BankDeposit,
    PatternKind::AirtimePurchase,
    PatternKind::BundlePurchase,
    PatternKind::DataBundle,
];

impl PatternKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::IncomingTransfer => "incoming_transfer",
            Self::OutgoingTransfer => "outgoing_transfer",
            Self::MerchantPayment => "merchant_payment",
            Self::BankDeposit => "bank_deposit",
            Self::AirtimePurchase => "airtime_purchase",
            Self::BundlePurchase => "bundle_purchase",
            Self::DataBundle => "data_bundle",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::IncomingTransfer => "Incoming Transfer",
            Self::OutgoingTransfer => "Outgoing Transfer",
            Self::MerchantPayment => "Merchant Payment",
            Self::BankDeposit => "Bank Deposit",
            Self::AirtimePurchase => "Airtime Purchase",
            Self::BundlePurchase => "Bundle Purchase",
            Self::DataBundle => "Data Bundle",
        }
    }

    // Bodies wrap across lines, so every pattern runs in (?s) mode.
    fn pattern(&self) -> &'static str {
        match self {
            Self::IncomingTransfer => {
                r"(?s)You have received (\d[\d,]*) RWF from (.+?) \((\*+\d+)\).*?at (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}).*?(?:Message from sender: (.*?)\. )?Your new balance[:\s]*(\d[\d,]*) RWF.*?Financial Transaction Id: (\d+)"
            }
            Self::OutgoingTransfer => {
                r"(?s)\*165\*S\*(\d[\d,]*) RWF transferred to (.+?) \((\d+)\) from (\d+) at (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}).*?Fee was: (\d[\d,]*) RWF.*?New balance: (\d[\d,]*) RWF"
            }
            Self::MerchantPayment => {
                r"(?s)TxId: (\d+)\. Your payment of (\d[\d,]*) RWF to (.+?) (\d+) has been completed at (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}).*?Your new balance: (\d[\d,]*) RWF.*?Fee was (\d[\d,]*) RWF"
            }
            Self::BankDeposit => {
                r"(?s)\*113\*R\*A bank deposit of (\d[\d,]*) RWF has been added.*?at (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}).*?NEW BALANCE\s*[:\s]*(\d[\d,]*) RWF"
            }
            Self::AirtimePurchase => {
                r"(?s)\*162\*TxId:(\d+)\*S\*Your payment of (\d[\d,]*) RWF to Airtime.*?at (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}).*?Fee was (\d[\d,]*) RWF.*?new balance: (\d[\d,]*) RWF"
            }
            Self::BundlePurchase => {
                r"(?s)\*162\*TxId:(\d+)\*S\*Your payment of (\d[\d,]*) RWF to Bundles and Packs.*?at (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}).*?Fee was (\d[\d,]*) RWF.*?new balance: (\d[\d,]*) RWF"
            }
            Self::DataBundle => {
                r"(?s)\*164\*S\*.*?transaction of (\d[\d,]*) RWF by Data Bundle MTN.*?at (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}).*?new balance[:\s]*(\d[\d,]*)\s*RWF.*?Fee was (\d[\d,]*) RWF.*?Financial Transaction Id: (\d+)"
            }
        }
    }

    /// Map a structural match's captures to typed fields. Any field that
    /// fails to normalize demotes this pattern to a non-match.
    pub fn extract(&self, caps: &Captures) -> Result<Extracted, ExtractionError> {
        match self {
            Self::IncomingTransfer => Ok(Extracted {
                amount: parse_positive_amount(&caps[1])?,
                fee: Decimal::ZERO,
                balance_after: parse_amount(&caps[6])?,
                timestamp: parse_timestamp(&caps[4])?,
                external_id: Some(caps[7].to_string()),
                sender_message: caps.get(5).map(|m| m.as_str().trim().to_string()),
                merchant_code: None,
                owner_role: PartyRole::Receiver,
                counterparty: Some(Counterparty {
                    name: caps[2].trim().to_string(),
                    phone: None,
                    masked: Some(caps[3].to_string()),
                    user_type: UserType::Individual,
                    role: PartyRole::Sender,
                }),
            }),
            Self::OutgoingTransfer => Ok(Extracted {
                amount: parse_positive_amount(&caps[1])?,
                fee: parse_amount(&caps[6])?,
                balance_after: parse_amount(&caps[7])?,
                timestamp: parse_timestamp(&caps[5])?,
                external_id: None,
                sender_message: None,
                merchant_code: None,
                owner_role: PartyRole::Sender,
                counterparty: Some(Counterparty {
                    name: caps[2].trim().to_string(),
                    phone: Some(caps[3].to_string()),
                    masked: None,
                    user_type: UserType::Individual,
                    role: PartyRole::Receiver,
                }),
            }),
            Self::MerchantPayment => Ok(Extracted {
                amount: parse_positive_amount(&caps[2])?,
                fee: parse_amount(&caps[7])?,
                balance_after: parse_amount(&caps[6])?,
                timestamp: parse_timestamp(&caps[5])?,
                external_id: Some(caps[1].to_string()),
                sender_message: None,
                merchant_code: Some(caps[4].to_string()),
                owner_role: PartyRole::Sender,
                counterparty: Some(Counterparty {
                    name: caps[3].trim().to_string(),
                    phone: None,
                    masked: None,
                    user_type: UserType::Merchant,
                    role: PartyRole::Merchant,
                }),
            }),
            Self::BankDeposit => Ok(Extracted {
                amount: parse_positive_amount(&caps[1])?,
                fee: Decimal::ZERO,
                balance_after: parse_amount(&caps[3])?,
                timestamp: parse_timestamp(&caps[2])?,
                external_id: None,
                sender_message: None,
                merchant_code: None,
                owner_role: PartyRole::Receiver,
                // No counterparty identity is known for deposits.
                counterparty: None,
            }),
            Self::AirtimePurchase => Ok(Extracted {
                amount: parse_positive_amount(&caps[2])?,
                fee: parse_amount(&caps[4])?,
                balance_after: parse_amount(&caps[5])?,
                timestamp: parse_timestamp(&caps[3])?,
                external_id: Some(caps[1].to_string()),
                sender_message: None,
                merchant_code: None,
                owner_role: PartyRole::Sender,
                counterparty: Some(Counterparty::service("MTN Airtime")),
            }),
            Self::BundlePurchase => Ok(Extracted {
                amount: parse_positive_amount(&caps[2])?,
                fee: parse_amount(&caps[4])?,
                balance_after: parse_amount(&caps[5])?,
                timestamp: parse_timestamp(&caps[3])?,
                external_id: Some(caps[1].to_string()),
                sender_message: None,
                merchant_code: None,
                owner_role: PartyRole::Sender,
                counterparty: Some(Counterparty::service("Bundles and Packs")),
            }),
            Self::DataBundle => Ok(Extracted {
                amount: parse_positive_amount(&caps[1])?,
                fee: parse_amount(&caps[4])?,
                balance_after: parse_amount(&caps[3])?,
                timestamp: parse_timestamp(&caps[2])?,
                external_id: Some(caps[5].to_string()),
                sender_message: None,
                merchant_code: None,
                owner_role: PartyRole::Sender,
                counterparty: Some(Counterparty::service("Data Bundle MTN")),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction output
// ---------------------------------------------------------------------------

/// A counterparty identity captured by a pattern, to be resolved to a user.
#[derive(Debug, Clone)]
pub struct Counterparty {
    pub name: String,
    pub phone: Option<String>,
    pub masked: Option<String>,
    pub user_type: UserType,
    pub role: PartyRole,
}

impl Counterparty {
    fn service(name: &str) -> Self {
        Self {
            name: name.to_string(),
            phone: None,
            masked: None,
            user_type: UserType::Service,
            role: PartyRole::ServiceProvider,
        }
    }
}

/// Typed fields extracted from one structurally matched body.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub amount: Decimal,
    pub fee: Decimal,
    pub balance_after: Decimal,
    pub timestamp: NaiveDateTime,
    pub external_id: Option<String>,
    pub sender_message: Option<String>,
    pub merchant_code: Option<String>,
    pub owner_role: PartyRole,
    pub counterparty: Option<Counterparty>,
}

// ---------------------------------------------------------------------------
// Compiled catalog
// ---------------------------------------------------------------------------

/// The seven shapes compiled once, in dispatch order.
pub struct Catalog {
    entries: Vec<(PatternKind, Regex)>,
}

impl Catalog {
    pub fn new() -> Self {
        let entries = CATALOG
            .iter()
            .map(|&kind| {
                // Pattern sources are fixed literals; a compile failure is a bug.
                let re = Regex::new(kind.pattern()).expect("catalog pattern must compile");
                (kind, re)
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[(PatternKind, Regex)] {
        &self.entries
    }
}
