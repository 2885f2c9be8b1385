use chrono::NaiveDateTime;
use rust_decimal::Decimal;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserType {
    Individual,
    Merchant,
    Service,
    Agent,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Merchant => "merchant",
            Self::Service => "service",
            Self::Agent => "agent",
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyRole {
    Sender,
    Receiver,
    Merchant,
    Agent,
    ServiceProvider,
}

impl PartyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sender => "sender",
            Self::Receiver => "receiver",
            Self::Merchant => "merchant",
            Self::Agent => "agent",
            Self::ServiceProvider => "service_provider",
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
    Reversed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Failed => "failed",
            Self::Reversed => "reversed",
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub is_debit: bool,
    pub fee_applicable: bool,
}

/// A transaction assembled by the classifier, before insertion.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub external_id: Option<String>,
    pub category_id: i64,
    pub amount: Decimal,
    pub fee: Decimal,
    pub balance_after: Decimal,
    pub timestamp: NaiveDateTime,
    pub sender_message: Option<String>,
    pub merchant_code: Option<String>,
}

/// One record from an SMS backup file, before classification.
#[derive(Debug, Clone)]
pub struct SmsMessage {
    pub protocol: Option<String>,
    pub address: String,
    pub date_ms: i64,
    pub sms_type: i64,
    pub body: String,
    pub service_center: Option<String>,
    pub date_sent_ms: i64,
    pub readable_date: Option<String>,
    pub contact_name: Option<String>,
}
