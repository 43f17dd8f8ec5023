/*!
 * Currency transfer between two accounts.
 *
 * A transfer is one batch wrapped in a transaction: both accounts are resolved,
 * the sender's balance is checked, both balances are updated and one
 * `transaction` record is created. Any failed check throws inside the
 * transaction, so either everything is applied or nothing is.
 *
 * Retrying a transfer is only safe with an idempotency key. A keyed batch first
 * looks up an earlier `transaction` with the same key and throws before any
 * balance check when it finds one, so a replay after a lost response is reported
 * as a duplicate rather than as insufficient funds. The unique index on
 * `transaction.idempotencyKey` still rejects two replays racing each other.
 */

use std::fmt;

use log::{info, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::database::schema::IDEMPOTENCY_INDEX;
use crate::database::{Bindings, QueryExecutor};
use crate::errors::{DomainError, QueryError, ValidationError};
use crate::record::{RecordId, table};

const SENDER_MISSING: &str = "Sender account not found";
const RECEIVER_MISSING: &str = "Receiver account not found";
const SAME_ACCOUNT: &str = "Sender and receiver are the same account";
const INSUFFICIENT_FUNDS: &str = "Insufficient funds";
const ALREADY_APPLIED: &str = "Transfer already applied";

/// Must run before every other check in a keyed batch
const REPLAY_CHECK: &str = "IF array::len((SELECT id FROM transaction WHERE idempotencyKey = $idempotencyKey)) > 0 { THROW 'Transfer already applied' };";

const SENDER_BY_ID: &str = "LET $sender = (SELECT id, currency FROM type::record($senderKey))[0];";
const SENDER_BY_NUMBER: &str =
    "LET $sender = (SELECT id, currency FROM user WHERE number = $senderKey)[0];";
const RECEIVER_BY_ID: &str = "LET $receiver = (SELECT id FROM type::record($receiverKey))[0];";
const RECEIVER_BY_NUMBER: &str =
    "LET $receiver = (SELECT id FROM user WHERE number = $receiverKey)[0];";

const TRANSFER_BODY: &str = "IF $sender = NONE { THROW 'Sender account not found' };
IF $receiver = NONE { THROW 'Receiver account not found' };
IF $sender.id = $receiver.id { THROW 'Sender and receiver are the same account' };
IF $sender.currency < $amount { THROW 'Insufficient funds' };
UPDATE $sender.id SET currency -= $amount;
UPDATE $receiver.id SET currency += $amount;
CREATE transaction CONTENT {
    sender: $sender.id,
    receiver: $receiver.id,
    amountSent: $amount,
    note: $note,
    link: $link,
    idempotencyKey: $idempotencyKey,
    time: time::now()
};";

/// How an account is referenced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountRef {
    /// By user record key
    Id(String),
    /// By public user number
    Number(i64),
}

impl AccountRef {
    fn binding(&self) -> Value {
        match self {
            Self::Id(key) => RecordId::new(table::User, key.as_str()).to_binding(),
            Self::Number(number) => Value::from(*number),
        }
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(key) => write!(f, "id {}", key),
            Self::Number(number) => write!(f, "number {}", number),
        }
    }
}

/// A requested transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub sender: AccountRef,
    pub receiver: AccountRef,
    /// Amount of currency to move; must be positive
    pub amount: u64,
    /// What the transfer was for
    pub note: Option<String>,
    /// Link to what the transfer was for
    pub link: Option<String>,
    /// Replay guard; transfers sharing a key are applied at most once
    pub idempotency_key: Option<String>,
}

impl TransferRequest {
    pub fn new(sender: AccountRef, receiver: AccountRef, amount: u64) -> Self {
        Self {
            sender,
            receiver,
            amount,
            note: None,
            link: None,
            idempotency_key: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Attach a freshly generated idempotency key; reuse the returned request when retrying
    pub fn with_generated_key(self) -> Self {
        self.with_idempotency_key(Uuid::new_v4().to_string())
    }

    /// Check the request before any query is sent
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();

        if self.amount == 0 {
            errors.push("amount", "Amount must be greater than zero");
        } else if i64::try_from(self.amount).is_err() {
            errors.push("amount", "Amount is too large");
        }

        if self.sender == self.receiver {
            errors.push("receiver", "Cannot transfer to the same account");
        }

        if let AccountRef::Id(key) = &self.sender {
            if key.is_empty() {
                errors.push("sender", "Account id must not be empty");
            }
        }

        if let AccountRef::Id(key) = &self.receiver {
            if key.is_empty() {
                errors.push("receiver", "Account id must not be empty");
            }
        }

        if matches!(&self.idempotency_key, Some(key) if key.trim().is_empty()) {
            errors.push("idempotency_key", "Idempotency key must not be blank");
        }

        errors.into_result()
    }

    fn query(&self) -> String {
        let sender = match self.sender {
            AccountRef::Id(_) => SENDER_BY_ID,
            AccountRef::Number(_) => SENDER_BY_NUMBER,
        };
        let receiver = match self.receiver {
            AccountRef::Id(_) => RECEIVER_BY_ID,
            AccountRef::Number(_) => RECEIVER_BY_NUMBER,
        };

        let mut query = String::from("BEGIN TRANSACTION;\n");
        if self.idempotency_key.is_some() {
            query.push_str(REPLAY_CHECK);
            query.push('\n');
        }
        query.push_str(&format!(
            "{}\n{}\n{}\nCOMMIT TRANSACTION;",
            sender, receiver, TRANSFER_BODY
        ));
        query
    }

    fn bindings(&self) -> Bindings {
        // Optional fields are left unbound so they are stored as NONE
        let mut bindings = Bindings::new()
            .bind("senderKey", self.sender.binding())
            .bind("receiverKey", self.receiver.binding())
            .bind("amount", self.amount);

        if let Some(note) = &self.note {
            bindings.insert("note", note.as_str());
        }
        if let Some(link) = &self.link {
            bindings.insert("link", link.as_str());
        }
        if let Some(key) = &self.idempotency_key {
            bindings.insert("idempotencyKey", key.as_str());
        }

        bindings
    }
}

/// Result of a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Id of the created transaction record; `None` for a duplicate
    pub transaction: Option<String>,
    /// The idempotency key was already used, nothing was applied
    pub duplicate: bool,
}

/// Move currency from one account to another
///
/// # Arguments
/// * `executor` - Executor to run the transfer batch on
/// * `request` - Accounts, amount and optional note, link and idempotency key
///
/// # Returns
/// * `Result<TransferReceipt, DomainError>` - The receipt, or why nothing was applied
pub async fn transfer(
    executor: &QueryExecutor,
    request: &TransferRequest,
) -> Result<TransferReceipt, DomainError> {
    request.validate()?;

    match executor.execute(&request.query(), &request.bindings()).await {
        Ok(results) => {
            let transaction = results
                .into_inner()
                .into_iter()
                .rev()
                .flatten()
                .find_map(|payload| created_id(&payload));

            info!(
                "Transferred {} from {} to {}",
                request.amount, request.sender, request.receiver
            );
            Ok(TransferReceipt {
                transaction,
                duplicate: false,
            })
        }
        Err(QueryError::Statement { message, index }) => {
            classify_failure(request, index, message)
        }
        Err(e) => Err(e.into()),
    }
}

fn classify_failure(
    request: &TransferRequest,
    index: usize,
    message: String,
) -> Result<TransferReceipt, DomainError> {
    let replayed = message.contains(ALREADY_APPLIED) || message.contains(IDEMPOTENCY_INDEX);
    if replayed && request.idempotency_key.is_some() {
        warn!(
            "Transfer with idempotency key {:?} already applied",
            request.idempotency_key
        );
        return Ok(TransferReceipt {
            transaction: None,
            duplicate: true,
        });
    }

    if message.contains(SENDER_MISSING) {
        return Err(DomainError::AccountNotFound(request.sender.to_string()));
    }
    if message.contains(RECEIVER_MISSING) {
        return Err(DomainError::AccountNotFound(request.receiver.to_string()));
    }
    if message.contains(INSUFFICIENT_FUNDS) {
        return Err(DomainError::InsufficientFunds {
            amount: request.amount,
        });
    }
    if message.contains(SAME_ACCOUNT) {
        return Err(ValidationError::single("receiver", "Cannot transfer to the same account").into());
    }

    Err(QueryError::Statement { index, message }.into())
}

/// Id of the record a `CREATE` statement returned
fn created_id(payload: &Value) -> Option<String> {
    let record = match payload {
        Value::Array(rows) => rows.first()?,
        other => other,
    };
    match record.get("id")? {
        Value::String(id) => Some(id.clone()),
        other => Some(other.to_string()),
    }
}
