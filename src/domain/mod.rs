/*!
 * Higher-level operations built on the query executor.
 *
 * - `audit`: privileged action log
 * - `transfer`: atomic currency transfer between accounts
 * - `account`: profile, styling and password settings
 * - `groups`: group listing and search
 * - `presence`: game client heartbeat
 *
 * Every operation takes the executor explicitly and validates its input before
 * any query is sent.
 */

pub mod account;
pub mod audit;
pub mod groups;
pub mod presence;
pub mod transfer;

pub use account::{
    PasswordChange, ProfileUpdate, StylingUpdate, set_password_hash, update_profile, update_styling,
};
pub use audit::{AuditAction, audit_log};
pub use groups::{GroupSummary, list_groups, search_groups};
pub use presence::{record_presence, record_presence_now};
pub use transfer::{AccountRef, TransferReceipt, TransferRequest, transfer};
