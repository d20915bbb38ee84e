pub mod batch;
pub mod spend_status;
pub mod token;
pub mod virtual_grant;

pub use batch::{CredentialBatch, CredsBatchStatus, TriggerType};
pub use spend_status::SpendStatus;
pub use token::Token;
pub use virtual_grant::{group_by_batch, GrantGroup, VirtualGrant};
