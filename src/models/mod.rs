mod id;
mod id_generator;
mod transaction;

pub use id::Id;
pub use id_generator::{FixedIdGenerator, IdGenerator, UuidIdGenerator};
pub(crate) use transaction::{check_amounts, check_product};
pub use transaction::{Transaction, TransactionDraft, ValidDraft, ValidationError};
