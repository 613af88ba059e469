//! Typed rows of the claim pipeline

pub mod beneficiary;
pub mod claim;
pub mod merged;
pub mod prediction;

pub use beneficiary::BeneficiaryRecord;
pub use claim::{ClaimKind, ClaimRecord};
pub use merged::{MergedRecord, merged_to_record_batch};
pub use prediction::{Label, Prediction, predictions_to_record_batch};
