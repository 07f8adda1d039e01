pub mod verification_record_store;

pub use verification_record_store::{StoreError, VerificationRecordStore};
