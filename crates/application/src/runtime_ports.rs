mod api_submit;
mod cache;
mod data_store;
mod events;
mod persistence;
mod record_ids;

pub use api_submit::{ApiSubmitGateway, ApiSubmitRequest};
pub use cache::AppInstanceCache;
pub use data_store::DataStoreRepository;
pub use events::{RuntimeEvent, RuntimeEventRecord, RuntimeEventSink};
pub use persistence::{AppInstanceRepository, SaveAppInstanceInput, StoredAppInstance};
pub use record_ids::{RecordIdGenerator, SequentialRecordIdGenerator, UuidRecordIdGenerator};
