//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_api_submit_gateway;
mod in_memory_app_instance_cache;
mod in_memory_app_instance_repository;
mod in_memory_data_store;
mod simulated_api_submit_gateway;
mod tracing_runtime_event_sink;

pub use http_api_submit_gateway::HttpApiSubmitGateway;
pub use in_memory_app_instance_cache::InMemoryAppInstanceCache;
pub use in_memory_app_instance_repository::InMemoryAppInstanceRepository;
pub use in_memory_data_store::InMemoryDataStore;
pub use simulated_api_submit_gateway::SimulatedApiSubmitGateway;
pub use tracing_runtime_event_sink::TracingRuntimeEventSink;
