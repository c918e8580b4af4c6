//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod disabled_llm_gateway;
mod file_source_document_store;
mod http_llm_gateway;
mod in_memory_rate_limit_repository;
mod lopdf_form_engine;
mod redis_rate_limit_repository;

pub use disabled_llm_gateway::DisabledLlmGateway;
pub use file_source_document_store::FileSourceDocumentStore;
pub use http_llm_gateway::HttpLlmGateway;
pub use in_memory_rate_limit_repository::InMemoryRateLimitRepository;
pub use lopdf_form_engine::LopdfFormEngine;
pub use redis_rate_limit_repository::RedisRateLimitRepository;
