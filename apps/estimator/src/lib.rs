//! US job-posting salary estimator: text normalizers, embedding caches, LLM
//! job-detail extraction, feature assembly and salary-range inference.

pub mod config;
pub mod embeddings;
pub mod errors;
pub mod extraction;
pub mod features;
pub mod inference;
pub mod llm_client;
pub mod normalize;
pub mod routes;
pub mod state;
