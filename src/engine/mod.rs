pub mod engine;
pub mod error;
pub mod llm_client;
pub mod mediator;
pub mod prompt_builder;
pub mod protocol;
pub mod save_store;
pub mod scene_extractor;
pub mod session;
