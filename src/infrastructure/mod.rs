// Infrastructure layer - External dependencies and adapters
pub mod api_client;
pub mod api_mapper;
pub mod config;
pub mod credentials;
pub mod event_stream;
