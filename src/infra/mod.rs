pub mod http_client;
pub mod output_adapter;
