pub mod decoder;
pub mod reader;
pub mod retry;
pub mod rpc_client;

pub use reader::RegistryReader;
pub use retry::RetryPolicy;
pub use rpc_client::RpcClient;
