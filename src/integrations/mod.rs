pub mod ipfs;
pub mod pinata;

pub use ipfs::{IpfsGateway, MetadataSource};
pub use pinata::{ContentPinner, PinataClient};
