pub mod game_assembly;
pub mod submission;
pub mod submitted_cache;
pub mod transaction_builder;

pub use game_assembly::GameAssembler;
pub use submitted_cache::SubmittedGameCache;
pub use transaction_builder::TransactionBuilder;
