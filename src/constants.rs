/// Application constants

// Chain endpoints
pub const DEFAULT_RPC_URL: &str = "https://fullnode.onechain.network:443";
pub const DEFAULT_CLOCK_ID: &str = "0x6";
pub const RPC_METHOD_GET_OBJECT: &str = "one_getObject";
pub const RPC_METHOD_GET_TRANSACTION_BLOCK: &str = "one_getTransactionBlock";

// Placeholders left in freshly generated .env files
pub const PLACEHOLDER_PACKAGE_ID: &str = "YOUR_PACKAGE_ID_HERE";
pub const PLACEHOLDER_REGISTRY_ID: &str = "YOUR_REGISTRY_OBJECT_ID_HERE";

// Registry contract
pub const REGISTRY_MODULE: &str = "game_registry";
pub const SUBMIT_GAME_FUNCTION: &str = "submit_game";
pub const SUBMIT_PROJECT_FUNCTION: &str = "submit_project";

// Fees in base units (1 OCT = 1_000_000_000)
pub const OCT_BASE_UNITS: u64 = 1_000_000_000;
pub const GAME_SUBMISSION_FEE: u64 = 100_000_000; // 0.1 OCT
pub const PROJECT_SUBMISSION_FEE: u64 = 50_000_000; // 0.05 OCT

// IPFS
pub const DEFAULT_IPFS_GATEWAY_URL: &str = "https://gateway.pinata.cloud";
pub const DEFAULT_PINATA_API_URL: &str = "https://api.pinata.cloud";

// Discovery retry
pub const DEFAULT_DISCOVERY_RETRIES: u32 = 3;
pub const DEFAULT_DISCOVERY_RETRY_DELAY_MS: u64 = 2000;

// Display defaults
pub const PLACEHOLDER_IMAGE: &str = "/images/game1.jpg";
pub const DEFAULT_STATUS: &str = "Open";
pub const DEFAULT_XP: &str = "1500 XP";
pub const DEFAULT_BUTTON: &str = "Join Test";

// Request body ceiling for asset uploads
pub const DEFAULT_UPLOAD_BODY_LIMIT_BYTES: usize = 100 * 1024 * 1024;

// Submitted-game echoes kept until the registry read catches up
pub const MAX_SUBMITTED_ECHOES: usize = 50;

// HTTP client
pub const RPC_CONNECT_TIMEOUT_SECS: u64 = 4;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 15;
pub const IPFS_FETCH_TIMEOUT_SECS: u64 = 10;

// API version
pub const API_VERSION: &str = "v1";
