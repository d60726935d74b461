pub const NETWORK_LIST: &str = "/network/list";
pub const NETWORK_STATUS: &str = "/network/status";
pub const MEMPOOL: &str = "/mempool";
pub const MEMPOOL_TRANSACTION: &str = "/mempool/transaction";
pub const BLOCK: &str = "/block";
