use super::constants::{
    DEFAULT_COST_BASIS_METHOD, DEFAULT_LOG_LEVEL, DEFAULT_UPDATE_CHANNEL_CAPACITY,
};
use crate::core::CostBasisMethod;
use serde::{Deserialize, Serialize};

/// Runtime configuration for the accounting core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingConfig {
    /// Cost basis applied to newly created positions
    #[serde(default = "default_cost_basis_method")]
    pub default_cost_basis_method: CostBasisMethod,

    /// Buffer size of each position update channel
    #[serde(default = "default_update_channel_capacity")]
    pub update_channel_capacity: usize,

    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for AccountingConfig {
    fn default() -> Self {
        Self {
            default_cost_basis_method: default_cost_basis_method(),
            update_channel_capacity: default_update_channel_capacity(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_cost_basis_method() -> CostBasisMethod {
    DEFAULT_COST_BASIS_METHOD
}

fn default_update_channel_capacity() -> usize {
    DEFAULT_UPDATE_CHANNEL_CAPACITY
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
