use {
    clap::ValueHint,
    iotex_evm_bridge::bridge::{DEFAULT_LOGS_PAGE_SIZE, DEFAULT_MAX_BLOCK_ACTIONS},
    log::warn,
    std::{net::SocketAddr, time::Duration},
};

/// IoTeX mainnet EVM chain id.
const DEFAULT_EVM_CHAIN_ID: u64 = 4689;

#[derive(clap::Parser, Debug)]
pub struct BridgeCli {
    /// URL of the IoTeX native API gateway
    #[arg(default_value = "http://127.0.0.1:14014", value_name = "URL", value_hint = ValueHint::Url)]
    pub rpc_address: String,

    /// RPC endpoint of the EVM bridge, websocket listens on the next port
    #[arg(default_value = "127.0.0.1:8545", value_name = "SOCK_ADDR")]
    pub binding_address: SocketAddr,

    /// EVM Chain ID
    #[arg(default_value_t = DEFAULT_EVM_CHAIN_ID, value_name = "CHAIN_ID")]
    pub evm_chain_id: u64,

    /// Print full details in RPC error message, and ignore original message
    #[arg(long)]
    pub verbose_errors: bool,

    /// Maximum number of actions fetched for a single block
    #[arg(long, value_name = "NUM", default_value_t = DEFAULT_MAX_BLOCK_ACTIONS)]
    pub max_block_actions: u64,

    /// Pagination size of ranged eth_getLogs queries
    #[arg(long, value_name = "NUM", default_value_t = DEFAULT_LOGS_PAGE_SIZE)]
    pub logs_page_size: u64,

    /// Timeout of a single native API request
    #[arg(long, value_parser = parse_seconds_duration, value_name = "SECONDS", default_value = "30")]
    pub rpc_timeout: Duration,
}

fn parse_seconds_duration(arg: &str) -> Result<Duration, String> {
    let seconds: u64 = arg.parse().map_err(|e: core::num::ParseIntError| {
        warn!("Unable to parse `--rpc-timeout={arg}` option: {e}");
        e.to_string()
    })?;

    Ok(Duration::from_secs(seconds))
}
