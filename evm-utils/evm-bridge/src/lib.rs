pub mod address;
pub mod block;
pub mod bridge;
pub mod logs;
pub mod middleware;
pub mod native;
pub mod receipt;
pub mod rpc_client;
pub mod transaction;

#[cfg(test)]
mod test_utils;

use {
    bridge::{BridgeErpcImpl, ChainErpcImpl, EvmBridge, GeneralErpcImpl},
    evm_rpc::{BridgeERPC, ChainERPC, GeneralERPC},
    jsonrpc_core::MetaIoHandler,
    middleware::LoggingMiddleware,
    std::sync::Arc,
};

/// Method registry of the bridge: every supported Ethereum method, with
/// unknown ones answered as unsupported by the middleware.
pub fn rpc_handler() -> MetaIoHandler<Arc<EvmBridge>, LoggingMiddleware> {
    let mut io = MetaIoHandler::with_middleware(LoggingMiddleware);

    io.extend_with(BridgeErpcImpl.to_delegate());
    io.extend_with(ChainErpcImpl.to_delegate());
    io.extend_with(GeneralErpcImpl.to_delegate());
    io
}
