use std::sync::Arc;
use std::time::Instant;

use jsonrpc_core::{
    futures_util::future::{Either, FutureExt},
    Call, ErrorCode, Failure, FutureOutput, Middleware, Output,
};
use log::*;

use crate::bridge::EvmBridge;

/// Method name of a call, for logging.
fn call_method(call: &Call) -> &str {
    match call {
        Call::MethodCall(call) => &call.method,
        Call::Notification(notification) => &notification.method,
        Call::Invalid { .. } => "<invalid>",
    }
}

/// Logs every call with its latency and answers methods without a handler
/// with the "method not supported" error.
#[derive(Clone, Default)]
pub struct LoggingMiddleware;

impl Middleware<Arc<EvmBridge>> for LoggingMiddleware {
    type Future = jsonrpc_core::middleware::NoopFuture;
    type CallFuture = FutureOutput;

    fn on_call<F, X>(
        &self,
        call: Call,
        meta: Arc<EvmBridge>,
        next: F,
    ) -> Either<Self::CallFuture, X>
    where
        F: FnOnce(Call, Arc<EvmBridge>) -> X + Send,
        X: std::future::Future<Output = Option<Output>> + Send + 'static,
    {
        let start = Instant::now();
        let method = call_method(&call).to_string();
        debug!("Received {}", method);

        Either::Left(Box::pin(next(call, meta).map(move |res| {
            let res = match res {
                Some(Output::Failure(Failure { jsonrpc, error, id }))
                    if error.code == ErrorCode::MethodNotFound =>
                {
                    warn!("Unsupported method {} called", method);
                    Some(Output::Failure(Failure {
                        jsonrpc,
                        error: evm_rpc::Error::Unimplemented {}.into(),
                        id,
                    }))
                }
                Some(Output::Failure(Failure { ref error, .. })) => {
                    debug!("{} failed: {}", method, error.message);
                    res
                }
                _ => res,
            };
            debug!("Processing {} took: {:?}", method, start.elapsed());
            res
        })))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        jsonrpc_core::{Id, MethodCall, Notification, Params, Version},
    };

    #[test]
    fn method_names() {
        let call = Call::MethodCall(MethodCall {
            jsonrpc: Some(Version::V2),
            method: "eth_chainId".to_string(),
            params: Params::None,
            id: Id::Num(1),
        });
        assert_eq!(call_method(&call), "eth_chainId");

        let notification = Call::Notification(Notification {
            jsonrpc: Some(Version::V2),
            method: "eth_blockNumber".to_string(),
            params: Params::None,
        });
        assert_eq!(call_method(&notification), "eth_blockNumber");
    }
}
