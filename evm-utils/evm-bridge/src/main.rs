mod cli;

use {
    clap::Parser,
    cli::BridgeCli,
    iotex_evm_bridge::{bridge::EvmBridge, rpc_client::AsyncRpcClient, rpc_handler},
    jsonrpc_http_server::*,
    log::*,
    std::{result::Result as StdResult, sync::Arc},
    tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter},
};

#[tokio::main]
async fn main() -> StdResult<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = BridgeCli::parse();

    trace!("Bridge is starting with args: {args:?}");

    let fmt_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(fmt_filter))
        .try_init()?;

    let binding_address = args.binding_address;
    let client = AsyncRpcClient::new_with_timeout(args.rpc_address, args.rpc_timeout)?;

    let mut meta = EvmBridge::new(args.evm_chain_id, Arc::new(client));
    meta.set_verbose_errors(args.verbose_errors);
    meta.set_max_block_actions(args.max_block_actions);
    meta.set_logs_page_size(args.logs_page_size);
    let meta = Arc::new(meta);

    let io = rpc_handler();

    info!("Creating server with: {}", binding_address);
    let meta_clone = meta.clone();
    let server = ServerBuilder::with_meta_extractor(
        io.clone(),
        move |_req: &hyper::Request<hyper::Body>| meta_clone.clone(),
    )
    .cors(DomainsValidation::AllowOnly(vec![
        AccessControlAllowOrigin::Any,
    ]))
    .threads(4)
    .cors_max_age(86400)
    .start_http(&binding_address)?;

    let ws_server = {
        let mut websocket_binding = binding_address;
        websocket_binding.set_port(binding_address.port() + 1);
        info!("Creating websocket server: {}", websocket_binding);
        jsonrpc_ws_server::ServerBuilder::with_meta_extractor(io, move |_: &_| meta.clone())
            .start(&websocket_binding)?
    };

    let http_waiter = tokio::task::spawn_blocking(|| server.wait());
    let ws_waiter = tokio::task::spawn_blocking(|| ws_server.wait());

    // wait for any failure/stops.
    tokio::select! {
        _ = http_waiter => {
            warn!("HTTP server exited.");
        }
        res = ws_waiter => {
            if let Ok(Err(e)) = res {
                error!("Websocket server failed: {}", e);
            }
            warn!("Websocket server exited.");
        }
    };
    Ok(())
}
