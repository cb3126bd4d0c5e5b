use {
    crate::{
        address::{native_from_address, to_eth_address},
        bridge::from_client_error,
        native::{Log, LogTopics, LogsFilter, LogsRange, LogsRequest},
        rpc_client::ChainClient,
    },
    anyhow::anyhow,
    evm_rpc::{error::into_native_error, BlockId, BlockRelId, Error, Hex, RPCLog, RPCLogFilter},
    log::*,
    primitive_types::H256,
    std::convert::TryFrom,
};

/// Filter logs carry no position inside their block; this is reported instead.
pub const FILTER_LOG_TRANSACTION_INDEX: usize = 1;

/// Chain height fetched at most once per request.
pub struct ChainHeight<'a> {
    client: &'a dyn ChainClient,
    verbose_errors: bool,
    height: Option<u64>,
}

impl<'a> ChainHeight<'a> {
    pub fn new(client: &'a dyn ChainClient, verbose_errors: bool) -> Self {
        Self {
            client,
            verbose_errors,
            height: None,
        }
    }

    pub async fn get(&mut self) -> Result<u64, Error> {
        if let Some(height) = self.height {
            return Ok(height);
        }
        let meta = self
            .client
            .get_chain_meta()
            .await
            .map_err(|e| from_client_error(e, self.verbose_errors))?;
        self.height = Some(meta.height);
        Ok(meta.height)
    }
}

async fn resolve_bound(block: BlockId, height: &mut ChainHeight<'_>) -> Result<u64, Error> {
    match block {
        BlockId::Num(Hex(number)) => Ok(number),
        BlockId::RelativeId(BlockRelId::Latest) | BlockId::RelativeId(BlockRelId::Pending) => {
            height.get().await
        }
        BlockId::RelativeId(BlockRelId::Earliest) => Ok(0),
        BlockId::BlockHash { block_hash } => Err(Error::InvalidParams {
            details: format!("block hash {:?} is not a valid log range bound", block_hash),
        }),
    }
}

/// Resolves the `fromBlock`/`toBlock` pair of a log filter into heights.
pub async fn resolve_block_range(
    from: Option<BlockId>,
    to: Option<BlockId>,
    height: &mut ChainHeight<'_>,
) -> Result<(u64, u64), Error> {
    let from_block = match from {
        Some(block) => resolve_bound(block, height).await?,
        None => 0,
    };
    let to_block = match to {
        Some(block) => resolve_bound(block, height).await?,
        None if from_block > 0 => height.get().await?,
        None => 0,
    };
    Ok((from_block, to_block))
}

/// Translates an Ethereum log filter with resolved bounds into a native request.
pub fn build_logs_request(
    filter: &RPCLogFilter,
    (from_block, to_block): (u64, u64),
    pagination_size: u64,
) -> LogsRequest {
    let address = filter
        .addresses()
        .iter()
        .map(native_from_address)
        .collect();
    let topics = filter
        .topic_positions()
        .into_iter()
        .map(|topic| LogTopics { topic })
        .collect();

    let by_range = if from_block > 0 || to_block > 0 {
        Some(LogsRange {
            from_block,
            to_block,
            pagination_size,
            count: 0,
        })
    } else {
        None
    };

    LogsRequest {
        filter: LogsFilter { address, topics },
        by_range,
    }
}

/// Builds an Ethereum log, optionally overriding the block and action hashes.
pub fn assemble_log(
    log: &Log,
    block_hash: Option<H256>,
    transaction_hash: Option<H256>,
    transaction_index: usize,
) -> Result<RPCLog, Error> {
    let topics = log
        .topics
        .iter()
        .map(|topic| {
            if topic.len() == 32 {
                Ok(H256::from_slice(topic))
            } else {
                Err(into_native_error(
                    anyhow!("native log topic of {} bytes", topic.len()),
                    false,
                ))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RPCLog {
        removed: false,
        log_index: Hex(usize::try_from(log.index).unwrap_or(usize::MAX)),
        transaction_index: Hex(transaction_index),
        transaction_hash: transaction_hash.unwrap_or(log.act_hash),
        block_hash: block_hash.unwrap_or(log.blk_hash),
        block_number: Hex(log.blk_height),
        address: to_eth_address(&log.contract_address)?,
        data: log.data.clone().into(),
        topics,
    })
}

/// Runs an `eth_getLogs` query against the native chain.
pub async fn query_logs(
    client: &dyn ChainClient,
    filter: &RPCLogFilter,
    pagination_size: u64,
    verbose_errors: bool,
) -> Result<Vec<RPCLog>, Error> {
    let mut height = ChainHeight::new(client, verbose_errors);
    let range = resolve_block_range(filter.from_block, filter.to_block, &mut height).await?;
    let request = build_logs_request(filter, range, pagination_size);
    debug!("logs request = {:?}", request);

    let logs = client
        .get_logs(request)
        .await
        .map_err(|e| from_client_error(e, verbose_errors))?;
    logs.iter()
        .map(|log| assemble_log(log, None, None, FILTER_LOG_TRANSACTION_INDEX))
        .collect()
}
