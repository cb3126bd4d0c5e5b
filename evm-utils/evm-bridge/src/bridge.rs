use {
    crate::{
        address::{native_from_address, optional_eth_address},
        block::{actions_page, assemble_block},
        logs::{query_logs, ChainHeight},
        native::{
            hash_to_native, wire::parse_hash, AccountMeta, ActionInfo, ActionsRequest, BlockMeta,
            BlockMetasRequest, EstimateGasRequest, Execution, ReadContractRequest, Transfer,
        },
        receipt::assemble_receipt,
        rpc_client::{ChainClient, ClientError},
        transaction::{assemble_transaction, TransactionLocation},
    },
    anyhow::anyhow,
    derivative::*,
    evm_rpc::{
        bridge::BridgeERPC,
        chain::ChainERPC,
        error::{into_native_error, Error},
        general::GeneralERPC,
        *,
    },
    jsonrpc_core::{BoxFuture, ErrorCode},
    log::*,
    primitive_types::{H256, U256},
    sha3::{Digest, Keccak256},
    std::{convert::TryFrom, future::ready, result::Result as StdResult, sync::Arc},
    tracing_attributes::instrument,
};

pub type EvmResult<T> = StdResult<T, evm_rpc::Error>;

pub const DEFAULT_MAX_BLOCK_ACTIONS: u64 = 1000;
pub const DEFAULT_LOGS_PAGE_SIZE: u64 = 100;

const PEER_COUNT: usize = 0x64;
const HASHRATE: u64 = 0x500000;
const PROTOCOL_VERSION: &str = "64";

/// Upstream code reported when a native error carries a non numeric code.
const UPSTREAM_ERROR_CODE: i64 = -32000;

#[derive(Derivative)]
#[derivative(Debug)]
pub struct EvmBridge {
    evm_chain_id: u64,
    #[derivative(Debug = "ignore")]
    client: Arc<dyn ChainClient>,
    verbose_errors: bool,
    max_block_actions: u64,
    logs_page_size: u64,
}

impl EvmBridge {
    pub fn new(evm_chain_id: u64, client: Arc<dyn ChainClient>) -> Self {
        info!("EVM chain id {}", evm_chain_id);
        Self {
            evm_chain_id,
            client,
            verbose_errors: false,
            max_block_actions: DEFAULT_MAX_BLOCK_ACTIONS,
            logs_page_size: DEFAULT_LOGS_PAGE_SIZE,
        }
    }

    pub fn set_verbose_errors(&mut self, verbose_errors: bool) {
        self.verbose_errors = verbose_errors;
    }

    pub fn set_max_block_actions(&mut self, max_block_actions: u64) {
        self.max_block_actions = max_block_actions;
    }

    pub fn set_logs_page_size(&mut self, logs_page_size: u64) {
        self.logs_page_size = logs_page_size;
    }

    pub fn chain_id(&self) -> u64 {
        self.evm_chain_id
    }

    fn native_error(&self, error: ClientError) -> Error {
        from_client_error(error, self.verbose_errors)
    }

    async fn chain_height(&self) -> EvmResult<u64> {
        ChainHeight::new(self.client.as_ref(), self.verbose_errors)
            .get()
            .await
    }

    async fn block_to_number(&self, block: BlockId) -> EvmResult<Option<u64>> {
        let number = match block {
            BlockId::Num(Hex(number)) => Some(number),
            BlockId::RelativeId(BlockRelId::Earliest) => Some(0),
            block if block.is_head() => Some(self.chain_height().await?),
            _ => None,
        };
        Ok(number)
    }

    async fn fetch_block_meta(&self, request: BlockMetasRequest) -> EvmResult<Option<BlockMeta>> {
        match self.client.get_block_metas(request).await {
            Ok(metas) => Ok(metas.into_iter().next()),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(self.native_error(e)),
        }
    }

    /// Meta of the block a block parameter points at. Lookup failures read as absent.
    pub async fn block_meta(&self, block: BlockId) -> Option<BlockMeta> {
        let result = match block {
            BlockId::BlockHash { block_hash } => self.block_meta_by_hash(block_hash).await,
            block => match self.block_to_number(block).await {
                Ok(Some(number)) => {
                    self.fetch_block_meta(BlockMetasRequest::ByIndex {
                        start: number,
                        count: 1,
                    })
                    .await
                }
                Ok(None) => Ok(None),
                Err(e) => Err(e),
            },
        };
        result.unwrap_or_else(|e| {
            warn!("Block {} lookup failed: {}", block, e);
            None
        })
    }

    async fn block_meta_by_hash(&self, block_hash: H256) -> EvmResult<Option<BlockMeta>> {
        self.fetch_block_meta(BlockMetasRequest::ByHash {
            blk_hash: hash_to_native(&block_hash),
        })
        .await
    }

    /// Actions of a block, capped at the configured page ceiling.
    async fn block_actions(&self, meta: &BlockMeta) -> EvmResult<Vec<ActionInfo>> {
        let count = actions_page(meta, self.max_block_actions);
        if count == 0 {
            return Ok(vec![]);
        }
        self.client
            .get_actions(ActionsRequest::by_block(&meta.hash, 0, count))
            .await
            .map_err(|e| self.native_error(e))
    }

    pub async fn block(&self, meta: &BlockMeta, full: bool) -> Option<RPCBlock> {
        let result = match self.block_actions(meta).await {
            Ok(actions) => assemble_block(meta, &actions, full),
            Err(e) => Err(e),
        };
        result
            .map_err(|e| warn!("Block {} assembly failed: {}", meta.height, e))
            .ok()
    }

    /// Fills `creates` of a deployment from its receipt. A failed lookup leaves it empty.
    pub async fn with_creates(&self, mut tx: RPCTransaction) -> RPCTransaction {
        if tx.to.is_some() {
            return tx;
        }
        let hash = match tx.hash {
            Some(hash) => hash,
            None => return tx,
        };
        match self.client.get_receipt_by_action(&hash_to_native(&hash)).await {
            Ok(info) => match optional_eth_address(&info.receipt.contract_address) {
                Ok(creates) => tx.creates = creates,
                Err(e) => warn!("Receipt of {:?} has malformed contract address: {}", hash, e),
            },
            Err(e) => debug!("Receipt of deployment {:?} unavailable: {}", hash, e),
        }
        tx
    }

    async fn action_by_hash(&self, tx_hash: H256) -> EvmResult<Option<RPCTransaction>> {
        let actions = match self.client.get_actions(ActionsRequest::by_hash(&tx_hash)).await {
            Ok(actions) => actions,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(self.native_error(e)),
        };
        actions
            .first()
            .map(|info| assemble_transaction(info, None))
            .transpose()
    }

    pub async fn transaction_by_hash(&self, tx_hash: H256) -> Option<RPCTransaction> {
        match self.action_by_hash(tx_hash).await {
            Ok(Some(tx)) => Some(self.with_creates(tx).await),
            Ok(None) => None,
            Err(e) => {
                warn!("Transaction {:?} lookup failed: {}", tx_hash, e);
                None
            }
        }
    }

    /// Action at `index` of the block with `block_hash`. `block_number` overrides
    /// the height the action record reports.
    pub async fn transaction_in_block(
        &self,
        block_hash: H256,
        block_number: Option<u64>,
        index: usize,
    ) -> Option<RPCTransaction> {
        let request = ActionsRequest::by_block(&block_hash, index as u64, 1);
        let result = match self.client.get_actions(request).await {
            Ok(actions) => actions
                .first()
                .map(|info| {
                    let location = TransactionLocation {
                        block_hash,
                        block_number: block_number.unwrap_or(info.blk_height),
                        index,
                    };
                    assemble_transaction(info, Some(location))
                })
                .transpose(),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(self.native_error(e)),
        };
        match result {
            Ok(Some(tx)) => Some(self.with_creates(tx).await),
            Ok(None) => None,
            Err(e) => {
                warn!("Action {} of block {:?} lookup failed: {}", index, block_hash, e);
                None
            }
        }
    }

    pub async fn receipt(&self, tx_hash: H256) -> Option<RPCReceipt> {
        let info = match self.client.get_receipt_by_action(&hash_to_native(&tx_hash)).await {
            Ok(info) => info,
            Err(e) => {
                debug!("Receipt of {:?} unavailable: {}", tx_hash, e);
                return None;
            }
        };
        let tx = match self.action_by_hash(tx_hash).await {
            Ok(Some(tx)) => tx,
            Ok(None) => return None,
            Err(e) => {
                warn!("Transaction {:?} of receipt lookup failed: {}", tx_hash, e);
                return None;
            }
        };
        assemble_receipt(tx_hash, &info, &tx)
            .map_err(|e| warn!("Receipt {:?} assembly failed: {}", tx_hash, e))
            .ok()
    }

    /// Account meta, `None` for accounts the chain has never seen.
    async fn account(&self, address: &Address) -> EvmResult<Option<AccountMeta>> {
        match self.client.get_account(&native_from_address(address)).await {
            Ok(account) => Ok(Some(account)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(self.native_error(e)),
        }
    }
}

pub(crate) fn from_client_error(client_error: ClientError, verbose: bool) -> evm_rpc::Error {
    match client_error {
        ClientError::NotFound { message } => evm_rpc::Error::NotFound { entity: message },
        ClientError::Rpc { code, message } => evm_rpc::Error::ProxyRpcError {
            source: jsonrpc_core::Error {
                code: code
                    .parse::<i64>()
                    .map(ErrorCode::from)
                    .unwrap_or(ErrorCode::ServerError(UPSTREAM_ERROR_CODE)),
                message,
                data: Some(serde_json::Value::String(code)),
            },
        },
        other => into_native_error(other, verbose),
    }
}

fn native_amount(value: Option<Hex<U256>>) -> U256 {
    value.map(|v| v.0).unwrap_or_default()
}

fn gas_limit(gas: Option<Hex<U256>>) -> u64 {
    gas.map(|g| {
        if g.0 > U256::from(u64::MAX) {
            u64::MAX
        } else {
            g.0.low_u64()
        }
    })
    .unwrap_or(0)
}

/// Native read-contract request of an `eth_call`. The caller defaults to the contract itself.
pub fn read_contract_request(tx: &RPCTransaction) -> EvmResult<ReadContractRequest> {
    let to = tx.to.ok_or_else(|| Error::InvalidParams {
        details: "eth_call requires a `to` address".to_string(),
    })?;
    let contract = native_from_address(&to);
    let caller_address = tx
        .from
        .map(|from| native_from_address(&from))
        .unwrap_or_else(|| contract.clone());
    Ok(ReadContractRequest {
        execution: Execution {
            amount: native_amount(tx.value),
            contract,
            data: tx.input.clone().map(|b| b.0).unwrap_or_default(),
        },
        caller_address,
        gas_limit: gas_limit(tx.gas),
    })
}

/// Native gas estimation of an `eth_estimateGas`: an execution when call data is
/// present or a contract is deployed, a plain transfer otherwise.
pub fn estimate_gas_request(tx: &RPCTransaction) -> EstimateGasRequest {
    let data = tx.input.clone().map(|b| b.0).unwrap_or_default();
    let amount = native_amount(tx.value);
    let caller_address = native_from_address(&tx.from.unwrap_or_default());

    match tx.to {
        Some(to) if data.is_empty() => EstimateGasRequest {
            transfer: Some(Transfer {
                amount,
                recipient: native_from_address(&to),
                payload: vec![],
            }),
            execution: None,
            caller_address,
        },
        to => EstimateGasRequest {
            transfer: None,
            execution: Some(Execution {
                amount,
                contract: to.map(|to| native_from_address(&to)).unwrap_or_default(),
                data,
            }),
            caller_address,
        },
    }
}

fn decode_hex_output(output: &str, verbose: bool) -> EvmResult<Bytes> {
    let digits = output.strip_prefix("0x").unwrap_or(output);
    hex::decode(digits)
        .map(Bytes)
        .map_err(|e| into_native_error(anyhow!("malformed native output {}: {}", output, e), verbose))
}

pub struct BridgeErpcImpl;

impl BridgeERPC for BridgeErpcImpl {
    type Metadata = Arc<EvmBridge>;

    #[instrument(skip(self, _meta))]
    fn accounts(&self, _meta: Self::Metadata) -> EvmResult<Vec<Address>> {
        Ok(vec![])
    }

    #[instrument(skip(self, _meta))]
    fn sign(&self, _meta: Self::Metadata, _address: Address, _data: Bytes) -> EvmResult<Bytes> {
        Err(Error::Unimplemented {})
    }

    #[instrument(skip(self, _meta))]
    fn sign_transaction(&self, _meta: Self::Metadata, _tx: RPCTransaction) -> EvmResult<Bytes> {
        Err(Error::Unimplemented {})
    }

    #[instrument(skip(self, _meta))]
    fn send_transaction(&self, _meta: Self::Metadata, _tx: RPCTransaction) -> EvmResult<H256> {
        Err(Error::Unimplemented {})
    }

    #[instrument(skip(self, meta))]
    fn send_raw_transaction(&self, meta: Self::Metadata, tx: Bytes) -> BoxFuture<EvmResult<H256>> {
        Box::pin(async move {
            let hash = meta
                .client
                .send_raw_transaction(meta.evm_chain_id, &tx.0)
                .await
                .map_err(|e| meta.native_error(e))?;
            info!("Native accepted action {}", hash);
            parse_hash(&hash).map_err(|e| into_native_error(anyhow!(e), meta.verbose_errors))
        })
    }

    #[instrument(skip(self, _meta))]
    fn compilers(&self, _meta: Self::Metadata) -> EvmResult<Vec<String>> {
        Ok(vec![])
    }
}

pub struct GeneralErpcImpl;

impl GeneralERPC for GeneralErpcImpl {
    type Metadata = Arc<EvmBridge>;

    #[instrument(skip(self, meta))]
    fn client_version(&self, meta: Self::Metadata) -> BoxFuture<EvmResult<String>> {
        Box::pin(async move {
            let server = meta
                .client
                .get_server_meta()
                .await
                .map_err(|e| meta.native_error(e))?;
            Ok(format!("{}/{}", server.package_version, server.go_version))
        })
    }

    #[instrument(skip(self, _meta))]
    fn sha3(&self, _meta: Self::Metadata, bytes: Bytes) -> EvmResult<H256> {
        Ok(H256::from_slice(&Keccak256::digest(&bytes.0)))
    }

    #[instrument(skip(self, meta))]
    fn network_id(&self, meta: Self::Metadata) -> EvmResult<String> {
        Ok(format!("{}", meta.evm_chain_id))
    }

    #[instrument(skip(self, _meta))]
    fn is_listening(&self, _meta: Self::Metadata) -> EvmResult<bool> {
        Ok(true)
    }

    #[instrument(skip(self, _meta))]
    fn peer_count(&self, _meta: Self::Metadata) -> EvmResult<Hex<usize>> {
        Ok(Hex(PEER_COUNT))
    }

    #[instrument(skip(self, meta))]
    fn chain_id(&self, meta: Self::Metadata) -> EvmResult<Hex<u64>> {
        Ok(Hex(meta.evm_chain_id))
    }

    #[instrument(skip(self, _meta))]
    fn protocol_version(&self, _meta: Self::Metadata) -> EvmResult<String> {
        Ok(PROTOCOL_VERSION.to_string())
    }

    #[instrument(skip(self, _meta))]
    fn is_syncing(&self, _meta: Self::Metadata) -> EvmResult<bool> {
        Ok(false)
    }

    #[instrument(skip(self, _meta))]
    fn coinbase(&self, _meta: Self::Metadata) -> EvmResult<Address> {
        Err(Error::Unimplemented {})
    }

    #[instrument(skip(self, _meta))]
    fn is_mining(&self, _meta: Self::Metadata) -> EvmResult<bool> {
        Ok(false)
    }

    #[instrument(skip(self, _meta))]
    fn hashrate(&self, _meta: Self::Metadata) -> EvmResult<Hex<U256>> {
        Ok(Hex(HASHRATE.into()))
    }

    #[instrument(skip(self, meta))]
    fn gas_price(&self, meta: Self::Metadata) -> BoxFuture<EvmResult<Hex<U256>>> {
        Box::pin(async move {
            let price = meta
                .client
                .suggest_gas_price()
                .await
                .map_err(|e| meta.native_error(e))?;
            Ok(Hex(price.into()))
        })
    }
}

pub struct ChainErpcImpl;

impl ChainERPC for ChainErpcImpl {
    type Metadata = Arc<EvmBridge>;

    #[instrument(skip(self, meta))]
    fn block_number(&self, meta: Self::Metadata) -> BoxFuture<EvmResult<Hex<u64>>> {
        Box::pin(async move { meta.chain_height().await.map(Hex) })
    }

    #[instrument(skip(self, meta))]
    fn balance(
        &self,
        meta: Self::Metadata,
        address: Address,
        _block: Option<BlockId>,
    ) -> BoxFuture<EvmResult<Hex<U256>>> {
        Box::pin(async move {
            let account = meta.account(&address).await?;
            Ok(Hex(account.map(|a| a.balance).unwrap_or_default()))
        })
    }

    #[instrument(skip(self, _meta))]
    fn storage_at(
        &self,
        _meta: Self::Metadata,
        _address: Address,
        _data: Hex<U256>,
        _block: Option<BlockId>,
    ) -> BoxFuture<EvmResult<H256>> {
        Box::pin(ready(Err(Error::Unimplemented {})))
    }

    #[instrument(skip(self, meta))]
    fn transaction_count(
        &self,
        meta: Self::Metadata,
        address: Address,
        _block: Option<BlockId>,
    ) -> BoxFuture<EvmResult<Hex<U256>>> {
        Box::pin(async move {
            let account = meta.account(&address).await?;
            Ok(Hex(account.map(|a| a.pending_nonce).unwrap_or(0).into()))
        })
    }

    #[instrument(skip(self, meta))]
    fn block_transaction_count_by_hash(
        &self,
        meta: Self::Metadata,
        block_hash: H256,
    ) -> BoxFuture<EvmResult<Hex<usize>>> {
        Box::pin(async move {
            let meta = meta.block_meta(BlockId::BlockHash { block_hash }).await;
            let count = meta.map_or(0, |m| usize::try_from(m.num_actions).unwrap_or(usize::MAX));
            Ok(Hex(count))
        })
    }

    #[instrument(skip(self, meta))]
    fn block_transaction_count_by_number(
        &self,
        meta: Self::Metadata,
        block: BlockId,
    ) -> BoxFuture<EvmResult<Hex<usize>>> {
        Box::pin(async move {
            let meta = meta.block_meta(block).await;
            let count = meta.map_or(0, |m| usize::try_from(m.num_actions).unwrap_or(usize::MAX));
            Ok(Hex(count))
        })
    }

    #[instrument(skip(self, meta))]
    fn code(
        &self,
        meta: Self::Metadata,
        address: Address,
        _block: Option<BlockId>,
    ) -> BoxFuture<EvmResult<Bytes>> {
        Box::pin(async move {
            let account = meta.account(&address).await?;
            Ok(Bytes(
                account.map(|a| a.contract_byte_code).unwrap_or_default(),
            ))
        })
    }

    #[instrument(skip(self, meta))]
    fn block_by_hash(
        &self,
        meta: Self::Metadata,
        block_hash: H256,
        full: Option<bool>,
    ) -> BoxFuture<EvmResult<OrEmpty<RPCBlock>>> {
        Box::pin(async move {
            let block = match meta.block_meta(BlockId::BlockHash { block_hash }).await {
                Some(block_meta) => meta.block(&block_meta, full.unwrap_or(false)).await,
                None => None,
            };
            Ok(or_empty(block))
        })
    }

    #[instrument(skip(self, meta))]
    fn block_by_number(
        &self,
        meta: Self::Metadata,
        block: BlockId,
        full: Option<bool>,
    ) -> BoxFuture<EvmResult<OrEmpty<RPCBlock>>> {
        Box::pin(async move {
            let block = match meta.block_meta(block).await {
                Some(block_meta) => meta.block(&block_meta, full.unwrap_or(false)).await,
                None => None,
            };
            Ok(or_empty(block))
        })
    }

    #[instrument(skip(self, meta))]
    fn transaction_by_hash(
        &self,
        meta: Self::Metadata,
        tx_hash: H256,
    ) -> BoxFuture<EvmResult<Option<RPCTransaction>>> {
        Box::pin(async move { Ok(meta.transaction_by_hash(tx_hash).await) })
    }

    #[instrument(skip(self, meta))]
    fn transaction_by_block_hash_and_index(
        &self,
        meta: Self::Metadata,
        block_hash: H256,
        tx_id: Hex<usize>,
    ) -> BoxFuture<EvmResult<Option<RPCTransaction>>> {
        Box::pin(async move {
            Ok(meta
                .transaction_in_block(block_hash, None, tx_id.0)
                .await)
        })
    }

    #[instrument(skip(self, meta))]
    fn transaction_by_block_number_and_index(
        &self,
        meta: Self::Metadata,
        block: BlockId,
        tx_id: Hex<usize>,
    ) -> BoxFuture<EvmResult<Option<OrEmpty<RPCTransaction>>>> {
        Box::pin(async move {
            let block_meta = match meta.block_meta(block).await {
                Some(block_meta) => block_meta,
                None => return Ok(Some(or_empty(None))),
            };
            let tx = meta
                .transaction_in_block(block_meta.hash, Some(block_meta.height), tx_id.0)
                .await;
            Ok(tx.map(Either::Left))
        })
    }

    #[instrument(skip(self, meta))]
    fn transaction_receipt(
        &self,
        meta: Self::Metadata,
        tx_hash: H256,
    ) -> BoxFuture<EvmResult<Option<RPCReceipt>>> {
        Box::pin(async move { Ok(meta.receipt(tx_hash).await) })
    }

    #[instrument(skip(self, meta))]
    fn call(
        &self,
        meta: Self::Metadata,
        tx: RPCTransaction,
        _block: Option<BlockId>,
    ) -> BoxFuture<EvmResult<Bytes>> {
        Box::pin(async move {
            let request = read_contract_request(&tx)?;
            let output = meta
                .client
                .read_contract(request)
                .await
                .map_err(|e| meta.native_error(e))?;
            decode_hex_output(&output, meta.verbose_errors)
        })
    }

    #[instrument(skip(self, meta))]
    fn estimate_gas(
        &self,
        meta: Self::Metadata,
        tx: RPCTransaction,
        _block: Option<BlockId>,
    ) -> BoxFuture<EvmResult<Hex<u64>>> {
        Box::pin(async move {
            let gas = meta
                .client
                .estimate_gas(estimate_gas_request(&tx))
                .await
                .map_err(|e| meta.native_error(e))?;
            Ok(Hex(gas))
        })
    }

    #[instrument(skip(self, meta))]
    fn logs(&self, meta: Self::Metadata, log_filter: RPCLogFilter) -> BoxFuture<EvmResult<Vec<RPCLog>>> {
        Box::pin(async move {
            query_logs(
                meta.client.as_ref(),
                &log_filter,
                meta.logs_page_size,
                meta.verbose_errors,
            )
            .await
        })
    }

    #[instrument(skip(self, _meta))]
    fn pending_transactions(&self, _meta: Self::Metadata) -> EvmResult<Vec<RPCTransaction>> {
        Err(Error::Unimplemented {})
    }

    #[instrument(skip(self, _meta))]
    fn uncle_by_block_hash_and_index(
        &self,
        _meta: Self::Metadata,
        _block_hash: H256,
        _uncle_id: Hex<U256>,
    ) -> EvmResult<Option<RPCBlock>> {
        Ok(None)
    }

    #[instrument(skip(self, _meta))]
    fn uncle_by_block_number_and_index(
        &self,
        _meta: Self::Metadata,
        _block: BlockId,
        _uncle_id: Hex<U256>,
    ) -> EvmResult<Option<RPCBlock>> {
        Ok(None)
    }

    #[instrument(skip(self, _meta))]
    fn block_uncles_count_by_hash(
        &self,
        _meta: Self::Metadata,
        _block_hash: H256,
    ) -> EvmResult<Hex<usize>> {
        Ok(Hex(0))
    }

    #[instrument(skip(self, _meta))]
    fn block_uncles_count_by_number(
        &self,
        _meta: Self::Metadata,
        _block: BlockId,
    ) -> EvmResult<Hex<usize>> {
        Ok(Hex(0))
    }
}
