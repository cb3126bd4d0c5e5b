//! In-memory chain used by the unit tests.

use {
    crate::{
        address::native_from_address,
        native::{
            AccountMeta, Action, ActionCore, ActionInfo, ActionsRequest, BlockMeta,
            BlockMetasRequest, ChainMeta, EstimateGasRequest, Execution, Log, LogsRequest,
            ReadContractRequest, ReceiptInfo, ServerMeta, Timestamp, Transfer,
        },
        rpc_client::{ChainClient, ClientError, ClientResult},
    },
    async_trait::async_trait,
    evm_rpc::Address,
    primitive_types::{H256, U256},
    sha3::{Digest, Keccak256},
    std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    },
};

/// Uncompressed public key of the secret key `1`.
pub const SENDER_PUBKEY: &str = "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";

pub fn native(address: &Address) -> String {
    native_from_address(address)
}

fn action(hash: H256, transfer: Option<Transfer>, execution: Option<Execution>) -> ActionInfo {
    ActionInfo {
        action: Action {
            core: ActionCore {
                version: 1,
                nonce: 3,
                gas_limit: 21000,
                gas_price: U256::from(1_000_000_000_000u64),
                chain_id: 4689,
                transfer,
                execution,
            },
            sender_pub_key: hex::decode(SENDER_PUBKEY).unwrap(),
            signature: vec![],
        },
        act_hash: hash,
        ..Default::default()
    }
}

pub fn transfer_action(hash: H256, recipient: &str, amount: u64) -> ActionInfo {
    let transfer = Transfer {
        amount: amount.into(),
        recipient: recipient.to_string(),
        payload: vec![],
    };
    action(hash, Some(transfer), None)
}

pub fn execution_action(hash: H256, contract: &str, data: Vec<u8>) -> ActionInfo {
    let execution = Execution {
        amount: U256::zero(),
        contract: contract.to_string(),
        data,
    };
    action(hash, None, Some(execution))
}

pub fn block_meta(height: u64, hash: H256, num_actions: u64) -> BlockMeta {
    BlockMeta {
        hash,
        height,
        timestamp: Timestamp {
            seconds: 100_000_000,
            nanos: 0,
        },
        num_actions,
        producer_address: native(&Address::repeat_byte(0x99)),
        previous_block_hash: H256::from_low_u64_be(height.saturating_sub(1)),
        gas_limit: 20_000_000,
        gas_used: 21000 * num_actions,
        ..Default::default()
    }
}

#[derive(Debug, Default)]
pub struct MockChainStorage {
    pub height: u64,
    pub server_meta: ServerMeta,
    pub gas_price: u64,
    pub accounts: HashMap<String, AccountMeta>,
    pub blocks: Vec<(BlockMeta, Vec<ActionInfo>)>,
    pub receipts: HashMap<H256, ReceiptInfo>,
    pub logs: Vec<Log>,
    pub estimated_gas: u64,
    pub contract_output: String,
    /// Error returned by the call, estimation and submission methods.
    pub rpc_failure: Option<(String, String)>,

    pub last_logs_request: Option<LogsRequest>,
    pub last_read_request: Option<ReadContractRequest>,
    pub last_estimate_request: Option<EstimateGasRequest>,
    pub last_raw_transaction: Option<(u64, Vec<u8>)>,
}

/// [`ChainClient`] backed by [`MockChainStorage`], counting the calls the
/// tests care about.
#[derive(Debug, Default)]
pub struct MockChainClient {
    storage: Mutex<MockChainStorage>,
    chain_meta_calls: AtomicUsize,
    block_action_calls: AtomicUsize,
}

impl MockChainClient {
    pub fn with_height(height: u64) -> Self {
        let client = Self::default();
        client.storage.lock().unwrap().height = height;
        client
    }

    pub fn chain_meta_calls(&self) -> usize {
        self.chain_meta_calls.load(Ordering::SeqCst)
    }

    pub fn block_action_calls(&self) -> usize {
        self.block_action_calls.load(Ordering::SeqCst)
    }

    pub fn update<F: FnOnce(&mut MockChainStorage)>(&self, f: F) {
        f(&mut self.storage.lock().unwrap())
    }

    /// Stores a block, placing its actions at their in-block positions.
    pub fn insert_block(&self, meta: BlockMeta, mut actions: Vec<ActionInfo>) {
        for (index, info) in actions.iter_mut().enumerate() {
            info.blk_hash = meta.hash;
            info.blk_height = meta.height;
            info.index = index as u64;
        }
        self.update(|s| s.blocks.push((meta, actions)));
    }

    pub fn insert_receipt(&self, action_hash: H256, receipt: ReceiptInfo) {
        self.update(|s| {
            s.receipts.insert(action_hash, receipt);
        });
    }

    pub fn insert_account(&self, address: &Address, account: AccountMeta) {
        self.update(|s| {
            s.accounts.insert(native(address), account);
        });
    }

    pub fn push_log(&self, log: Log) {
        self.update(|s| s.logs.push(log));
    }

    pub fn last_logs_request(&self) -> Option<LogsRequest> {
        self.storage.lock().unwrap().last_logs_request.clone()
    }

    pub fn last_read_request(&self) -> Option<ReadContractRequest> {
        self.storage.lock().unwrap().last_read_request.clone()
    }

    pub fn last_estimate_request(&self) -> Option<EstimateGasRequest> {
        self.storage.lock().unwrap().last_estimate_request.clone()
    }

    pub fn last_raw_transaction(&self) -> Option<(u64, Vec<u8>)> {
        self.storage.lock().unwrap().last_raw_transaction.clone()
    }

    fn failure(&self) -> ClientResult<()> {
        match self.storage.lock().unwrap().rpc_failure.clone() {
            Some((code, message)) => Err(ClientError::Rpc { code, message }),
            None => Ok(()),
        }
    }
}

fn not_found(what: impl Into<String>) -> ClientError {
    ClientError::NotFound {
        message: what.into(),
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn get_chain_meta(&self) -> ClientResult<ChainMeta> {
        self.chain_meta_calls.fetch_add(1, Ordering::SeqCst);
        let storage = self.storage.lock().unwrap();
        Ok(ChainMeta {
            height: storage.height,
            num_actions: 0,
            chain_id: 4689,
        })
    }

    async fn get_server_meta(&self) -> ClientResult<ServerMeta> {
        Ok(self.storage.lock().unwrap().server_meta.clone())
    }

    async fn get_account(&self, address: &str) -> ClientResult<AccountMeta> {
        self.storage
            .lock()
            .unwrap()
            .accounts
            .get(address)
            .cloned()
            .ok_or_else(|| not_found(format!("account {}", address)))
    }

    async fn get_block_metas(&self, request: BlockMetasRequest) -> ClientResult<Vec<BlockMeta>> {
        let storage = self.storage.lock().unwrap();
        let metas: Vec<_> = match &request {
            BlockMetasRequest::ByIndex { start, count } => storage
                .blocks
                .iter()
                .map(|(meta, _)| meta)
                .filter(|meta| meta.height >= *start && meta.height < start + count)
                .cloned()
                .collect(),
            BlockMetasRequest::ByHash { blk_hash } => storage
                .blocks
                .iter()
                .map(|(meta, _)| meta)
                .filter(|meta| hex::encode(meta.hash.as_bytes()) == *blk_hash)
                .cloned()
                .collect(),
        };
        if metas.is_empty() {
            return Err(not_found(format!("{:?}", request)));
        }
        Ok(metas)
    }

    async fn get_actions(&self, request: ActionsRequest) -> ClientResult<Vec<ActionInfo>> {
        let storage = self.storage.lock().unwrap();
        match &request {
            ActionsRequest::ByHash { action_hash, .. } => storage
                .blocks
                .iter()
                .flat_map(|(_, actions)| actions.iter())
                .find(|info| hex::encode(info.act_hash.as_bytes()) == *action_hash)
                .map(|info| vec![info.clone()])
                .ok_or_else(|| not_found(format!("action {}", action_hash))),
            ActionsRequest::ByBlk {
                blk_hash,
                start,
                count,
            } => {
                self.block_action_calls.fetch_add(1, Ordering::SeqCst);
                let (_, actions) = storage
                    .blocks
                    .iter()
                    .find(|(meta, _)| hex::encode(meta.hash.as_bytes()) == *blk_hash)
                    .ok_or_else(|| not_found(format!("block {}", blk_hash)))?;
                Ok(actions
                    .iter()
                    .skip(*start as usize)
                    .take(*count as usize)
                    .cloned()
                    .collect())
            }
        }
    }

    async fn get_receipt_by_action(&self, action_hash: &str) -> ClientResult<ReceiptInfo> {
        let storage = self.storage.lock().unwrap();
        storage
            .receipts
            .iter()
            .find(|(hash, _)| hex::encode(hash.as_bytes()) == action_hash)
            .map(|(_, receipt)| receipt.clone())
            .ok_or_else(|| not_found(format!("receipt {}", action_hash)))
    }

    async fn get_logs(&self, request: LogsRequest) -> ClientResult<Vec<Log>> {
        let mut storage = self.storage.lock().unwrap();
        storage.last_logs_request = Some(request);
        Ok(storage.logs.clone())
    }

    async fn suggest_gas_price(&self) -> ClientResult<u64> {
        Ok(self.storage.lock().unwrap().gas_price)
    }

    async fn estimate_gas(&self, request: EstimateGasRequest) -> ClientResult<u64> {
        self.failure()?;
        let mut storage = self.storage.lock().unwrap();
        storage.last_estimate_request = Some(request);
        Ok(storage.estimated_gas)
    }

    async fn read_contract(&self, request: ReadContractRequest) -> ClientResult<String> {
        self.failure()?;
        let mut storage = self.storage.lock().unwrap();
        storage.last_read_request = Some(request);
        Ok(storage.contract_output.clone())
    }

    async fn send_raw_transaction(&self, chain_id: u64, data: &[u8]) -> ClientResult<String> {
        self.failure()?;
        let mut storage = self.storage.lock().unwrap();
        storage.last_raw_transaction = Some((chain_id, data.to_vec()));
        Ok(hex::encode(Keccak256::digest(data)))
    }
}
