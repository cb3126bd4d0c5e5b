#![allow(clippy::upper_case_acronyms)]

use {
    jsonrpc_core::BoxFuture,
    jsonrpc_derive::rpc,
    primitive_types::{H160, H256, U256},
    serde::{Deserialize, Serialize},
    std::fmt,
};

mod serialize;

pub mod error;
pub use self::{error::Error, serialize::*};

pub type Address = H160;

/// Keccak-256 of the RLP encoding of an empty uncle list.
pub const EMPTY_UNCLES_HASH: H256 = H256([
    0x1d, 0xcc, 0x4d, 0xe8, 0xde, 0xc7, 0x5d, 0x7a, 0xab, 0x85, 0xb5, 0x67, 0xb6, 0xcc, 0xd4, 0x1a,
    0xd3, 0x12, 0x45, 0x1b, 0x94, 0x8a, 0x74, 0x13, 0xf0, 0xa1, 0x42, 0xfd, 0x40, 0xd4, 0x93, 0x47,
]);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Either<T, U> {
    Left(T),
    Right(U),
}

/// The `{}` returned by lookups that report a missing entity as an empty object.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EmptyObject {}

/// Either a found value or `{}`.
pub type OrEmpty<T> = Either<T, EmptyObject>;

pub fn or_empty<T>(value: Option<T>) -> OrEmpty<T> {
    match value {
        Some(value) => Either::Left(value),
        None => Either::Right(EmptyObject {}),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum RPCTopicFilter {
    Single(H256),
    Or(Vec<H256>),
}

impl RPCTopicFilter {
    pub fn into_topics(value: Option<RPCTopicFilter>) -> Vec<H256> {
        match value {
            Some(RPCTopicFilter::Single(t)) => vec![t],
            Some(RPCTopicFilter::Or(t)) => t,
            None => vec![],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RPCLogFilter {
    pub from_block: Option<BlockId>,
    pub to_block: Option<BlockId>,
    pub address: Option<Either<Vec<Address>, Address>>,
    pub topics: Option<Either<Vec<Option<RPCTopicFilter>>, H256>>,
}

impl RPCLogFilter {
    pub fn addresses(&self) -> Vec<Address> {
        match &self.address {
            Some(Either::Left(addresses)) => addresses.clone(),
            Some(Either::Right(address)) => vec![*address],
            None => vec![],
        }
    }

    /// Positional topic filter; an empty position matches any topic.
    pub fn topic_positions(&self) -> Vec<Vec<H256>> {
        match &self.topics {
            Some(Either::Left(positions)) => positions
                .iter()
                .cloned()
                .map(RPCTopicFilter::into_topics)
                .collect(),
            Some(Either::Right(topic)) => vec![vec![*topic]],
            None => vec![],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RPCLog {
    pub removed: bool,
    pub log_index: Hex<usize>,
    pub transaction_index: Hex<usize>,
    pub transaction_hash: H256,
    pub block_hash: H256,
    pub block_number: Hex<u64>,
    pub address: Address,
    pub data: Bytes,
    pub topics: Vec<H256>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RPCBlock {
    pub number: Hex<u64>,
    pub hash: H256,
    pub parent_hash: H256,

    pub size: Hex<usize>,
    pub gas_limit: Hex<u64>,
    pub gas_used: Hex<u64>,
    pub timestamp: Hex<u64>,
    pub transactions: Either<Vec<H256>, Vec<RPCTransaction>>,

    pub transactions_root: H256,
    pub state_root: H256,
    pub receipts_root: H256,

    pub sha3_uncles: H256,
    pub logs_bloom: ethbloom::Bloom, // H2048

    pub author: Address,
    pub miner: Address,
    pub difficulty: Hex<U256>,
    pub total_difficulty: Hex<U256>,
    pub extra_data: Bytes,
    pub uncles: Vec<H256>,
}

impl RPCBlock {
    pub fn transaction_count(&self) -> usize {
        match &self.transactions {
            Either::Left(hashes) => hashes.len(),
            Either::Right(txs) => txs.len(),
        }
    }
}

/// Ethereum transaction as returned by the transaction lookups, and as accepted
/// by `eth_call`/`eth_estimateGas` (where every field is optional).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RPCTransaction {
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub creates: Option<Address>,
    pub gas: Option<Hex<U256>>,
    pub gas_price: Option<Hex<U256>>,
    pub value: Option<Hex<U256>>,
    #[serde(alias = "data")]
    pub input: Option<Bytes>,
    pub nonce: Option<Hex<U256>>,

    pub hash: Option<H256>,
    pub block_hash: Option<H256>,
    pub block_number: Option<Hex<u64>>,
    pub transaction_index: Option<Hex<usize>>,

    pub public_key: Option<Bytes>,
    pub chain_id: Option<Hex<u64>>,
    pub raw: Option<Bytes>,
    #[serde(alias = "R")]
    pub r: Option<Bytes>,
    #[serde(alias = "S")]
    pub s: Option<Bytes>,
    pub standard_v: Option<Hex<u64>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RPCReceipt {
    pub transaction_hash: H256,
    pub transaction_index: Hex<usize>,
    pub block_hash: H256,
    pub block_number: Hex<u64>,
    pub cumulative_gas_used: Hex<u64>,
    pub gas_used: Hex<u64>,
    pub contract_address: Option<Address>,
    pub logs_bloom: ethbloom::Bloom, // H2048
    pub to: Option<Address>,
    pub from: Option<Address>,
    pub logs: Vec<RPCLog>,
    pub status: Hex<usize>,
}

#[derive(Eq, PartialEq, Serialize, Deserialize, Debug, Clone, Copy)]
#[serde(untagged)]
pub enum BlockId {
    Num(Hex<u64>),
    BlockHash {
        #[serde(rename = "blockHash")]
        block_hash: H256,
    },
    RelativeId(BlockRelId),
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{}", n.0.format_hex()),
            Self::BlockHash { block_hash } => {
                write!(f, "{{ block_hash:{} }}", block_hash.format_hex())
            }
            Self::RelativeId(id) => write!(f, "{}", id),
        }
    }
}

impl BlockId {
    /// `latest` and `pending`, the tags that resolve to the current chain height.
    pub fn is_head(&self) -> bool {
        matches!(
            self,
            Self::RelativeId(BlockRelId::Latest) | Self::RelativeId(BlockRelId::Pending)
        )
    }
}

#[derive(Eq, PartialEq, Serialize, Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub enum BlockRelId {
    Latest,
    Pending,
    Earliest,
}

impl fmt::Display for BlockRelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let str_id = match self {
            Self::Latest => "latest",
            Self::Pending => "pending",
            Self::Earliest => "earliest",
        };
        write!(f, "{}", str_id)
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::RelativeId(BlockRelId::Latest)
    }
}

impl From<u64> for BlockId {
    fn from(b: u64) -> BlockId {
        BlockId::Num(Hex(b))
    }
}

pub use {bridge::BridgeERPC, chain::ChainERPC, general::GeneralERPC};

pub mod general {
    use super::*;

    #[rpc(server)]
    pub trait GeneralERPC {
        type Metadata;

        #[rpc(meta, name = "web3_clientVersion")]
        fn client_version(&self, meta: Self::Metadata) -> BoxFuture<Result<String, Error>>;

        #[rpc(meta, name = "web3_sha3")]
        fn sha3(&self, meta: Self::Metadata, bytes: Bytes) -> Result<H256, Error>;

        #[rpc(meta, name = "net_version")]
        fn network_id(&self, meta: Self::Metadata) -> Result<String, Error>;

        #[rpc(meta, name = "net_listening")]
        fn is_listening(&self, meta: Self::Metadata) -> Result<bool, Error>;

        #[rpc(meta, name = "net_peerCount")]
        fn peer_count(&self, meta: Self::Metadata) -> Result<Hex<usize>, Error>;

        #[rpc(meta, name = "eth_chainId")]
        fn chain_id(&self, meta: Self::Metadata) -> Result<Hex<u64>, Error>;

        #[rpc(meta, name = "eth_protocolVersion")]
        fn protocol_version(&self, meta: Self::Metadata) -> Result<String, Error>;

        #[rpc(meta, name = "eth_syncing")]
        fn is_syncing(&self, meta: Self::Metadata) -> Result<bool, Error>;

        #[rpc(meta, name = "eth_coinbase")]
        fn coinbase(&self, meta: Self::Metadata) -> Result<Address, Error>;

        #[rpc(meta, name = "eth_mining")]
        fn is_mining(&self, meta: Self::Metadata) -> Result<bool, Error>;

        #[rpc(meta, name = "eth_hashrate")]
        fn hashrate(&self, meta: Self::Metadata) -> Result<Hex<U256>, Error>;

        #[rpc(meta, name = "eth_gasPrice")]
        fn gas_price(&self, meta: Self::Metadata) -> BoxFuture<Result<Hex<U256>, Error>>;
    }
}

pub mod chain {
    use super::*;

    #[rpc(server)]
    pub trait ChainERPC {
        type Metadata;

        #[rpc(meta, name = "eth_blockNumber")]
        fn block_number(&self, meta: Self::Metadata) -> BoxFuture<Result<Hex<u64>, Error>>;

        #[rpc(meta, name = "eth_getBalance")]
        fn balance(
            &self,
            meta: Self::Metadata,
            address: Address,
            block: Option<BlockId>,
        ) -> BoxFuture<Result<Hex<U256>, Error>>;

        #[rpc(meta, name = "eth_getStorageAt")]
        fn storage_at(
            &self,
            meta: Self::Metadata,
            address: Address,
            data: Hex<U256>,
            block: Option<BlockId>,
        ) -> BoxFuture<Result<H256, Error>>;

        #[rpc(meta, name = "eth_getTransactionCount")]
        fn transaction_count(
            &self,
            meta: Self::Metadata,
            address: Address,
            block: Option<BlockId>,
        ) -> BoxFuture<Result<Hex<U256>, Error>>;

        #[rpc(meta, name = "eth_getBlockTransactionCountByHash")]
        fn block_transaction_count_by_hash(
            &self,
            meta: Self::Metadata,
            block_hash: H256,
        ) -> BoxFuture<Result<Hex<usize>, Error>>;

        #[rpc(meta, name = "eth_getBlockTransactionCountByNumber")]
        fn block_transaction_count_by_number(
            &self,
            meta: Self::Metadata,
            block: BlockId,
        ) -> BoxFuture<Result<Hex<usize>, Error>>;

        #[rpc(meta, name = "eth_getCode")]
        fn code(
            &self,
            meta: Self::Metadata,
            address: Address,
            block: Option<BlockId>,
        ) -> BoxFuture<Result<Bytes, Error>>;

        #[rpc(meta, name = "eth_getBlockByHash")]
        fn block_by_hash(
            &self,
            meta: Self::Metadata,
            block_hash: H256,
            full: Option<bool>,
        ) -> BoxFuture<Result<OrEmpty<RPCBlock>, Error>>;

        #[rpc(meta, name = "eth_getBlockByNumber")]
        fn block_by_number(
            &self,
            meta: Self::Metadata,
            block: BlockId,
            full: Option<bool>,
        ) -> BoxFuture<Result<OrEmpty<RPCBlock>, Error>>;

        #[rpc(meta, name = "eth_getTransactionByHash")]
        fn transaction_by_hash(
            &self,
            meta: Self::Metadata,
            tx_hash: H256,
        ) -> BoxFuture<Result<Option<RPCTransaction>, Error>>;

        #[rpc(meta, name = "eth_getTransactionByBlockHashAndIndex")]
        fn transaction_by_block_hash_and_index(
            &self,
            meta: Self::Metadata,
            block_hash: H256,
            tx_id: Hex<usize>,
        ) -> BoxFuture<Result<Option<RPCTransaction>, Error>>;

        #[rpc(meta, name = "eth_getTransactionByBlockNumberAndIndex")]
        fn transaction_by_block_number_and_index(
            &self,
            meta: Self::Metadata,
            block: BlockId,
            tx_id: Hex<usize>,
        ) -> BoxFuture<Result<Option<OrEmpty<RPCTransaction>>, Error>>;

        #[rpc(meta, name = "eth_getTransactionReceipt")]
        fn transaction_receipt(
            &self,
            meta: Self::Metadata,
            tx_hash: H256,
        ) -> BoxFuture<Result<Option<RPCReceipt>, Error>>;

        #[rpc(meta, name = "eth_call")]
        fn call(
            &self,
            meta: Self::Metadata,
            tx: RPCTransaction,
            block: Option<BlockId>,
        ) -> BoxFuture<Result<Bytes, Error>>;

        #[rpc(meta, name = "eth_estimateGas")]
        fn estimate_gas(
            &self,
            meta: Self::Metadata,
            tx: RPCTransaction,
            block: Option<BlockId>,
        ) -> BoxFuture<Result<Hex<u64>, Error>>;

        #[rpc(meta, name = "eth_getLogs")]
        fn logs(
            &self,
            meta: Self::Metadata,
            log_filter: RPCLogFilter,
        ) -> BoxFuture<Result<Vec<RPCLog>, Error>>;

        #[rpc(meta, name = "eth_pendingTransactions")]
        fn pending_transactions(
            &self,
            meta: Self::Metadata,
        ) -> Result<Vec<RPCTransaction>, Error>;

        #[rpc(meta, name = "eth_getUncleByBlockHashAndIndex")]
        fn uncle_by_block_hash_and_index(
            &self,
            meta: Self::Metadata,
            block_hash: H256,
            uncle_id: Hex<U256>,
        ) -> Result<Option<RPCBlock>, Error>;

        #[rpc(meta, name = "eth_getUncleByBlockNumberAndIndex")]
        fn uncle_by_block_number_and_index(
            &self,
            meta: Self::Metadata,
            block: BlockId,
            uncle_id: Hex<U256>,
        ) -> Result<Option<RPCBlock>, Error>;

        #[rpc(meta, name = "eth_getUncleCountByBlockHash")]
        fn block_uncles_count_by_hash(
            &self,
            meta: Self::Metadata,
            block_hash: H256,
        ) -> Result<Hex<usize>, Error>;

        #[rpc(meta, name = "eth_getUncleCountByBlockNumber")]
        fn block_uncles_count_by_number(
            &self,
            meta: Self::Metadata,
            block: BlockId,
        ) -> Result<Hex<usize>, Error>;
    }
}

pub mod bridge {
    use super::*;

    #[rpc(server)]
    pub trait BridgeERPC {
        type Metadata;

        #[rpc(meta, name = "eth_accounts")]
        fn accounts(&self, meta: Self::Metadata) -> Result<Vec<Address>, Error>;

        #[rpc(meta, name = "eth_sign")]
        fn sign(&self, meta: Self::Metadata, address: Address, data: Bytes)
            -> Result<Bytes, Error>;

        #[rpc(meta, name = "eth_signTransaction")]
        fn sign_transaction(&self, meta: Self::Metadata, tx: RPCTransaction)
            -> Result<Bytes, Error>;

        #[rpc(meta, name = "eth_sendTransaction")]
        fn send_transaction(&self, meta: Self::Metadata, tx: RPCTransaction)
            -> Result<H256, Error>;

        #[rpc(meta, name = "eth_sendRawTransaction")]
        fn send_raw_transaction(
            &self,
            meta: Self::Metadata,
            tx: Bytes,
        ) -> BoxFuture<Result<H256, Error>>;

        #[rpc(meta, name = "eth_getCompilers")]
        fn compilers(&self, meta: Self::Metadata) -> Result<Vec<String>, Error>;
    }
}
