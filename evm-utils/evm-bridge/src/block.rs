use {
    crate::{
        address::to_eth_address,
        native::{ActionInfo, BlockMeta},
        transaction::{assemble_transaction, TransactionLocation},
    },
    evm_rpc::{Bytes, Either, Error, Hex, RPCBlock, EMPTY_UNCLES_HASH},
    log::*,
    primitive_types::U256,
    std::convert::TryFrom,
};

/// Constant difficulty reported for every block.
pub const BLOCK_DIFFICULTY: &str = "0xfffffffffffffffffffffffffffffffe";

/// Constant total difficulty reported for every block.
pub const BLOCK_TOTAL_DIFFICULTY: &str = "0xff14700000000000000000000000486001d72";

pub fn block_difficulty() -> U256 {
    U256::from(u128::MAX - 1)
}

pub fn block_total_difficulty() -> U256 {
    // 0xff147 << 128 | 0x486001d72
    (U256::from(0xff147u64) << 128) | U256::from(0x4_8600_1d72u64)
}

/// Number of actions to request for a block, bounded by the page ceiling.
pub fn actions_page(meta: &BlockMeta, ceiling: u64) -> u64 {
    if meta.num_actions > ceiling {
        warn!(
            "Block {} has {} actions, only the first {} are returned",
            meta.height, meta.num_actions, ceiling
        );
    }
    meta.num_actions.min(ceiling)
}

/// Builds the Ethereum view of a block from its meta and the fetched actions.
pub fn assemble_block(
    meta: &BlockMeta,
    actions: &[ActionInfo],
    full: bool,
) -> Result<RPCBlock, Error> {
    let producer = to_eth_address(&meta.producer_address)?;

    let transactions = if full {
        let txs = actions
            .iter()
            .enumerate()
            .map(|(index, info)| {
                let location = TransactionLocation {
                    block_hash: meta.hash,
                    block_number: meta.height,
                    index,
                };
                assemble_transaction(info, Some(location))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Either::Right(txs)
    } else {
        Either::Left(actions.iter().map(|info| info.act_hash).collect())
    };

    let logs_bloom = if meta.logs_bloom.len() == 256 {
        ethbloom::Bloom::from_slice(&meta.logs_bloom)
    } else {
        ethbloom::Bloom::zero()
    };

    Ok(RPCBlock {
        number: Hex(meta.height),
        hash: meta.hash,
        parent_hash: meta.previous_block_hash,
        size: Hex(usize::try_from(meta.num_actions).unwrap_or(usize::MAX)),
        gas_limit: Hex(meta.gas_limit),
        gas_used: Hex(meta.gas_used),
        timestamp: Hex(meta.timestamp.unix_seconds()),
        transactions,
        transactions_root: meta.tx_root,
        state_root: meta.delta_state_digest,
        receipts_root: meta.receipt_root,
        sha3_uncles: EMPTY_UNCLES_HASH,
        logs_bloom,
        author: producer,
        miner: producer,
        difficulty: Hex(block_difficulty()),
        total_difficulty: Hex(block_total_difficulty()),
        extra_data: Bytes(vec![]),
        uncles: vec![],
    })
}
