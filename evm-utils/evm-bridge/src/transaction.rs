use {
    crate::{
        address::{address_from_public_key, optional_eth_address, to_eth_address},
        native::{ActionInfo, NativeActionKind},
    },
    evm_rpc::{Bytes, Error, Hex, RPCTransaction},
    primitive_types::{H256, U256},
    std::convert::TryFrom,
};

/// Position of an action inside a block, overriding what the action record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionLocation {
    pub block_hash: H256,
    pub block_number: u64,
    pub index: usize,
}

/// Builds the Ethereum view of a native action.
///
/// Transfers map their recipient and amount, executions their contract, amount and
/// call data; any other action kind carries no payload. `creates` is left empty,
/// see [`crate::bridge::EvmBridge::with_creates`] for the receipt follow-up.
pub fn assemble_transaction(
    info: &ActionInfo,
    location: Option<TransactionLocation>,
) -> Result<RPCTransaction, Error> {
    let core = &info.action.core;

    let (to, value, input) = match core.kind() {
        NativeActionKind::Transfer(transfer) => {
            (Some(to_eth_address(&transfer.recipient)?), transfer.amount, vec![])
        }
        NativeActionKind::Execution(execution) => (
            optional_eth_address(&execution.contract)?,
            execution.amount,
            execution.data,
        ),
        NativeActionKind::Other => (None, U256::zero(), vec![]),
    };

    let location = location.unwrap_or(TransactionLocation {
        block_hash: info.blk_hash,
        block_number: info.blk_height,
        index: usize::try_from(info.index).unwrap_or(usize::MAX),
    });

    Ok(RPCTransaction {
        from: Some(address_from_public_key(&info.action.sender_pub_key)),
        to,
        creates: None,
        gas: Some(Hex(core.gas_limit.into())),
        gas_price: Some(Hex(core.gas_price)),
        value: Some(Hex(value)),
        input: Some(Bytes(input)),
        nonce: Some(Hex(core.nonce.into())),
        hash: Some(info.act_hash),
        block_hash: Some(location.block_hash),
        block_number: Some(Hex(location.block_number)),
        transaction_index: Some(Hex(location.index)),
        public_key: Some(Bytes(info.action.sender_pub_key.clone())),
        chain_id: None,
        raw: Some(Bytes(vec![])),
        r: Some(Bytes(vec![])),
        s: Some(Bytes(vec![])),
        standard_v: Some(Hex(1)),
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::test_utils::{execution_action, native, transfer_action, SENDER_PUBKEY},
        serde_json::json,
    };

    #[test]
    fn transfer_maps_recipient_and_amount() {
        let recipient = evm_rpc::Address::repeat_byte(0x22);
        let info = transfer_action(H256::repeat_byte(1), &native(&recipient), 5);
        let tx = assemble_transaction(&info, None).unwrap();

        assert_eq!(tx.to, Some(recipient));
        assert_eq!(tx.value, Some(Hex(U256::from(5))));
        assert_eq!(tx.input, Some(Bytes(vec![])));
        assert_eq!(tx.hash, Some(H256::repeat_byte(1)));
        assert_eq!(
            tx.from,
            Some(address_from_public_key(&hex::decode(SENDER_PUBKEY).unwrap()))
        );

        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["value"], json!("0x5"));
        assert_eq!(value["input"], json!("0x"));
        assert_eq!(value["chainId"], json!(null));
        assert_eq!(value["creates"], json!(null));
        assert_eq!(value["raw"], json!("0x"));
        assert_eq!(value["r"], json!("0x"));
        assert_eq!(value["s"], json!("0x"));
        assert_eq!(value["standardV"], json!("0x1"));
        assert_eq!(value["nonce"], json!("0x3"));
        assert_eq!(value["gas"], json!("0x5208"));
    }

    #[test]
    fn deployment_has_no_recipient() {
        let info = execution_action(H256::repeat_byte(2), "", vec![0x60, 0x80]);
        let tx = assemble_transaction(&info, None).unwrap();
        assert_eq!(tx.to, None);
        assert_eq!(tx.input, Some(Bytes(vec![0x60, 0x80])));
        assert_eq!(serde_json::to_value(&tx).unwrap()["to"], json!(null));
    }

    #[test]
    fn location_override() {
        let contract = evm_rpc::Address::repeat_byte(0x33);
        let mut info = execution_action(H256::repeat_byte(3), &native(&contract), vec![1]);
        info.blk_height = 10;
        info.index = 4;
        let tx = assemble_transaction(&info, None).unwrap();
        assert_eq!(tx.block_number, Some(Hex(10)));
        assert_eq!(tx.transaction_index, Some(Hex(4)));
        assert_eq!(tx.to, Some(contract));

        let location = TransactionLocation {
            block_hash: H256::repeat_byte(9),
            block_number: 11,
            index: 1,
        };
        let tx = assemble_transaction(&info, Some(location)).unwrap();
        assert_eq!(tx.block_hash, Some(H256::repeat_byte(9)));
        assert_eq!(tx.block_number, Some(Hex(11)));
        assert_eq!(tx.transaction_index, Some(Hex(1)));
    }

    #[test]
    fn unknown_kind_has_empty_payload() {
        let mut info = transfer_action(H256::repeat_byte(4), &native(&Default::default()), 1);
        info.action.core.transfer = None;
        let tx = assemble_transaction(&info, None).unwrap();
        assert_eq!(tx.to, None);
        assert_eq!(tx.value, Some(Hex(U256::zero())));
        assert_eq!(tx.input, Some(Bytes(vec![])));
    }

    #[test]
    fn malformed_recipient_is_an_error() {
        let info = transfer_action(H256::repeat_byte(5), "io1broken", 1);
        assert!(matches!(
            assemble_transaction(&info, None),
            Err(Error::InvalidAddress { .. })
        ));
    }
}
