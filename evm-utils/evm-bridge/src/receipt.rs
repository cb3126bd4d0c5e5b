use {
    crate::{
        address::optional_eth_address,
        logs::assemble_log,
        native::ReceiptInfo,
    },
    evm_rpc::{Error, Hex, RPCReceipt, RPCTransaction},
    primitive_types::H256,
};

/// Native status code of a successful action.
const RECEIPT_STATUS_SUCCESS: u64 = 1;

/// Builds the Ethereum receipt of `tx_hash` from its native receipt and the
/// already assembled transaction.
pub fn assemble_receipt(
    tx_hash: H256,
    info: &ReceiptInfo,
    tx: &RPCTransaction,
) -> Result<RPCReceipt, Error> {
    let receipt = &info.receipt;
    let transaction_index = tx.transaction_index.unwrap_or(Hex(0));

    let logs = receipt
        .logs
        .iter()
        .map(|log| assemble_log(log, Some(info.blk_hash), Some(tx_hash), transaction_index.0))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RPCReceipt {
        transaction_hash: tx_hash,
        transaction_index,
        block_hash: info.blk_hash,
        block_number: Hex(receipt.blk_height),
        cumulative_gas_used: Hex(receipt.gas_consumed),
        gas_used: Hex(receipt.gas_consumed),
        contract_address: optional_eth_address(&receipt.contract_address)?,
        logs_bloom: ethbloom::Bloom::zero(),
        to: tx.to,
        from: tx.from,
        logs,
        status: Hex(usize::from(receipt.status == RECEIPT_STATUS_SUCCESS)),
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            native::{Log, Receipt},
            test_utils::native,
        },
        evm_rpc::Address,
        serde_json::json,
    };

    fn receipt_info(status: u64, contract: &str) -> ReceiptInfo {
        ReceiptInfo {
            receipt: Receipt {
                status,
                blk_height: 42,
                act_hash: H256::repeat_byte(0xcc),
                gas_consumed: 21000,
                contract_address: contract.to_string(),
                logs: vec![Log {
                    contract_address: native(&Address::repeat_byte(0x44)),
                    topics: vec![vec![0x55; 32]],
                    data: vec![1, 2],
                    blk_height: 42,
                    act_hash: H256::zero(),
                    index: 3,
                    blk_hash: H256::zero(),
                }],
            },
            blk_hash: H256::repeat_byte(0xbb),
        }
    }

    fn transaction() -> RPCTransaction {
        RPCTransaction {
            from: Some(Address::repeat_byte(0x01)),
            to: Some(Address::repeat_byte(0x02)),
            transaction_index: Some(Hex(6)),
            ..Default::default()
        }
    }

    #[test]
    fn successful_receipt() {
        let hash = H256::repeat_byte(0xcc);
        let receipt = assemble_receipt(hash, &receipt_info(1, ""), &transaction()).unwrap();
        assert_eq!(receipt.status, Hex(1));
        assert_eq!(receipt.contract_address, None);
        assert_eq!(receipt.cumulative_gas_used, receipt.gas_used);
        assert_eq!(receipt.from, Some(Address::repeat_byte(0x01)));
        assert_eq!(receipt.to, Some(Address::repeat_byte(0x02)));

        let log = &receipt.logs[0];
        assert_eq!(log.block_hash, H256::repeat_byte(0xbb));
        assert_eq!(log.transaction_hash, hash);
        assert_eq!(log.transaction_index, Hex(6));
        assert_eq!(log.log_index, Hex(3));
        assert_eq!(log.address, Address::repeat_byte(0x44));

        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["gasUsed"], json!("0x5208"));
        assert_eq!(value["blockNumber"], json!("0x2a"));
        assert_eq!(value["contractAddress"], json!(null));
        assert_eq!(value["logsBloom"], json!(format!("0x{}", "0".repeat(512))));
    }

    #[test]
    fn failed_deployment_receipt() {
        let contract = Address::repeat_byte(0x77);
        let receipt = assemble_receipt(
            H256::repeat_byte(0xcc),
            &receipt_info(106, &native(&contract)),
            &transaction(),
        )
        .unwrap();
        assert_eq!(receipt.status, Hex(0));
        assert_eq!(receipt.contract_address, Some(contract));
    }
}
