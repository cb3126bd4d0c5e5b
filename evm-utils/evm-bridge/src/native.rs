//! Wire types of the IoTeX native API in their protobuf-JSON form.
//!
//! `uint64` fields may arrive either as JSON strings or numbers, `bytes` fields
//! as base64 strings, and the block/action hashes of metas as bare hex strings.

use {
    primitive_types::{H256, U256},
    serde::{de, Deserialize, Deserializer, Serialize, Serializer},
    std::{convert::TryFrom, fmt},
};

pub mod wire {
    use {super::*, base64::Engine as _};

    pub fn u64_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct U64Visitor;

        impl<'de> de::Visitor<'de> for U64Visitor {
            type Value = u64;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an unsigned integer or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
                u64::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
                if v.is_empty() {
                    return Ok(0);
                }
                v.parse()
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }

            fn visit_unit<E: de::Error>(self) -> Result<u64, E> {
                Ok(0)
            }
        }

        deserializer.deserialize_any(U64Visitor)
    }

    pub fn u64_as_string<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    /// Decimal string amounts (balances, transfer amounts, gas prices).
    pub fn amount<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AmountVisitor;

        impl<'de> de::Visitor<'de> for AmountVisitor {
            type Value = U256;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a decimal amount")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<U256, E> {
                Ok(v.into())
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<U256, E> {
                if v.is_empty() {
                    return Ok(U256::zero());
                }
                U256::from_dec_str(v).map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }

            fn visit_unit<E: de::Error>(self) -> Result<U256, E> {
                Ok(U256::zero())
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }

    pub fn amount_as_string<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn base64_bytes<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(de::Error::custom)
    }

    pub fn bytes_as_base64<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(value))
    }

    pub fn base64_list<'de, D>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Vec<String>>::deserialize(deserializer)?
            .unwrap_or_default()
            .into_iter()
            .map(|encoded| {
                base64::engine::general_purpose::STANDARD
                    .decode(encoded.as_bytes())
                    .map_err(de::Error::custom)
            })
            .collect()
    }

    /// Hex hash, with or without `0x`. Empty means zero.
    pub fn parse_hash(input: &str) -> Result<H256, String> {
        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);
        if digits.is_empty() {
            return Ok(H256::zero());
        }
        let bytes = hex::decode(digits).map_err(|e| format!("{}: {}", input, e))?;
        if bytes.len() != 32 {
            return Err(format!("{}: expected 32 bytes, got {}", input, bytes.len()));
        }
        Ok(H256::from_slice(&bytes))
    }

    pub fn hex_hash<'de, D>(deserializer: D) -> Result<H256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let input = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        parse_hash(&input).map_err(de::Error::custom)
    }

    /// Bytes-typed hash (base64 on the wire), as found in logs and receipts.
    pub fn base64_hash<'de, D>(deserializer: D) -> Result<H256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = base64_bytes(deserializer)?;
        match bytes.len() {
            0 => Ok(H256::zero()),
            32 => Ok(H256::from_slice(&bytes)),
            len => Err(de::Error::invalid_length(len, &"32 bytes")),
        }
    }

    /// Hex string field that may also be encoded as bytes. Used for blooms.
    pub fn hex_string<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let input = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        let digits = input.strip_prefix("0x").unwrap_or(&input);
        hex::decode(digits).map_err(de::Error::custom)
    }
}

/// Protobuf timestamp, either RFC 3339 or `{seconds, nanos}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Rfc3339(String),
            Parts {
                #[serde(default, deserialize_with = "lenient_seconds")]
                seconds: i64,
                #[serde(default)]
                nanos: u32,
            },
        }

        fn lenient_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
            #[derive(Deserialize)]
            #[serde(untagged)]
            enum Seconds {
                Num(i64),
                Str(String),
            }
            match Seconds::deserialize(deserializer)? {
                Seconds::Num(n) => Ok(n),
                Seconds::Str(s) => s.parse().map_err(de::Error::custom),
            }
        }

        match Repr::deserialize(deserializer)? {
            Repr::Rfc3339(text) => {
                let parsed =
                    chrono::DateTime::parse_from_rfc3339(&text).map_err(de::Error::custom)?;
                Ok(Timestamp {
                    seconds: parsed.timestamp(),
                    nanos: parsed.timestamp_subsec_nanos(),
                })
            }
            Repr::Parts { seconds, nanos } => Ok(Timestamp { seconds, nanos }),
        }
    }
}

impl Timestamp {
    /// Unix seconds, negative timestamps clamp to zero.
    pub fn unix_seconds(&self) -> u64 {
        u64::try_from(self.seconds).unwrap_or(0)
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChainMeta {
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub height: u64,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub num_actions: u64,
    #[serde(rename = "chainID", deserialize_with = "wire::u64_lenient")]
    pub chain_id: u64,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerMeta {
    pub package_version: String,
    #[serde(rename = "packageCommitID")]
    pub package_commit_id: String,
    pub go_version: String,
    pub build_time: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountMeta {
    pub address: String,
    #[serde(deserialize_with = "wire::amount")]
    pub balance: U256,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub nonce: u64,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub pending_nonce: u64,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub num_actions: u64,
    pub is_contract: bool,
    #[serde(deserialize_with = "wire::base64_bytes")]
    pub contract_byte_code: Vec<u8>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockMeta {
    #[serde(deserialize_with = "wire::hex_hash")]
    pub hash: H256,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub height: u64,
    pub timestamp: Timestamp,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub num_actions: u64,
    pub producer_address: String,
    #[serde(deserialize_with = "wire::hex_hash")]
    pub tx_root: H256,
    #[serde(deserialize_with = "wire::hex_hash")]
    pub receipt_root: H256,
    #[serde(deserialize_with = "wire::hex_hash")]
    pub delta_state_digest: H256,
    #[serde(deserialize_with = "wire::hex_string")]
    pub logs_bloom: Vec<u8>,
    #[serde(deserialize_with = "wire::hex_hash")]
    pub previous_block_hash: H256,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub gas_limit: u64,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub gas_used: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Transfer {
    #[serde(deserialize_with = "wire::amount", serialize_with = "wire::amount_as_string")]
    pub amount: U256,
    pub recipient: String,
    #[serde(deserialize_with = "wire::base64_bytes", serialize_with = "wire::bytes_as_base64")]
    pub payload: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Execution {
    #[serde(deserialize_with = "wire::amount", serialize_with = "wire::amount_as_string")]
    pub amount: U256,
    /// Empty for contract deployments.
    pub contract: String,
    #[serde(deserialize_with = "wire::base64_bytes", serialize_with = "wire::bytes_as_base64")]
    pub data: Vec<u8>,
}

/// Payload-carrying part of an action.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeActionKind {
    Transfer(Transfer),
    Execution(Execution),
    /// Staking, rewarding, and every other kind without an Ethereum shape.
    Other,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionCore {
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub version: u64,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub nonce: u64,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub gas_limit: u64,
    #[serde(deserialize_with = "wire::amount")]
    pub gas_price: U256,
    #[serde(rename = "chainID", deserialize_with = "wire::u64_lenient")]
    pub chain_id: u64,
    pub transfer: Option<Transfer>,
    pub execution: Option<Execution>,
}

impl ActionCore {
    pub fn kind(&self) -> NativeActionKind {
        match (&self.transfer, &self.execution) {
            (Some(transfer), _) => NativeActionKind::Transfer(transfer.clone()),
            (None, Some(execution)) => NativeActionKind::Execution(execution.clone()),
            (None, None) => NativeActionKind::Other,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Action {
    pub core: ActionCore,
    #[serde(deserialize_with = "wire::base64_bytes")]
    pub sender_pub_key: Vec<u8>,
    #[serde(deserialize_with = "wire::base64_bytes")]
    pub signature: Vec<u8>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionInfo {
    pub action: Action,
    #[serde(deserialize_with = "wire::hex_hash")]
    pub act_hash: H256,
    #[serde(deserialize_with = "wire::hex_hash")]
    pub blk_hash: H256,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub blk_height: u64,
    pub sender: String,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub index: u64,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Log {
    pub contract_address: String,
    #[serde(deserialize_with = "wire::base64_list")]
    pub topics: Vec<Vec<u8>>,
    #[serde(deserialize_with = "wire::base64_bytes")]
    pub data: Vec<u8>,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub blk_height: u64,
    #[serde(deserialize_with = "wire::base64_hash")]
    pub act_hash: H256,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub index: u64,
    #[serde(deserialize_with = "wire::base64_hash")]
    pub blk_hash: H256,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Receipt {
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub status: u64,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub blk_height: u64,
    #[serde(deserialize_with = "wire::base64_hash")]
    pub act_hash: H256,
    #[serde(deserialize_with = "wire::u64_lenient")]
    pub gas_consumed: u64,
    pub contract_address: String,
    pub logs: Vec<Log>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceiptInfo {
    pub receipt: Receipt,
    #[serde(deserialize_with = "wire::hex_hash")]
    pub blk_hash: H256,
}

/// Block selector of `GetBlockMetas`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BlockMetasRequest {
    ByIndex {
        #[serde(serialize_with = "wire::u64_as_string")]
        start: u64,
        #[serde(serialize_with = "wire::u64_as_string")]
        count: u64,
    },
    ByHash {
        #[serde(rename = "blkHash")]
        blk_hash: String,
    },
}

/// Action selector of `GetActions`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ActionsRequest {
    ByHash {
        #[serde(rename = "actionHash")]
        action_hash: String,
        #[serde(rename = "checkPending")]
        check_pending: bool,
    },
    ByBlk {
        #[serde(rename = "blkHash")]
        blk_hash: String,
        #[serde(serialize_with = "wire::u64_as_string")]
        start: u64,
        #[serde(serialize_with = "wire::u64_as_string")]
        count: u64,
    },
}

impl ActionsRequest {
    pub fn by_hash(hash: &H256) -> Self {
        ActionsRequest::ByHash {
            action_hash: hash_to_native(hash),
            check_pending: true,
        }
    }

    pub fn by_block(block_hash: &H256, start: u64, count: u64) -> Self {
        ActionsRequest::ByBlk {
            blk_hash: hash_to_native(block_hash),
            start,
            count,
        }
    }
}

/// Bare lowercase hex, the form native hash parameters take.
pub fn hash_to_native(hash: &H256) -> String {
    hex::encode(hash.as_bytes())
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LogTopics {
    #[serde(serialize_with = "topic_list")]
    pub topic: Vec<H256>,
}

fn topic_list<S>(topics: &[H256], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    use serde::ser::SerializeSeq;
    let mut seq = serializer.serialize_seq(Some(topics.len()))?;
    for topic in topics {
        seq.serialize_element(&base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            topic.as_bytes(),
        ))?;
    }
    seq.end()
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LogsFilter {
    pub address: Vec<String>,
    pub topics: Vec<LogTopics>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogsRange {
    #[serde(serialize_with = "wire::u64_as_string")]
    pub from_block: u64,
    #[serde(serialize_with = "wire::u64_as_string")]
    pub to_block: u64,
    #[serde(serialize_with = "wire::u64_as_string")]
    pub pagination_size: u64,
    #[serde(serialize_with = "wire::u64_as_string")]
    pub count: u64,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogsRequest {
    pub filter: LogsFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_range: Option<LogsRange>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadContractRequest {
    pub execution: Execution,
    pub caller_address: String,
    #[serde(serialize_with = "wire::u64_as_string")]
    pub gas_limit: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EstimateGasRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer: Option<Transfer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<Execution>,
    pub caller_address: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SendRawTransactionRequest {
    #[serde(rename = "chainID")]
    pub chain_id: u64,
    /// Signed transaction bytes as bare hex.
    pub data: String,
}
