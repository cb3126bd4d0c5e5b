use {
    crate::native::{
        AccountMeta, ActionInfo, ActionsRequest, BlockMeta, BlockMetasRequest, ChainMeta,
        EstimateGasRequest, Log, LogsRequest, ReadContractRequest, ReceiptInfo,
        SendRawTransactionRequest, ServerMeta,
    },
    async_trait::async_trait,
    log::*,
    reqwest::{
        header::{CONTENT_TYPE, RETRY_AFTER},
        StatusCode,
    },
    serde::{de::DeserializeOwned, Deserialize, Serialize},
    serde_json::{json, Value},
    snafu::{ResultExt, Snafu},
    std::{fmt, sync::Arc, time::Duration},
    tokio::time::sleep,
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ClientError {
    #[snafu(display("Native entity not found: {}", message))]
    NotFound { message: String },

    #[snafu(display("Native rpc error {}: {}", code, message))]
    Rpc { code: String, message: String },

    #[snafu(display("Native transport failure: {}", source))]
    Transport { source: reqwest::Error },

    #[snafu(display("Failed to decode native response of {}: {}", method, source))]
    Decode {
        method: NativeMethod,
        source: serde_json::Error,
    },
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Native API methods reachable through the JSON transcoding gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeMethod {
    GetChainMeta,
    GetServerMeta,
    GetAccount,
    GetBlockMetas,
    GetActions,
    GetReceiptByAction,
    GetLogs,
    SuggestGasPrice,
    EstimateActionGasConsumption,
    ReadContract,
    SendRawTransaction,
}

impl fmt::Display for NativeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = match self {
            NativeMethod::GetChainMeta => "GetChainMeta",
            NativeMethod::GetServerMeta => "GetServerMeta",
            NativeMethod::GetAccount => "GetAccount",
            NativeMethod::GetBlockMetas => "GetBlockMetas",
            NativeMethod::GetActions => "GetActions",
            NativeMethod::GetReceiptByAction => "GetReceiptByAction",
            NativeMethod::GetLogs => "GetLogs",
            NativeMethod::SuggestGasPrice => "SuggestGasPrice",
            NativeMethod::EstimateActionGasConsumption => "EstimateActionGasConsumption",
            NativeMethod::ReadContract => "ReadContract",
            NativeMethod::SendRawTransaction => "SendRawTransaction",
        };
        f.write_str(method)
    }
}

/// Client side of the native chain API used by the bridge.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_chain_meta(&self) -> ClientResult<ChainMeta>;

    async fn get_server_meta(&self) -> ClientResult<ServerMeta>;

    async fn get_account(&self, address: &str) -> ClientResult<AccountMeta>;

    async fn get_block_metas(&self, request: BlockMetasRequest) -> ClientResult<Vec<BlockMeta>>;

    async fn get_actions(&self, request: ActionsRequest) -> ClientResult<Vec<ActionInfo>>;

    async fn get_receipt_by_action(&self, action_hash: &str) -> ClientResult<ReceiptInfo>;

    async fn get_logs(&self, request: LogsRequest) -> ClientResult<Vec<Log>>;

    async fn suggest_gas_price(&self) -> ClientResult<u64>;

    async fn estimate_gas(&self, request: EstimateGasRequest) -> ClientResult<u64>;

    /// Returns the hex encoded return data of the call.
    async fn read_contract(&self, request: ReadContractRequest) -> ClientResult<String>;

    /// Returns the hex encoded hash of the accepted action.
    async fn send_raw_transaction(&self, chain_id: u64, data: &[u8]) -> ClientResult<String>;
}

#[derive(Deserialize, Debug)]
struct NativeErrorObject {
    #[serde(default)]
    code: Value,
    #[serde(default, alias = "error")]
    message: String,
}

impl NativeErrorObject {
    fn code(&self) -> String {
        match &self.code {
            Value::String(code) => code.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    fn is_not_found(&self) -> bool {
        // gRPC status 5 / connect code "not_found"
        let code = self.code();
        code == "5" || code.eq_ignore_ascii_case("not_found") || code.eq_ignore_ascii_case("notfound")
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ChainMetaResponse {
    chain_meta: ChainMeta,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ServerMetaResponse {
    server_meta: ServerMeta,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct AccountResponse {
    account_meta: AccountMeta,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct BlockMetasResponse {
    blk_metas: Vec<BlockMeta>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ActionsResponse {
    action_info: Vec<ActionInfo>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ReceiptResponse {
    receipt_info: Option<ReceiptInfo>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct LogsResponse {
    logs: Vec<Log>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct GasPriceResponse {
    #[serde(deserialize_with = "crate::native::wire::u64_lenient")]
    gas_price: u64,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct EstimateGasResponse {
    #[serde(deserialize_with = "crate::native::wire::u64_lenient")]
    gas: u64,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ReadContractResponse {
    data: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct SendRawTransactionResponse {
    action_hash: String,
}

/// HTTP client of the native API JSON gateway.
pub struct AsyncRpcClient {
    client: Arc<reqwest::Client>,
    url: String,
}

impl AsyncRpcClient {
    pub fn new(url: String) -> Result<Self, ClientError> {
        Self::new_with_timeout(url, Duration::from_secs(30))
    }

    pub fn new_with_timeout(url: String, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context(TransportSnafu)?;

        Ok(Self {
            client: Arc::new(client),
            url: url.trim_end_matches('/').to_string(),
        })
    }

    fn method_url(&self, method: NativeMethod) -> String {
        format!("{}/iotexapi.APIService/{}", self.url, method)
    }

    pub async fn send<T, R>(&self, method: NativeMethod, request: &R) -> ClientResult<T>
    where
        T: DeserializeOwned,
        R: Serialize + ?Sized,
    {
        let body = serde_json::to_string(request).context(DecodeSnafu { method })?;
        trace!("{} request: {}", method, body);

        let response = self.send_request(method, body).await.context(TransportSnafu)?;
        let status = response.status();
        let text = response.text().await.context(TransportSnafu)?;
        trace!("{} response ({}): {}", method, status, text);

        if !status.is_success() {
            let error = serde_json::from_str::<NativeErrorObject>(&text).ok();
            if status == StatusCode::NOT_FOUND
                || error.as_ref().map_or(false, NativeErrorObject::is_not_found)
            {
                return Err(ClientError::NotFound {
                    message: error.map(|e| e.message).unwrap_or(text),
                });
            }
            return Err(match error {
                Some(error) => ClientError::Rpc {
                    code: error.code(),
                    message: error.message,
                },
                None => ClientError::Rpc {
                    code: status.as_u16().to_string(),
                    message: text,
                },
            });
        }

        serde_json::from_str(&text).context(DecodeSnafu { method })
    }

    async fn send_request(
        &self,
        method: NativeMethod,
        body: String,
    ) -> reqwest::Result<reqwest::Response> {
        let url = self.method_url(method);
        let mut too_many_requests_retries = 5;
        loop {
            let response = self
                .client
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone())
                .send()
                .await?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS && too_many_requests_retries > 0
            {
                let mut duration = Duration::from_millis(500);
                if let Some(retry_after) = response.headers().get(RETRY_AFTER) {
                    if let Ok(retry_after) = retry_after.to_str() {
                        if let Ok(retry_after) = retry_after.parse::<u64>() {
                            if retry_after < 120 {
                                duration = Duration::from_secs(retry_after);
                            }
                        }
                    }
                }

                too_many_requests_retries -= 1;
                debug!(
                    "Too many requests: server responded with {:?}, {} retries left, pausing for {:?}",
                    response, too_many_requests_retries, duration
                );

                sleep(duration).await;
                continue;
            }
            return Ok(response);
        }
    }
}

#[async_trait]
impl ChainClient for AsyncRpcClient {
    async fn get_chain_meta(&self) -> ClientResult<ChainMeta> {
        let response: ChainMetaResponse = self.send(NativeMethod::GetChainMeta, &json!({})).await?;
        Ok(response.chain_meta)
    }

    async fn get_server_meta(&self) -> ClientResult<ServerMeta> {
        let response: ServerMetaResponse =
            self.send(NativeMethod::GetServerMeta, &json!({})).await?;
        Ok(response.server_meta)
    }

    async fn get_account(&self, address: &str) -> ClientResult<AccountMeta> {
        let response: AccountResponse = self
            .send(NativeMethod::GetAccount, &json!({ "address": address }))
            .await?;
        Ok(response.account_meta)
    }

    async fn get_block_metas(&self, request: BlockMetasRequest) -> ClientResult<Vec<BlockMeta>> {
        let response: BlockMetasResponse = self.send(NativeMethod::GetBlockMetas, &request).await?;
        Ok(response.blk_metas)
    }

    async fn get_actions(&self, request: ActionsRequest) -> ClientResult<Vec<ActionInfo>> {
        let response: ActionsResponse = self.send(NativeMethod::GetActions, &request).await?;
        Ok(response.action_info)
    }

    async fn get_receipt_by_action(&self, action_hash: &str) -> ClientResult<ReceiptInfo> {
        let response: ReceiptResponse = self
            .send(
                NativeMethod::GetReceiptByAction,
                &json!({ "actionHash": action_hash }),
            )
            .await?;
        response.receipt_info.ok_or_else(|| ClientError::NotFound {
            message: format!("receipt of {}", action_hash),
        })
    }

    async fn get_logs(&self, request: LogsRequest) -> ClientResult<Vec<Log>> {
        let response: LogsResponse = self.send(NativeMethod::GetLogs, &request).await?;
        Ok(response.logs)
    }

    async fn suggest_gas_price(&self) -> ClientResult<u64> {
        let response: GasPriceResponse =
            self.send(NativeMethod::SuggestGasPrice, &json!({})).await?;
        Ok(response.gas_price)
    }

    async fn estimate_gas(&self, request: EstimateGasRequest) -> ClientResult<u64> {
        let response: EstimateGasResponse = self
            .send(NativeMethod::EstimateActionGasConsumption, &request)
            .await?;
        Ok(response.gas)
    }

    async fn read_contract(&self, request: ReadContractRequest) -> ClientResult<String> {
        let response: ReadContractResponse =
            self.send(NativeMethod::ReadContract, &request).await?;
        Ok(response.data)
    }

    async fn send_raw_transaction(&self, chain_id: u64, data: &[u8]) -> ClientResult<String> {
        let request = SendRawTransactionRequest {
            chain_id,
            data: hex::encode(data),
        };
        let response: SendRawTransactionResponse =
            self.send(NativeMethod::SendRawTransaction, &request).await?;
        Ok(response.action_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_urls() {
        let client = AsyncRpcClient::new("https://gateway.example/".to_string()).unwrap();
        assert_eq!(
            client.method_url(NativeMethod::GetBlockMetas),
            "https://gateway.example/iotexapi.APIService/GetBlockMetas"
        );
        assert_eq!(
            client.method_url(NativeMethod::EstimateActionGasConsumption),
            "https://gateway.example/iotexapi.APIService/EstimateActionGasConsumption"
        );
    }

    #[test]
    fn native_error_codes() {
        let error: NativeErrorObject =
            serde_json::from_str(r#"{"code":"not_found","message":"block 9 missing"}"#).unwrap();
        assert!(error.is_not_found());

        let error: NativeErrorObject =
            serde_json::from_str(r#"{"code":5,"message":"action missing"}"#).unwrap();
        assert!(error.is_not_found());
        assert_eq!(error.code(), "5");

        let error: NativeErrorObject =
            serde_json::from_str(r#"{"code":"invalid_argument","message":"bad hash"}"#).unwrap();
        assert!(!error.is_not_found());
        assert_eq!(error.message, "bad hash");
    }

    #[test]
    fn responses_tolerate_missing_fields() {
        let response: ActionsResponse = serde_json::from_str("{}").unwrap();
        assert!(response.action_info.is_empty());
        let response: GasPriceResponse = serde_json::from_str(r#"{"gasPrice":"1000000000000"}"#)
            .unwrap();
        assert_eq!(response.gas_price, 1_000_000_000_000);
        let response: ChainMetaResponse =
            serde_json::from_str(r#"{"chainMeta":{"height":"77","chainID":4689}}"#).unwrap();
        assert_eq!(response.chain_meta.height, 77);
        assert_eq!(response.chain_meta.chain_id, 4689);
    }
}
