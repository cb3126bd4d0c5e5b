use {
    jsonrpc_core::Error as JRpcError,
    snafu::Snafu,
};

#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Failed to decode Hex({})", input_data))]
    #[snafu(context(suffix(Error)))]
    HexError {
        input_data: String,
        source: hex::FromHexError,
    },

    #[snafu(display("Invalid hex prefix in Hex({})", input_data))]
    InvalidHexPrefix { input_data: String },

    #[snafu(display("Invalid quantity({})", input_data))]
    InvalidQuantity { input_data: String },

    #[snafu(display("Invalid address({})", input_data))]
    InvalidAddress { input_data: String },

    #[snafu(display("Failed to find {}", entity))]
    NotFound { entity: String },

    #[snafu(display("Failed to process native chain request: {}", source))]
    #[snafu(context(suffix(Error)))]
    ProxyRpcError { source: JRpcError },

    #[snafu(display("Failed to execute request, rpc return error: {}", source))]
    #[snafu(context(suffix(Error)))]
    NativeRpcError {
        details: String,
        source: anyhow::Error,
        verbose: bool,
    },

    #[snafu(display("Method unimplemented"))]
    Unimplemented {},

    #[snafu(display("Invalid rpc params: {}", details))]
    InvalidParams { details: String },
}

pub fn internal_error_with_details<T: ToString, U: ToString>(
    code: i64,
    message: &T,
    data: &U,
) -> JRpcError {
    JRpcError {
        code: jsonrpc_core::ErrorCode::ServerError(code),
        message: message.to_string(),
        data: serde_json::Value::String(data.to_string()).into(),
    }
}

pub fn internal_error<T: ToString>(code: i64, message: &T) -> JRpcError {
    JRpcError {
        code: jsonrpc_core::ErrorCode::ServerError(code),
        message: message.to_string(),
        data: None,
    }
}
const NATIVE_RPC_ERROR: i64 = 1003;

const NOT_FOUND_RPC_ERROR: i64 = 2001;

// "Method not supported", EIP-1474
pub const METHOD_NOT_SUPPORTED: i64 = -32004;

impl From<Error> for JRpcError {
    fn from(err: Error) -> Self {
        match &err {
            Error::HexError { source, .. } => {
                Self::invalid_params_with_details(err.to_string(), source)
            }
            Error::InvalidHexPrefix { .. } => Self::invalid_params(err.to_string()),
            Error::InvalidQuantity { .. } => Self::invalid_params(err.to_string()),
            Error::InvalidAddress { .. } => Self::invalid_params(err.to_string()),
            // NOTE: add context information of the error
            Error::InvalidParams { .. } => Self::invalid_params(err.to_string()),
            Error::ProxyRpcError { source } => source.clone(),
            Error::NativeRpcError {
                source: _source,
                details,
                verbose,
            } => {
                if *verbose {
                    // in verbose mode, print full details in message, and ignore original message.
                    internal_error_with_details(NATIVE_RPC_ERROR, &details, &"")
                } else {
                    internal_error_with_details(NATIVE_RPC_ERROR, &err, &details)
                }
            }
            Error::NotFound { .. } => internal_error(NOT_FOUND_RPC_ERROR, &err),
            Error::Unimplemented {} => internal_error(METHOD_NOT_SUPPORTED, &err),
        }
    }
}

pub fn into_native_error<E>(e: E, verbose: bool) -> Error
where
    E: Into<anyhow::Error> + std::fmt::Debug,
{
    let details = format!("{:?}", e);
    Error::NativeRpcError {
        source: e.into(),
        details,
        verbose,
    }
}

#[cfg(test)]
mod test {
    use {super::*, jsonrpc_core::ErrorCode};

    #[test]
    fn codec_failures_are_invalid_params() {
        let error: JRpcError = Error::InvalidAddress {
            input_data: "io1zzz".to_string(),
        }
        .into();
        assert_eq!(error.code, ErrorCode::InvalidParams);
        assert_eq!(error.message, "Invalid address(io1zzz)");

        let error: JRpcError = Error::InvalidQuantity {
            input_data: "0xzz".to_string(),
        }
        .into();
        assert_eq!(error.code, ErrorCode::InvalidParams);
    }

    #[test]
    fn unimplemented_has_stable_code() {
        let error: JRpcError = Error::Unimplemented {}.into();
        assert_eq!(error.code, ErrorCode::ServerError(METHOD_NOT_SUPPORTED));
        assert_eq!(error.message, "Method unimplemented");
    }

    #[test]
    fn native_errors_respect_verbosity() {
        let quiet: JRpcError = into_native_error(anyhow::anyhow!("connection reset"), false).into();
        assert_eq!(quiet.code, ErrorCode::ServerError(NATIVE_RPC_ERROR));
        assert!(quiet.message.starts_with("Failed to execute request"));

        let verbose: JRpcError = into_native_error(anyhow::anyhow!("connection reset"), true).into();
        assert_eq!(verbose.message, "connection reset");
    }

    #[test]
    fn proxy_errors_are_forwarded() {
        let upstream = JRpcError {
            code: ErrorCode::ServerError(-32000),
            message: "insufficient balance".to_string(),
            data: None,
        };
        let error: JRpcError = Error::ProxyRpcError {
            source: upstream.clone(),
        }
        .into();
        assert_eq!(error, upstream);
    }
}
