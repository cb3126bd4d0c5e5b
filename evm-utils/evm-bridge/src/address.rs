use {
    bech32::{FromBase32, ToBase32, Variant},
    evm_rpc::{Address, Error},
    sha3::{Digest, Keccak256},
};

/// Human readable part of native account addresses.
pub const NATIVE_HRP: &str = "io";

const ADDRESS_LEN: usize = 20;

fn invalid(input: &str) -> Error {
    Error::InvalidAddress {
        input_data: input.to_string(),
    }
}

/// Decode a bech32 `io1…` address into its 20-byte Ethereum form.
pub fn to_eth_address(native: &str) -> Result<Address, Error> {
    let (hrp, data, variant) = bech32::decode(native).map_err(|_| invalid(native))?;
    if hrp != NATIVE_HRP || variant != Variant::Bech32 {
        return Err(invalid(native));
    }
    let bytes = Vec::<u8>::from_base32(&data).map_err(|_| invalid(native))?;
    if bytes.len() != ADDRESS_LEN {
        return Err(invalid(native));
    }
    Ok(Address::from_slice(&bytes))
}

/// Encode a hex Ethereum address (`0x` optional) as a native `io1…` address.
pub fn to_native_address(eth: &str) -> Result<String, Error> {
    let digits = eth
        .strip_prefix("0x")
        .or_else(|| eth.strip_prefix("0X"))
        .unwrap_or(eth);
    let bytes = hex::decode(digits).map_err(|_| invalid(eth))?;
    if bytes.len() != ADDRESS_LEN {
        return Err(invalid(eth));
    }
    encode(&bytes).ok_or_else(|| invalid(eth))
}

pub fn native_from_address(address: &Address) -> String {
    // a 20-byte payload under a valid hrp always encodes
    encode(address.as_bytes()).unwrap_or_default()
}

fn encode(bytes: &[u8]) -> Option<String> {
    bech32::encode(NATIVE_HRP, bytes.to_base32(), Variant::Bech32).ok()
}

/// Account address of a secp256k1 public key: the last 20 bytes of its keccak hash.
pub fn address_from_public_key(public_key: &[u8]) -> Address {
    let key = match public_key {
        [0x04, rest @ ..] if public_key.len() == 65 => rest,
        _ => public_key,
    };
    let hash = Keccak256::digest(key);
    Address::from_slice(&hash[12..])
}

/// Ethereum form of an optional native address; empty means absent.
pub fn optional_eth_address(native: &str) -> Result<Option<Address>, Error> {
    if native.is_empty() {
        Ok(None)
    } else {
        to_eth_address(native).map(Some)
    }
}
