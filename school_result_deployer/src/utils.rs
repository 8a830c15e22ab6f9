use ethers::{abi::Token, types::Address, utils::to_checksum};
use serde_json::{json, Value};

/// EIP-55 checksummed '0x..' string.
///
/// note that debug fmt of an address is the lowercase '0x..' hex encoding,
/// where as .to_string() (fmt) truncates it
pub fn format_address(address: &Address) -> String {
    to_checksum(address, None)
}

/// Renders a decoded ABI value for console output. The layout of the value is
/// owned by the contract, so nothing here assumes a particular shape.
pub fn token_to_json(token: &Token) -> Value {
    match token {
        Token::Address(address) => json!(format_address(address)),
        Token::FixedBytes(bytes) | Token::Bytes(bytes) => {
            json!(format!("0x{}", hex::encode(bytes)))
        }
        Token::Int(value) => {
            // two's complement, reinterpret for display
            let signed = ethers::types::I256::from_raw(*value);
            json!(signed.to_string())
        }
        Token::Uint(value) => json!(value.to_string()),
        Token::Bool(value) => json!(value),
        Token::String(value) => json!(value),
        Token::FixedArray(items) | Token::Array(items) | Token::Tuple(items) => {
            Value::Array(items.iter().map(token_to_json).collect())
        }
    }
}
