//! Compact text encoding of environment objects for embedding in markup.
//!
//! A token is the standard base64 of a JSON object string.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::CodecError;

/// Encodes `env` as a base64 JSON object, leaving out the keys in `exclude`.
pub fn encode_env<T: Serialize + ?Sized>(env: &T, exclude: &[&str]) -> Result<String, CodecError> {
    let Value::Object(mut object) = serde_json::to_value(env)? else {
        return Err(CodecError::NotAnObject);
    };
    object.retain(|key, _| !exclude.contains(&key.as_str()));
    let json = serde_json::to_string(&object)?;
    Ok(STANDARD.encode(json))
}

/// Decodes a token made by [`encode_env`]. An empty token is `None`.
pub fn decode_env(token: &str) -> Result<Option<Map<String, Value>>, CodecError> {
    decode_env_as(token)
}

/// Like [`decode_env`], deserializing into `T`.
pub fn decode_env_as<T: DeserializeOwned>(token: &str) -> Result<Option<T>, CodecError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }
    let json = STANDARD.decode(token)?;
    Ok(Some(serde_json::from_slice(&json)?))
}
