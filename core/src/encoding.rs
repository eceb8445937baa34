//! Wire formats spoken by the two CircleCI API flavours.
//!
//! `Client<E>` is generic over an [`Encoding`], which fixes the default base
//! URL, the content negotiation headers, the authentication cookie, and how
//! request payloads and response bodies are encoded.

use serde::de::DeserializeOwned;

use crate::auth::AuthScheme;
use crate::error::{BoxError, DecodeError, DecodeStage};
use crate::transit;

pub trait Encoding: Send + Sync + 'static {
    /// Request payload before encoding.
    type Payload: Send + Sync;

    const DEFAULT_BASE_URL: &'static str;
    const ACCEPT: &'static str;
    /// Sent only when the request has a body.
    const CONTENT_TYPE: &'static str;
    const AUTH: AuthScheme;

    fn encode(payload: &Self::Payload) -> Result<String, BoxError>;

    fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError>;
}

/// REST v2: plain JSON, authenticated with an API token cookie.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Encoding for Json {
    type Payload = serde_json::Value;

    const DEFAULT_BASE_URL: &'static str = "https://circleci.com/api/v2";
    const ACCEPT: &'static str = "application/json";
    const CONTENT_TYPE: &'static str = "application/json";
    const AUTH: AuthScheme = AuthScheme::TokenCookie;

    fn encode(payload: &Self::Payload) -> Result<String, BoxError> {
        Ok(serde_json::to_string(payload)?)
    }

    fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
        serde_json::from_slice(body).map_err(|e| DecodeError::new(DecodeStage::Unmarshal, e))
    }
}

/// Query API: transit+json, authenticated with a browser session cookie.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transit;

impl Encoding for Transit {
    type Payload = transit::Value;

    const DEFAULT_BASE_URL: &'static str = "https://circleci.com/query-api";
    const ACCEPT: &'static str = "application/transit+json; charset=UTF-8";
    const CONTENT_TYPE: &'static str = "application/transit+json";
    const AUTH: AuthScheme = AuthScheme::SessionCookie;

    fn encode(payload: &Self::Payload) -> Result<String, BoxError> {
        Ok(transit::to_string(payload)?)
    }

    /// Transit bytes, then a transit value tree, then plain JSON, then JSON
    /// bytes, then `T`. Each step reports its own [`DecodeStage`].
    fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
        let value =
            transit::from_slice(body).map_err(|e| DecodeError::new(DecodeStage::DecodeTransit, e))?;
        let json = value
            .to_json()
            .map_err(|e| DecodeError::new(DecodeStage::ConvertTransit, e))?;
        let bytes =
            serde_json::to_vec(&json).map_err(|e| DecodeError::new(DecodeStage::Marshal, e))?;
        serde_json::from_slice(&bytes).map_err(|e| DecodeError::new(DecodeStage::Unmarshal, e))
    }
}
