//! Wire message shapes for the `Config.*` commands.
//!
//! Argument structs tolerate absent fields (every field has a default),
//! mirroring the original handler table where all parameters are
//! optional. `value` accepts `config` as a synonym for compatibility
//! with older tooling.

use serde::Deserialize;
use serde_json::{Value as Json, json};

/// Method name for reading configuration.
pub const METHOD_GET: &str = "Config.Get";
/// Method name for merging a partial update.
pub const METHOD_SET: &str = "Config.Set";
/// Method name for persisting the live snapshot.
pub const METHOD_SAVE: &str = "Config.Save";

/// Arguments of `Config.Get`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GetArgs {
    pub key: Option<String>,
    pub level: Option<i32>,
}

/// Arguments of `Config.Set`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SetArgs {
    pub key: Option<String>,
    /// `config` is a synonym for `value`.
    #[serde(alias = "config")]
    pub value: Option<Json>,
    pub level: Option<i32>,
    pub save: bool,
    pub try_once: bool,
    pub reboot: bool,
}

/// Arguments of `Config.Save`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SaveArgs {
    pub try_once: bool,
    pub reboot: bool,
}

/// Response frame handed back to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcResponse {
    /// Successful result payload.
    Success(Json),
    /// Error (or advisory, code 418) frame.
    Error { code: i32, message: String },
}

impl RpcResponse {
    pub fn success(payload: Json) -> Self {
        Self::Success(payload)
    }

    /// The `{saved: bool}` result shared by Set and Save.
    pub fn saved(saved: bool) -> Self {
        Self::Success(json!({ "saved": saved }))
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_args_value_and_config_are_synonyms() {
        let a: SetArgs = serde_json::from_value(json!({"value": {"n": 1}})).unwrap();
        let b: SetArgs = serde_json::from_value(json!({"config": {"n": 1}})).unwrap();
        assert_eq!(a.value, b.value);
        assert!(a.value.is_some());
    }

    #[test]
    fn absent_fields_take_defaults() {
        let args: SetArgs = serde_json::from_value(json!({})).unwrap();
        assert!(args.key.is_none());
        assert!(args.value.is_none());
        assert!(args.level.is_none());
        assert!(!args.save && !args.try_once && !args.reboot);
    }

    #[test]
    fn saved_response_shape() {
        assert_eq!(
            RpcResponse::saved(true),
            RpcResponse::Success(json!({"saved": true}))
        );
    }
}
