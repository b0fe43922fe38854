//! RPC engine — dispatches decoded `Config.*` requests to the service.
//!
//! **Transport-decoupled**: the engine does not own a transport. Callers
//! feed `(method, args)` pairs via [`dispatch`](RpcEngine::dispatch) and
//! receive an [`RpcResponse`] to frame and send. The platform's RPC
//! channel registers the three method names and bridges to this engine.
//!
//! The engine is also where service errors become wire codes:
//!
//! | condition                    | code | message                        |
//! |------------------------------|------|--------------------------------|
//! | unknown key                  |  404 | `invalid config key`           |
//! | level out of range           |  400 | `invalid config level`         |
//! | missing value                |  400 | `value is required`            |
//! | write to vendor layer        |  400 | `not allowed`                  |
//! | storage load failure         |  400 | `failed to load config`        |
//! | payload parse / access       |  400 | `invalid config value: <why>`  |
//! | persistence failure          |   -1 | `error saving config: <why>`   |
//! | restart after first flash    |  418 | manual-reset advisory          |

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value as Json;

use crate::app::commands::{GetRequest, SaveRequest, SetRequest};
use crate::app::ports::{EventSink, LevelStorePort, SystemPort};
use crate::app::service::{ConfigService, SaveOutcome, SetOutcome};
use crate::error::ServiceError;
use crate::level::LevelSelect;

use super::messages::{
    GetArgs, METHOD_GET, METHOD_SAVE, METHOD_SET, RpcResponse, SaveArgs, SetArgs,
};

const MANUAL_RESET_ADVISORY: &str =
    "configuration has been saved but manual device reset is required";

/// Dispatches `Config.*` methods onto a [`ConfigService`].
pub struct RpcEngine {
    service: ConfigService,
}

impl RpcEngine {
    pub fn new(service: ConfigService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &ConfigService {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut ConfigService {
        &mut self.service
    }

    /// Dispatch one decoded request. Runs to completion before the next
    /// request is handed in; the transport must not interleave calls.
    pub fn dispatch(
        &mut self,
        method: &str,
        args: &Json,
        store: &mut impl LevelStorePort,
        sys: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) -> RpcResponse {
        debug!("RPC {method}");
        match method {
            METHOD_GET => self.handle_get(args, store),
            METHOD_SET => self.handle_set(args, store, sys, sink),
            METHOD_SAVE => self.handle_save(args, store, sys, sink),
            other => {
                warn!("RPC: no handler for '{other}'");
                RpcResponse::error(404, format!("no handler for {other}"))
            }
        }
    }

    // ── Handlers ──────────────────────────────────────────────

    fn handle_get(&self, args: &Json, store: &impl LevelStorePort) -> RpcResponse {
        let args: GetArgs = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return bad_args(&e),
        };
        let level = match LevelSelect::from_wire(args.level) {
            Ok(l) => l,
            Err(e) => return error_response(&ServiceError::InvalidLevel(e)),
        };
        let req = GetRequest {
            key: args.key,
            level,
        };
        match self.service.get(&req, store) {
            Ok(payload) => RpcResponse::success(payload),
            Err(e) => error_response(&e),
        }
    }

    fn handle_set(
        &mut self,
        args: &Json,
        store: &mut impl LevelStorePort,
        sys: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) -> RpcResponse {
        let args: SetArgs = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return bad_args(&e),
        };
        let level = match LevelSelect::from_wire(args.level) {
            Ok(l) => l,
            Err(e) => return error_response(&ServiceError::InvalidLevel(e)),
        };
        let Some(value) = args.value.filter(|v| !v.is_null()) else {
            return error_response(&ServiceError::ValueRequired);
        };
        let req = SetRequest {
            key: args.key,
            value,
            level,
            save: args.save,
            try_once: args.try_once,
            reboot: args.reboot,
        };
        match self.service.set(&req, store, sys, sink) {
            Ok(SetOutcome::NotSaved) => RpcResponse::saved(false),
            Ok(SetOutcome::Saved) => RpcResponse::saved(true),
            Ok(SetOutcome::ManualResetRequired) => manual_reset_advisory(),
            Err(e) => error_response(&e),
        }
    }

    fn handle_save(
        &mut self,
        args: &Json,
        store: &mut impl LevelStorePort,
        sys: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) -> RpcResponse {
        let args: SaveArgs = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return bad_args(&e),
        };
        let req = SaveRequest {
            try_once: args.try_once,
            reboot: args.reboot,
        };
        match self.service.save(&req, store, sys, sink) {
            Ok(SaveOutcome::Saved) => RpcResponse::saved(true),
            Ok(SaveOutcome::ManualResetRequired) => manual_reset_advisory(),
            Err(e) => error_response(&e),
        }
    }
}

/// Decode an argument struct; a missing/null args object means
/// "all defaults", matching transports that omit the field entirely.
fn parse_args<T: DeserializeOwned + Default>(args: &Json) -> Result<T, serde_json::Error> {
    if args.is_null() {
        Ok(T::default())
    } else {
        serde_json::from_value(args.clone())
    }
}

// ── Wire mapping ──────────────────────────────────────────────

fn error_response(err: &ServiceError) -> RpcResponse {
    match err {
        ServiceError::UnknownKey => RpcResponse::error(404, "invalid config key"),
        ServiceError::InvalidLevel(_) => RpcResponse::error(400, "invalid config level"),
        ServiceError::ValueRequired => RpcResponse::error(400, "value is required"),
        ServiceError::NotAllowed => RpcResponse::error(400, "not allowed"),
        ServiceError::Load(_) => RpcResponse::error(400, "failed to load config"),
        ServiceError::Apply(e) => RpcResponse::error(400, format!("invalid config value: {e}")),
        ServiceError::Save(e) => RpcResponse::error(-1, format!("error saving config: {e}")),
    }
}

fn manual_reset_advisory() -> RpcResponse {
    RpcResponse::error(418, MANUAL_RESET_ADVISORY)
}

fn bad_args(err: &serde_json::Error) -> RpcResponse {
    RpcResponse::error(400, format!("invalid arguments: {err}"))
}
