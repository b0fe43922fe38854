//! Integration tests: RPC engine dispatch → ConfigService → wire codes.

use devconf::adapters::MemStorage;
use devconf::app::events::ConfigEvent;
use devconf::app::ports::{RestartHandle, StorageError, StoragePort, SystemPort};
use devconf::rpc::{RpcEngine, RpcResponse};
use devconf::schema::{Access, AccessPolicy, SchemaNode};
use devconf::store::BlobLevelStore;
use serde_json::{Value as Json, json};

// ── Mocks ─────────────────────────────────────────────────────

#[derive(Default)]
struct MockSystem {
    strapped: bool,
    scheduled: Vec<u32>,
}

impl SystemPort for MockSystem {
    fn strapped_to_bootloader(&self) -> bool {
        self.strapped
    }
    fn schedule_restart(&mut self, delay_ms: u32) -> RestartHandle {
        self.scheduled.push(delay_ms);
        RestartHandle::new()
    }
}

#[derive(Default)]
struct NullSink;

impl devconf::app::ports::EventSink for NullSink {
    fn emit(&mut self, _event: &ConfigEvent) {}
}

struct BrokenStorage;

impl StoragePort for BrokenStorage {
    fn read(&self, _ns: &str, _key: &str) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::IoError)
    }
    fn write(&mut self, _ns: &str, _key: &str, _data: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::IoError)
    }
    fn delete(&mut self, _ns: &str, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::IoError)
    }
    fn exists(&self, _ns: &str, _key: &str) -> bool {
        false
    }
}

// ── Fixture ───────────────────────────────────────────────────

fn schema() -> SchemaNode {
    SchemaNode::root(vec![
        SchemaNode::object(
            "wifi",
            Access::ReadWrite,
            vec![SchemaNode::object(
                "sta",
                Access::ReadWrite,
                vec![
                    SchemaNode::string("ssid", Access::ReadWrite, "factory-net"),
                    SchemaNode::string("pass", Access::ReadWrite, ""),
                ],
            )],
        ),
        SchemaNode::int("boot_count", Access::ReadWrite, 0),
    ])
    .unwrap()
}

struct Rig {
    engine: RpcEngine,
    store: BlobLevelStore<MemStorage>,
    sys: MockSystem,
    sink: NullSink,
}

fn rig() -> Rig {
    let store = BlobLevelStore::new(MemStorage::new());
    let svc = devconf::app::service::ConfigService::new(
        schema(),
        AccessPolicy::allow_all(),
        &store,
    )
    .unwrap();
    Rig {
        engine: RpcEngine::new(svc),
        store,
        sys: MockSystem::default(),
        sink: NullSink,
    }
}

fn dispatch(rig: &mut Rig, method: &str, args: Json) -> RpcResponse {
    rig.engine
        .dispatch(method, &args, &mut rig.store, &mut rig.sys, &mut rig.sink)
}

fn expect_error(resp: RpcResponse) -> (i32, String) {
    match resp {
        RpcResponse::Error { code, message } => (code, message),
        RpcResponse::Success(v) => panic!("expected error, got success: {v}"),
    }
}

// ── Config.Get ────────────────────────────────────────────────

#[test]
fn get_whole_tree() {
    let mut rig = rig();
    let resp = dispatch(&mut rig, "Config.Get", json!({}));
    let RpcResponse::Success(tree) = resp else {
        panic!("expected success");
    };
    assert_eq!(tree["wifi"]["sta"]["ssid"], json!("factory-net"));
    assert_eq!(tree["boot_count"], json!(0));
}

#[test]
fn get_subtree_by_key() {
    let mut rig = rig();
    let resp = dispatch(&mut rig, "Config.Get", json!({"key": "wifi.sta"}));
    assert_eq!(
        resp,
        RpcResponse::Success(json!({"ssid": "factory-net", "pass": ""}))
    );
}

#[test]
fn get_unknown_key_is_404() {
    let mut rig = rig();
    let (code, message) = expect_error(dispatch(
        &mut rig,
        "Config.Get",
        json!({"key": "no.such.key"}),
    ));
    assert_eq!(code, 404);
    assert_eq!(message, "invalid config key");
}

#[test]
fn get_unreadable_storage_is_400() {
    let mut rig = rig();
    let mut broken = BlobLevelStore::new(BrokenStorage);
    let resp = rig.engine.dispatch(
        "Config.Get",
        &json!({"level": 8}),
        &mut broken,
        &mut rig.sys,
        &mut rig.sink,
    );
    let (code, message) = expect_error(resp);
    assert_eq!(code, 400);
    assert_eq!(message, "failed to load config");
}

#[test]
fn get_level_out_of_range_is_rejected() {
    let mut rig = rig();
    let (code, message) = expect_error(dispatch(&mut rig, "Config.Get", json!({"level": 42})));
    assert_eq!(code, 400);
    assert_eq!(message, "invalid config level");
}

// ── Config.Set ────────────────────────────────────────────────

#[test]
fn set_without_value_is_400() {
    let mut rig = rig();
    let (code, message) = expect_error(dispatch(
        &mut rig,
        "Config.Set",
        json!({"key": "wifi.sta.ssid"}),
    ));
    assert_eq!(code, 400);
    assert_eq!(message, "value is required");
}

#[test]
fn set_level_zero_is_400_not_allowed() {
    let mut rig = rig();
    let (code, message) = expect_error(dispatch(
        &mut rig,
        "Config.Set",
        json!({"key": "wifi.sta.ssid", "value": "x", "level": 0}),
    ));
    assert_eq!(code, 400);
    assert_eq!(message, "not allowed");
}

#[test]
fn set_unknown_key_is_404() {
    let mut rig = rig();
    let (code, _) = expect_error(dispatch(
        &mut rig,
        "Config.Set",
        json!({"key": "nope", "value": 1}),
    ));
    assert_eq!(code, 404);
}

#[test]
fn set_type_mismatch_is_400_with_detail() {
    let mut rig = rig();
    let (code, message) = expect_error(dispatch(
        &mut rig,
        "Config.Set",
        json!({"key": "boot_count", "value": "many"}),
    ));
    assert_eq!(code, 400);
    assert!(
        message.starts_with("invalid config value:"),
        "message was: {message}"
    );
    assert!(message.contains("boot_count"));
}

#[test]
fn set_without_save_reports_saved_false() {
    let mut rig = rig();
    let resp = dispatch(
        &mut rig,
        "Config.Set",
        json!({"key": "wifi.sta.ssid", "value": "lab"}),
    );
    assert_eq!(resp, RpcResponse::saved(false));
}

#[test]
fn set_with_save_reports_saved_true_and_round_trips() {
    let mut rig = rig();
    let resp = dispatch(
        &mut rig,
        "Config.Set",
        json!({"key": "wifi.sta.ssid", "value": "lab", "save": true}),
    );
    assert_eq!(resp, RpcResponse::saved(true));

    // Reload the user level through the RPC surface only.
    let resp = dispatch(
        &mut rig,
        "Config.Get",
        json!({"key": "wifi.sta.ssid", "level": 8}),
    );
    assert_eq!(resp, RpcResponse::Success(json!("lab")));
}

#[test]
fn set_accepts_config_as_value_synonym() {
    let mut rig = rig();
    let resp = dispatch(
        &mut rig,
        "Config.Set",
        json!({"key": "wifi.sta.ssid", "config": "legacy"}),
    );
    assert_eq!(resp, RpcResponse::saved(false));
    let resp = dispatch(&mut rig, "Config.Get", json!({"key": "wifi.sta.ssid"}));
    assert_eq!(resp, RpcResponse::Success(json!("legacy")));
}

// ── Config.Save ───────────────────────────────────────────────

#[test]
fn save_reports_saved_true() {
    let mut rig = rig();
    let resp = dispatch(&mut rig, "Config.Save", json!({}));
    assert_eq!(resp, RpcResponse::saved(true));
    assert!(rig.sys.scheduled.is_empty());
}

#[test]
fn save_with_reboot_schedules_restart() {
    let mut rig = rig();
    let resp = dispatch(&mut rig, "Config.Save", json!({"reboot": true}));
    assert_eq!(resp, RpcResponse::saved(true));
    assert_eq!(rig.sys.scheduled, vec![500]);
}

#[test]
fn save_reboot_on_strapped_device_is_418_advisory() {
    let mut rig = rig();
    rig.sys.strapped = true;
    let resp = dispatch(
        &mut rig,
        "Config.Save",
        json!({"try_once": true, "reboot": true}),
    );
    let (code, message) = expect_error(resp);
    assert_eq!(code, 418);
    assert!(message.contains("manual device reset"));
    assert!(rig.sys.scheduled.is_empty());
}

#[test]
fn save_failure_is_code_minus_one_with_detail() {
    let mut rig = rig();
    // Dirty the live snapshot first so the save has something to write.
    dispatch(
        &mut rig,
        "Config.Set",
        json!({"key": "wifi.sta.ssid", "value": "lab"}),
    );
    let mut broken = BlobLevelStore::new(BrokenStorage);
    let resp = rig.engine.dispatch(
        "Config.Save",
        &json!({}),
        &mut broken,
        &mut rig.sys,
        &mut rig.sink,
    );
    let (code, message) = expect_error(resp);
    assert_eq!(code, -1);
    assert!(
        message.starts_with("error saving config:"),
        "message was: {message}"
    );
}

// ── Dispatch ──────────────────────────────────────────────────

#[test]
fn null_args_decode_as_all_defaults() {
    let mut rig = rig();
    let resp = dispatch(&mut rig, "Config.Save", Json::Null);
    assert_eq!(resp, RpcResponse::saved(true));
    let resp = dispatch(&mut rig, "Config.Get", Json::Null);
    assert!(!resp.is_error());
}

#[test]
fn unknown_method_is_404() {
    let mut rig = rig();
    let (code, message) = expect_error(dispatch(&mut rig, "Config.Reset", json!({})));
    assert_eq!(code, 404);
    assert!(message.contains("Config.Reset"));
}

#[test]
fn malformed_args_are_400() {
    let mut rig = rig();
    let (code, _) = expect_error(dispatch(&mut rig, "Config.Get", json!({"level": "eight"})));
    assert_eq!(code, 400);
}
