#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestEnv {
    _tmp: TempDir,
    pub root: PathBuf,
    pub data: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path().to_path_buf();
        let data = root.join("data");
        fs::create_dir_all(&data).expect("create data dir");

        write_json(&data.join("users.json"), &users());
        write_json(&data.join("products.json"), &products());
        write_json(&data.join("skin_analyses.json"), &analyses());

        Self {
            _tmp: tmp,
            root,
            data,
        }
    }

    /// Runs from the temp root, so the default `data` dir is picked up.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("skintrack").expect("binary built");
        cmd.current_dir(&self.root)
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }

    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .output()
            .expect("run skintrack");
        assert!(
            output.status.success(),
            "skintrack {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is json")
    }

    pub fn write(&self, name: &str, value: &Value) -> PathBuf {
        let path = self.root.join(name);
        write_json(&path, value);
        path
    }

    pub fn collection(&self, name: &str) -> Value {
        let content = fs::read_to_string(self.data.join(format!("{name}.json"))).expect("read collection");
        serde_json::from_str(&content).expect("collection is json")
    }
}

pub fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string_pretty(value).expect("serialize")).expect("write json");
}

fn users() -> Value {
    json!([
        {"id": "u1", "email": "mia@example.com", "name": "Mia", "skin_type": "oily"},
        {"id": "u2", "email": "noor@example.com", "name": "Noor"},
        {"id": "admin", "email": "staff@example.com", "name": "Staff", "role": "admin"}
    ])
}

fn analyses() -> Value {
    json!([
        {
            "id": "a1", "user_id": "u1", "area": "face", "created_at": "2026-04-01T09:00:00Z",
            "readings": [
                {"label": "Acne", "value": 90.0},
                {"label": "Pores", "value": 70.0}
            ]
        },
        {
            "id": "a2", "user_id": "u1", "area": "face", "created_at": "2026-05-01T09:00:00Z",
            "readings": [
                {"label": "Acne", "value": 80.0},
                {"label": "Pores", "value": 65.0},
                {"label": "Blackheads", "value": 50.0},
                {"label": "Freckles", "value": 0.0}
            ]
        }
    ])
}

/// Three named products plus 22 filler body lotions, 25 in total.
fn products() -> Value {
    let mut products = vec![
        json!({
            "id": "p-serum", "name": "Clarifying Serum", "type": "serum", "brand": "Lumen",
            "area": "face", "severity": "severe", "skin_type": "oily,combination",
            "impurity": "Acne", "created_at": "2026-03-03T00:00:00Z"
        }),
        json!({
            "id": "p-cream", "name": "Barrier Cream", "type": "moisturizer", "brand": "Lumen",
            "area": "face", "severity": "mild", "skin_type": "normal, dry",
            "impurity": "Acne", "created_at": "2026-03-02T00:00:00Z"
        }),
        json!({
            "id": "p-strip", "name": "Pore Strip", "type": "mask", "brand": "Nosey",
            "area": "face", "severity": "moderate", "skin_type": "oily",
            "impurity": "Blackheads", "created_at": "2026-03-01T00:00:00Z"
        }),
    ];
    for idx in 1..=22 {
        let body_part = if idx % 2 == 0 { "arms" } else { "legs" };
        products.push(json!({
            "id": format!("p-body-{idx:02}"), "name": format!("Body Lotion {idx:02}"),
            "type": "lotion", "area": "body", "body_part": body_part,
            "skin_type": "dry", "impurity": "Dryness",
            "created_at": format!("2026-02-{idx:02}T00:00:00Z")
        }));
    }
    Value::Array(products)
}
