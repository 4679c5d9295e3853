//! Shared test utilities for the nxos-igmp test suite.
//!
//! Provides an in-memory NX-OS device that keeps a simulated running config,
//! applies the IGMP configuration lines it is sent, and records every call.
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use nxos_igmp::modules::network::{
    DeviceConnector, DeviceTarget, IgmpReconciler, NxosDevice, StaticCredentials,
};
use nxos_igmp::modules::{ModuleError, ModuleResult};

/// In-memory device holding a list of running-config lines
#[derive(Debug, Default)]
pub struct FakeDevice {
    running: Mutex<Vec<String>>,
    batches: Mutex<Vec<Vec<String>>>,
    shows: AtomicUsize,
    reject_with: Mutex<Option<String>>,
}

impl FakeDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A device whose running config already contains `lines`
    pub fn with_lines(lines: &[&str]) -> Arc<Self> {
        let device = Self::default();
        *device.running.lock() = lines.iter().map(|l| l.to_string()).collect();
        Arc::new(device)
    }

    /// Make every `configure` call fail with `message`
    pub fn reject(&self, message: &str) {
        *self.reject_with.lock() = Some(message.to_string());
    }

    /// Every configuration batch the device has accepted or rejected
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }

    pub fn show_count(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }

    pub fn running_lines(&self) -> Vec<String> {
        self.running.lock().clone()
    }

    fn apply(&self, command: &str) {
        if command == "restart igmp" {
            return;
        }
        let mut running = self.running.lock();
        match command.strip_prefix("no ") {
            Some(line) => running.retain(|existing| existing != line),
            None => {
                if !running.iter().any(|existing| existing == command) {
                    running.push(command.to_string());
                }
            }
        }
    }
}

#[async_trait]
impl NxosDevice for FakeDevice {
    async fn show_text(&self, command: &str) -> ModuleResult<String> {
        assert_eq!(command, "show running-config igmp");
        self.shows.fetch_add(1, Ordering::SeqCst);
        let mut text = String::from("!Command: show running-config igmp\n\nversion 9.3(5)\n");
        for line in self.running.lock().iter() {
            text.push_str(line);
            text.push('\n');
        }
        Ok(text)
    }

    async fn configure(&self, commands: &[String]) -> ModuleResult<()> {
        self.batches.lock().push(commands.to_vec());
        if let Some(message) = self.reject_with.lock().clone() {
            return Err(ModuleError::DeviceConfig(message));
        }
        for command in commands {
            self.apply(command);
        }
        Ok(())
    }
}

/// Hands out the same [`FakeDevice`] and remembers the targets it was asked for
pub struct FakeConnector {
    device: Arc<FakeDevice>,
    targets: Mutex<Vec<DeviceTarget>>,
}

impl FakeConnector {
    pub fn new(device: Arc<FakeDevice>) -> Arc<Self> {
        Arc::new(Self {
            device,
            targets: Mutex::new(Vec::new()),
        })
    }

    pub fn targets(&self) -> Vec<DeviceTarget> {
        self.targets.lock().clone()
    }
}

#[async_trait]
impl DeviceConnector for FakeConnector {
    async fn connect(&self, target: &DeviceTarget) -> ModuleResult<Arc<dyn NxosDevice>> {
        self.targets.lock().push(target.clone());
        Ok(self.device.clone())
    }
}

/// Reconciler talking to `connector` with admin/admin fallback credentials
pub fn reconciler(connector: Arc<FakeConnector>) -> IgmpReconciler {
    IgmpReconciler::new(
        Arc::new(StaticCredentials::new("admin", "admin")),
        connector,
    )
}

/// Helper to create module params
pub fn create_params(entries: Vec<(&str, serde_json::Value)>) -> nxos_igmp::modules::ModuleParams {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
