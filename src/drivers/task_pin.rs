//! Core-pinned worker threads for ESP32-S3 dual-core.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread::spawn` creates a
//! FreeRTOS task pinned to a specific CPU core with explicit priority
//! and stack size. On non-ESP targets, falls back to a plain named thread.
//!
//! `esp_pthread_set_cfg()` applies to the *next* `pthread_create()` from
//! the calling thread, so the config→spawn pair must not be interleaved
//! with other thread creation on the same thread.

use std::thread::JoinHandle;

use crate::error::{Error, Result};

/// CPU core identifiers for the ESP32-S3 Xtensa LX7 dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): USB stack and the command receiver.
    Pro = 0,
    /// Core 1 (APP_CPU): the e-fuse supervisor.
    App = 1,
}

/// Worker placement: core, FreeRTOS priority, stack and task name.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
    /// Null-terminated, e.g. `"efuse\0"`.
    pub name: &'static str,
}

impl TaskSpec {
    /// Name without the trailing NUL.
    pub fn display_name(&self) -> &'static str {
        self.name.trim_end_matches('\0')
    }
}

/// Spawn a thread pinned to `task.core` with explicit priority and stack.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    task: TaskSpec,
    f: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>> {
    if !task.name.ends_with('\0') {
        return Err(Error::Init("task name must be NUL-terminated"));
    }

    // SAFETY: `cfg` is a fully initialised default config and `name` is a
    // 'static NUL-terminated string that outlives the spawned task.
    let ret = unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = task.core as i32;
        cfg.prio = i32::from(task.priority);
        cfg.stack_size = (task.stack_kb * 1024) as i32;
        cfg.thread_name = task.name.as_ptr().cast();
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_sys::ESP_OK as i32 {
        log::error!("esp_pthread_set_cfg failed for '{}': {}", task.display_name(), ret);
        return Err(Error::Init("esp_pthread_set_cfg failed"));
    }

    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        task.display_name(),
        task.core,
        task.priority,
        task.stack_kb
    );

    std::thread::Builder::new()
        .name(task.display_name().into())
        .spawn(f)
        .map_err(|_| Error::Init("thread creation failed"))
}

/// Host fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    task: TaskSpec,
    f: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>> {
    log::info!(
        "Spawning '{}' (host, no core pinning, stack={}KB)",
        task.display_name(),
        task.stack_kb
    );

    std::thread::Builder::new()
        .name(task.display_name().into())
        .stack_size(task.stack_kb * 1024)
        .spawn(f)
        .map_err(|_| Error::Init("thread creation failed"))
}
