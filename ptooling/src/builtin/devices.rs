//! RGB device tools with bounded per-attempt waits and retries.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_timer::Delay;
use futures_util::future::{Either, select};
use serde_json::{Value, json};

use crate::{
    ToolArgs, ToolCatalog, ToolError, ToolFuture, object_definition, required_channel,
    required_string,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: &'static str,
    pub location: &'static str,
    pub features: &'static [&'static str],
}

const DEVICES: [DeviceInfo; 3] = [
    DeviceInfo {
        name: "lamp_livingroom",
        location: "Living Room",
        features: &["color", "brightness"],
    },
    DeviceInfo {
        name: "ceiling_kitchen",
        location: "Kitchen",
        features: &["color"],
    },
    DeviceInfo {
        name: "strip_bedroom",
        location: "Bedroom",
        features: &["color", "animation"],
    },
];

pub fn known_devices() -> &'static [DeviceInfo] {
    &DEVICES
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCommand {
    pub device: String,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

pub trait DeviceTransport: Send + Sync {
    fn send<'a>(&'a self, command: &'a DeviceCommand) -> ToolFuture<'a, Result<(), ToolError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCallPolicy {
    pub timeout: Duration,
    pub attempts: u32,
    pub retry_delay: Duration,
}

impl Default for DeviceCallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            attempts: 5,
            retry_delay: Duration::from_millis(200),
        }
    }
}

impl DeviceCallPolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }
}

/// Sends `command`, waiting at most `policy.timeout` per attempt.
///
/// Timeouts and retryable transport errors are retried up to `policy.attempts` times.
pub async fn call_device(
    transport: &dyn DeviceTransport,
    command: &DeviceCommand,
    policy: DeviceCallPolicy,
) -> Result<(), ToolError> {
    let attempts = policy.attempts.max(1);
    let mut last_error = ToolError::other("device was never contacted");

    for attempt in 1..=attempts {
        let outcome = select(transport.send(command), Delay::new(policy.timeout)).await;
        last_error = match outcome {
            Either::Left((Ok(()), _)) => return Ok(()),
            Either::Left((Err(error), _)) if !error.is_retryable() => return Err(error),
            Either::Left((Err(error), _)) => error,
            Either::Right(((), _)) => ToolError::timeout(format!(
                "device '{}' did not answer within {:?}",
                command.device, policy.timeout
            )),
        };

        tracing::debug!(
            device = %command.device,
            attempt,
            attempts,
            error = %last_error.message,
            "device call attempt failed"
        );

        if attempt < attempts {
            Delay::new(policy.retry_delay).await;
        }
    }

    last_error.message = format!("{} (after {attempts} attempts)", last_error.message);
    Err(last_error)
}

/// In-process stand-in for real devices.
///
/// Records every command it accepts. Can be told to fail or stall a number of times
/// first, which exercises the retry path.
#[derive(Debug, Default)]
pub struct SimulatedDeviceTransport {
    sent: Mutex<Vec<DeviceCommand>>,
    failures_left: AtomicU32,
    stalls_left: AtomicU32,
}

impl SimulatedDeviceTransport {
    pub fn failing_first(self, failures: u32) -> Self {
        self.failures_left.store(failures, Ordering::SeqCst);
        self
    }

    pub fn stalling_first(self, stalls: u32) -> Self {
        self.stalls_left.store(stalls, Ordering::SeqCst);
        self
    }

    pub fn sent(&self) -> Vec<DeviceCommand> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    fn take_one(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

impl DeviceTransport for SimulatedDeviceTransport {
    fn send<'a>(&'a self, command: &'a DeviceCommand) -> ToolFuture<'a, Result<(), ToolError>> {
        Box::pin(async move {
            if Self::take_one(&self.stalls_left) {
                futures_util::future::pending::<()>().await;
            }

            if Self::take_one(&self.failures_left) {
                return Err(ToolError::device_busy(format!(
                    "device '{}' is busy",
                    command.device
                )));
            }

            self.sent
                .lock()
                .map_err(|_| ToolError::other("device log lock poisoned"))?
                .push(command.clone());
            Ok(())
        })
    }
}

pub(super) fn register(
    catalog: &mut ToolCatalog,
    transport: Arc<dyn DeviceTransport>,
    policy: DeviceCallPolicy,
) {
    catalog.register_sync_fn(
        object_definition(
            "list_devices",
            "List available RGB-capable devices with their location and features.",
            json!({}),
            &[],
        ),
        |_args| Ok(list_devices()),
    );

    catalog.register_fn(
        object_definition(
            "set_rgb_color",
            "Set an RGB color on a device returned by list_devices.",
            json!({
                "device": {"type": "string", "description": "Name of the target device"},
                "r": {"type": "integer", "description": "Red value (0-255)"},
                "g": {"type": "integer", "description": "Green value (0-255)"},
                "b": {"type": "integer", "description": "Blue value (0-255)"}
            }),
            &["device", "r", "g", "b"],
        ),
        move |args, _context| {
            let transport = Arc::clone(&transport);
            async move { set_rgb_color(transport.as_ref(), args, policy).await }
        },
    );
}

fn list_devices() -> Value {
    Value::Array(
        known_devices()
            .iter()
            .map(|device| {
                json!({
                    "name": device.name,
                    "location": device.location,
                    "features": device.features,
                })
            })
            .collect(),
    )
}

async fn set_rgb_color(
    transport: &dyn DeviceTransport,
    args: ToolArgs,
    policy: DeviceCallPolicy,
) -> Result<Value, ToolError> {
    let device = required_string(&args, "device")?;
    if !known_devices().iter().any(|known| known.name == device) {
        let names = known_devices()
            .iter()
            .map(|known| known.name)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ToolError::invalid_arguments(format!(
            "device '{device}' not found; known devices: {names}"
        )));
    }

    let command = DeviceCommand {
        device,
        red: required_channel(&args, "r")?,
        green: required_channel(&args, "g")?,
        blue: required_channel(&args, "b")?,
    };
    call_device(transport, &command, policy).await?;

    Ok(json!(format!(
        "Color set to ({}, {}, {}) on device '{}'.",
        command.red, command.green, command.blue, command.device
    )))
}
