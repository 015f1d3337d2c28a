//! Tools shipped with parley.

mod basic;
mod calculator;
mod devices;
mod web;

pub use basic::{add_two_numbers, current_datetime};
pub use calculator::{calculator, evaluate};
pub use devices::{
    DeviceCallPolicy, DeviceCommand, DeviceInfo, DeviceTransport, SimulatedDeviceTransport,
    call_device, known_devices,
};
pub use web::{
    DEFAULT_SEARCH_RESULTS, HttpWebTransport, MAX_PAGE_CHARS, SearchResult, WEB_REQUEST_TIMEOUT,
    WebPage, WebTransport, get_weather, parse_search_results, resolve_result_url, web_search,
};

use std::sync::Arc;

use crate::ToolCatalog;

pub(crate) fn register_builtin(catalog: &mut ToolCatalog) {
    basic::register(catalog);
    calculator::register(catalog);
    devices::register(
        catalog,
        Arc::new(SimulatedDeviceTransport::default()),
        DeviceCallPolicy::default(),
    );
    match HttpWebTransport::new() {
        Ok(transport) => web::register(catalog, Arc::new(transport)),
        Err(error) => tracing::warn!(error = %error, "web tools are unavailable"),
    }
}

/// Registers the device tools against a caller-supplied transport.
pub fn register_device_tools(
    catalog: &mut ToolCatalog,
    transport: Arc<dyn DeviceTransport>,
    policy: DeviceCallPolicy,
) {
    devices::register(catalog, transport, policy);
}

/// Registers `get_weather` and `web_search` against a caller-supplied transport.
pub fn register_web_tools(catalog: &mut ToolCatalog, transport: Arc<dyn WebTransport>) {
    web::register(catalog, transport);
}
