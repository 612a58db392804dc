//! Shared `ureq` plumbing for the lookup and archive transports.

use std::time::Duration;

/// Build an agent whose every request is bounded by `timeout`.
pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    ureq::Agent::new_with_config(config)
}

/// Return the HTTP status when `err` is a status-code failure.
pub(crate) fn status_of(err: &ureq::Error) -> Option<u16> {
    match err {
        ureq::Error::StatusCode(status) => Some(*status),
        _ => None,
    }
}
