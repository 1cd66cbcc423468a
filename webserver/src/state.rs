//! Webserver state management

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Process-wide server state shared by every handler
#[derive(Debug)]
pub struct WebServerState {
    pub bind_address: SocketAddr,
    pub server_start_time: Instant,
    runs_in_flight: AtomicU32,
}

impl WebServerState {
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            server_start_time: Instant::now(),
            runs_in_flight: AtomicU32::new(0),
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.server_start_time.elapsed().as_secs()
    }

    pub fn runs_in_flight(&self) -> u32 {
        self.runs_in_flight.load(Ordering::Relaxed)
    }

    /// Count a quote run until the returned guard is dropped
    pub fn track_run(&self) -> RunGuard<'_> {
        self.runs_in_flight.fetch_add(1, Ordering::Relaxed);
        RunGuard { state: self }
    }
}

pub struct RunGuard<'a> {
    state: &'a WebServerState,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.runs_in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}
