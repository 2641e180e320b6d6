//! Mock collaborators for driving the gateway without hardware.

use crate::error::GatewayError;
use crate::gateway::serial::MeterLink;
use crate::gateway::UplinkSink;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Meter link fed from a queue of canned bytes.
///
/// An empty queue behaves like a silent meter: each poll waits one
/// simulated poll interval before reporting nothing, which is what drives
/// the cycle-timeout path in tests.
#[derive(Clone)]
pub struct MockMeterLink {
    rx: Arc<Mutex<VecDeque<u8>>>,
    idle_poll: Duration,
    pub opened: Arc<Mutex<bool>>,
}

impl Default for MockMeterLink {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMeterLink {
    pub fn new() -> Self {
        Self {
            rx: Arc::new(Mutex::new(VecDeque::new())),
            idle_poll: Duration::from_millis(100),
            opened: Arc::new(Mutex::new(false)),
        }
    }

    /// Queue bytes the link will hand out in order.
    pub fn queue(&self, data: &[u8]) {
        self.rx.lock().unwrap().extend(data.iter().copied());
    }

    pub fn remaining(&self) -> usize {
        self.rx.lock().unwrap().len()
    }
}

#[async_trait]
impl MeterLink for MockMeterLink {
    async fn open(&mut self) -> Result<(), GatewayError> {
        *self.opened.lock().unwrap() = true;
        Ok(())
    }

    async fn close(&mut self) {
        *self.opened.lock().unwrap() = false;
    }

    async fn read_byte(&mut self) -> Result<Option<u8>, GatewayError> {
        let byte = self.rx.lock().unwrap().pop_front();
        if byte.is_none() {
            tokio::time::sleep(self.idle_poll).await;
        }
        Ok(byte)
    }
}

/// Uplink sink recording every payload it accepts, optionally failing a
/// number of sends first.
#[derive(Clone, Default)]
pub struct MockSink {
    pub sent: Arc<Mutex<Vec<Vec<u8>>>>,
    pub failures_remaining: Arc<Mutex<u32>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failures: u32) -> Self {
        let sink = Self::default();
        *sink.failures_remaining.lock().unwrap() = failures;
        sink
    }

    pub fn sent_payloads(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl UplinkSink for MockSink {
    async fn send(&mut self, payload: &[u8]) -> Result<(), GatewayError> {
        let mut failures = self.failures_remaining.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(GatewayError::UplinkError("simulated failure".into()));
        }
        self.sent.lock().unwrap().push(payload.to_vec());
        Ok(())
    }
}
