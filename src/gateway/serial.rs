//! Serial link to the M-Bus attached meter.
//!
//! The LG-family meter pushes at 2400 baud, 8 data bits, even parity, one
//! stop bit, half-duplex: the gateway only ever reads.

use crate::constants::SERIAL_POLL_MS;
use crate::error::GatewayError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::time::timeout;
use tokio_serial::SerialPortBuilderExt;

/// Meter-side baud rate.
pub const METER_BAUD_RATE: u32 = 2400;

/// Byte source the cycle driver reads from.
///
/// `read_byte` waits up to roughly one poll interval for a byte and
/// returns `None` when nothing arrived; the driver's idle pacing lives in
/// that wait rather than in a separate sleep.
#[async_trait]
pub trait MeterLink: Send {
    async fn open(&mut self) -> Result<(), GatewayError>;
    async fn close(&mut self);
    async fn read_byte(&mut self) -> Result<Option<u8>, GatewayError>;
}

/// `tokio-serial` backed meter link.
pub struct SerialMeterLink {
    port_name: String,
    port: Option<tokio_serial::SerialStream>,
    poll_interval: Duration,
}

impl SerialMeterLink {
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            port: None,
            poll_interval: Duration::from_millis(SERIAL_POLL_MS),
        }
    }
}

#[async_trait]
impl MeterLink for SerialMeterLink {
    async fn open(&mut self) -> Result<(), GatewayError> {
        log::info!("Open serial port {} at {METER_BAUD_RATE} 8E1", self.port_name);

        let port = tokio_serial::new(&self.port_name, METER_BAUD_RATE)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::Even)
            .timeout(self.poll_interval)
            .open_native_async()
            .map_err(|e| GatewayError::SerialPortError(e.to_string()))?;

        self.port = Some(port);
        Ok(())
    }

    async fn close(&mut self) {
        log::info!("Close serial port {}", self.port_name);
        self.port = None;
    }

    async fn read_byte(&mut self) -> Result<Option<u8>, GatewayError> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| GatewayError::SerialPortError("port not open".into()))?;

        let mut buf = [0u8; 1];
        match timeout(self.poll_interval, port.read(&mut buf)).await {
            Err(_) => Ok(None), // nothing available this poll
            Ok(Ok(0)) => Ok(None),
            Ok(Ok(_)) => Ok(Some(buf[0])),
            Ok(Err(e)) => Err(GatewayError::SerialPortError(e.to_string())),
        }
    }
}
