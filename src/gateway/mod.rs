//! # Cycle Driver
//!
//! The gateway wakes, powers the M-Bus adapter, reads the meter push
//! through the receive pipeline until an APDU completes or the cycle
//! timeout expires, then ships the encoded payload to the uplink sink and
//! goes back to sleep.
//!
//! Everything hardware- or transport-specific sits behind a trait:
//! [`serial::MeterLink`] for the byte source, [`AdapterControl`] for
//! power/watchdog, [`BatteryProbe`] for the supply voltage and
//! [`UplinkSink`] for the outbound transport.

pub mod mock;
pub mod pipeline;
pub mod serial;

use crate::axdr::DataNotification;
use crate::config::{AppConfig, SendDataType};
use crate::constants::APDU_MAX_SIZE;
use crate::dlms::{GcmCiphering, Router};
use crate::error::GatewayError;
use crate::meter::MeterExtractor;
use crate::uplink::Encoder;
use crate::util::hex::log_frame_hex;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

pub use pipeline::{PipelineStats, ReceivePipeline};

/// Outbound transport for finished payloads. Retransmission beyond the
/// driver's retry budget, fragmentation and network join are the sink's
/// concern.
#[async_trait]
pub trait UplinkSink: Send {
    async fn send(&mut self, payload: &[u8]) -> Result<(), GatewayError>;

    /// Sinks that need a network join may report not-ready; the driver
    /// then skips the flush for this cycle.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Sink that only logs; used when no transport is wired up.
#[derive(Debug, Default)]
pub struct LoggingSink;

#[async_trait]
impl UplinkSink for LoggingSink {
    async fn send(&mut self, payload: &[u8]) -> Result<(), GatewayError> {
        log_frame_hex("Uplink payload", payload);
        log::info!("Uplink sink (logging only): {} bytes", payload.len());
        Ok(())
    }
}

/// Power switch for the M-Bus adapter plus the watchdog kick.
pub trait AdapterControl: Send {
    fn power_on(&mut self);
    fn power_off(&mut self);
    fn kick_watchdog(&mut self) {}
}

/// No-op adapter control for hosts where the adapter is always powered.
#[derive(Debug, Default)]
pub struct NullAdapter;

impl AdapterControl for NullAdapter {
    fn power_on(&mut self) {
        log::debug!("Adapter power on (no-op)");
    }

    fn power_off(&mut self) {
        log::debug!("Adapter power off (no-op)");
    }
}

/// GPIO-driven adapter power on Raspberry Pi class hosts.
#[cfg(feature = "raspberry-pi")]
pub struct GpioAdapter {
    pin: rppal::gpio::OutputPin,
}

#[cfg(feature = "raspberry-pi")]
impl GpioAdapter {
    pub fn new(pin_number: u8) -> Result<Self, GatewayError> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| GatewayError::Other(e.to_string()))?;
        let pin = gpio
            .get(pin_number)
            .map_err(|e| GatewayError::Other(e.to_string()))?
            .into_output();
        Ok(Self { pin })
    }
}

#[cfg(feature = "raspberry-pi")]
impl AdapterControl for GpioAdapter {
    fn power_on(&mut self) {
        log::info!("Enable M-Bus adapter");
        self.pin.set_high();
    }

    fn power_off(&mut self) {
        log::info!("Disable M-Bus adapter");
        self.pin.set_low();
    }
}

/// Supply voltage source for the battery telemetry triplet.
pub trait BatteryProbe: Send {
    fn read_millivolts(&mut self) -> u16;
}

/// Probe reporting a fixed voltage; stands in for an ADC on mains-powered
/// hosts.
#[derive(Debug)]
pub struct FixedBattery(pub u16);

impl BatteryProbe for FixedBattery {
    fn read_millivolts(&mut self) -> u16 {
        self.0
    }
}

/// Retry policy for uplink sends.
#[derive(Debug, Clone)]
pub struct UplinkRetryConfig {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for UplinkRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Outcome of one read-send cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub apdu_received: bool,
    pub value_count: usize,
    pub unknown_identifiers: u32,
    pub uplink_sent: bool,
    pub uplink_bytes: usize,
    pub elapsed: Duration,
}

/// The cycle driver.
pub struct Gateway<M: MeterExtractor> {
    config: AppConfig,
    pipeline: ReceivePipeline,
    encoder: Encoder,
    meter: M,
    link: Box<dyn serial::MeterLink>,
    adapter: Box<dyn AdapterControl>,
    battery: Box<dyn BatteryProbe>,
    sink: Box<dyn UplinkSink>,
    retry: UplinkRetryConfig,
    last_apdu: Option<Vec<u8>>,
    read_loops: u32,
    send_failures: u16,
}

impl<M: MeterExtractor> Gateway<M> {
    pub fn new(
        config: AppConfig,
        meter: M,
        link: Box<dyn serial::MeterLink>,
        sink: Box<dyn UplinkSink>,
    ) -> Self {
        let router = if config.decrypt_data {
            Router::with_cipher(Box::new(GcmCiphering::new(
                config.aes_key,
                config.authentication_key,
            )))
        } else {
            Router::new()
        };

        Self {
            config,
            pipeline: ReceivePipeline::new(router),
            encoder: Encoder::new(),
            meter,
            link,
            adapter: Box::new(NullAdapter),
            battery: Box::new(FixedBattery(3300)),
            sink,
            retry: UplinkRetryConfig::default(),
            last_apdu: None,
            read_loops: 0,
            send_failures: 0,
        }
    }

    pub fn with_adapter(mut self, adapter: Box<dyn AdapterControl>) -> Self {
        self.adapter = adapter;
        self
    }

    pub fn with_battery(mut self, battery: Box<dyn BatteryProbe>) -> Self {
        self.battery = battery;
        self
    }

    pub fn with_retry(mut self, retry: UplinkRetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Swap in a freshly loaded configuration between cycles. Rebuilds the
    /// router so a changed decrypt flag or key material takes effect.
    pub fn reload_config(&mut self, config: AppConfig) {
        let router = if config.decrypt_data {
            Router::with_cipher(Box::new(GcmCiphering::new(
                config.aes_key,
                config.authentication_key,
            )))
        } else {
            Router::new()
        };
        self.pipeline = ReceivePipeline::new(router);
        self.config = config;
    }

    pub fn read_loops(&self) -> u32 {
        self.read_loops
    }

    pub fn send_failures(&self) -> u16 {
        self.send_failures
    }

    pub fn meter(&self) -> &M {
        &self.meter
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn pipeline_stats(&self) -> PipelineStats {
        self.pipeline.stats()
    }

    /// Execute one wake → read → send cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, GatewayError> {
        self.read_loops = self.read_loops.wrapping_add(1);
        log::info!("Start read cycle {}", self.read_loops);

        let started = Instant::now();
        let mut report = CycleReport::default();

        self.encoder.reset();
        self.adapter.power_on();

        if let Err(e) = self.link.open().await {
            self.adapter.power_off();
            return Err(e);
        }

        self.pipeline.reset();

        let cycle_timeout = Duration::from_millis(self.config.cycle_timeout_ms);
        let read_result = self.read_until_complete(cycle_timeout, &mut report).await;

        self.link.close().await;
        self.adapter.power_off();

        read_result?;

        // Adapter state telemetry rides along with every uplink.
        let channel = self.meter.channel();
        let millivolts = self.battery.read_millivolts();
        log::debug!("Add telemetry: battery {millivolts} mV, loops {}", self.read_loops);
        self.encoder.add_battery_voltage(channel, millivolts);
        self.encoder.add_read_loops(channel, self.read_loops);
        self.encoder.add_send_failures(channel, self.send_failures);

        self.flush_uplink(&mut report).await;

        self.adapter.kick_watchdog();

        report.elapsed = started.elapsed();
        log::info!(
            "Read cycle completed in {} ms (apdu={}, sent={})",
            report.elapsed.as_millis(),
            report.apdu_received,
            report.uplink_sent
        );

        Ok(report)
    }

    async fn read_until_complete(
        &mut self,
        cycle_timeout: Duration,
        report: &mut CycleReport,
    ) -> Result<(), GatewayError> {
        let deadline = Instant::now() + cycle_timeout;

        while !self.pipeline.is_complete() {
            if Instant::now() >= deadline {
                log::info!(
                    "Read cycle timeout of {} ms reached",
                    cycle_timeout.as_millis()
                );
                break;
            }

            if let Some(byte) = self.link.read_byte().await? {
                if let Some(apdu) = self.pipeline.feed_byte(byte) {
                    self.handle_apdu(apdu, report);
                }
            }
        }

        Ok(())
    }

    fn handle_apdu(&mut self, apdu: Vec<u8>, report: &mut CycleReport) {
        log::info!("APDU received with {} bytes", apdu.len());

        let notification = DataNotification::parse(&apdu);
        report.apdu_received = true;
        report.value_count = notification.value_count();
        report.unknown_identifiers = notification.unknown_identifiers();

        if notification.unknown_identifiers() > 0 {
            log::warn!(
                "APDU parsed with {} unknown identifiers",
                notification.unknown_identifiers()
            );
        }

        if apdu.len() <= APDU_MAX_SIZE {
            self.last_apdu = Some(apdu);
        }

        if !self.meter.parse(&notification) {
            log::warn!("Meter extraction aborted for this APDU");
        }

        self.meter.copy_data(&notification, &mut self.encoder);

        if self.encoder.has_error() {
            log::warn!("Uplink encoder reported an error while copying meter data");
        }
    }

    async fn flush_uplink(&mut self, report: &mut CycleReport) {
        if !self.sink.is_ready() {
            log::info!("Uplink sink not ready, skipping send");
            return;
        }

        let payload: Vec<u8> = match self.config.send_data_type {
            SendDataType::Parsed => {
                if self.encoder.has_error() {
                    log::warn!("Send aborted: uplink encoder error");
                    return;
                }
                self.encoder.buffer().to_vec()
            }
            SendDataType::RawApdu => match &self.last_apdu {
                Some(apdu) => apdu.clone(),
                None => {
                    log::info!("No APDU to send in raw mode");
                    return;
                }
            },
        };

        if payload.is_empty() {
            log::info!("Nothing to send (payload empty)");
            return;
        }

        let mut backoff = self.retry.initial_backoff;
        for attempt in 1..=self.retry.max_attempts {
            match self.sink.send(&payload).await {
                Ok(()) => {
                    log::info!("Sent {} bytes via uplink", payload.len());
                    report.uplink_sent = true;
                    report.uplink_bytes = payload.len();
                    return;
                }
                Err(e) => {
                    log::warn!(
                        "Uplink send attempt {attempt}/{} failed: {e}",
                        self.retry.max_attempts
                    );
                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(self.retry.max_backoff);
                    }
                }
            }
        }

        self.send_failures = self.send_failures.wrapping_add(1);
        log::error!(
            "Uplink send failed after {} attempts ({} total failures)",
            self.retry.max_attempts,
            self.send_failures
        );
    }
}
