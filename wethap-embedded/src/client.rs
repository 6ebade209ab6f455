use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::convert::Infallible;

use embassy_futures::select::{Either4, select4};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Timer, with_timeout};
use embedded_hal::digital::OutputPin;
use serde::Serialize;
use wethap_api::{Handshake, HandshakeAck, Info, JsonProtocol, Protocol, ReadingReport, ServerPush};

use crate::board::{Board, device_key};
use crate::config::SenderConfig;
use crate::display::{StatusDisplay, date_string, notify, status_lines, time_string};
use crate::error::{Error, Fault, FatalDeviceError};
use crate::network::{LinkEvent, SenderLink, WifiController, acquire_network};
use crate::sensor::{Calibration, EnvSensor, Knob, Measurement};
use crate::storage::{LocalStorage, load_lab_id, store_lab_id};
use crate::time::{DeviceClock, TimeSource, sync_clock};

/// The concrete peripherals a board brings to the sender.
pub trait Platform {
    type Wifi: WifiController;
    type Link: SenderLink;
    type Sensor: EnvSensor;
    type Knob: Knob;
    type Display: StatusDisplay;
    type Led: OutputPin;
    type Storage: LocalStorage;
    type PrimaryTime: TimeSource;
    type SecondaryTime: TimeSource;
    type Board: Board;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Booting,
    AcquiringNetwork,
    Handshaking,
    Connected,
    /// The link dropped; the session task is waiting to reconnect
    Degraded,
}

/// Peripherals handed to [`SenderClient::new`].
pub struct Hardware<P: Platform> {
    pub wifi: P::Wifi,
    pub sensor: P::Sensor,
    pub temp_knob: P::Knob,
    pub humid_knob: P::Knob,
    pub display: P::Display,
    pub led: P::Led,
    pub storage: P::Storage,
    pub primary_time: P::PrimaryTime,
    pub secondary_time: P::SecondaryTime,
}

struct Shared<P: Platform> {
    wifi: P::Wifi,
    sensor: P::Sensor,
    temp_knob: P::Knob,
    humid_knob: P::Knob,
    display: P::Display,
    led: P::Led,
    storage: P::Storage,
    primary_time: P::PrimaryTime,
    secondary_time: P::SecondaryTime,
    clock: DeviceClock,
    state: ClientState,
    lab_id: String,
}

/// The sender firmware: one session task and three housekeeping tasks over shared hardware.
pub struct SenderClient<P: Platform> {
    config: SenderConfig,
    calibration: Calibration,
    device_key: String,
    board: P::Board,
    link: Mutex<NoopRawMutex, P::Link>,
    shared: Mutex<NoopRawMutex, Shared<P>>,
}

impl<P: Platform> SenderClient<P> {
    pub fn new(
        config: SenderConfig,
        board: P::Board,
        link: P::Link,
        hardware: Hardware<P>,
    ) -> Result<Self, FatalDeviceError> {
        config.validate()?;

        let shared = Shared {
            wifi: hardware.wifi,
            sensor: hardware.sensor,
            temp_knob: hardware.temp_knob,
            humid_knob: hardware.humid_knob,
            display: hardware.display,
            led: hardware.led,
            storage: hardware.storage,
            primary_time: hardware.primary_time,
            secondary_time: hardware.secondary_time,
            clock: DeviceClock::new(),
            state: ClientState::Booting,
            lab_id: config.lab_id.trim().to_string(),
        };

        Ok(Self {
            calibration: Calibration::new(config.adjust_temp_range, config.adjust_humid_range),
            device_key: device_key(&board),
            config,
            board,
            link: Mutex::new(link),
            shared: Mutex::new(shared),
        })
    }

    pub fn device_key(&self) -> &str {
        &self.device_key
    }

    pub async fn state(&self) -> ClientState {
        self.shared.lock().await.state
    }

    /// Runs until a fatal fault, then resets the board.
    pub async fn run(mut self) -> ! {
        let fault = self.supervise().await;
        log::error!("{}, resetting board", fault);
        self.board.reset()
    }

    /// Boots, then drives all tasks until one of them hits a fatal fault.
    pub async fn supervise(&self) -> FatalDeviceError {
        if let Err(e) = self.boot().await {
            return e;
        }

        match select4(
            self.session_task(),
            self.health_task(),
            self.clock_task(),
            self.display_task(),
        )
        .await
        {
            Either4::First(e) | Either4::Second(e) | Either4::Third(e) | Either4::Fourth(e) => e,
        }
    }

    async fn boot(&self) -> Result<(), FatalDeviceError> {
        let mut shared = self.shared.lock().await;
        notify(&mut shared.display, &["WETHAP", "starting"]);
        let _ = shared.led.set_low();

        if !shared.sensor.probe().await {
            log::error!("No sensor detected");
            notify(&mut shared.display, &["no sensor detect"]);
            return Err(FatalDeviceError::SensorMissing);
        }

        if let Some(cached) = load_lab_id(&shared.storage).await {
            log::info!("Using cached labID {}", cached);
            shared.lab_id = cached;
        }

        log::info!("Sender {} booted as {}", self.device_key, shared.lab_id);
        Ok(())
    }

    async fn set_state(&self, state: ClientState) {
        self.shared.lock().await.state = state;
    }

    async fn session_task(&self) -> FatalDeviceError {
        loop {
            match self.session_cycle().await {
                Fault::Fatal(e) => return e,
                Fault::Recoverable(e) => log::warn!("Session ended: {}", e),
            }

            self.set_state(ClientState::Degraded).await;
            Timer::after_millis(self.config.socket_delay_ms).await;
        }
    }

    /// One connection attempt, from network acquisition to link loss.
    async fn session_cycle(&self) -> Fault {
        let mut link = self.link.lock().await;

        let fault = match self.serve(&mut link).await {
            Ok(never) => match never {},
            Err(fault) => fault,
        };
        if let Err(e) = link.close().await {
            log::debug!("Closing link failed: {:?}", e);
        }

        fault
    }

    async fn serve(&self, link: &mut P::Link) -> Result<Infallible, Fault> {
        self.set_state(ClientState::AcquiringNetwork).await;
        {
            let mut shared = self.shared.lock().await;
            acquire_network(
                &mut shared.wifi,
                &self.config.wifi_ssid,
                &self.config.wifi_password,
                self.config.wifi_attempts,
                Duration::from_millis(self.config.wifi_delay_ms),
            )
            .await?;
        }

        self.set_state(ClientState::Handshaking).await;
        link.open(&self.config.server_url).await.map_err(|e| {
            log::warn!("Opening {} failed: {:?}", self.config.server_url, e);
            Error::LinkError
        })?;

        let requested = self.shared.lock().await.lab_id.clone();
        let handshake = Handshake::new(
            self.device_key.clone(),
            self.config.identifier.clone(),
            requested,
        );
        send(link, &handshake).await?;

        let timeout = Duration::from_millis(self.config.handshake_timeout_ms);
        let ack: HandshakeAck = match with_timeout(timeout, link.recv()).await {
            Err(_) => return Err(Error::HandshakeTimeout.into()),
            Ok(Err(e)) => {
                log::warn!("Link failed during handshake: {:?}", e);
                return Err(Error::LinkError.into());
            }
            Ok(Ok(LinkEvent::Closed)) => return Err(Error::HandshakeClosed.into()),
            Ok(Ok(LinkEvent::Text(text))) => JsonProtocol
                .decode_text(&text)
                .map_err(|_| Error::InvalidMessage)?,
        };

        self.adopt_lab_id(&ack.lab_id).await;
        {
            let mut shared = self.shared.lock().await;
            shared.state = ClientState::Connected;
            let _ = shared.led.set_high();
            log::info!("Connected as {}", shared.lab_id);
        }

        // Any frame, keep alive included, restarts the idle timer
        let idle = Duration::from_millis(self.config.idle_timeout_ms);
        loop {
            let text = match with_timeout(idle, link.recv()).await {
                Err(_) => return Err(Error::IdleTimeout.into()),
                Ok(Err(e)) => {
                    log::warn!("Link read failed: {:?}", e);
                    return Err(Error::LinkError.into());
                }
                Ok(Ok(LinkEvent::Closed)) => return Err(Error::NotConnected.into()),
                Ok(Ok(LinkEvent::Text(text))) => text,
            };

            match JsonProtocol.decode_text::<ServerPush>(&text) {
                Ok(ServerPush::RequestInfo { num_gen }) => self.report(link, num_gen).await?,
                Ok(ServerPush::ChangeLabId { new_lab_id }) => self.adopt_lab_id(&new_lab_id).await,
                Ok(ServerPush::KeepAlive) => log::debug!("Keep alive"),
                Err(e) => log::warn!("Ignoring unknown frame: {}", e),
            }
        }
    }

    /// Takes the label the server assigned and caches it for the next boot.
    async fn adopt_lab_id(&self, lab_id: &str) {
        let Some(lab_id) = wethap_api::label::normalize(lab_id) else {
            log::warn!("Ignoring blank labID from server");
            return;
        };

        let mut shared = self.shared.lock().await;
        if shared.lab_id == lab_id && load_lab_id(&shared.storage).await.as_deref() == Some(lab_id) {
            return;
        }

        if shared.lab_id != lab_id {
            log::info!("labID changed: {} -> {}", shared.lab_id, lab_id);
            notify(&mut shared.display, &["change labID", lab_id]);
        }
        shared.lab_id = lab_id.to_string();
        let _ = store_lab_id(&mut shared.storage, lab_id).await;
    }

    async fn report(&self, link: &mut P::Link, num_gen: Option<u32>) -> Result<(), Fault> {
        let info = {
            let mut shared = self.shared.lock().await;
            let measurement = self.measure(&mut shared).await?;

            // An unsynced clock would report 1970; let the server date the reading instead
            let (date, time) = if shared.clock.is_synced() {
                let local = shared.clock.now_local(self.config.timezone_hours);
                (Some(date_string(local)), Some(time_string(local)))
            } else {
                (None, None)
            };
            let _ = shared.led.set_low();

            Info {
                lab_id: shared.lab_id.clone(),
                date,
                time,
                num_gen,
                temperature: measurement.temperature,
                humidity: measurement.humidity,
                pressure: measurement.pressure.unwrap_or_default(),
            }
        };

        log::info!("Reporting {:?} for {}", num_gen, info.lab_id);
        let result = send(link, &ReadingReport { info }).await;
        let _ = self.shared.lock().await.led.set_high();

        result
    }

    async fn measure(&self, shared: &mut Shared<P>) -> Result<Measurement, FatalDeviceError> {
        let raw = shared.sensor.read().await.map_err(|e| {
            log::error!("Sensor read failed: {:?}", e);
            FatalDeviceError::SensorFailure
        })?;
        let temp_knob = shared.temp_knob.read_u16();
        let humid_knob = shared.humid_knob.read_u16();

        Ok(self.calibration.apply(raw, temp_knob, humid_knob))
    }

    async fn health_task(&self) -> FatalDeviceError {
        loop {
            Timer::after_millis(self.config.health_check_ms).await;

            let mut shared = self.shared.lock().await;
            if shared.wifi.is_connected() {
                continue;
            }

            log::warn!("Network lost");
            notify(&mut shared.display, &["offline detect"]);
            let _ = shared.led.set_low();
            shared.state = ClientState::Degraded;

            let result = acquire_network(
                &mut shared.wifi,
                &self.config.wifi_ssid,
                &self.config.wifi_password,
                self.config.wifi_attempts,
                Duration::from_millis(self.config.wifi_delay_ms),
            )
            .await;
            match result {
                Ok(()) => notify(&mut shared.display, &["reconnect"]),
                Err(_) => notify(&mut shared.display, &["reconnect failed"]),
            }
        }
    }

    async fn clock_task(&self) -> FatalDeviceError {
        loop {
            let wait = {
                let mut shared = self.shared.lock().await;
                let Shared {
                    clock,
                    primary_time,
                    secondary_time,
                    display,
                    ..
                } = &mut *shared;

                notify(display, &["time update"]);
                match sync_clock(clock, primary_time, secondary_time).await {
                    Ok(source) => {
                        log::info!("Clock synced from {:?} source", source);
                        notify(display, &["time update", "success"]);
                    }
                    Err(e) => {
                        log::warn!("{}", e);
                        notify(display, &["time update failed"]);
                    }
                }

                // Until the first success, retry on the reconnect cadence
                if clock.is_synced() {
                    clock.until_next_hour()
                } else {
                    Duration::from_millis(self.config.socket_delay_ms)
                }
            };

            Timer::after(wait).await;
        }
    }

    async fn display_task(&self) -> FatalDeviceError {
        if !self.shared.lock().await.display.is_present() {
            return core::future::pending().await;
        }

        loop {
            Timer::after_millis(self.config.display_refresh_ms).await;

            let mut shared = self.shared.lock().await;
            if shared.state != ClientState::Connected || !shared.clock.is_synced() {
                continue;
            }

            // Only reporting treats a failed read as fatal
            let measurement = match self.measure(&mut shared).await {
                Ok(measurement) => measurement,
                Err(e) => {
                    log::warn!("Skipping status refresh: {}", e);
                    continue;
                }
            };
            let local = shared.clock.now_local(self.config.timezone_hours);
            let lines = status_lines(local, &measurement);
            let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
            notify(&mut shared.display, &lines);
        }
    }
}

async fn send<L: SenderLink, T: Serialize>(link: &mut L, message: &T) -> Result<(), Fault> {
    let text = JsonProtocol
        .encode_text(message)
        .map_err(|_| Error::SerializationError)?;

    link.send_text(&text).await.map_err(|e| {
        log::warn!("Link write failed: {:?}", e);
        Fault::from(Error::LinkError)
    })
}
