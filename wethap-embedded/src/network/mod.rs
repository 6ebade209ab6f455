mod link;

pub use link::*;

use core::fmt::Debug;

use embassy_time::{Duration, Timer};

use crate::error::{Error, Result};

#[allow(async_fn_in_trait)]
pub trait WifiController {
    type Error: Debug;

    /// Power up the radio in station mode
    async fn activate(&mut self) -> core::result::Result<(), Self::Error>;

    /// Start associating with the given network; completion shows up in [`is_connected`](Self::is_connected)
    async fn connect_station(
        &mut self,
        ssid: &str,
        password: &str,
    ) -> core::result::Result<(), Self::Error>;

    /// An association request is still in flight
    fn is_connecting(&self) -> bool;

    fn is_connected(&self) -> bool;
}

/// Brings the station up, polling at most `attempts` times with `delay` between polls.
///
/// A new association request is only issued while none is in flight.
pub async fn acquire_network<W: WifiController>(
    wifi: &mut W,
    ssid: &str,
    password: &str,
    attempts: u8,
    delay: Duration,
) -> Result<()> {
    if wifi.is_connected() {
        return Ok(());
    }

    wifi.activate().await.map_err(|e| {
        log::warn!("Radio activation failed: {:?}", e);
        Error::NetworkError
    })?;

    let mut attempt = 1;
    while !wifi.is_connected() && attempt <= attempts {
        log::info!("WiFi connecting, attempt {}/{}", attempt, attempts);

        if !wifi.is_connecting() {
            if let Err(e) = wifi.connect_station(ssid, password).await {
                log::warn!("Association request failed: {:?}", e);
            }
        }

        Timer::after(delay).await;
        attempt += 1;
    }

    if wifi.is_connected() {
        log::info!("WiFi connected to {}", ssid);
        Ok(())
    } else {
        log::warn!("WiFi unavailable after {} attempts", attempts);
        Err(Error::NetworkUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;

    /// Associates once `connect_station` was called and `ready_after` status polls have passed.
    struct ScriptedWifi {
        ready_after: u32,
        polls: Cell<u32>,
        requests: u32,
    }

    impl ScriptedWifi {
        fn new(ready_after: u32) -> Self {
            Self {
                ready_after,
                polls: Cell::new(0),
                requests: 0,
            }
        }
    }

    impl WifiController for ScriptedWifi {
        type Error = ();

        async fn activate(&mut self) -> core::result::Result<(), ()> {
            Ok(())
        }

        async fn connect_station(&mut self, _: &str, _: &str) -> core::result::Result<(), ()> {
            self.requests += 1;
            Ok(())
        }

        fn is_connecting(&self) -> bool {
            self.requests > 0
        }

        fn is_connected(&self) -> bool {
            self.polls.set(self.polls.get() + 1);
            self.requests > 0 && self.polls.get() > self.ready_after
        }
    }

    #[tokio::test]
    async fn test_connects_within_attempts() {
        let mut wifi = ScriptedWifi::new(3);
        let result = acquire_network(&mut wifi, "lab", "secret", 5, Duration::from_millis(1)).await;

        assert_eq!(result, Ok(()));
        assert_eq!(wifi.requests, 1, "no new request while one is in flight");
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let mut wifi = ScriptedWifi::new(100);
        let result = acquire_network(&mut wifi, "lab", "secret", 3, Duration::from_millis(1)).await;

        assert_eq!(result, Err(Error::NetworkUnavailable));
    }

    #[tokio::test]
    async fn test_already_connected_is_noop() {
        let mut wifi = ScriptedWifi::new(0);
        wifi.requests = 1;
        let result = acquire_network(&mut wifi, "lab", "secret", 1, Duration::from_millis(1)).await;

        assert_eq!(result, Ok(()));
        assert_eq!(wifi.requests, 1);
    }
}
