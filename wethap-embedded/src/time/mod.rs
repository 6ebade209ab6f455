mod clock;

pub use clock::*;

use alloc::string::String;
use core::fmt::Debug;

use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{Error, Result};

/// A remote authority for the current UTC time.
#[allow(async_fn_in_trait)]
pub trait TimeSource {
    type Error: Debug;

    fn name(&self) -> &'static str;

    async fn fetch_utc(&mut self) -> core::result::Result<OffsetDateTime, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSource {
    Primary,
    Secondary,
}

/// Sets the clock from the primary source, falling back to the secondary one.
pub async fn sync_clock<A: TimeSource, B: TimeSource>(
    clock: &mut DeviceClock,
    primary: &mut A,
    secondary: &mut B,
) -> Result<SyncSource> {
    match primary.fetch_utc().await {
        Ok(utc) => {
            clock.sync(utc);
            return Ok(SyncSource::Primary);
        }
        Err(e) => log::warn!("{} time sync failed: {:?}", primary.name(), e),
    }

    match secondary.fetch_utc().await {
        Ok(utc) => {
            clock.sync(utc);
            Ok(SyncSource::Secondary)
        }
        Err(e) => {
            log::warn!("{} time sync failed: {:?}", secondary.name(), e);
            Err(Error::TimeSyncFailed)
        }
    }
}

#[derive(Deserialize)]
struct TimeApiResponse {
    utc_datetime: String,
}

/// Reads the `utc_datetime` field of an HTTP time API body.
pub fn parse_time_api(body: &str) -> Result<OffsetDateTime> {
    let response: TimeApiResponse =
        serde_json::from_str(body).map_err(|_| Error::SerializationError)?;

    OffsetDateTime::parse(&response.utc_datetime, &Rfc3339).map_err(|_| Error::InvalidMessage)
}
