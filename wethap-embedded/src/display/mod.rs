use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;

use time::OffsetDateTime;

use crate::sensor::Measurement;

/// A small text panel that shows a handful of centered lines.
pub trait StatusDisplay {
    type Error: Debug;

    fn is_present(&self) -> bool;

    /// Replaces the whole panel content
    fn show_lines(&mut self, lines: &[&str]) -> Result<(), Self::Error>;
}

/// Best-effort write: a broken or missing panel never stops the sender.
pub fn notify<D: StatusDisplay>(display: &mut D, lines: &[&str]) {
    if !display.is_present() {
        return;
    }
    if let Err(e) = display.show_lines(lines) {
        log::debug!("Display write failed: {:?}", e);
    }
}

/// `YYYY-MM-DD`, the date format the server stores.
pub fn date_string(local: OffsetDateTime) -> String {
    format!("{:04}-{:02}-{:02}", local.year(), local.month() as u8, local.day())
}

pub fn time_string(local: OffsetDateTime) -> String {
    format!("{:02}:{:02}:{:02}", local.hour(), local.minute(), local.second())
}

/// Date, time and the last calibrated sample, one value per line.
pub fn status_lines(local: OffsetDateTime, measurement: &Measurement) -> Vec<String> {
    let mut lines = Vec::with_capacity(5);
    lines.push(date_string(local));
    lines.push(time_string(local));
    lines.push(format!("Temp:{:.1}C", measurement.temperature));
    lines.push(format!("Hmd.:{:.1}%", measurement.humidity));
    if let Some(pressure) = measurement.pressure {
        lines.push(format!("Pres.:{:.1}hPa", pressure));
    }
    lines
}
