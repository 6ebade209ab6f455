use std::sync::Arc;

use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};
use wethap_api::{Info, label};

use crate::configs::Storage;
use crate::errors::InfoError;
use crate::models::NewInfo;
use crate::repositories::{InfoRepository, ManualInfoRepository, is_unique_violation};
use crate::services::weather_service::WeatherProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredReading {
    Scheduled(i64),
    Manual(i64),
}

/// Persists sender readings, routing them by whether they answer a scheduled request.
pub struct ReadingService {
    storage: Arc<Storage>,
    infos: Arc<InfoRepository>,
    manual_infos: Arc<ManualInfoRepository>,
    weather: Arc<dyn WeatherProvider>,
    offset: UtcOffset,
}

impl ReadingService {
    pub fn new(
        storage: Arc<Storage>,
        infos: Arc<InfoRepository>,
        manual_infos: Arc<ManualInfoRepository>,
        weather: Arc<dyn WeatherProvider>,
        offset: UtcOffset,
    ) -> Self {
        Self {
            storage,
            infos,
            manual_infos,
            weather,
            offset,
        }
    }

    /// Today's date in the configured offset, `YYYY-MM-DD`.
    pub fn local_date(&self) -> String {
        format_date(OffsetDateTime::now_utc().to_offset(self.offset).date())
    }

    /// Stores `info` under `lab_id`, ignoring the label carried in the reading itself.
    pub async fn record(&self, lab_id: &str, info: &Info) -> Result<StoredReading, InfoError> {
        let lab_id = label::normalize(lab_id).ok_or(InfoError::InvalidLabel)?;

        let date = match &info.date {
            Some(date) => {
                validate_date(date)?;
                date.clone()
            }
            None => self.local_date(),
        };

        let item = NewInfo {
            lab_id: lab_id.to_string(),
            date,
            time: info.time.clone(),
            num_gen: info.num_gen.map(i64::from),
            temperature: info.temperature,
            humidity: info.humidity,
            pressure: info.pressure,
            weather: self.weather.current().await,
        };

        let mut tx = self.storage.get_pool().begin().await?;

        let stored = match item.num_gen {
            Some(num_gen) => {
                let id = self.infos.create(&item, &mut tx).await.map_err(|e| {
                    if is_unique_violation(&e, "infos", "lab_id") {
                        InfoError::DuplicateReading {
                            lab_id: item.lab_id.clone(),
                            date: item.date.clone(),
                            num_gen,
                        }
                    } else {
                        InfoError::Storage(e)
                    }
                })?;
                StoredReading::Scheduled(id)
            }
            None => StoredReading::Manual(self.manual_infos.create(&item, &mut tx).await?),
        };

        tx.commit().await?;

        tracing::info!(lab_id, date = %item.date, num_gen = item.num_gen, ?stored, "reading stored");
        Ok(stored)
    }
}

fn format_date(date: Date) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

pub fn validate_date(date: &str) -> Result<Date, InfoError> {
    Date::parse(date, format_description!("[year]-[month]-[day]"))
        .map_err(|_| InfoError::InvalidDate(date.to_string()))
}
