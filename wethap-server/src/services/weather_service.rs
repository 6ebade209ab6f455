use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::configs::Weather;

/// Source of the weather description stored next to each reading.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self) -> String;
}

/// Always reports the same description.
#[derive(Debug, Clone)]
pub struct StaticWeather(pub String);

#[async_trait]
impl WeatherProvider for StaticWeather {
    async fn current(&self) -> String {
        self.0.clone()
    }
}

/// Fetches a JSON document and reads one string out of it with a JSON pointer.
pub struct HttpWeather {
    client: reqwest::Client,
    url: String,
    pointer: String,
    fallback: String,
}

impl HttpWeather {
    /// Every lookup gives up after `timeout` and reports `fallback` instead.
    pub fn new(
        url: String,
        pointer: String,
        fallback: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url,
            pointer,
            fallback,
        })
    }

    async fn fetch(&self) -> Result<String, reqwest::Error> {
        let body: Value = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(extract(&body, &self.pointer).unwrap_or_else(|| self.fallback.clone()))
    }
}

#[async_trait]
impl WeatherProvider for HttpWeather {
    async fn current(&self) -> String {
        match self.fetch().await {
            Ok(weather) => weather,
            Err(e) => {
                tracing::warn!(url = %self.url, "weather lookup failed: {}", e);
                self.fallback.clone()
            }
        }
    }
}

fn extract(body: &Value, pointer: &str) -> Option<String> {
    match body.pointer(pointer)? {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

pub fn weather_provider(settings: &Weather) -> Result<Box<dyn WeatherProvider>, reqwest::Error> {
    let provider: Box<dyn WeatherProvider> = match &settings.url {
        Some(url) => Box::new(HttpWeather::new(
            url.clone(),
            settings.pointer.clone(),
            settings.fallback.clone(),
            Duration::from_secs(settings.timeout_secs),
        )?),
        None => Box::new(StaticWeather(settings.fallback.clone())),
    };

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_extract_by_pointer() {
        let body = json!({"forecasts": [{"telop": "晴れ"}], "code": 100});

        assert_eq!(extract(&body, "/forecasts/0/telop"), Some("晴れ".to_string()));
        assert_eq!(extract(&body, "/code"), Some("100".to_string()));
        assert_eq!(extract(&body, "/missing"), None);
    }

    #[tokio::test]
    async fn test_static_weather_without_url() {
        let provider = weather_provider(&Weather {
            url: None,
            pointer: "/weather".to_string(),
            fallback: "unknown".to_string(),
            timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(provider.current().await, "unknown");
    }

    #[tokio::test]
    async fn test_stalled_lookup_falls_back() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let provider = weather_provider(&Weather {
            url: Some(format!("http://{addr}/weather")),
            pointer: "/weather".to_string(),
            fallback: "unknown".to_string(),
            timeout_secs: 1,
        })
        .unwrap();

        let weather = tokio::time::timeout(Duration::from_secs(5), provider.current())
            .await
            .expect("lookup outlived its timeout");
        assert_eq!(weather, "unknown");
    }
}
