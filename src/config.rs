use std::time::Duration;

use crate::transport::AckMarkers;
use crate::transport::Marker;

#[derive(Debug, serde::Deserialize)]
pub struct Config {
    pub serial: SerialConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    pub mqtt: MqttConfig,
}

#[derive(Debug, serde::Deserialize)]
pub struct SerialConfig {
    pub path: camino::Utf8PathBuf,
    pub baud_rate: u32,

    /// Zero waits forever
    #[serde(with = "humantime_serde", default = "default_ack_timeout")]
    pub ack_timeout: Duration,

    #[serde(default = "default_ready_marker")]
    pub ready_marker: Marker,

    #[serde(default = "default_paint_complete_marker")]
    pub paint_complete_marker: Marker,
}

fn default_ack_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_ready_marker() -> Marker {
    AckMarkers::default().ready
}

fn default_paint_complete_marker() -> Marker {
    AckMarkers::default().paint_complete
}

impl SerialConfig {
    pub fn markers(&self) -> AckMarkers {
        AckMarkers {
            ready: self.ready_marker,
            paint_complete: self.paint_complete_marker,
        }
    }

    pub fn ack_timeout(&self) -> Option<Duration> {
        (!self.ack_timeout.is_zero()).then_some(self.ack_timeout)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct DispatchConfig {
    #[serde(with = "humantime_serde", default = "default_interval")]
    pub interval: Duration,

    /// Drop queued commands a newer frame already overwrote
    #[serde(default)]
    pub skip_superseded: bool,
}

fn default_interval() -> Duration {
    Duration::from_millis(100)
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            skip_superseded: false,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MqttConfig {
    pub host: std::net::IpAddr,
    pub port: u16,
    pub qos: Qos,
    pub client_name: String,

    #[serde(with = "humantime_serde")]
    pub keep_alive: Duration,

    pub topic_prefix: String,
}

impl MqttConfig {
    pub fn state_topic(&self) -> String {
        format!("{prefix}/state", prefix = self.topic_prefix)
    }
}

#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[expect(clippy::enum_variant_names, reason = "That's the names")]
pub enum Qos {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl From<Qos> for rumqttc::v5::mqttbytes::QoS {
    fn from(value: Qos) -> Self {
        match value {
            Qos::AtMostOnce => rumqttc::v5::mqttbytes::QoS::AtMostOnce,
            Qos::AtLeastOnce => rumqttc::v5::mqttbytes::QoS::AtLeastOnce,
            Qos::ExactlyOnce => rumqttc::v5::mqttbytes::QoS::ExactlyOnce,
        }
    }
}

impl Config {
    pub async fn load(path: &camino::Utf8Path) -> Result<Self, ConfigError> {
        let config_str =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::ReadingFile {
                    path: path.to_path_buf(),
                    source,
                })?;

        Self::parse(&config_str)
    }

    fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;

        if config.dispatch.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }

        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file from path '{}'", .path)]
    ReadingFile {
        path: camino::Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    ParsingConfig(#[from] toml::de::Error),

    #[error("Dispatch interval must not be zero")]
    ZeroInterval,
}
