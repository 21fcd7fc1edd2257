#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Setting up error reporting failed")]
    InstallingColorEyre(#[source] color_eyre::Report),

    #[error("Setting up logging failed")]
    Logging(#[source] tracing::subscriber::SetGlobalDefaultError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("Serial transport error")]
    Transport(#[from] crate::transport::TransportError),

    #[error("MQTT error")]
    Mqtt(#[source] MqttError),

    #[error("Dispatch task failed")]
    DispatchTask(#[source] tokio::task::JoinError),
}

#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    #[error("Failed to subscribe")]
    Subscribing(#[source] rumqttc::v5::ClientError),

    #[error("Connection failed")]
    Connection(#[source] rumqttc::v5::ConnectionError),
}
