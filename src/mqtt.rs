use rumqttc::v5::MqttOptions;
use tokio_util::sync::CancellationToken;

use crate::error::MqttError;
use crate::frame::CanvasFrame;

/// Subscribe to the canvas state topic and forward every decodable frame.
pub async fn run(
    config: crate::config::MqttConfig,
    cancellation_token: CancellationToken,
    frame_sender: tokio::sync::mpsc::Sender<CanvasFrame>,
) -> Result<(), MqttError> {
    let mut mqttoptions =
        MqttOptions::new(&config.client_name, config.host.to_string(), config.port);
    mqttoptions.set_keep_alive(config.keep_alive);
    // a full frame of JSON is a few kilobytes, well above the default packet limit
    mqttoptions.set_max_packet_size(Some(64 * 1024));

    let (client, mut eventloop) = rumqttc::v5::AsyncClient::new(mqttoptions, 10);

    let topic = config.state_topic();
    let qos = rumqttc::v5::mqttbytes::QoS::from(config.qos);

    let Some(sub_result) = cancellation_token
        .run_until_cancelled(client.subscribe(&topic, qos))
        .await
    else {
        tracing::info!("Cancelled, shutting down frame subscription");
        return Ok(());
    };
    sub_result.map_err(MqttError::Subscribing)?;
    tracing::info!(%topic, "Subscribed to canvas state");

    loop {
        let Some(event) = cancellation_token
            .run_until_cancelled(eventloop.poll())
            .await
        else {
            tracing::info!("Cancelled, shutting down frame subscription");
            break;
        };

        let event = event.map_err(MqttError::Connection)?;

        let rumqttc::v5::Event::Incoming(rumqttc::v5::Incoming::Publish(publish)) = event else {
            continue;
        };

        tracing::trace!(topic = ?publish.topic, bytes = publish.payload.len(), "Received payload");

        let frame = match decode_frame(&publish.payload) {
            Ok(frame) => frame,
            Err(error) => {
                tracing::warn!(%error, "Failed to decode canvas frame, ignoring");
                continue;
            }
        };

        if !forward(&cancellation_token, &frame_sender, frame).await {
            break;
        }
    }

    Ok(())
}

/// Hand a frame to the ingest side, `false` once the subscription should stop.
async fn forward(
    cancellation_token: &CancellationToken,
    frame_sender: &tokio::sync::mpsc::Sender<CanvasFrame>,
    frame: CanvasFrame,
) -> bool {
    match cancellation_token
        .run_until_cancelled(frame_sender.send(frame))
        .await
    {
        Some(Ok(())) => true,
        Some(Err(_closed)) => {
            tracing::error!("Frame receiver closed, shutting down frame subscription");
            false
        }
        None => {
            tracing::info!("Cancelled, shutting down frame subscription");
            false
        }
    }
}

/// Payloads are JSON arrays of rows of packed colors.
fn decode_frame(payload: &[u8]) -> Result<CanvasFrame, serde_json::Error> {
    serde_json::from_slice(payload)
}
