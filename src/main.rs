use std::sync::Arc;

use tokio::sync::Mutex;

mod cli;
mod color;
mod command;
mod config;
mod diff;
mod dispatch;
mod error;
mod frame;
mod logging;
mod mqtt;
mod queue;
mod state;
mod transport;

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::eyre::Result<()> {
    setup_panic();
    color_eyre::install().map_err(crate::error::Error::InstallingColorEyre)?;
    let cli = <crate::cli::Cli as clap::Parser>::parse();
    crate::logging::setup(cli.verbosity).map_err(crate::error::Error::Logging)?;
    let mut cfg = crate::config::Config::load(&cli.config)
        .await
        .map_err(crate::error::Error::from)?;

    match cli.command {
        cli::Command::Run {
            device,
            skip_superseded,
        } => {
            if let Some(device) = device {
                cfg.serial.path = device;
            }
            cfg.dispatch.skip_superseded |= skip_superseded;

            run(cfg).await?;
        }
        cli::Command::VerifyConfig => {
            tracing::info!(
                device = %cfg.serial.path,
                topic = %cfg.mqtt.state_topic(),
                "Configuration verified"
            );
        }
    }

    Ok(())
}

fn setup_panic() {
    human_panic::setup_panic!(human_panic::Metadata::new(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));
}

async fn run(config: crate::config::Config) -> Result<(), crate::error::Error> {
    let driver = crate::transport::TransportDriver::open(&config.serial)?;

    let state = Arc::new(Mutex::new(crate::state::DisplayState::new(
        config.dispatch.skip_superseded,
    )));
    if config.dispatch.skip_superseded {
        tracing::info!("Superseded commands will be skipped");
    }
    let link = Arc::new(crate::dispatch::LinkStatus::default());
    let cancellation_token = tokio_util::sync::CancellationToken::new();

    let (frame_sender, mut frame_receiver) = tokio::sync::mpsc::channel(16);
    let mqtt_handle = tokio::task::spawn({
        let mqtt_config = config.mqtt.clone();
        let cancellation_token = cancellation_token.clone();
        crate::mqtt::run(mqtt_config, cancellation_token, frame_sender)
    });

    let mut dispatch_handle = tokio::task::spawn(
        crate::dispatch::DispatchTask::new(
            config.dispatch.interval,
            cancellation_token.clone(),
            state.clone(),
            link.clone(),
            driver,
        )
        .run(),
    );

    let finished_dispatch = loop {
        tokio::select! {
            frame = frame_receiver.recv() => {
                let Some(frame) = frame else {
                    tracing::error!("Frame source closed");
                    break None;
                };

                let mut state = state.lock().await;
                match state.ingest(&frame) {
                    Ok(enqueued) => tracing::debug!(
                        enqueued,
                        pending = state.pending(),
                        device_ready = link.is_ready(),
                        in_flight = link.is_in_flight(),
                        "Frame received"
                    ),
                    Err(error) => tracing::warn!(%error, "Ignoring invalid frame"),
                }
            }

            result = &mut dispatch_handle => {
                tracing::error!("Dispatch stopped unexpectedly");
                break Some(result);
            }

            _ctrl_c = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl-C received, shutting down");
                break None;
            }
        }
    };

    cancellation_token.cancel();
    drop(frame_receiver);

    let dispatch_result = match finished_dispatch {
        Some(result) => result,
        None => dispatch_handle.await,
    };
    let stats = dispatch_result.map_err(crate::error::Error::DispatchTask)??;
    let unsent = state.lock().await.pending();
    tracing::info!(sent = stats.sent, failed = stats.failed, unsent, "Stopped");

    match mqtt_handle.await {
        Ok(result) => result.map_err(crate::error::Error::Mqtt),
        Err(error) => {
            tracing::error!(?error, "Frame subscription task panicked");
            Ok(())
        }
    }
}
