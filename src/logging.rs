use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

/// Used when `RUST_LOG` is not set. The MQTT client is chatty on reconnects.
const DEFAULT_DIRECTIVES: &str = "info,rumqttc=warn";

pub fn setup<Level>(
    verbosity: clap_verbosity_flag::Verbosity<Level>,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError>
where
    Level: clap_verbosity_flag::LogLevel,
{
    let mut env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    if verbosity.is_present() {
        let directive =
            tracing_subscriber::filter::Directive::from(verbosity.tracing_level_filter());
        env_filter = env_filter.add_directive(directive);
    }

    let subscriber = tracing_subscriber::registry::Registry::default().with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(env_filter),
    );

    tracing::subscriber::set_global_default(subscriber)
}
