use clap::Parser;

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(flatten)]
    pub verbosity: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

    /// Path of the configuration file
    #[clap(long, short)]
    pub config: camino::Utf8PathBuf,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Mirror the remote canvas onto the matrix until interrupted
    Run {
        /// Serial device to use instead of the configured one
        #[clap(long)]
        device: Option<camino::Utf8PathBuf>,

        /// Drop queued commands for pixels a newer frame already overwrote
        #[clap(long)]
        skip_superseded: bool,
    },

    /// Load the configuration and exit
    VerifyConfig,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Cli;
    use super::Command;

    #[test]
    fn test_run_with_device_override() {
        let cli = Cli::try_parse_from([
            "pixelsync",
            "--config",
            "pixelsync.toml",
            "run",
            "--device",
            "/dev/ttyUSB1",
        ])
        .unwrap();

        assert_eq!(cli.config.as_str(), "pixelsync.toml");
        match cli.command {
            Command::Run {
                device,
                skip_superseded,
            } => {
                assert_eq!(device.as_deref().map(|d| d.as_str()), Some("/dev/ttyUSB1"));
                assert!(!skip_superseded);
            }
            other => panic!("Expected run command, got {other:?}"),
        }
    }

    #[test]
    fn test_config_is_required() {
        assert!(Cli::try_parse_from(["pixelsync", "verify-config"]).is_err());
    }
}
