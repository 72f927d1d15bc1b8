use std::path::PathBuf;

use clap::Parser;

const DEFAULT_CONFIG_PATH: &str = "checkpointz.yaml";

#[derive(Debug, Parser)]
#[command(author, version, about = "A checkpoint sync provider for the Ethereum beacon chain")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_default() {
        let cli = Cli::parse_from(["checkpointz"]);

        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_config_path_override() {
        let cli = Cli::parse_from(["checkpointz", "--config", "/etc/checkpointz.yaml"]);

        assert_eq!(cli.config, PathBuf::from("/etc/checkpointz.yaml"));
    }
}
