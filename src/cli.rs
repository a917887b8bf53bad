use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "asilsync")]
#[command(author, version, about = "ASIL safety story replication trigger for Jira", long_about = None)]
pub struct Cli {
    /// Path to a configuration file (asilsync.toml/json/yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address the trigger endpoint listens on
    #[arg(short, long, env = "ASILSYNC_BIND", default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// Jira API token, overrides the configuration file
    #[arg(short, long, env = "JIRA_TOKEN")]
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["asilsync"]);
        assert_eq!(cli.bind, "0.0.0.0:8080");
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_explicit_flags() {
        let cli = Cli::parse_from([
            "asilsync",
            "--bind",
            "127.0.0.1:9000",
            "--config",
            "custom.toml",
        ]);
        assert_eq!(cli.bind, "127.0.0.1:9000");
        assert_eq!(cli.config.unwrap().to_str().unwrap(), "custom.toml");
    }
}
