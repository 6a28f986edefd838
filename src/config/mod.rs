pub mod cli;
pub mod settings;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use self::command_line::*;

#[cfg(feature = "cli")]
mod command_line {
    use crate::config::settings::SettingsOverrides;
    use crate::domain::model::{Flavor, NamingStrategy};
    use clap::{Args, Parser, Subcommand, ValueEnum};
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "pik-upscaler")]
    #[command(about = "Upscale images by URL through the Freepik precision upscaler")]
    pub struct CliConfig {
        /// Path to an optional TOML configuration file
        #[arg(short, long, global = true)]
        pub config: Option<PathBuf>,

        /// API key (defaults to FREEPIK_API_KEY from the environment or .env)
        #[arg(long, global = true)]
        pub api_key: Option<String>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Log process CPU and memory per phase")]
        pub monitor: bool,

        #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
        pub log_format: LogFormat,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    pub enum LogFormat {
        Compact,
        Json,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Submit an image URL, wait for the result and save it
        Upscale(UpscaleArgs),
        /// Download an image and show its size, optionally saving a thumbnail
        Preview {
            url: String,
            /// Write a 400x220 PNG thumbnail to this path
            #[arg(long)]
            save: Option<PathBuf>,
        },
        /// List the image URLs referenced by a web page
        Extract { page_url: String },
    }

    #[derive(Debug, Clone, Args)]
    pub struct UpscaleArgs {
        /// Publicly reachable image URL
        pub url: String,

        #[arg(long)]
        pub flavor: Option<Flavor>,

        #[arg(long)]
        pub sharpen: Option<u8>,

        #[arg(long)]
        pub smart_grain: Option<u8>,

        #[arg(long)]
        pub ultra_detail: Option<u8>,

        #[arg(long)]
        pub scale_factor: Option<u8>,

        #[arg(short, long)]
        pub output_dir: Option<String>,

        /// generated: name after the result URL; source: upscaled_<source name>
        #[arg(long)]
        pub naming: Option<NamingStrategy>,

        /// Seconds to wait before each status poll
        #[arg(long)]
        pub poll_interval: Option<u64>,

        #[arg(long)]
        pub max_attempts: Option<u32>,

        /// Write a JSON run report to this path
        #[arg(long)]
        pub report: Option<PathBuf>,

        /// Show the resolved request without calling the API
        #[arg(long)]
        pub dry_run: bool,
    }

    impl CliConfig {
        pub fn overrides(&self) -> SettingsOverrides {
            let mut overrides = SettingsOverrides {
                api_key: self.api_key.clone(),
                ..Default::default()
            };

            if let Command::Upscale(args) = &self.command {
                overrides.output_dir = args.output_dir.clone();
                overrides.naming = args.naming;
                overrides.flavor = args.flavor;
                overrides.sharpen = args.sharpen;
                overrides.smart_grain = args.smart_grain;
                overrides.ultra_detail = args.ultra_detail;
                overrides.scale_factor = args.scale_factor;
                overrides.poll_interval_secs = args.poll_interval;
                overrides.max_attempts = args.max_attempts;
            }

            overrides
        }
    }

}
