use std::path::PathBuf;

use clap::Parser;
use tickcounter_config::Config;

/// Command-line options. Anything given here overrides the config file.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "tickcounter")]
#[command(about = "Terminal countdown with a starfield and an explosion at zero", long_about = None)]
pub struct Cli {
    /// Countdown target: YYYYMMDDHHMMSS or an ISO date/time
    #[arg(long, short)]
    pub date: Option<String>,

    /// Title shown above the counter
    #[arg(long, short)]
    pub title: Option<String>,

    /// Config file (default: platform config dir)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Animation frames per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Do not play the explosion when the countdown ends
    #[arg(long, default_value_t = false)]
    pub no_explosion: bool,

    /// Seed for the starfield and explosion randomness
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    /// Apply the flags on top of `config`.
    pub fn merge_into(&self, mut config: Config) -> Config {
        if let Some(date) = &self.date {
            config.target = Some(date.clone());
        }
        if let Some(title) = &self.title {
            config.title = Some(title.clone());
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if self.no_explosion {
            config.explosion.enabled = false;
        }
        config.sanitized()
    }
}
