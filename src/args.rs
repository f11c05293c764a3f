use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_PATH;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Camera index (overrides the config file)
    #[arg(short, long)]
    pub cam_index: Option<u32>,

    /// Configuration file
    #[arg(long, default_value = DEFAULT_PATH)]
    pub config: PathBuf,

    /// Mirror the camera image before analysis
    #[arg(long, default_value_t = false)]
    pub mirror: bool,

    /// List available cameras
    #[arg(long)]
    pub list: bool,

    /// Write the default configuration to --config and exit
    #[arg(long)]
    pub init_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["gaze-direction"]);
        assert_eq!(args.cam_index, None);
        assert_eq!(args.config, PathBuf::from(DEFAULT_PATH));
        assert!(!args.mirror && !args.list && !args.init_config);
    }

    #[test]
    fn test_flags() {
        let args = Args::parse_from(["gaze-direction", "-c", "2", "--mirror", "--config", "x.json"]);
        assert_eq!(args.cam_index, Some(2));
        assert!(args.mirror);
        assert_eq!(args.config, PathBuf::from("x.json"));
    }
}
