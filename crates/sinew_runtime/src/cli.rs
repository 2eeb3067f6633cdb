use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sinew")]
#[command(version)]
#[command(about = "Skin cache buffer pooling and object reference tracing")]
pub struct CliArgs {
    /// JSON settings file; defaults apply when omitted.
    #[arg(long, global = true, env = "SINEW_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Drive the skin cache through a number of frames and report pool usage.
    Skin(SkinArgs),
    /// Explain why the demo level is still alive.
    Trace(TraceArgs),
}

#[derive(Args, Debug)]
pub struct SkinArgs {
    #[arg(long, default_value_t = 120)]
    pub frames: u64,

    #[arg(long, default_value_t = 8)]
    pub meshes: u32,

    #[arg(long, default_value_t = 75)]
    pub bones: u32,

    /// Allocate on the GPU instead of in system memory.
    #[arg(long)]
    pub gpu: bool,
}

#[derive(Args, Debug)]
pub struct TraceArgs {
    /// Path name of the object to trace.
    #[arg(long, default_value = "/Game/Maps/Arena.PersistentLevel")]
    pub object: String,

    /// Also list every direct referencer of the object.
    #[arg(long)]
    pub referencers: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skin_defaults() {
        let args = CliArgs::try_parse_from(["sinew", "skin"]).unwrap();
        match args.command {
            Command::Skin(skin) => {
                assert_eq!(skin.frames, 120);
                assert!(!skin.gpu);
            }
            Command::Trace(_) => panic!("expected skin"),
        }
    }

    #[test]
    fn config_is_global() {
        let args =
            CliArgs::try_parse_from(["sinew", "trace", "--config", "sinew.json", "--referencers"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("sinew.json")));
        assert!(matches!(args.command, Command::Trace(TraceArgs { referencers: true, .. })));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }
}
