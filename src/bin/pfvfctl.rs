// CLASSIFICATION: COMMUNITY
// Filename: pfvfctl.rs v0.1
// Author: Lukas Bower
// Date Modified: 2027-09-02

//! Inspect and build PF/VF mailbox words from the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cohesix_pfvf::{
    blkmsg_crc, csr_msg_of, message_of, CsrFormat, HwGeneration, LogSink, Pf2VfMsgType,
    PfvfConfig, PfvfMessage, Vf2PfMsgType,
};

#[derive(Parser)]
#[command(name = "pfvfctl", about = "Encode and inspect PF/VF mailbox words", version = "0.1")]
struct Cli {
    /// Hardware generation (gen2, gen4); overrides the config file.
    #[arg(long, global = true)]
    generation: Option<HwGeneration>,
    /// TOML config describing the control word layout.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a message into a control word.
    Encode {
        #[arg(value_name = "TYPE", value_parser = parse_u32)]
        ty: u32,
        #[arg(value_parser = parse_u32)]
        data: u32,
    },
    /// Decode a control word.
    Decode {
        #[arg(value_parser = parse_u32)]
        word: u32,
    },
    /// Compute the block message CRC of hex-encoded bytes.
    Crc { bytes: String },
}

fn parse_u32(value: &str) -> Result<u32, String> {
    let (digits, radix) = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (value, 10),
    };
    u32::from_str_radix(digits, radix).map_err(|e| format!("invalid number {value:?}: {e}"))
}

fn resolve_format(cli: &Cli) -> Result<CsrFormat, String> {
    if let Some(generation) = cli.generation {
        return Ok(generation.csr_format());
    }
    let cfg = match &cli.config {
        Some(path) => PfvfConfig::load(path).map_err(|e| e.to_string())?,
        None => PfvfConfig::load_active(),
    };
    cfg.csr_format().map_err(|e| e.to_string())
}

fn describe(ty: u32) -> String {
    let pf2vf = Pf2VfMsgType::try_from(ty).map(|t| format!("{t:?}")).ok();
    let vf2pf = Vf2PfMsgType::try_from(ty).map(|t| format!("{t:?}")).ok();
    match (pf2vf, vf2pf) {
        (Some(pf), Some(vf)) => format!("pf2vf {pf} / vf2pf {vf}"),
        (Some(pf), None) => format!("pf2vf {pf}"),
        (None, Some(vf)) => format!("vf2pf {vf}"),
        (None, None) => "unknown".to_owned(),
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    match &cli.command {
        Commands::Encode { ty, data } => {
            let fmt = resolve_format(cli)?;
            let word = csr_msg_of(PfvfMessage::new(*ty, *data), &fmt, &LogSink)
                .map_err(|e| e.to_string())?;
            println!("{word:#010x}");
        }
        Commands::Decode { word } => {
            let fmt = resolve_format(cli)?;
            let msg = message_of(*word, &fmt, &LogSink);
            let origin = if word & fmt.origin != 0 {
                "system"
            } else {
                "vf"
            };
            println!("type: {:#x} ({})", msg.ty, describe(msg.ty));
            println!("data: {:#x}", msg.data);
            println!("origin: {origin}");
        }
        Commands::Crc { bytes } => {
            let payload =
                hex::decode(bytes.trim()).map_err(|e| format!("invalid hex payload: {e}"))?;
            println!("{:#04x}", blkmsg_crc(&payload));
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pfvfctl").chain(args.iter().copied()))
            .expect("arguments parse")
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_decimal_and_hex_numbers() {
        assert_eq!(parse_u32("1000"), Ok(1000));
        assert_eq!(parse_u32("0x3FF"), Ok(0x3FF));
        assert_eq!(parse_u32("0XfF"), Ok(0xFF));
        assert_eq!(parse_u32("4294967295"), Ok(u32::MAX));
    }

    #[test]
    fn rejects_malformed_numbers() {
        for bad in ["4294967296", "0x1_0000_0000", "0x", "ten", "-1", ""] {
            let err = parse_u32(bad).expect_err(bad);
            assert!(err.starts_with("invalid number"), "{bad}: {err}");
        }
    }

    #[test]
    fn subcommands_accept_hex_words() {
        let parsed = cli(&["--generation", "gen4", "decode", "0x4006"]);
        assert_eq!(parsed.generation, Some(HwGeneration::Gen4));
        assert!(matches!(parsed.command, Commands::Decode { word: 0x4006 }));
        assert!(Cli::try_parse_from(["pfvfctl", "decode", "0xZZ"]).is_err());
        assert!(Cli::try_parse_from(["pfvfctl", "--generation", "gen9", "decode", "1"]).is_err());
    }

    #[test]
    fn run_reports_encode_failures() {
        assert!(run(&cli(&["--generation", "gen2", "encode", "3", "0x10"])).is_ok());
        assert!(run(&cli(&["--generation", "gen2", "encode", "0", "1"])).is_err());
        assert!(run(&cli(&["--generation", "gen2", "encode", "0x10", "0"])).is_err());
        assert!(run(&cli(&["--generation", "gen2", "encode", "1", "0x400"])).is_err());
    }

    #[test]
    fn run_decodes_and_checksums() {
        assert!(run(&cli(&["--generation", "gen4", "decode", "0"])).is_ok());
        assert!(run(&cli(&["crc", "0304deadbeef"])).is_ok());
        let err = run(&cli(&["crc", "abc"])).expect_err("odd length");
        assert!(err.starts_with("invalid hex payload"), "{err}");
        assert!(run(&cli(&["crc", "zz"])).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let parsed = cli(&["--config", "/nonexistent/pfvf.toml", "decode", "0"]);
        assert!(run(&parsed).is_err());
    }
}
