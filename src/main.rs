use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use wampwire::config::Config;
use wampwire::logging::{self, LogConfig};
use wampwire::protocol::{JsonCodec, Message, MessageKind, Serialization};
use wampwire::Codec;

// ── CLI ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "wampwire",
    version,
    about = "Inspect and re-encode WAMP frames"
)]
struct Cli {
    /// Path to a wampwire.toml file
    #[arg(
        short = 'c',
        long,
        value_name = "PATH",
        env = "WAMPWIRE_CONFIG",
        global = true
    )]
    config: Option<PathBuf>,

    /// Log every encoded and decoded frame
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every message kind with its code and fields
    Kinds,
    /// Decode one frame and describe it
    Decode {
        /// Frame format (defaults to the configured serialization)
        #[arg(long, short, value_enum)]
        format: Option<Serialization>,
        /// File holding the frame; stdin when absent. MessagePack is read as hex.
        file: Option<PathBuf>,
    },
    /// Re-encode one frame in another format
    Transcode {
        #[arg(long, value_enum)]
        from: Serialization,
        #[arg(long, value_enum)]
        to: Serialization,
        /// File holding the frame; stdin when absent. MessagePack is read as hex.
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.clone())?;

    logging::init(resolve_log(&config, cli.verbose, |name| std::env::var(name).ok()));

    match cli.command {
        Command::Kinds => print_kinds(),
        Command::Decode { format, file } => {
            let format = format.unwrap_or(config.serialization);
            let frame = read_frame(file.as_deref(), format)?;
            let message = format
                .codec()
                .decode(&frame)
                .with_context(|| format!("decoding {format} frame"))?;
            describe(&message)?;
        }
        Command::Transcode { from, to, file } => {
            let frame = read_frame(file.as_deref(), from)?;
            let message = from
                .codec()
                .decode(&frame)
                .with_context(|| format!("decoding {from} frame"))?;
            let out = to
                .codec()
                .encode(&message)
                .with_context(|| format!("encoding {to} frame"))?;
            println!("{}", render_frame(&out, to)?);
        }
    }

    Ok(())
}

/// Config file, then environment, then `--verbose`.
fn resolve_log(
    config: &Config,
    verbose: bool,
    var: impl Fn(&str) -> Option<String>,
) -> LogConfig {
    let log = config.log_config().with_vars(var);
    if verbose { log.verbose() } else { log }
}

// ── Commands ────────────────────────────────────────────────────────────────

fn print_kinds() {
    for kind in MessageKind::ALL {
        let optional = kind.optional_fields();
        let fields: Vec<String> = kind
            .fields()
            .iter()
            .map(|f| {
                if optional.contains(f) {
                    format!("{f}?")
                } else {
                    (*f).to_string()
                }
            })
            .collect();
        println!("{:>3}  {:<13} {}", kind.code(), kind.name(), fields.join(", "));
    }
}

fn describe(message: &Message) -> Result<()> {
    println!("kind:        {} ({})", message.name(), message.kind().code());
    match message.destination() {
        Ok(destination) => println!("destination: {destination}"),
        Err(_) => println!("destination: -"),
    }
    match message.request_id() {
        Some(id) => println!("request:     {id}"),
        None => println!("request:     -"),
    }
    let canonical = JsonCodec.encode(message)?;
    println!("frame:       {}", String::from_utf8_lossy(&canonical));
    Ok(())
}

// ── Frame I/O ───────────────────────────────────────────────────────────────

fn read_frame(file: Option<&Path>, format: Serialization) -> Result<Vec<u8>> {
    let raw = match file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };
    debug!(%format, len = raw.len(), "read frame input");

    if format.is_binary() {
        let text = std::str::from_utf8(&raw).context("MessagePack input must be hex text")?;
        let compact: String = text.split_whitespace().collect();
        hex::decode(&compact).context("MessagePack input must be hex text")
    } else {
        Ok(raw)
    }
}

fn render_frame(frame: &[u8], format: Serialization) -> Result<String> {
    if format.is_binary() {
        Ok(hex::encode(frame))
    } else {
        Ok(String::from_utf8(frame.to_vec()).context("JSON frame is not UTF-8")?)
    }
}
