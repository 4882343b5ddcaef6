//! `txhub` - operator command line for stored transactions

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use txhub_core::prelude::*;
use txhub_core::{EndpointProfile, Severity};
use txhub_ejson::{parse_field, LiteralRewriter};

/// Prints notifications on stderr
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, n: Notification) {
        let mark = match n.severity {
            Severity::Success => "ok",
            Severity::Error => "error",
            Severity::Info => "info",
        };
        eprintln!("[{mark}] {}: {}", n.title, n.description);
    }
}

fn cli() -> Command {
    Command::new("txhub")
        .version(txhub_core::VERSION)
        .about("Inspect, normalize and update stored transactions")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .global(true)
                .help("Webhook URL, overrides the profile"),
        )
        .arg(
            Arg::new("profile")
                .long("profile")
                .global(true)
                .help("Named webhook: production or test"),
        )
        .arg(
            Arg::new("plain-json")
                .long("plain-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Accept strict JSON only, no Shell literals"),
        )
        .arg(
            Arg::new("preview")
                .long("preview")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print the read-only preview"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
        .subcommand(
            Command::new("normalize")
                .about("Normalize JSON or Shell text into plain JSON")
                .arg(Arg::new("file").value_parser(value_parser!(PathBuf)).help("Input file, stdin when omitted")),
        )
        .subcommand(
            Command::new("rewrite")
                .about("Rewrite Shell constructors into Extended JSON")
                .arg(Arg::new("file").value_parser(value_parser!(PathBuf)).help("Input file, stdin when omitted")),
        )
        .subcommand(
            Command::new("fetch")
                .about("Fetch the records of a transaction")
                .arg(Arg::new("id").long("id").help("Transaction identifier"))
                .arg(
                    Arg::new("page-url")
                        .long("page-url")
                        .conflicts_with("id")
                        .help("Hosting page URL carrying the identifier"),
                ),
        )
        .subcommand(
            Command::new("submit")
                .about("Validate and submit an update")
                .arg(Arg::new("id").long("id").required(true).help("Transaction identifier"))
                .arg(
                    Arg::new("transaction")
                        .long("transaction")
                        .value_parser(value_parser!(PathBuf))
                        .help("File with the transaction record"),
                )
                .arg(
                    Arg::new("webcheckout")
                        .long("webcheckout")
                        .value_parser(value_parser!(PathBuf))
                        .help("File with the webcheckout record"),
                )
                .arg(
                    Arg::new("no-refresh")
                        .long("no-refresh")
                        .action(ArgAction::SetTrue)
                        .help("Skip the re-fetch after success"),
                ),
        )
        .subcommand(
            Command::new("edit")
                .about("Fetch, edit scalar fields and optionally submit")
                .arg(Arg::new("id").long("id").required(true).help("Transaction identifier"))
                .arg(
                    Arg::new("set")
                        .long("set")
                        .action(ArgAction::Append)
                        .required(true)
                        .help("slot.key=value, e.g. transaction.amount=600"),
                )
                .arg(
                    Arg::new("submit")
                        .long("submit")
                        .action(ArgAction::SetTrue)
                        .help("Submit after editing"),
                ),
        )
}

fn init_logging(matches: &ArgMatches) {
    let default = if matches.get_flag("verbose") { "txhub=debug" } else { "txhub=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if matches.get_flag("log-json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(matches: &ArgMatches) -> Result<FormConfig> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => FormConfig::load(path)?,
        None => FormConfig::new(),
    };
    let mut config = config.apply_env()?;
    if let Some(profile) = matches.get_one::<String>("profile") {
        config = config.with_profile(profile.parse::<EndpointProfile>()?);
    }
    if let Some(endpoint) = matches.get_one::<String>("endpoint") {
        config = config.with_endpoint(endpoint.clone());
    }
    if matches.get_flag("plain-json") {
        config = config.with_extended_json(false);
    }
    if matches.get_flag("preview") {
        config = config.with_preview(true);
    }
    Ok(config)
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => read_file(path),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text).context("reading stdin")?;
            Ok(text)
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn print_fields<T: WebhookTransport, N: Notifier>(session: &TransactionSession<T, N>) {
    for slot in FieldSlot::ALL {
        println!("{slot}:\n{}", session.field(slot).text());
    }
    if let Some(preview) = session.preview() {
        println!("preview:\n{preview}");
    }
}

fn session_for(config: FormConfig, id: &str) -> Result<TransactionSession<ReqwestTransport, ConsoleNotifier>> {
    let transport = ReqwestTransport::from_config(&config)?;
    Ok(TransactionSession::new(config, transport, ConsoleNotifier, id))
}

fn split_assignment(raw: &str) -> Result<(FieldSlot, &str, &str)> {
    let Some((target, value)) = raw.split_once('=') else {
        bail!("expected slot.key=value, got {raw:?}");
    };
    let Some((slot, key)) = target.split_once('.') else {
        bail!("expected slot.key=value, got {raw:?}");
    };
    let slot = slot.parse::<FieldSlot>().map_err(anyhow::Error::msg)?;
    Ok((slot, key, value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(&matches);
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("normalize", args)) => {
            let text = read_input(args.get_one::<PathBuf>("file"))?;
            let value = parse_field(&text, config.input_mode())?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Some(("rewrite", args)) => {
            let text = read_input(args.get_one::<PathBuf>("file"))?;
            let rewritten = LiteralRewriter::new().rewrite(&text);
            tracing::debug!(rules = ?rewritten.applied, "rewrite finished");
            println!("{}", rewritten.text);
        }
        Some(("fetch", args)) => {
            let config = config.with_auto_fetch(true);
            let mut session = match args.get_one::<String>("page-url") {
                Some(url) => {
                    let transport = ReqwestTransport::from_config(&config)?;
                    TransactionSession::from_page_url(config, url, transport, ConsoleNotifier)?
                }
                None => {
                    let Some(id) = args.get_one::<String>("id") else {
                        bail!("either --id or --page-url is required");
                    };
                    session_for(config, id)?
                }
            };
            session.start().await?;
            print_fields(&session);
        }
        Some(("submit", args)) => {
            let mut config = config;
            if args.get_flag("no-refresh") {
                config = config.with_refresh_delay(Duration::ZERO);
            }
            let id = args.get_one::<String>("id").context("--id is required")?;
            let mut session = session_for(config, id)?;
            for slot in FieldSlot::ALL {
                if let Some(path) = args.get_one::<PathBuf>(slot.as_str()) {
                    session.edit(slot, read_file(path)?);
                }
            }
            let payload = session.submit().await?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Some(("edit", args)) => {
            let id = args.get_one::<String>("id").context("--id is required")?;
            let mut session = session_for(config, id)?;
            session.load().await?;
            for raw in args.get_many::<String>("set").into_iter().flatten() {
                let (slot, key, value) = split_assignment(raw)?;
                let updated = session.edit_field(slot, key, value)?;
                tracing::info!(%slot, key, value = %updated, "field updated");
            }
            if args.get_flag("submit") {
                session.submit().await?;
            } else {
                print_fields(&session);
            }
        }
        _ => unreachable!("subcommand is required"),
    }
    Ok(())
}
