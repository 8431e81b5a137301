use std::env;
use std::fs;

use contracts::ActionContext;
use engine_api::EngineApi;
use engine_core::current_timestamp;

const DEFAULT_DB: &str = "fiefdom.db";
const DEFAULT_CONFIG_DIR: &str = "configs";

fn print_usage() {
    println!("engine-cli <command>");
    println!("commands:");
    println!("  init-db");
    println!("  actions");
    println!("  show <fiefdom_id>");
    println!("  advance [fiefdom_id]");
    println!("  dispatch <tag> <payload.json> <character_id> <fiefdom_id>");
    println!("environment:");
    println!("  FIEFDOM_DB          database path (default: {DEFAULT_DB})");
    println!("  FIEFDOM_CONFIG_DIR  catalogue directory (default: {DEFAULT_CONFIG_DIR})");
}

fn parse_i64(value: Option<&String>, label: &str) -> Result<i64, String> {
    let raw = value.ok_or_else(|| format!("missing {}", label))?;
    raw.parse::<i64>()
        .map_err(|_| format!("invalid {}: {}", label, raw))
}

fn open_api() -> Result<EngineApi, String> {
    let db_path = env::var("FIEFDOM_DB").unwrap_or_else(|_| DEFAULT_DB.to_string());
    let config_dir =
        env::var("FIEFDOM_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    EngineApi::open(&db_path, &config_dir).map_err(|err| err.to_string())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    let outcome = match command {
        Some("init-db") => open_api().map(|_| println!("database ready")),
        Some("actions") => open_api().map(|api| {
            for (tag, description) in api.registered_actions() {
                println!("{tag:<16} {description}");
            }
        }),
        Some("show") => parse_i64(args.get(2), "fiefdom_id").and_then(|fiefdom_id| {
            let mut api = open_api()?;
            match api.fetch_fiefdom(fiefdom_id).map_err(|err| err.to_string())? {
                Some(fiefdom) => {
                    let rendered = serde_json::to_string_pretty(&fiefdom)
                        .map_err(|err| err.to_string())?;
                    println!("{rendered}");
                    Ok(())
                }
                None => Err(format!("fiefdom {fiefdom_id} not found")),
            }
        }),
        Some("advance") => {
            let filter = match args.get(2) {
                Some(raw) => Some(parse_i64(Some(raw), "fiefdom_id")),
                None => None,
            };
            match filter.transpose() {
                Ok(filter) => open_api().and_then(|mut api| {
                    let report = api.advance_time(current_timestamp(), filter);
                    let rendered =
                        serde_json::to_string_pretty(&report).map_err(|err| err.to_string())?;
                    println!("{rendered}");
                    Ok(())
                }),
                Err(err) => Err(err),
            }
        }
        Some("dispatch") => dispatch_command(&args),
        _ => {
            print_usage();
            return;
        }
    };

    if let Err(err) = outcome {
        eprintln!("error: {err}");
        print_usage();
        std::process::exit(2);
    }
}

fn dispatch_command(args: &[String]) -> Result<(), String> {
    let tag = args.get(2).ok_or("missing action tag")?;
    let payload_path = args.get(3).ok_or("missing payload file")?;
    let character_id = parse_i64(args.get(4), "character_id")?;
    let fiefdom_id = parse_i64(args.get(5), "fiefdom_id")?;

    let raw = fs::read_to_string(payload_path)
        .map_err(|err| format!("cannot read {payload_path}: {err}"))?;
    let payload: serde_json::Value =
        serde_json::from_str(&raw).map_err(|err| format!("invalid payload: {err}"))?;

    let mut api = open_api()?;
    let ctx = ActionContext::new(character_id, fiefdom_id);
    let result = api.dispatch(tag, &payload, &ctx);

    let rendered = serde_json::to_string_pretty(&result).map_err(|err| err.to_string())?;
    println!("{rendered}");
    Ok(())
}
