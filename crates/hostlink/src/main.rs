use std::process;

use serde_json::Value;

use hostlink::logging::init_tracing;
use hostlink::{Config, Toolkit, VersionInfo};

enum Invocation {
    Call { tool: String, params: Value },
    List,
    Version,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let invocation = match parse_args(&args) {
        Ok(v) => v,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("error: {msg}");
                eprintln!();
            }
            eprintln!("Usage: hostlink <tool> [params-json]");
            eprintln!("       hostlink --list");
            eprintln!();
            eprintln!("Arguments:");
            eprintln!("  <tool>           Tool name, e.g. create_blackboard");
            eprintln!("  [params-json]    Parameter object [default: {{}}]");
            eprintln!();
            eprintln!("Options:");
            eprintln!("  --list           Print every tool with a one-line summary");
            eprintln!("  --version        Print version information");
            process::exit(2);
        }
    };

    match invocation {
        Invocation::List => print_json(&serde_json::json!(Toolkit::catalogue())),
        Invocation::Version => print_json(&serde_json::json!(VersionInfo::new())),
        Invocation::Call { tool, params } => {
            init_tracing();
            match run(&tool, params) {
                Ok(true) => {}
                Ok(false) => process::exit(1),
                Err(e) => {
                    eprintln!("error: {e:#}");
                    process::exit(1);
                }
            }
        }
    }
}

fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut tool: Option<String> = None;
    let mut params: Option<Value> = None;

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--list" => return Ok(Invocation::List),
            "--version" | "-V" => return Ok(Invocation::Version),
            "--help" | "-h" => return Err(String::new()),
            a if a.starts_with('-') => return Err(format!("unknown flag: {a}")),
            a if tool.is_none() => tool = Some(a.to_string()),
            a if params.is_none() => {
                let value: Value =
                    serde_json::from_str(a).map_err(|e| format!("params must be JSON: {e}"))?;
                if !value.is_object() {
                    return Err("params must be a JSON object".to_string());
                }
                params = Some(value);
            }
            a => return Err(format!("unexpected argument: {a}")),
        }
    }

    let tool = tool.ok_or("missing required argument: <tool>")?;
    Ok(Invocation::Call {
        tool,
        params: params.unwrap_or_else(|| Value::Object(Default::default())),
    })
}

fn run(tool: &str, params: Value) -> anyhow::Result<bool> {
    let toolkit = Toolkit::from_config(&Config::from_env())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(toolkit.call(tool, params));
    let success = result.is_success();
    print_json(&result.into_value());
    Ok(success)
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("error: JSON serialization failed: {e}"),
    }
}
