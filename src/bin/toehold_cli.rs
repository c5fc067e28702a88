use serde::Serialize;
use std::env;
use toehold::{
    about,
    config::{DEFAULT_CONFIG_PATH, ToeholdConfig},
    export::export_ranked_csv,
    pipeline::AnalysisPipeline,
    sequence::{NamedSequence, load_fasta_records},
    store::{DEFAULT_STATE_PATH, ResultStore},
};

#[derive(Serialize)]
struct EffectiveConfig<'a> {
    config: &'a ToeholdConfig,
    resolved_executable: String,
}

struct GlobalArgs {
    state_path: String,
    config_path: String,
    cmd_idx: usize,
}

fn usage() {
    eprintln!(
        "Usage:\n  \
  toehold_cli --version\n  \
  toehold_cli [--state PATH] [--config PATH] analyze SEQUENCE|@FASTA [--window N] [--name NAME]\n  \
  toehold_cli [--state PATH] runs\n  \
  toehold_cli [--state PATH] list RUN_ID\n  \
  toehold_cli [--state PATH] details RUN_ID INDEX\n  \
  toehold_cli [--state PATH] export-csv RUN_ID OUTPUT.csv\n  \
  toehold_cli [--state PATH] remove RUN_ID\n  \
  toehold_cli [--config PATH] config\n\n  \
  Defaults: --state {DEFAULT_STATE_PATH}, --config {DEFAULT_CONFIG_PATH}\n  \
  The folding tool is taken from the config, else $TOEHOLD_PAIRS_BIN, else 'pairs'"
    );
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Could not serialize JSON output: {e}"))?;
    println!("{text}");
    Ok(())
}

fn parse_global_args(args: &[String]) -> Result<GlobalArgs, String> {
    let mut ret = GlobalArgs {
        state_path: DEFAULT_STATE_PATH.to_string(),
        config_path: DEFAULT_CONFIG_PATH.to_string(),
        cmd_idx: 1,
    };
    while ret.cmd_idx < args.len() {
        let flag = args[ret.cmd_idx].as_str();
        if flag != "--state" && flag != "--config" {
            break;
        }
        let value = args
            .get(ret.cmd_idx + 1)
            .ok_or_else(|| format!("Missing PATH after {flag}"))?
            .clone();
        if flag == "--state" {
            ret.state_path = value;
        } else {
            ret.config_path = value;
        }
        ret.cmd_idx += 2;
    }
    Ok(ret)
}

fn load_config(path: &str) -> Result<ToeholdConfig, String> {
    ToeholdConfig::load_or_default(path).map_err(|e| e.to_string())
}

fn load_store(path: &str) -> Result<ResultStore, String> {
    ResultStore::load_or_default(path).map_err(|e| e.to_string())
}

fn parse_number(value: &str, what: &str) -> Result<usize, String> {
    value
        .parse::<usize>()
        .map_err(|e| format!("Invalid {what} '{value}': {e}"))
}

fn read_inputs(input: &str, name: Option<String>) -> Result<Vec<NamedSequence>, String> {
    if let Some(path) = input.strip_prefix('@') {
        load_fasta_records(path).map_err(|e| format!("{e:#}"))
    } else {
        Ok(vec![NamedSequence {
            name,
            raw: input.to_string(),
        }])
    }
}

fn run_analyze(global: &GlobalArgs, rest: &[String]) -> Result<(), String> {
    let Some(input) = rest.first() else {
        usage();
        return Err("analyze requires a SEQUENCE or @FASTA argument".to_string());
    };
    let config = load_config(&global.config_path)?;
    let mut window = config.window;
    let mut name = None;
    let mut idx = 1;
    while idx < rest.len() {
        let value = rest
            .get(idx + 1)
            .ok_or_else(|| format!("Missing value after {}", rest[idx]))?;
        match rest[idx].as_str() {
            "--window" => window = parse_number(value, "window")?,
            "--name" => name = Some(value.clone()),
            other => return Err(format!("Unknown analyze option '{other}'")),
        }
        idx += 2;
    }

    let records = read_inputs(input, name)?;
    let pipeline = AnalysisPipeline::with_pairs_tool(config).map_err(|e| e.to_string())?;
    let mut store = load_store(&global.state_path)?;

    let mut summaries = vec![];
    let mut failures = 0;
    for (record, result) in records.iter().zip(pipeline.analyze_batch(&records, window)) {
        match result {
            Ok(report) => {
                let run_id = store.insert(report);
                summaries.push(store.summary(&run_id).map_err(|e| e.to_string())?);
            }
            Err(e) => {
                failures += 1;
                eprintln!("{}: {e}", record.name.as_deref().unwrap_or("sequence"));
            }
        }
    }
    if summaries.is_empty() {
        return Err(format!("All {failures} analyses failed"));
    }
    store
        .save_to_path(&global.state_path)
        .map_err(|e| e.to_string())?;
    if summaries.len() == 1 && failures == 0 {
        print_json(&summaries[0])
    } else {
        print_json(&summaries)
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
    if args.len() <= 1 {
        usage();
        return Err("Missing command".to_string());
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }

    let global = parse_global_args(&args)?;
    if args.len() <= global.cmd_idx {
        usage();
        return Err("Missing command".to_string());
    }
    let command = &args[global.cmd_idx];
    let rest = &args[global.cmd_idx + 1..];

    match command.as_str() {
        "analyze" => run_analyze(&global, rest),
        "runs" => print_json(&load_store(&global.state_path)?.runs()),
        "list" => {
            let [run_id, ..] = rest else {
                usage();
                return Err("list requires RUN_ID".to_string());
            };
            let store = load_store(&global.state_path)?;
            print_json(&store.summary(run_id).map_err(|e| e.to_string())?)
        }
        "details" => {
            let [run_id, index, ..] = rest else {
                usage();
                return Err("details requires: RUN_ID INDEX".to_string());
            };
            let index = parse_number(index, "index")?;
            let store = load_store(&global.state_path)?;
            let detail = store
                .candidate_detail(run_id, index)
                .map_err(|e| e.to_string())?;
            print_json(&detail)
        }
        "export-csv" => {
            let [run_id, output, ..] = rest else {
                usage();
                return Err("export-csv requires: RUN_ID OUTPUT.csv".to_string());
            };
            let store = load_store(&global.state_path)?;
            let run = store.get(run_id).map_err(|e| e.to_string())?;
            export_ranked_csv(&run.report, output).map_err(|e| e.to_string())?;
            println!(
                "Wrote {} ranked candidates of '{run_id}' to '{output}'",
                run.report.candidates.len()
            );
            Ok(())
        }
        "remove" => {
            let [run_id, ..] = rest else {
                usage();
                return Err("remove requires RUN_ID".to_string());
            };
            let mut store = load_store(&global.state_path)?;
            store.remove(run_id).map_err(|e| e.to_string())?;
            store
                .save_to_path(&global.state_path)
                .map_err(|e| e.to_string())?;
            println!("Removed '{run_id}' from '{}'", global.state_path);
            Ok(())
        }
        "config" => {
            let config = load_config(&global.config_path)?;
            print_json(&EffectiveConfig {
                resolved_executable: config.tool.resolved_executable(),
                config: &config,
            })
        }
        _ => {
            usage();
            Err(format!("Unknown command '{command}'"))
        }
    }
}
