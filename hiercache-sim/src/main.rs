use std::fs::File;
use std::io::BufReader;
use std::time::Instant;
use clap::Parser;
use hiercache::config::HierarchyConfig;
use hiercache::io::open_trace;
use hiercache::simulator::Simulator;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Replays per-core access traces through a simulated cache hierarchy"))]
struct Args {
    config: String,

    /// One trace per core, in core order
    #[arg(required = true)]
    traces: Vec<String>,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

fn main() -> Result<(), String> {
    // Drop reports are logged at info, so show them unless RUST_LOG says otherwise
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let start = Instant::now();
    let args = Args::parse();
    let config_file = File::open(&args.config).map_err(|e| format!("Couldn't open the config file at path {}: {e}", args.config))?;
    let config: HierarchyConfig = serde_json::from_reader(BufReader::new(config_file)).map_err(|e| format!("Couldn't parse the config file: {e}"))?;
    let mut simulator = Simulator::new(&config).map_err(|e| format!("Couldn't build the hierarchy: {e}"))?;
    let traces = args
        .traces
        .iter()
        .map(|path| open_trace(path).map_err(|e| format!("Couldn't open the trace file at path {path}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    let replayed = simulator.replay_concurrently(traces).map_err(|e| format!("Simulation failed: {e}"))?;
    simulator.finish().map_err(|e| format!("Couldn't flush the memory trace: {e}"))?;
    log::info!("{replayed} accesses replayed across {} cores", args.traces.len());
    println!("{}", serde_json::to_string_pretty(&simulator.result()).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    if args.performance {
        let end = Instant::now();
        let simulation_time = simulator.get_execution_time();
        let total_time = end - start;
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        println!("Hierarchy with {} cores: {:?}", simulator.cores(), config.levels);
        for (depth, level) in simulator.levels().iter().enumerate() {
            for cache in level.caches() {
                let geometry = cache.geometry();
                println!(
                    "level {depth} {} {}: {}/{} lines valid, {} byte capacity",
                    cache.name(),
                    cache.id(),
                    cache.valid_line_count(),
                    geometry.lines(),
                    geometry.capacity()
                );
            }
        }
    }
    Ok(())
}
