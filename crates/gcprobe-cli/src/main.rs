use std::time::Duration;

use facet::Facet;
use figue as args;
use gcprobe::{
    AdjacencyGraph, CollectorFacade, CycleDetector, ObjectId, ProbeConfig, ProcessGauges,
    RefCountOnly, SnapshotStore, gather_report, monitor,
};
use tracing::info;

const DEFAULT_TOP_TYPES: usize = 10;

#[derive(Facet, Debug)]
struct Cli {
    #[facet(flatten)]
    builtins: args::FigueBuiltins,
    #[facet(args::subcommand)]
    command: Command,
}

#[derive(Facet, Debug)]
#[repr(u8)]
enum Command {
    /// Capture one labeled snapshot of this process.
    Snapshot {
        #[facet(args::named, default)]
        label: Option<String>,
    },
    /// Memory reading plus collector state.
    Report {
        #[facet(args::named, default)]
        top: Option<usize>,
    },
    /// Sample memory at a fixed interval.
    Monitor {
        #[facet(args::named, default)]
        duration_ms: Option<u64>,
        #[facet(args::named, default)]
        interval_ms: Option<u64>,
    },
    /// Search a graph document for reference cycles.
    Cycles {
        #[facet(args::named)]
        graph: String,
        #[facet(args::named)]
        root: String,
        #[facet(args::named, default)]
        max_depth: Option<u32>,
        #[facet(args::named, default)]
        node_budget: Option<u64>,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = parse_cli()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ProbeConfig::from_env();
    match cli.command {
        Command::Snapshot { label } => run_snapshot(label),
        Command::Report { top } => run_report(top),
        Command::Monitor {
            duration_ms,
            interval_ms,
        } => run_monitor(&config, duration_ms, interval_ms),
        Command::Cycles {
            graph,
            root,
            max_depth,
            node_budget,
        } => run_cycles(&config, graph, root, max_depth, node_budget),
    }
}

fn parse_cli() -> Result<Cli, String> {
    let figue_config = args::builder::<Cli>()
        .map_err(|e| format!("failed to build CLI schema: {e}"))?
        .cli(|cli| cli.strict())
        .help(|h| {
            h.program_name("gcprobe")
                .description("Memory snapshots, monitoring, and reference-cycle search")
                .version(option_env!("CARGO_PKG_VERSION").unwrap_or("dev"))
        })
        .build();
    let cli = args::Driver::new(figue_config)
        .run()
        .into_result()
        .map_err(|e| e.to_string())?;
    Ok(cli.value)
}

fn run_snapshot(label: Option<String>) -> Result<(), String> {
    let gauges = ProcessGauges::new().map_err(|e| e.to_string())?;
    let store = SnapshotStore::new(gauges, RefCountOnly::new());
    let snapshot = store
        .capture(label.unwrap_or_default())
        .map_err(|e| e.to_string())?;
    print_json(&snapshot, "snapshot")
}

fn run_report(top: Option<usize>) -> Result<(), String> {
    let gauges = ProcessGauges::new().map_err(|e| e.to_string())?;
    let facade = CollectorFacade::new(RefCountOnly::new());
    let report = gather_report(&gauges, &facade, top.unwrap_or(DEFAULT_TOP_TYPES))
        .map_err(|e| e.to_string())?;
    print_json(&report, "report")
}

fn run_monitor(
    config: &ProbeConfig,
    duration_ms: Option<u64>,
    interval_ms: Option<u64>,
) -> Result<(), String> {
    let duration = duration_ms
        .map(Duration::from_millis)
        .unwrap_or(config.monitor_duration);
    let interval = interval_ms
        .map(Duration::from_millis)
        .unwrap_or(config.monitor_interval);
    let gauges = ProcessGauges::new().map_err(|e| e.to_string())?;
    info!(?duration, ?interval, "monitoring process memory");
    let samples =
        monitor(&gauges, &RefCountOnly::new(), duration, interval).map_err(|e| e.to_string())?;
    print_json(&samples, "samples")
}

fn run_cycles(
    config: &ProbeConfig,
    graph_path: String,
    root: String,
    max_depth: Option<u32>,
    node_budget: Option<u64>,
) -> Result<(), String> {
    let json = std::fs::read_to_string(&graph_path)
        .map_err(|e| format!("read graph document {graph_path}: {e}"))?;
    let graph = AdjacencyGraph::from_json(&json).map_err(|e| format!("{graph_path}: {e}"))?;
    let root: ObjectId = root.parse().map_err(|e| format!("--root: {e}"))?;
    let root = graph.root(root).map_err(|e| e.to_string())?;

    let mut detector = CycleDetector::new(max_depth.unwrap_or(config.max_depth));
    if let Some(budget) = node_budget.or(config.node_budget) {
        detector = detector.with_node_budget(budget);
    }
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        max_depth = detector.max_depth(),
        "searching for cycles"
    );
    let search = detector.search(&graph, root);
    print_json(&search, "cycle search")
}

fn print_json<T>(value: &T, what: &str) -> Result<(), String>
where
    T: for<'facet> Facet<'facet>,
{
    let pretty = facet_json::to_string_pretty(value).map_err(|e| format!("encode {what}: {e}"))?;
    println!("{pretty}");
    Ok(())
}
