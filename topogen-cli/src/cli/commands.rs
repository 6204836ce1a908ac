//! Argument parsing and command execution for the topogen CLI.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::{SeedableRng, rngs::SmallRng};
use thiserror::Error;
use tracing::{debug, info};

use topogen_core::{
    AdjacencyImport, BoundedNetwork, BudgetCheck, BuildSummary, Capacity, ConfigurationModel,
    ErdosRenyi, GeometricGraph, Lattice, MatrixStrictness, NodeState, Periodicity, RegularGraph,
    TopologyError,
};

const DEFAULT_MAX_NODES: usize = 1_000;
const DEFAULT_MAX_LINKS: usize = 10_000;
const DEFAULT_MAX_STATES: u32 = 2;
const DEFAULT_STATE: u32 = 1;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "topogen", about = "Generate synthetic network topologies.")]
pub struct Cli {
    /// Substrate limits and random seed.
    #[command(flatten)]
    pub substrate: SubstrateArgs,

    /// Generator to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Capacity of the substrate the generator fills.
#[derive(Debug, Args, Clone)]
pub struct SubstrateArgs {
    /// Maximum number of nodes.
    #[arg(long = "max-nodes", global = true, default_value_t = DEFAULT_MAX_NODES)]
    pub max_nodes: usize,

    /// Maximum number of links.
    #[arg(long = "max-links", global = true, default_value_t = DEFAULT_MAX_LINKS)]
    pub max_links: usize,

    /// Number of node states, including the reserved state 0.
    #[arg(long = "max-states", global = true, default_value_t = DEFAULT_MAX_STATES)]
    pub max_states: u32,

    /// Seed for the random source.
    #[arg(long, global = true, default_value_t = 0)]
    pub seed: u64,
}

impl Default for SubstrateArgs {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
            max_links: DEFAULT_MAX_LINKS,
            max_states: DEFAULT_MAX_STATES,
            seed: 0,
        }
    }
}

impl SubstrateArgs {
    fn capacity(&self) -> Capacity {
        Capacity::new(self.max_nodes, self.max_links, self.max_states)
    }
}

/// Supported generators.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Place links between uniformly drawn endpoints.
    ErdosRenyi(ErdosRenyiArgs),
    /// Realise a degree distribution by stub matching.
    Configuration(ConfigurationArgs),
    /// Give every node the same degree.
    Regular(RegularArgs),
    /// Build an axis-aligned lattice.
    Lattice(LatticeArgs),
    /// Import a whitespace-separated adjacency matrix.
    Adjacency(AdjacencyArgs),
    /// Link nearby points in the unit hypercube.
    Geometric(GeometricArgs),
}

/// Options for the `erdos-renyi` command.
#[derive(Debug, Args, Clone)]
pub struct ErdosRenyiArgs {
    /// Nodes to create (defaults to the node capacity).
    #[arg(long)]
    pub nodes: Option<usize>,
    /// Links to create (defaults to the link capacity).
    #[arg(long)]
    pub links: Option<usize>,
    /// State of every created node.
    #[arg(long, default_value_t = DEFAULT_STATE)]
    pub state: u32,
}

impl Default for ErdosRenyiArgs {
    fn default() -> Self {
        Self {
            nodes: None,
            links: None,
            state: DEFAULT_STATE,
        }
    }
}

/// Options for the `configuration` command.
#[derive(Debug, Args, Clone)]
pub struct ConfigurationArgs {
    /// Comma-separated fractions of nodes with degree 1, 2, 3, ...
    #[arg(long = "degree-dist", value_delimiter = ',', required = true)]
    pub degree_distribution: Vec<f64>,
    /// Nodes to create (defaults to the node capacity).
    #[arg(long)]
    pub nodes: Option<usize>,
    /// State of every created node.
    #[arg(long, default_value_t = DEFAULT_STATE)]
    pub state: u32,
}

impl Default for ConfigurationArgs {
    fn default() -> Self {
        Self {
            degree_distribution: Vec::new(),
            nodes: None,
            state: DEFAULT_STATE,
        }
    }
}

/// Options for the `regular` command.
#[derive(Debug, Args, Clone)]
pub struct RegularArgs {
    /// Degree of every node.
    #[arg(long)]
    pub degree: usize,
    /// Nodes to create (defaults to the node capacity).
    #[arg(long)]
    pub nodes: Option<usize>,
    /// State of every created node.
    #[arg(long, default_value_t = DEFAULT_STATE)]
    pub state: u32,
}

impl Default for RegularArgs {
    fn default() -> Self {
        Self {
            degree: 0,
            nodes: None,
            state: DEFAULT_STATE,
        }
    }
}

/// Options for the `lattice` command.
#[derive(Debug, Args, Clone)]
pub struct LatticeArgs {
    /// Comma-separated axis sizes.
    #[arg(long, value_delimiter = ',', required = true)]
    pub dims: Vec<usize>,
    /// One flag for every axis, or a single flag for all of them.
    #[arg(long, value_delimiter = ',')]
    pub periodic: Vec<bool>,
    /// State of every created node.
    #[arg(long, default_value_t = DEFAULT_STATE)]
    pub state: u32,
}

impl Default for LatticeArgs {
    fn default() -> Self {
        Self {
            dims: Vec::new(),
            periodic: Vec::new(),
            state: DEFAULT_STATE,
        }
    }
}

/// Options for the `adjacency` command.
#[derive(Debug, Args, Clone)]
pub struct AdjacencyArgs {
    /// Text file with one matrix row per line; `#` starts a comment.
    pub path: PathBuf,
    /// How links are counted against the capacity.
    #[arg(long, value_enum, default_value_t = StrictnessArg::Strict)]
    pub strictness: StrictnessArg,
    /// State of every created node.
    #[arg(long, default_value_t = DEFAULT_STATE)]
    pub state: u32,
}

/// CLI spelling of [`MatrixStrictness`].
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum)]
pub enum StrictnessArg {
    /// Count every pair that will be linked.
    #[default]
    Strict,
    /// Count only the upper triangle.
    UpperOnly,
}

impl From<StrictnessArg> for MatrixStrictness {
    fn from(value: StrictnessArg) -> Self {
        match value {
            StrictnessArg::Strict => Self::Strict,
            StrictnessArg::UpperOnly => Self::UpperOnly,
        }
    }
}

/// Options for the `geometric` command.
#[derive(Debug, Args, Clone)]
pub struct GeometricArgs {
    /// Nodes to place (defaults to the node capacity).
    #[arg(long)]
    pub nodes: Option<usize>,
    /// Link budget (defaults to the link capacity).
    #[arg(long)]
    pub links: Option<usize>,
    /// Embedding dimension.
    #[arg(long, default_value_t = 2)]
    pub dimension: usize,
    /// Target mean degree.
    #[arg(long = "mean-degree", default_value_t = 2.0)]
    pub mean_degree: f64,
    /// When the link budget is enforced.
    #[arg(long = "budget-check", value_enum, default_value_t = BudgetCheckArg::Precheck)]
    pub budget_check: BudgetCheckArg,
    /// State of every created node.
    #[arg(long, default_value_t = DEFAULT_STATE)]
    pub state: u32,
}

impl Default for GeometricArgs {
    fn default() -> Self {
        Self {
            nodes: None,
            links: None,
            dimension: 2,
            mean_degree: 2.0,
            budget_check: BudgetCheckArg::Precheck,
            state: DEFAULT_STATE,
        }
    }
}

/// CLI spelling of [`BudgetCheck`].
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum)]
pub enum BudgetCheckArg {
    /// Fail before touching the substrate.
    #[default]
    Precheck,
    /// Fail mid-construction, keeping the partial graph.
    DuringConstruction,
}

impl From<BudgetCheckArg> for BudgetCheck {
    fn from(value: BudgetCheckArg) -> Self {
        match value {
            BudgetCheckArg::Precheck => Self::Precheck,
            BudgetCheckArg::DuringConstruction => Self::DuringConstruction,
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading the adjacency matrix failed.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// An adjacency matrix entry is not a number.
    #[error("`{path}` line {line}: `{token}` is not a number")]
    InvalidEntry {
        /// Matrix file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// Offending token.
        token: String,
    },
    /// The generator rejected the request.
    #[error(transparent)]
    Core(#[from] TopologyError),
}

/// Outcome of a successful command.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSummary {
    /// Counts reported by the generator.
    pub build: BuildSummary,
    /// Links whose endpoints coincide.
    pub self_loops: usize,
    /// Largest node degree, or zero for an empty graph.
    pub max_degree: usize,
}

/// Executes the command represented by `cli` against a fresh substrate.
///
/// # Errors
/// Returns [`CliError`] when the matrix file cannot be read or the generator
/// rejects the request.
///
/// # Examples
/// ```
/// use topogen_cli::cli::{Cli, Command, LatticeArgs, SubstrateArgs, run_cli};
///
/// let cli = Cli {
///     substrate: SubstrateArgs::default(),
///     command: Command::Lattice(LatticeArgs {
///         dims: vec![4, 4],
///         periodic: vec![true],
///         state: 1,
///     }),
/// };
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.build.links, 32);
/// assert_eq!(summary.max_degree, 4);
/// # Ok::<(), topogen_cli::cli::CliError>(())
/// ```
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let Cli { substrate, command } = cli;
    let mut network = BoundedNetwork::new(substrate.capacity());
    let mut rng = SmallRng::seed_from_u64(substrate.seed);
    let build = run_command(command, &mut network, &mut rng)?;
    let summary = inspect(build, &network);
    info!(
        model = summary.build.model,
        self_loops = summary.self_loops,
        max_degree = summary.max_degree,
        "command finished"
    );
    Ok(summary)
}

pub(super) fn run_command(
    command: Command,
    network: &mut BoundedNetwork,
    rng: &mut SmallRng,
) -> Result<BuildSummary, CliError> {
    let summary = match command {
        Command::ErdosRenyi(args) => {
            let mut generator = ErdosRenyi::new().with_state(NodeState::new(args.state));
            if let Some(nodes) = args.nodes {
                generator = generator.with_nodes(nodes);
            }
            if let Some(links) = args.links {
                generator = generator.with_links(links);
            }
            generator.build(network, rng)?
        }
        Command::Configuration(args) => {
            let mut generator = ConfigurationModel::new(args.degree_distribution)
                .with_state(NodeState::new(args.state));
            if let Some(nodes) = args.nodes {
                generator = generator.with_nodes(nodes);
            }
            generator.build(network, rng)?
        }
        Command::Regular(args) => {
            let mut generator =
                RegularGraph::new(args.degree).with_state(NodeState::new(args.state));
            if let Some(nodes) = args.nodes {
                generator = generator.with_nodes(nodes);
            }
            generator.build(network, rng)?
        }
        Command::Lattice(args) => Lattice::new(args.dims)
            .with_periodic(periodicity(args.periodic))
            .with_state(NodeState::new(args.state))
            .build(network, rng)?,
        Command::Adjacency(args) => {
            let matrix = read_matrix(&args.path)?;
            AdjacencyImport::new(&matrix)
                .with_strictness(args.strictness.into())
                .with_state(NodeState::new(args.state))
                .build(network, rng)?
        }
        Command::Geometric(args) => {
            let mut generator = GeometricGraph::new()
                .with_dimension(args.dimension)
                .with_mean_degree(args.mean_degree)
                .with_budget_check(args.budget_check.into())
                .with_state(NodeState::new(args.state));
            if let Some(nodes) = args.nodes {
                generator = generator.with_nodes(nodes);
            }
            if let Some(links) = args.links {
                generator = generator.with_links(links);
            }
            generator.build(network, rng)?
        }
    };
    Ok(summary)
}

/// Maps the flag list onto a periodicity: none means open, one applies to
/// every axis.
pub(super) fn periodicity(flags: Vec<bool>) -> Periodicity {
    match flags.as_slice() {
        [] => Periodicity::Uniform(false),
        [flag] => Periodicity::Uniform(*flag),
        _ => Periodicity::PerAxis(flags),
    }
}

/// Parses a whitespace-separated numeric matrix, skipping blank lines and
/// `#` comments.
pub(super) fn read_matrix(path: &Path) -> Result<Vec<Vec<f64>>, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let matrix = parse_matrix(path, &text)?;
    debug!(path = %path.display(), rows = matrix.len(), "adjacency matrix read");
    Ok(matrix)
}

pub(super) fn parse_matrix(path: &Path, text: &str) -> Result<Vec<Vec<f64>>, CliError> {
    let mut rows = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let content = raw.split_once('#').map_or(raw, |(before, _)| before);
        if content.trim().is_empty() {
            continue;
        }
        let row = content
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| CliError::InvalidEntry {
                    path: path.to_path_buf(),
                    line: index + 1,
                    token: token.to_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    Ok(rows)
}

fn inspect(build: BuildSummary, network: &BoundedNetwork) -> ExecutionSummary {
    let self_loops = network.links().filter(|link| link.is_loop()).count();
    let max_degree = network
        .nodes()
        .filter_map(|node| network.degree(node))
        .max()
        .unwrap_or(0);
    ExecutionSummary {
        build,
        self_loops,
        max_degree,
    }
}

/// Renders `summary` to `writer` as `key: value` lines.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// use topogen_cli::cli::{ExecutionSummary, render_summary};
/// use topogen_core::BuildSummary;
///
/// let summary = ExecutionSummary {
///     build: BuildSummary { model: "regular", nodes: 4, links: 4 },
///     self_loops: 0,
///     max_degree: 2,
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// assert!(String::from_utf8_lossy(&buffer).contains("mean degree: 2.000"));
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "model: {}", summary.build.model)?;
    writeln!(writer, "nodes: {}", summary.build.nodes)?;
    writeln!(writer, "links: {}", summary.build.links)?;
    writeln!(writer, "mean degree: {:.3}", summary.build.mean_degree())?;
    writeln!(writer, "max degree: {}", summary.max_degree)?;
    writeln!(writer, "self loops: {}", summary.self_loops)?;
    Ok(())
}
