//! Command-line interface for the topology generators.
//!
//! Each subcommand configures one generator, builds it into a fresh bounded
//! substrate and reports what was created.

mod commands;

pub use commands::{
    AdjacencyArgs, BudgetCheckArg, Cli, CliError, Command, ConfigurationArgs, ErdosRenyiArgs,
    ExecutionSummary, GeometricArgs, LatticeArgs, RegularArgs, StrictnessArg, SubstrateArgs,
    render_summary, run_cli,
};
