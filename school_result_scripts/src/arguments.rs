use std::{
    fmt::{self, Display, Formatter},
    path::PathBuf,
};

use school_result_deployer::contracts::school_result::SCHOOL_RESULT;

#[derive(clap::Parser)]
#[clap(name = "school-result", about = "Deploy and seed the SchoolResult contract")]
pub struct Arguments {
    /// Config file. Defaults to `deployer.config.json` when present, else the
    /// built-in networks.
    #[clap(long, env = "DEPLOYER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Network to use instead of the config's default network.
    #[clap(long, env)]
    pub network: Option<String>,

    /// Directory holding the compiled contract artifacts.
    #[clap(long, env = "ARTIFACTS_DIR")]
    pub artifacts: Option<PathBuf>,

    #[clap(long, env, default_value = "info")]
    pub log_filter: String,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand)]
pub enum Command {
    /// Deploy a contract from the first account of the network and print its
    /// address.
    Deploy {
        /// Contract name, or `path/to/Source.sol:Name`.
        #[clap(long, default_value = SCHOOL_RESULT)]
        contract: String,

        /// Write a deployment record to the deployments directory.
        #[clap(long)]
        save: bool,
    },
    /// Deploy SchoolResult, add a department and two students, then print
    /// every student.
    Seed,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            config,
            network,
            artifacts,
            log_filter,
            command: _,
        } = self;

        writeln!(f, "config: {:?}", config)?;
        writeln!(f, "network: {:?}", network)?;
        writeln!(f, "artifacts: {:?}", artifacts)?;
        writeln!(f, "log_filter: {}", log_filter)?;
        Ok(())
    }
}
