mod arguments;

use std::{process::ExitCode, sync::Arc};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use ethers::{signers::Signer, types::Address};
use school_result_deployer::{
    artifacts::ArtifactStore,
    config::{ResolvedNetwork, ToolchainConfig},
    contracts::school_result::SCHOOL_RESULT,
    deployer::deploy_contract,
    ethers_client::{get_signers, EtherSigner},
    fixtures::deploy_seeded_school_result,
    gas_reporter::GasReporter,
    utils::{format_address, token_to_json},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::arguments::{Arguments, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Arguments::parse();
    init_logging(&args.log_filter);
    tracing::debug!("running with arguments:\n{args}");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(filter: &str) {
    // logs go to stderr, stdout only carries the script output
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

struct Session {
    config: ToolchainConfig,
    network: ResolvedNetwork,
    artifacts: ArtifactStore,
    signers: Vec<Arc<EtherSigner>>,
    gas_reporter: Arc<GasReporter>,
}

async fn run(args: Arguments) -> Result<()> {
    let config = ToolchainConfig::load(args.config.as_deref()).context("failed to load config")?;
    let network = config.resolve_network(args.network.as_deref())?;
    let artifacts = ArtifactStore::new(
        args.artifacts
            .unwrap_or_else(|| config.paths.artifacts.clone()),
    );
    let gas_reporter = Arc::new(GasReporter::new(config.gas_reporter.clone()));

    tracing::info!(
        network = %network.name,
        host = network.rpc_url.host_str().unwrap_or_default(),
        "using network"
    );
    let signers = get_signers(&network)
        .await
        .with_context(|| format!("failed to get signers for network '{}'", network.name))?;

    let session = Session {
        config,
        network,
        artifacts,
        signers,
        gas_reporter,
    };

    match args.command {
        Command::Deploy { contract, save } => deploy(&session, &contract, save).await?,
        Command::Seed => seed(&session).await?,
    }

    let report = session.gas_reporter.report();
    if session.gas_reporter.is_enabled() && !report.is_empty() {
        println!("\n{report}");
    }

    Ok(())
}

async fn deploy(session: &Session, contract: &str, save: bool) -> Result<()> {
    let owner = session.signers[0].clone();
    tracing::debug!(artifacts = %session.artifacts.root().display(), contract, "looking up artifact");
    let artifact = session.artifacts.read(contract)?;

    let deployment = deploy_contract(owner.clone(), &artifact, &session.gas_reporter)
        .await
        .with_context(|| format!("failed to deploy {}", artifact.contract_name))?;

    println!("{}", deployed_message(&deployment.address(), &owner.address()));

    if save {
        let record = deployment.record(
            &session.network.name,
            owner.signer().chain_id(),
            &session.config.solidity,
        );
        record.save(&session.config.paths.deployments)?;
    }

    Ok(())
}

fn deployed_message(address: &Address, owner: &Address) -> String {
    format!(
        "{} deployed by {}",
        format_address(address),
        format_address(owner)
    )
}

async fn seed(session: &Session) -> Result<()> {
    ensure!(
        session.signers.len() >= 2,
        "network '{}' needs at least two accounts to seed students",
        session.network.name
    );
    let owner = session.signers[0].clone();
    let other = &session.signers[1];
    let artifact = session.artifacts.read(SCHOOL_RESULT)?;

    let seeded = deploy_seeded_school_result(
        &artifact,
        owner,
        other.address(),
        session.gas_reporter.clone(),
    )
    .await
    .context("failed to seed SchoolResult")?;

    println!(
        "{} seeded, students:",
        format_address(&seeded.school_result.address())
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&token_to_json(&seeded.students))?
    );

    Ok(())
}
