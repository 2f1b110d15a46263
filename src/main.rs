use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use complyform_client::{
    ClientConfig, ComplyFormClient, FormError, ParticipationForm, submit_participation_form,
};
use dotenvy::dotenv;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the bid-management API (overrides COMPLYFORM_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Attach a subcontractor to a bid
    AddSubcontractor {
        #[arg(long)]
        bid: String,

        #[arg(long)]
        subcontractor: String,

        #[arg(long)]
        description: String,

        /// NAICS code, 2-6 digits
        #[arg(long, default_value = "")]
        naics: String,

        /// Subcontract value in dollars
        #[arg(long)]
        value: String,

        /// Participation category, repeatable (e.g. --breakdown MBE=30)
        #[arg(long = "breakdown", value_parser = parse_breakdown_arg)]
        breakdown: Vec<(String, String)>,

        /// Print the normalized payload instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the server-side compliance rules for a bid
    ValidateBid { bid: String },
    /// List all bids
    ListBids,
    /// Show one bid with its subcontractors
    ShowBid { bid: String },
    /// Detach a subcontractor from a bid
    RemoveSubcontractor { bid: String, bid_subcontractor: String },
    /// List organizations
    ListOrganizations,
    /// Search subcontractors by name
    SearchSubcontractors {
        query: Option<String>,

        /// Only MBE (true) or non-MBE (false) firms
        #[arg(long)]
        mbe: Option<bool>,
    },
    /// Search the subcontractor directory
    SearchDirectory { query: String },
}

fn parse_breakdown_arg(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((category, percentage)) if !category.trim().is_empty() => {
            Ok((category.trim().to_string(), percentage.to_string()))
        }
        _ => Err(format!("expected CATEGORY=PERCENT, got '{}'", raw)),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "complyform=info,complyform_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = ClientConfig::from_env();
    if let Some(api_base) = args.api_base {
        config = config.with_api_base(api_base);
    }
    let client = ComplyFormClient::new(&config).context("failed to build API client")?;
    info!("Using bid-management API at {}", client.base_url());

    match args.command {
        Command::AddSubcontractor {
            bid,
            subcontractor,
            description,
            naics,
            value,
            breakdown,
            dry_run,
        } => {
            let mut form = ParticipationForm::new(subcontractor, description, naics, value);
            for (category, percentage) in &breakdown {
                let before = form.breakdown.len();
                form = form.add_breakdown_entry(category, percentage)?;
                if form.breakdown.len() == before {
                    warn!(
                        "Ignored breakdown entry {}={} (percentage must be a number above 0)",
                        category, percentage
                    );
                }
            }

            let summary = form.breakdown.summary();
            if !form.breakdown.is_empty() {
                match summary.non_mbe_remainder {
                    Some(rest) => info!("Breakdown total: {:.2}% (Non-MBE: {:.2}%)", summary.total, rest),
                    None => info!("Breakdown total: {:.2}%", summary.total),
                }
            }

            if dry_run {
                let request = form.build_request()?;
                return print_json(&request);
            }

            match submit_participation_form(&client, &bid, &form).await {
                Ok(outcome) => {
                    info!("✅ Subcontractor added successfully");
                    print_json(&outcome.created)?;
                }
                Err(e @ FormError::Server(_)) => {
                    error!("❌ Server rejected the submission");
                    bail!(e);
                }
                Err(e) => bail!(e),
            }
        }
        Command::ValidateBid { bid } => {
            let report = client.validate_bid(&bid).await?;
            info!(
                "Bid {}: {} ({} passed, {} failed, {} warnings)",
                report.bid_id, report.overall_status, report.passed, report.failed, report.warnings
            );
            for failure in report.failures() {
                warn!("{}: {}", failure.rule_name, failure.error_message);
            }
            print_json(&report)?;
        }
        Command::ListBids => print_json(&client.list_bids().await?)?,
        Command::ShowBid { bid } => print_json(&client.get_bid(&bid).await?)?,
        Command::RemoveSubcontractor {
            bid,
            bid_subcontractor,
        } => {
            client.remove_subcontractor(&bid, &bid_subcontractor).await?;
            info!("Removed {} from bid {}", bid_subcontractor, bid);
        }
        Command::ListOrganizations => print_json(&client.list_organizations().await?)?,
        Command::SearchSubcontractors { query, mbe } => {
            print_json(&client.search_subcontractors(query.as_deref(), mbe).await?)?
        }
        Command::SearchDirectory { query } => {
            let results = if query.trim().is_empty() {
                client.list_directory(0, 100).await?
            } else {
                client.search_directory(&query).await?
            };
            print_json(&results)?
        }
    }

    Ok(())
}
