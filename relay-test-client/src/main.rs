use anyhow::Result;
use clap::Parser;
use colored::*;

mod api_client;
mod output;
mod scenarios;
mod sse_client;
mod ws_client;

use api_client::ApiClient;
use output::print_test_summary;

#[derive(Parser)]
#[command(name = "relay-test-client")]
#[command(about = "Relay Integration Testing Tool")]
struct Cli {
    /// Base URL of the relay server (e.g., http://localhost:4000)
    #[arg(long)]
    base_url: String,

    /// User ID to subscribe and broadcast as
    #[arg(long, default_value = "relay-test-user")]
    user: String,

    /// Second user ID for the isolation scenario
    #[arg(long, default_value = "relay-test-bystander")]
    other_user: String,

    /// Test scenario to run
    #[arg(long, value_enum)]
    scenario: ScenarioChoice,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone)]
enum ScenarioChoice {
    /// Test SSE delivery of a live broadcast
    SseDelivery,
    /// Test WebSocket replay of stored events on connect
    WsReplay,
    /// Test WebSocket delivery of a live broadcast
    WsDelivery,
    /// Test application-level ping/pong
    PingPong,
    /// Test the recent events endpoint and its since cursor
    RecentEvents,
    /// Test that events never cross user boundaries
    Isolation,
    /// Run all scenarios
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    println!("{}", "=== SETUP PHASE ===".bright_white().bold());
    println!("{} Target: {}", "→".blue(), cli.base_url);
    println!("{} User: {}", "→".blue(), cli.user);

    let client = reqwest::Client::new();
    let api_client = ApiClient::new(client, cli.base_url.clone());

    println!("\n{}", "=== TEST PHASE ===".bright_white().bold());

    let mut results = Vec::new();

    match cli.scenario {
        ScenarioChoice::SseDelivery => {
            let mut sse = sse_client::Connection::establish(
                &cli.base_url,
                &cli.user,
                "SSE subscriber".to_string(),
            )
            .await?;
            results.push(scenarios::test_sse_delivery(&api_client, &cli.user, &mut sse).await?);
        }
        ScenarioChoice::WsReplay => {
            results.push(scenarios::test_ws_replay(&api_client, &cli.base_url, &cli.user).await?);
        }
        ScenarioChoice::WsDelivery => {
            let mut ws = ws_client::Connection::establish(
                &cli.base_url,
                &cli.user,
                "WebSocket subscriber".to_string(),
            )
            .await?;
            results
                .push(scenarios::test_ws_live_delivery(&api_client, &cli.user, &mut ws).await?);
        }
        ScenarioChoice::PingPong => {
            let mut ws = ws_client::Connection::establish(
                &cli.base_url,
                &cli.user,
                "WebSocket subscriber".to_string(),
            )
            .await?;
            results.push(scenarios::test_ping_pong(&mut ws).await?);
        }
        ScenarioChoice::RecentEvents => {
            results.push(scenarios::test_recent_events(&api_client, &cli.user).await?);
        }
        ScenarioChoice::Isolation => {
            let mut other_sse = sse_client::Connection::establish(
                &cli.base_url,
                &cli.other_user,
                "Bystander".to_string(),
            )
            .await?;
            results
                .push(scenarios::test_user_isolation(&api_client, &cli.user, &mut other_sse).await?);
        }
        ScenarioChoice::All => {
            let mut sse = sse_client::Connection::establish(
                &cli.base_url,
                &cli.user,
                "SSE subscriber".to_string(),
            )
            .await?;
            let mut ws = ws_client::Connection::establish(
                &cli.base_url,
                &cli.user,
                "WebSocket subscriber".to_string(),
            )
            .await?;
            let mut other_sse = sse_client::Connection::establish(
                &cli.base_url,
                &cli.other_user,
                "Bystander".to_string(),
            )
            .await?;

            results.push(scenarios::test_sse_delivery(&api_client, &cli.user, &mut sse).await?);
            results
                .push(scenarios::test_ws_live_delivery(&api_client, &cli.user, &mut ws).await?);
            results.push(scenarios::test_ping_pong(&mut ws).await?);
            results.push(scenarios::test_ws_replay(&api_client, &cli.base_url, &cli.user).await?);
            results.push(scenarios::test_recent_events(&api_client, &cli.user).await?);
            results
                .push(scenarios::test_user_isolation(&api_client, &cli.user, &mut other_sse).await?);
        }
    }

    println!("\n{}", "=== RESULTS ===".bright_white().bold());
    print_test_summary(&results);

    let all_passed = results.iter().all(|r| r.passed);

    if all_passed {
        println!("\n{}", "All tests passed! ✓".bright_green().bold());
    } else {
        println!("\n{}", "Some tests failed! ✗".bright_red().bold());
    }

    std::process::exit(if all_passed { 0 } else { 1 });
}
