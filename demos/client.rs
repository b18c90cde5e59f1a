use argh::FromArgs;
use dermalens::{
    AllergyList, ClientConfig, HttpTransport, ImageResource, PollPolicy, ResultsHandoff,
    Workflow, WorkflowOutcome, health,
};
use std::{path::PathBuf, time::Duration};

// defaults for the client
const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_WAIT_MS: u64 = 10_000;

#[derive(FromArgs)]
/// Dermalens client for analysing skin images and fetching recommendations
struct ClientArgs {
    /// the base URL of the analysis service
    #[argh(option, short = 'u', default = "DEFAULT_BASE_URL.to_string()")]
    base_url: String,

    /// command to execute: "analyze" or "health"
    #[argh(subcommand)]
    command: ClientCommands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum ClientCommands {
    Analyze(AnalyzeCommand),
    Health(HealthCommand),
}

#[derive(FromArgs)]
/// Upload an image, wait for the diagnosis and fetch recommendations
#[argh(subcommand, name = "analyze")]
struct AnalyzeCommand {
    /// the path to the image (jpg, png or webp)
    #[argh(option, short = 'i')]
    image_path: PathBuf,

    /// comma-separated allergies, e.g. "peanuts, dairy"
    #[argh(option, short = 'a', default = "String::new()")]
    allergies: String,

    /// milliseconds to wait before reading the job status
    #[argh(option, short = 'w', default = "DEFAULT_WAIT_MS")]
    wait_ms: u64,

    /// re-read a still-running job up to this many times
    #[argh(option, short = 'r')]
    retries: Option<u32>,
}

#[derive(FromArgs)]
/// Check that the analysis service is up
#[argh(subcommand, name = "health")]
struct HealthCommand {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: ClientArgs = argh::from_env();

    match args.command {
        ClientCommands::Analyze(command) => {
            let mut config = ClientConfig::new(args.base_url)
                .with_observation_delay(Duration::from_millis(command.wait_ms));
            if let Some(retries) = command.retries {
                config = config.with_poll_policy(PollPolicy::Backoff {
                    max_attempts: retries.saturating_add(1),
                    initial_interval: Duration::from_secs(2),
                    max_interval: Duration::from_secs(30),
                });
            }

            let image = ImageResource::from_path(&command.image_path).await?;
            let workflow = Workflow::new(HttpTransport::new(&config)?, &config);

            match workflow.run(&image, &command.allergies).await {
                WorkflowOutcome::Success {
                    analysis,
                    recommendations,
                } => {
                    let handoff = ResultsHandoff::new(
                        analysis,
                        AllergyList::parse(&command.allergies),
                        recommendations,
                    );
                    println!("Condition: {}", handoff.condition());
                    println!("Allergies: {}", handoff.allergies);
                    println!(
                        "Result: {}",
                        serde_json::to_string_pretty(&handoff.recommendations)?
                    );
                    println!("Hand-off: {}", handoff.encode()?);
                }
                WorkflowOutcome::Failure { stage, error } => {
                    eprintln!("Analysis failed during {}: {}", stage.as_str(), error);
                    std::process::exit(1);
                }
            }
        }
        ClientCommands::Health(_) => {
            let config = ClientConfig::new(args.base_url);
            let status = health::check(&HttpTransport::new(&config)?).await?;
            println!("Status: {status}");
        }
    }

    Ok(())
}
