use clap::Parser;
use log::error;

use ai_failover::{AiClient, RequestOptions};

#[derive(Parser, Debug)]
#[command(
    name = "ai-status",
    about = "Show AI provider availability or route one prompt"
)]
struct Cli
{   /// Send this prompt through the failover chain instead of probing
    #[arg(long)]
    prompt: Option<String>

  , /// System prompt for --prompt
    #[arg(long)]
    system: Option<String>

  , #[arg(long)]
    max_tokens: Option<u32>

  , #[arg(long)]
    temperature: Option<f32>

  , /// Override the configured model for every provider
    #[arg(long)]
    model: Option<String>
}

#[tokio::main]
async fn main() -> std::process::ExitCode
{   env_logger::init();
    let cli = Cli::parse();

    let client = match AiClient::from_env()
    {   Ok(client) => client
      , Err(e) => {
          error!("cannot load AI provider configuration: {}", e);
          eprintln!("{}", e);
          return std::process::ExitCode::from(2);
        }
    };

    let Some(prompt) = cli.prompt
    else
    {   let statuses = client.provider_status().await;
        if statuses.is_empty()
        {   println!("no providers configured");
        }
        for status in statuses
        {   println!(
              "{:<16} {}",
              status.name,
              if status.available { "available" } else { "unavailable" }
            );
        }
        return std::process::ExitCode::SUCCESS;
    };

    let mut options = RequestOptions::new();
    options.system_prompt = cli.system;
    options.max_tokens = cli.max_tokens;
    options.temperature = cli.temperature;
    options.model = cli.model;

    match client.generate_response(&prompt, Some(options)).await
    {   Ok(result) => {
          println!("{}: {}", result.provider, result.text);
          std::process::ExitCode::SUCCESS
        }
      , Err(e) => {
          eprintln!("{}", e);
          std::process::ExitCode::FAILURE
        }
    }
}
