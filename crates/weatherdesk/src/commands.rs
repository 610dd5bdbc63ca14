//! weatherdesk command implementations

use anyhow::{Context, Result};
use serde_json::json;
use std::io::Write;
use std::path::Path;
use tracing::info;

use weatherdesk_agent::tools::ToolRegistry;
use weatherdesk_agent::AgentLoop;
use weatherdesk_config::Config;
use weatherdesk_provider::OpenAiCompatibleProvider;

/// Scripted prompts: (label, prompt)
pub const DEMO_PROMPTS: &[(&str, &str)] = &[
    ("weather", "What's the weather like in New York?"),
    ("time", "What time is it in New York?"),
    ("unsupported city", "What's the weather in London?"),
];

/// Load config and environment once, then build the agent.
///
/// A missing API key stops here, before any prompt is sent.
async fn build_agent(config_path: &Path) -> Result<AgentLoop<OpenAiCompatibleProvider>> {
    let config = Config::load_with_env(config_path)
        .await
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let api_key = config.require_api_key()?;
    let provider = OpenAiCompatibleProvider::new(api_key, config.api_base(), Some(config.model()));
    info!("using {:?} endpoint at {}", provider.endpoint(), provider.api_base());

    Ok(AgentLoop::from_config(provider, &config))
}

fn title_case(label: &str) -> String {
    label
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run the three scripted prompts; one failing does not stop the others
pub async fn demo_command(config_path: &Path) -> Result<()> {
    let agent = build_agent(config_path).await?;

    println!("◆ Agent {} initialized. Starting interaction...", agent.definition().name);

    for (label, prompt) in DEMO_PROMPTS {
        println!("\nAsking about {}...", label);
        match agent.run(prompt).await {
            Ok(answer) => {
                println!("\n{} Result:", title_case(label));
                println!("{}", answer);
            }
            Err(e) => {
                println!("\nError during {} execution: {}", label, e);
            }
        }
    }

    println!("\n◆ Interaction finished.");
    Ok(())
}

/// Single prompt, or an interactive loop
pub async fn ask_command(config_path: &Path, message: Option<String>) -> Result<()> {
    let agent = build_agent(config_path).await?;

    if let Some(msg) = message {
        println!("\n◆ {}", agent.process_direct(&msg).await);
        return Ok(());
    }

    println!("◆ Interactive mode (type 'exit' to quit)");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    loop {
        print!("◆ ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        println!("\n◆ {}\n", agent.process_direct(input).await);
    }

    Ok(())
}

/// Invoke a tool without the model; no API key needed
pub async fn tool_command(name: &str, city: &str) -> Result<()> {
    let registry = ToolRegistry::with_defaults();
    let result = registry.execute(name, json!({ "city": city })).await?;
    println!("{}", result);
    Ok(())
}

/// Print the tool specs sent to the model
pub fn tools_command() -> Result<()> {
    let registry = ToolRegistry::with_defaults();
    let definitions = serde_json::to_string_pretty(&registry.definitions())?;
    println!("{}", definitions);
    Ok(())
}

pub async fn init_command(config_path: &Path) -> Result<()> {
    println!("◆ Initializing weatherdesk...");

    let config = weatherdesk_config::init_at(config_path).await?;

    println!("Config:  {}", config_path.display());
    println!("Model:   {}", config.model());
    println!("\nNext steps:");
    println!("  1. Put GOOGLE_API_KEY=... in a .env file or your environment");
    println!("  2. Run the scripted prompts: weatherdesk demo");

    Ok(())
}

pub async fn status_command(config_path: &Path) -> Result<()> {
    let config = Config::load_with_env(config_path).await?;

    println!("◆ weatherdesk status");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "Config:   {} {}",
        config_path.display(),
        if config_path.exists() {
            "[OK]"
        } else {
            "[Missing, using defaults]"
        }
    );
    println!("Model:    {}", config.model());
    println!(
        "API Key:  {}",
        if config.has_api_key() {
            "[Set]"
        } else {
            "[Missing]"
        }
    );
    println!(
        "Tools:    {}",
        ToolRegistry::with_defaults().names().join(", ")
    );

    Ok(())
}
