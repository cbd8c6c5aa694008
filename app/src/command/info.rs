use gemline_config::Config;
use gemline_memory::MemoryManager;
use tracing::info;

/// Strategy for displaying the effective configuration.
///
/// Secrets are masked, and the database is connected to so a bad URL shows up
/// before `serve` is started.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== gemline Configuration ===\n");

        println!("LINE:");
        println!(
            "  Channel Access Token: {}",
            mask_secret(&config.line.channel_access_token)
        );
        println!("  Channel Secret: {}", mask_secret(&config.line.channel_secret));
        println!("  API Base: {}", config.line.api_base);
        println!();

        println!("Gemini:");
        let gemini = &config.providers.gemini;
        println!("  API Key: {}", mask_secret(&gemini.api_key));
        println!("  Model: {}", gemini.model);
        println!("  Base URL: {}", gemini.base_url);
        if let Some(t) = gemini.temperature {
            println!("  Temperature: {t}");
        }
        if let Some(n) = gemini.max_output_tokens {
            println!("  Max Output Tokens: {n}");
        }
        println!();

        println!("Assistant:");
        println!("  Persona: {}", truncate(&config.assistant.persona, 40));
        println!("  Timezone: {}", config.assistant.timezone);
        println!("  Greeting Delay: {}ms", config.assistant.greeting_delay_ms);
        println!();

        println!("Memory:");
        println!("  Scope: {:?}", config.memory.scope);
        if config.memory.max_entries == 0 {
            println!("  Max Entries: unbounded");
        } else {
            println!("  Max Entries: {}", config.memory.max_entries);
        }
        println!("  Replay Timestamps: {}", config.memory.replay_timestamps);
        println!();

        println!("Server:");
        println!("  Listen: {}:{}", config.server.host, config.server.port);
        println!();

        println!("Database:");
        let db_url = &config.database.url;
        println!("  URL: {}", mask_database_url(db_url));

        info!("Testing database connection");
        match MemoryManager::new(db_url).await {
            Ok(manager) => {
                println!("  Status: Connected");
                match manager.list_scopes().await {
                    Ok(scopes) => println!("  Memory Logs: {}", scopes.len()),
                    Err(e) => println!("  Memory Logs: unavailable ({e})"),
                }
            }
            Err(e) => {
                println!("  Status: Failed ({e})");
            }
        }

        match config.validate() {
            Ok(()) => println!("\n✅ Ready to serve"),
            Err(e) => println!("\n⚠️  Not ready to serve: {e}"),
        }

        Ok(())
    }
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        "(not set)".to_string()
    } else if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}

fn mask_database_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };

    let Some((credentials, after_at)) = rest.split_once('@') else {
        return url.to_string();
    };

    let Some((username, _password)) = credentials.split_once(':') else {
        return url.to_string();
    };

    format!("{scheme}://{username}:***@{after_at}")
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
