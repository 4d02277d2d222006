//! Interactive Amparo chat example.
//!
//! Runs the full turn pipeline in the terminal against mock providers:
//! profile routing, crisis detection, moderation and intervention
//! recording, with no API keys required.
//!
//! Run with: cargo run -p orchestrator --example amparo_chat
//!
//! Set RUST_LOG=orchestrator=debug,moderation=debug for pipeline logs.

use std::io::{self, Write};
use std::sync::Arc;

use mock_provider::{CannedProvider, EchoProvider};
use moderation::{CrisisDetector, MemoryInterventionStore};
use orchestrator::{Orchestrator, ProviderRegistration, ProviderRegistry, TurnContext};
use provider_core::HistoryMessage;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("orchestrator=info".parse()?)
                .add_directive("moderation=info".parse()?)
                .add_directive("provider_registry=info".parse()?),
        )
        .init();

    // Register mock providers. Real SDK adapters slot in the same way,
    // under the same names.
    let registry = Arc::new(ProviderRegistry::new());
    registry
        .register(ProviderRegistration::instance(
            "googleai",
            Arc::new(EchoProvider::with_prefix("[eco] ")),
        ))
        .await;
    registry
        .register(ProviderRegistration::instance(
            "openai",
            Arc::new(CannedProvider::new(
                "openai",
                "Estou aqui com você. Quer me contar um pouco mais sobre como está se sentindo?",
            )),
        ))
        .await;
    registry
        .register(ProviderRegistration::instance(
            "anthropic",
            Arc::new(CannedProvider::new(
                "anthropic",
                "Obrigada por compartilhar isso comigo. Estou ouvindo.",
            )),
        ))
        .await;
    registry
        .register(ProviderRegistration::instance(
            "analytics",
            Arc::new(EchoProvider::new()),
        ))
        .await;

    // Interventions stay in memory for the demo; the database crate offers
    // the SQLite-backed store with the same seam.
    let store = MemoryInterventionStore::new();
    let detector = CrisisDetector::new().with_store(store.clone());
    let orchestrator = Orchestrator::new(Arc::clone(&registry)).with_crisis_detector(detector);

    println!("Amparo demo chat");
    println!("================");
    println!();
    println!("Features:");
    println!("  - Routes each turn to a profile with a provider fallback chain");
    println!("  - Detects crisis signals and prepends safety disclaimers");
    println!("  - Records severe episodes without blocking the conversation");
    println!("  - Loads providers lazily, on the first turn that needs them");
    println!();
    println!("Try:");
    println!("  - \"oi, tudo bem?\" - quick check-in (cheap profile)");
    println!("  - \"não aguento mais\" - contextual distress (crisis-safe profile)");
    println!("  - \"posso tomar dipirona amamentando?\" - medication disclaimer");
    println!();
    println!("Type 'sair' to exit.");
    println!();

    let stdin = io::stdin();
    let mut history: Vec<HistoryMessage> = Vec::new();
    let context = TurnContext {
        user_id: Some("demo-user".to_string()),
        name: Some("Ana".to_string()),
        ..TurnContext::default()
    };

    loop {
        print!("você> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message.eq_ignore_ascii_case("sair") {
            break;
        }

        let reply = orchestrator.send_turn(message, &context, &history).await;

        let provider = reply.provider_used.as_deref().unwrap_or("roteiro");
        println!();
        println!("amparo [{} via {}]:", reply.profile, provider);
        println!("{}", reply.text);
        if let Some(crisis) = &reply.crisis {
            println!();
            println!("  nível de crise: {}", crisis.level.as_str());
            if !crisis.urgent_resources.is_empty() {
                println!("  recursos: {}", crisis.urgent_resources.join(" | "));
            }
        }
        println!();

        history.push(HistoryMessage::user(message));
        history.push(HistoryMessage::assistant(reply.text.clone()));
    }

    let interventions = store.all().await;
    let stats = registry.stats().await;
    println!();
    println!(
        "Até logo! {} intervenção(ões) registrada(s) nesta sessão.",
        interventions.len()
    );
    println!(
        "Providers: {} configurados, {} carregado(s) sob demanda.",
        stats.total_configured, stats.loaded
    );

    orchestrator.shutdown().await;
    Ok(())
}
