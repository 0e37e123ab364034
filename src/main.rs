use std::io::{self, Write};
use std::process::exit;

use anyhow::Result;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;
use vehicle_search_assistant::{
    conversation::{Controller, Session},
    gateway::HttpGateway,
    llm::OllamaBackend,
    prompt::system_prompt,
    settings::Settings,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let settings = match Settings::from_default_location() {
        Ok(ret) => ret,
        Err(error) => {
            eprintln!("Problem while loading settings. {error}");
            exit(1);
        }
    };

    if let Err(error) = run(&settings).await {
        eprintln!("Problem while running the assistant. {error:#}");
        exit(1);
    }
}

async fn run(settings: &Settings) -> Result<()> {
    let backend = OllamaBackend::new(
        &settings.assistant.ollama_url,
        settings.assistant.ollama_port,
        &settings.assistant.model,
    )?;
    let gateway = HttpGateway::new(&settings.gateway.base_url, settings.gateway.timeout())?;
    let exit_keyword = &settings.assistant.exit_keyword;

    let mut out = io::stdout();
    writeln!(out, "--- Alfred: seu assistente virtual de veículos ---")?;
    writeln!(out, "Modelo em uso: {} (via Ollama)", backend.model())?;
    writeln!(out, "Diga o que você procura, ou simplesmente 'olá'.")?;
    writeln!(
        out,
        "Digite 'buscar' quando quiser que eu procure, ou '{exit_keyword}' para terminar."
    )?;

    let mut controller = Controller::new(
        backend,
        gateway,
        Session::new(system_prompt()),
        exit_keyword,
    );

    controller
        .run(BufReader::new(tokio::io::stdin()), &mut out)
        .await?;
    Ok(())
}
