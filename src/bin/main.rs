use shopping_assistant::{
    assistant::{Conversation, ShoppingAssistant},
    config::BotConfig,
};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing; logs go to stderr so the chat stays readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = BotConfig::from_env()?;
    let assistant = ShoppingAssistant::from_config(&config).await?;
    let mut conversation = Conversation::new();

    info!(conversation_id = %conversation.id(), "Terminal chat started");

    let mut stdout = io::stdout();
    for turn in conversation.transcript() {
        stdout.write_all(format!("{}\n", turn.text).as_bytes()).await?;
    }

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                conversation.reset();
                if let Some(greeting) = conversation.transcript().first() {
                    stdout.write_all(format!("{}\n", greeting.text).as_bytes()).await?;
                }
                continue;
            }
            _ => {}
        }

        let reply = assistant.respond(&mut conversation, &line).await;
        stdout.write_all(format!("{}\n", reply.answer).as_bytes()).await?;
    }

    info!("Terminal chat closed");
    Ok(())
}
