use clap::Parser;

use chat_relay::config::Config;
use chat_relay::error::Result;
use chat_relay::logging;
use chat_relay::relay;

#[derive(Parser, Debug)]
#[command(name = "chat-relayd")]
#[command(about = "Chat completion relay daemon")]
struct Cli {
    #[arg(long, env = "CHAT_RELAY_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "CHAT_RELAY_PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing("chat_relayd");

    let cli = Cli::parse();
    let config = Config::from_env();
    relay::run(&cli.host, cli.port, config).await
}
