use gemline_config::Config;
use gemline_line::{AppState, LineClient, Messenger, serve};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::info;

/// Input for the webhook server command.
#[derive(Debug, Clone)]
pub struct ServeInput {
    /// Bind address (overrides config)
    pub host: Option<String>,
    /// Bind port (overrides config and `PORT`)
    pub port: Option<u16>,
}

/// Strategy for serving the LINE webhook.
///
/// Configuration problems abort before the listener is bound.
#[derive(Debug, Clone, Copy)]
pub struct ServeStrategy;

impl super::CommandStrategy for ServeStrategy {
    type Input = ServeInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        config.validate()?;

        let host = input.host.unwrap_or_else(|| config.server.host.clone());
        let port = input.port.unwrap_or(config.server.port);
        let ip: IpAddr = host
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address {host}: {e}"))?;
        let addr = SocketAddr::new(ip, port);

        let messenger: Arc<dyn Messenger> = Arc::new(
            LineClient::new(config.line.channel_access_token.clone())
                .with_api_base(config.line.api_base.clone()),
        );
        let dispatcher = super::build_dispatcher(&config, messenger, false).await?;

        info!("Starting LINE webhook on {addr}");
        serve(addr, AppState::new(dispatcher, &config.line.channel_secret)).await?;

        Ok(())
    }
}
