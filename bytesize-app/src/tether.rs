use anyhow::{Context, Result};
use bytesize_config::{BytesizeConfig, StrategyDetails};
use bytesize_http::HttpClient;
use bytesize_social::strategy::{
    DEFAULT_STRATEGY_TIMEOUT, MirrorStrategy, NitterStrategy, TwitterApiStrategy,
};
use bytesize_social::twitter::TwitterApi;
use bytesize_social::{Resolver, Strategy, SyntheticBackstop};
use std::sync::Arc;
use std::time::Duration;

fn strategy_timeout(secs: Option<u64>) -> Duration {
    secs.map(Duration::from_secs)
        .unwrap_or(DEFAULT_STRATEGY_TIMEOUT)
}

fn http_for(base: &str, timeout: Duration, retries: Option<usize>) -> Result<HttpClient> {
    Ok(HttpClient::new(base)
        .with_context(|| format!("invalid base url '{base}'"))?
        .with_timeout(timeout)
        .with_retries(retries.unwrap_or(0)))
}

// one slot per nitter instance; a single instance keeps the bare strategy id
fn nitter_slot_name(spec_id: &str, idx: usize, total: usize) -> String {
    if total == 1 {
        spec_id.to_string()
    } else {
        format!("{spec_id}#{idx}")
    }
}

/// Turn the ordered strategy list into a [`Resolver`]. Disabled entries are skipped.
pub fn build_resolver(cfg: &BytesizeConfig) -> Result<Resolver> {
    let mut strategies: Vec<Arc<dyn Strategy>> = Vec::new();

    for spec in cfg.resolver.strategies.iter().filter(|s| s.is_enabled()) {
        match &spec.details {
            StrategyDetails::TwitterApi { config } => {
                let timeout = strategy_timeout(config.timeout_secs);
                let strategy = if config.has_token() {
                    let http = http_for(&config.endpoint, timeout, config.retries)
                        .with_context(|| format!("strategy '{}'", spec.id))?;
                    TwitterApiStrategy::new(
                        spec.id.as_str(),
                        TwitterApi::with_http(http, config.auth_token.clone()),
                    )
                } else {
                    tracing::warn!(strategy = %spec.id, "tether.twitter.no_token");
                    TwitterApiStrategy::without_credentials(spec.id.as_str())
                };
                strategies.push(Arc::new(strategy.with_timeout(timeout)));
            }
            StrategyDetails::Mirror { config } => {
                let timeout = strategy_timeout(config.timeout_secs);
                let http = http_for(&config.base_url, timeout, config.retries)
                    .with_context(|| format!("strategy '{}'", spec.id))?;
                strategies.push(Arc::new(
                    MirrorStrategy::new(spec.id.as_str(), http, config.path.as_str())
                        .with_timeout(timeout),
                ));
            }
            StrategyDetails::Nitter { config } => {
                let timeout = strategy_timeout(config.timeout_secs);
                let total = config.instances.len();
                for (idx, instance) in config.instances.iter().enumerate() {
                    let http = http_for(instance, timeout, config.retries)
                        .with_context(|| format!("strategy '{}'", spec.id))?;
                    strategies.push(Arc::new(
                        NitterStrategy::new(nitter_slot_name(&spec.id, idx, total), http)
                            .with_timeout(timeout),
                    ));
                }
            }
        }
    }

    let resolver = Resolver::new(strategies)
        .with_backstop(SyntheticBackstop::new(
            cfg.resolver.synthetic_topics.clone(),
        ))
        .with_default_max_items(cfg.resolver.max_items);
    tracing::info!(strategies = ?resolver.strategy_names(), "tether.resolver.built");
    Ok(resolver)
}
