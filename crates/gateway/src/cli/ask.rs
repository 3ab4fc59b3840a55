use cr_domain::config::Config;
use cr_providers::{Reply, ReplySource, ResponseResolver};

/// One-shot stateless resolution, the same path `POST /chat` takes.
pub async fn ask(config: &Config, message: &str, json: bool) -> anyhow::Result<()> {
    if message.trim().is_empty() {
        anyhow::bail!("message must not be empty");
    }
    let resolver = ResponseResolver::from_config(&config.backend);
    let reply = resolver.resolve(message).await;
    println!("{}", render(&reply, resolver.backend_name(), json)?);
    Ok(())
}

fn render(reply: &Reply, backend: &str, json: bool) -> anyhow::Result<String> {
    if !json {
        return Ok(reply.text.clone());
    }
    let fallback = match reply.source {
        ReplySource::Generated => None,
        ReplySource::Fallback(reason) => Some(reason.as_str()),
    };
    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "message": reply.text,
        "backend": backend,
        "fallback": fallback,
    }))?)
}
