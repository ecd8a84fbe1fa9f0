use anyhow::{Result, anyhow};
use medlens_core::communication::LlmProvider;
use medlens_core::config::TrackerConfig;

pub fn run(
    config: &TrackerConfig,
    provider: &str,
    model: &str,
    input: u64,
    output: u64,
) -> Result<()> {
    let provider: LlmProvider = provider.parse().map_err(|e: String| anyhow!(e))?;
    let pricing = config.pricing_table();

    if pricing.price_for(provider, model).is_none() {
        println!("⚠️  No pricing entry for {}/{}; cost is reported as 0", provider, model);
    }

    let cost = pricing.calculate_cost(provider, model, input, output);
    println!(
        "{}/{}: {} input + {} output tokens = ${:.6}",
        provider, model, input, output, cost
    );
    Ok(())
}
