use anyhow::Result;
use medlens_core::classify_message;

pub fn run(message: &str, status: Option<u16>) -> Result<()> {
    let classification = classify_message(message, status);
    println!("{}", serde_json::to_string_pretty(&classification)?);
    Ok(())
}
