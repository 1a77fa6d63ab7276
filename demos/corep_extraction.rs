use corep_extractor::{
    AuditReport, CapitalExtractor, CorepError, ExtractionEvent, ExtractorConfig, FileTextSource,
    GeminiClient, TextSource,
};
use dotenv::dotenv;
use std::error::Error;
use std::path::Path;

// Simulated user input
const SCENARIO: &str = r#"
The bank has CET1 capital of £120 million
and Additional Tier 1 capital of £30 million.
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    println!("🚀 Starting COREP extraction example...");

    // 1. Configuration: optional corep.toml, then COREP_* environment overrides
    let config_path = Path::new("corep.toml");
    let config = if config_path.exists() {
        ExtractorConfig::load(config_path)?
    } else {
        ExtractorConfig::default()
    }
    .apply_env()?;
    println!("⚙️  Using model {}", config.model);

    // 2. Client and extractor
    let client = GeminiClient::from_env()?;
    let extractor = CapitalExtractor::new(client).with_config(config);

    // 3. Progress reporting
    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ExtractionEvent::Invoking { attempt } => {
                    println!("🤖 Calling model (attempt {})", attempt)
                }
                ExtractionEvent::Retry { error, .. } => {
                    println!("🔁 Retrying after: {}", error)
                }
                ExtractionEvent::Recovered { keys } => {
                    println!("📥 Recovered {} entries", keys)
                }
                _ => {}
            }
        }
    });

    // 4. Run the pipeline
    let source = FileTextSource::new("rules/own_funds_rules.txt");
    let regulatory_text = source.read_text()?;
    let result = extractor
        .run_with_progress(&regulatory_text, SCENARIO, Some(tx))
        .await;
    printer.await?;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(CorepError::MalformedResponse { raw, reason }) => {
            eprintln!("❌ Model output could not be parsed ({}):\n{}", reason, raw);
            return Err("malformed model response".into());
        }
        Err(e) => return Err(e.into()),
    };

    // 5. Report
    let report = AuditReport::from_outcome(&outcome);
    println!("\n{}", report.render_text());

    std::fs::write("corep_audit.json", report.to_json()?)?;
    println!("💾 Audit report saved to corep_audit.json");

    Ok(())
}
