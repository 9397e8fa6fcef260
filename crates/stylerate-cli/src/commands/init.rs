//! The `stylerate init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("stylerate.toml").exists() {
        println!("stylerate.toml already exists, skipping.");
    } else {
        std::fs::write("stylerate.toml", SAMPLE_CONFIG)?;
        println!("Created stylerate.toml");
    }

    std::fs::create_dir_all("questions")?;
    let sample_path = Path::new("questions/sample.csv");
    if sample_path.exists() {
        println!("questions/sample.csv already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_QUESTIONS)?;
        println!("Created questions/sample.csv");
    }

    println!("\nNext steps:");
    println!("  1. Replace questions/sample.csv with your question bank");
    println!("  2. Run: stylerate validate --questions questions/sample.csv");
    println!("  3. Run: stylerate run");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# stylerate configuration

questions = "questions/sample.csv"
output_dir = "./results"
# "lenient" records blank answers; "strict" requires a distinct category per sentence
policy = "lenient"
# seed = 42

[export]
bom = true
include_ground_truth = true

# Remote endpoint that receives each result file as a form post.
# [sync]
# url = "${STYLERATE_SYNC_URL}"
# timeout_secs = 30
"#;

const SAMPLE_QUESTIONS: &str = include_str!("../../../../questions/sample.csv");
