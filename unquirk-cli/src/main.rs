use anyhow::Result;
use clap::Parser;
use std::io::Read;
use std::path::Path;

// Import from unquirk-core
use unquirk_core::{BlockResult, ExplainResult, Translator};

#[derive(Parser)]
#[command(name = "unquirk")]
#[command(about = "Translate stylized dialect text with configurable substitution profiles")]
struct Args {
    /// Text to translate (reads stdin if neither this nor --input is given)
    text: Option<String>,

    /// Read the input text from a file instead
    #[arg(short, long)]
    input: Option<String>,

    /// Directory of profile definition files (one <name>.json per profile)
    #[arg(short, long, default_value = "rules")]
    rules_dir: String,

    /// Translate with this profile explicitly (skips per-line detection)
    #[arg(short, long)]
    profile: Option<String>,

    /// Explain mode: report which rules fired per line and how many times
    #[arg(long)]
    explain: bool,

    /// List available profile names and exit
    #[arg(long)]
    list_profiles: bool,

    /// Validate every profile definition in the rules directory and exit
    #[arg(long)]
    validate: bool,

    /// Extra postprocessing steps to apply to the final text, in order
    /// (e.g. --post sentence_case --post collapse_whitespace)
    #[arg(long = "post")]
    post_steps: Vec<String>,

    /// Write the full result (text + per-line records) as JSON to a file
    #[arg(short, long)]
    output: Option<String>,

    /// Print the full result as JSON to stdout instead of plain text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let translator = Translator::new(&args.rules_dir);

    if args.list_profiles {
        let profiles = translator.profiles()?;
        println!("📋 Available profiles ({}):", profiles.len());
        for name in profiles {
            println!("   - {name}");
        }
        return Ok(());
    }

    if args.validate {
        return run_validate(&translator);
    }

    let text = read_input(&args)?;

    if args.explain {
        let mut result = translator.explain(&text)?;
        if !args.post_steps.is_empty() {
            result.text = translator.apply_extra_post(&result.text, &args.post_steps);
        }
        return emit_explain(&args, &result);
    }

    if let Some(profile) = &args.profile {
        match translator.translate(&text, profile) {
            Ok(mut out) => {
                if !args.post_steps.is_empty() {
                    out = translator.apply_extra_post(&out, &args.post_steps);
                }
                println!("{out}");
            }
            Err(e) => {
                eprintln!("❌ Translation failed: {e}");
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Default mode: per-line auto-detection
    let mut result = translator.translate_auto(&text)?;
    if !args.post_steps.is_empty() {
        result.text = translator.apply_extra_post(&result.text, &args.post_steps);
    }
    emit_auto(&args, &result)
}

fn read_input(args: &Args) -> Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.input {
        if !Path::new(path).exists() {
            anyhow::bail!("input file not found: {path}");
        }
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn run_validate(translator: &Translator) -> Result<()> {
    let issues = translator.validate_rules()?;
    if issues.is_empty() {
        println!("✅ OK — all profile definitions are well-formed");
        return Ok(());
    }
    for issue in &issues {
        println!("❌ [{}] {}", issue.entry, issue.problem);
    }
    println!("FAIL ({} issues)", issues.len());
    std::process::exit(1);
}

fn emit_auto(args: &Args, result: &BlockResult) -> Result<()> {
    if let Some(path) = &args.output {
        std::fs::write(path, serde_json::to_string_pretty(result)?)?;
        println!("💾 Result saved to: {path}");
        return Ok(());
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("{}", result.text);
    for record in &result.lines {
        if let Some(profile) = &record.profile {
            eprintln!("   line {} → {}", record.line, profile);
        }
    }
    Ok(())
}

fn emit_explain(args: &Args, result: &ExplainResult) -> Result<()> {
    if let Some(path) = &args.output {
        std::fs::write(path, serde_json::to_string_pretty(result)?)?;
        println!("💾 Result saved to: {path}");
        return Ok(());
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("{}", result.text);
    for record in &result.details {
        let profile = record.profile.as_deref().unwrap_or("-");
        eprintln!("   line {} [{}]:", record.line, profile);
        for hit in &record.rule_counts {
            eprintln!("      {} × {}", hit.count, hit.pattern);
        }
    }
    Ok(())
}
