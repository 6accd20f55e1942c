// CLI commands for running and grading submissions
use anyhow::{bail, Context, Result};
use examrunner_common::languages::ANY_VERSION;
use examrunner_common::types::{Answer, ExecutionSummary, QuestionStatus, TestCase};
use examrunner_common::{Config, LanguageCatalog};
use examrunner_grader::{grade_exam, score_question, Executor, PistonEngine, SubmissionRunner};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path))
}

fn build_executor(config: &Config) -> Result<Executor<PistonEngine>> {
    let catalog = LanguageCatalog::load_or_empty(Path::new(&config.language_config_path))?;
    let engine = PistonEngine::new(config.execution_api_url.clone())
        .with_timeout(config.execution_timeout);

    Ok(Executor::new(engine, catalog).with_limits(config.max_source_bytes, config.max_input_bytes))
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

fn print_summary(summary: &ExecutionSummary) {
    for (idx, result) in summary.results.iter().enumerate() {
        let mark = if result.is_correct { "✓" } else { "✗" };
        println!("  {} Test {}", mark, idx + 1);

        if !result.is_correct {
            println!("    Expected: \"{}\"", result.expected_output.trim());
            println!("    Got:      \"{}\"", result.actual_output);
        }
        if let Some(error) = &result.error {
            println!("    stderr: {}", first_line(error));
        }
    }

    println!(
        "\n📊 Passed {} / {} ({:.1}%)",
        summary.total_passed,
        summary.total_cases,
        score_question(summary)
    );
}

/// Run one source file against a test case file
pub async fn run_file(config: &Config, language: &str, file: &str, cases: &str) -> Result<()> {
    let source_code = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))?;
    let test_cases: Vec<TestCase> = read_json(cases)?;

    if source_code.trim().is_empty() {
        bail!("Source file {} is empty", file);
    }

    println!("🚀 Running {} ({} test cases) on {}", file, test_cases.len(), config.execution_api_url);

    let executor = build_executor(config)?;
    let summary = executor.run(language, &source_code, &test_cases).await?;

    print_summary(&summary);

    Ok(())
}

/// Grade every answer in an answers file
pub async fn grade_answers(config: &Config, answers_path: &str) -> Result<()> {
    let answers: Vec<Answer> = read_json(answers_path)?;

    println!("📝 Grading {} question(s)...\n", answers.len());

    let executor = build_executor(config)?;
    let exam = grade_exam(&executor, &answers).await;

    println!("{:<16} {:<18} {:>8}", "Question", "Status", "Score");
    println!("{}", "─".repeat(44));

    for question in &exam.questions {
        println!(
            "{:<16} {:<18} {:>7.1}%",
            question.question_id,
            question.status.to_string(),
            question.score
        );
        if question.status == QuestionStatus::ExecutionFailed {
            if let Some(error) = &question.error {
                println!("  ⚠️  {}", error);
            }
        }
    }

    println!("\n✅ Overall score: {:.1}%", exam.score);

    Ok(())
}

pub fn list_languages(config: &Config) -> Result<()> {
    let catalog = LanguageCatalog::load_or_empty(Path::new(&config.language_config_path))?;

    if catalog.entries().is_empty() {
        println!("No languages pinned; every language uses the newest runtime ({}).", ANY_VERSION);
        println!("\n💡 Pin one with: examrunner-cli pin --name <name> --version <version>");
        return Ok(());
    }

    println!("📋 Configured Languages:\n");
    println!("{:<14} {:<12}", "Name", "Version");
    println!("{}", "─".repeat(26));

    for entry in catalog.entries() {
        let version = if entry.version == ANY_VERSION {
            "any"
        } else {
            entry.version.as_str()
        };
        println!("{:<14} {:<12}", entry.name, version);
    }

    println!("\n✅ Total: {} language(s)", catalog.entries().len());

    Ok(())
}

pub fn pin_language(config: &Config, name: &str, version: &str) -> Result<()> {
    if name.trim().is_empty() || version.trim().is_empty() {
        bail!("Language name and version cannot be empty");
    }

    let path = Path::new(&config.language_config_path);
    let mut catalog = LanguageCatalog::load_or_empty(path)?;

    catalog.pin(name, version);
    catalog.save(path)?;

    println!("📌 {} pinned to {} in {}", name, version, path.display());

    Ok(())
}

pub fn unpin_language(config: &Config, name: &str) -> Result<()> {
    let path = Path::new(&config.language_config_path);
    let mut catalog = LanguageCatalog::load_or_empty(path)?;

    if !catalog.unpin(name) {
        bail!("Language '{}' not found in {}", name, path.display());
    }

    catalog.save(path)?;

    println!("✅ {} unpinned; the newest runtime will be used", name);

    Ok(())
}
