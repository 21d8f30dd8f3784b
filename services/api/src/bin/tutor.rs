//! services/api/src/bin/tutor.rs
//!
//! Terminal front end: scenario practice, vocabulary review and progress reports
//! against the same data directories as the API server.

use api_lib::{
    adapters::{JsonFileStore, OpenAiChatAdapter},
    config::Config,
    error::ApiError,
};
use async_openai::{config::OpenAIConfig, Client};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tutor_core::{
    analysis::build_report,
    domain::{ChatMessage, Level},
    ports::ConversationService,
    seed::sample_scenarios,
    tutor::{
        conversation_messages, is_quit_command, scenario_system_prompt, session_feedback,
        vocabulary_outcomes, PracticeTally,
    },
    ProgressStore, ScenarioStore,
};

#[derive(Parser)]
#[command(name = "tutor", about = "English conversation practice in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the sample scenarios into the scenario directory.
    Seed,
    /// List scenarios.
    Scenarios {
        #[arg(long)]
        level: Option<String>,
        #[arg(long)]
        theme: Option<String>,
    },
    /// Role-play a scenario with the AI tutor and record the session.
    Practice {
        #[arg(long)]
        learner: String,
        #[arg(long)]
        scenario: String,
    },
    /// Self-graded review of the least accurate vocabulary.
    Review {
        #[arg(long)]
        learner: String,
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Print the learning report.
    Report {
        #[arg(long)]
        learner: String,
    },
    /// Set the assessed level for one category.
    Level {
        #[arg(long)]
        learner: String,
        category: String,
        level: String,
    },
}

type InputLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let store = Arc::new(JsonFileStore::new(
        config.scenarios_dir.clone(),
        config.progress_dir.clone(),
    ));

    match cli.command {
        Command::Seed => {
            let mut scenarios = ScenarioStore::new(store);
            let samples = sample_scenarios();
            let count = samples.len();
            for scenario in samples {
                scenarios.save(scenario).await?;
            }
            println!("Wrote {count} scenarios to {}", config.scenarios_dir.display());
        }
        Command::Scenarios { level, theme } => {
            let scenarios = ScenarioStore::open(store).await?;
            let level = level
                .map(|l| l.parse::<Level>())
                .transpose()
                .map_err(|e| ApiError::invalid_request(e.to_string()))?;
            for scenario in scenarios.all() {
                if level.is_some_and(|l| l != scenario.level)
                    || theme.as_deref().is_some_and(|t| t != scenario.theme)
                {
                    continue;
                }
                println!(
                    "{:<20} {:<6} {:<12} {}",
                    scenario.id,
                    scenario.level.label(),
                    scenario.theme,
                    scenario.title
                );
            }
        }
        Command::Practice { learner, scenario } => {
            let client = Client::with_config(
                OpenAIConfig::new().with_api_key(config.require_openai_api_key()?),
            );
            let chat = OpenAiChatAdapter::new(client, config.chat_model.clone());
            let scenarios = ScenarioStore::open(store.clone()).await?;
            let mut progress = ProgressStore::open(&learner, store).await?;
            practice(&chat, &scenarios, &mut progress, &scenario).await?;
        }
        Command::Review { learner, count } => {
            let scenarios = ScenarioStore::open(store.clone()).await?;
            let mut progress = ProgressStore::open(&learner, store).await?;
            review(&scenarios, &mut progress, count).await?;
        }
        Command::Report { learner } => {
            let progress = ProgressStore::open(&learner, store).await?;
            print_report(&progress);
        }
        Command::Level {
            learner,
            category,
            level,
        } => {
            let mut progress = ProgressStore::open(&learner, store).await?;
            if !progress.update_level_assessment(&category, &level).await? {
                return Err(ApiError::invalid_request(format!(
                    "Unknown assessment category '{category}' or level '{level}'"
                )));
            }
            println!("{category} level set to {level}");
        }
    }
    Ok(())
}

async fn read_line(lines: &mut InputLines, prompt: &str) -> Result<Option<String>, ApiError> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}

async fn practice(
    chat: &dyn ConversationService,
    scenarios: &ScenarioStore,
    progress: &mut ProgressStore,
    scenario_id: &str,
) -> Result<(), ApiError> {
    let scenario = scenarios
        .get(scenario_id)
        .ok_or_else(|| ApiError::not_found(format!("Scenario '{scenario_id}' not found")))?;

    println!("== {} ({}) ==", scenario.title, scenario.level.label());
    println!("{}", scenario.description);
    println!("Useful phrases:");
    for phrase in &scenario.example_phrases {
        println!("  {}  ({})", phrase.source_text, phrase.translated_text);
    }
    println!("Type 'quit' to finish.\n");

    let system_prompt = scenario_system_prompt(scenario);
    let opening = chat
        .complete(&[ChatMessage::system(system_prompt.clone())])
        .await?;
    println!("Tutor: {opening}");

    let mut history = vec![ChatMessage::assistant(opening)];
    let mut learner_turns: Vec<String> = Vec::new();
    let mut tally = PracticeTally::default();
    let started = Instant::now();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = read_line(&mut lines, "You: ").await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_quit_command(input) {
            break;
        }

        let messages = conversation_messages(system_prompt.clone(), &history, input);
        match chat.complete(&messages).await {
            Ok(reply) => {
                if tally.record_turn(input, scenario) {
                    println!("  (nice, that fits the scenario)");
                }
                learner_turns.push(input.to_string());
                history.push(ChatMessage::user(input));
                history.push(ChatMessage::assistant(reply.clone()));
                println!("Tutor: {reply}");
            }
            Err(e) => {
                warn!("Conversation turn failed: {}", e);
                println!("The tutor could not answer, please try again.");
            }
        }
    }

    if tally.learner_turns == 0 {
        println!("No turns taken, nothing recorded.");
        return Ok(());
    }

    let minutes = u32::try_from(started.elapsed().as_secs().div_ceil(60)).unwrap_or(u32::MAX);
    let accuracy = tally.accuracy_rate();
    progress
        .record_session(&scenario.id, minutes, tally.learner_turns, accuracy)
        .await?;
    for (term, used) in vocabulary_outcomes(scenario, &learner_turns) {
        progress.record_vocabulary_progress(&term, used).await?;
    }
    info!(learner_id = progress.learner_id(), scenario_id = %scenario.id, "Practice session recorded");

    println!(
        "\n{} turns, {:.0}% used scenario phrasing.",
        tally.learner_turns,
        accuracy * 100.0
    );
    println!("{}", session_feedback(accuracy));
    Ok(())
}

async fn review(
    scenarios: &ScenarioStore,
    progress: &mut ProgressStore,
    count: usize,
) -> Result<(), ApiError> {
    let terms = progress.get_vocabulary_for_review(count);
    if terms.is_empty() {
        println!("No vocabulary recorded yet. Practise a scenario first.");
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    for term in terms {
        println!("\n{term}");
        let item = scenarios
            .all()
            .iter()
            .flat_map(|s| s.key_vocabulary.iter())
            .find(|v| v.term == term);

        let Some(answer) = read_line(&mut lines, "Do you remember it? [y/n] ").await? else {
            break;
        };
        if let Some(item) = item {
            println!("  {}: {}", item.definition, item.example_sentence);
        }
        let remembered = matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "はい");
        progress.record_vocabulary_progress(&term, remembered).await?;
    }
    Ok(())
}

fn print_report(progress: &ProgressStore) {
    let report = build_report(progress.record());
    let summary = &report.summary;
    let sessions = &report.sessions;
    let vocabulary = &report.vocabulary;

    println!("Learner: {}", progress.learner_id());
    println!("Level: {}", summary.current_level.label());
    println!(
        "Sessions: {} ({} min), scenarios completed: {}",
        summary.total_sessions, summary.total_time_minutes, summary.scenarios_completed
    );
    println!(
        "Accuracy: average {:.0}%, recent {:.0}%, trend {}",
        sessions.average_accuracy * 100.0,
        sessions.recent_accuracy * 100.0,
        sessions.trend
    );
    println!("Frequency: {}", sessions.session_frequency);
    println!(
        "Vocabulary: {} terms, {} mastered, {} learning, {} struggling ({:.0}% mastered)",
        vocabulary.total_vocabulary,
        vocabulary.mastered_count,
        vocabulary.learning_count,
        vocabulary.struggling_count,
        vocabulary.mastery_rate * 100.0
    );
    if !summary.strengths.is_empty() {
        println!("Strengths: {}", summary.strengths.join(", "));
    }
    if !summary.weaknesses.is_empty() {
        println!("Weaknesses: {}", summary.weaknesses.join(", "));
    }
    println!("Advice:");
    for insight in &report.insights {
        println!("  - {insight}");
    }
}
