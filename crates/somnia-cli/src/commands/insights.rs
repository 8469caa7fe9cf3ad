//! Narrative insight command implementations

use anyhow::{Context, Result};
use somnia_core::ai::NarrativeBackend;
use somnia_core::db::Database;
use somnia_core::insights::{InsightOrchestrator, InsightPayload, InsightState, TIMESTAMP_KEY};
use somnia_core::Outcome;

pub async fn cmd_insights(
    orchestrator: &InsightOrchestrator<Database>,
    refresh: bool,
    json: bool,
) -> Result<()> {
    let outcome = if refresh {
        orchestrator.refresh().await
    } else {
        orchestrator.get_insights().await
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &Outcome<InsightPayload>) {
    let payload = outcome.value();

    println!();
    println!("🌙 Dream Insights ({} dreams)", payload.dream_count);
    println!("   ─────────────────────────────────────────────────────────────");

    match outcome {
        Outcome::Nominal { .. } => {}
        Outcome::Placeholder { .. } => {
            println!("   ℹ️  Record a few more dreams for personalized insights");
            println!();
        }
        Outcome::Degraded { cause, .. } => {
            println!("   ⚠️  Showing fallback insights: {}", cause);
            println!();
        }
    }

    println!("   {}", payload.main_insight);

    for sub in &payload.sub_insights {
        println!();
        println!("   • {} [{}]", sub.title, sub.source);
        println!("     {}", sub.content);
    }

    if !payload.pattern.is_empty() {
        println!();
        println!("   🔁 Pattern: {}", payload.pattern);
    }
    if !payload.suggestion.is_empty() {
        println!("   💡 Try: {}", payload.suggestion);
    }
    if !payload.next_focus.is_empty() {
        println!("   🎯 Next focus: {}", payload.next_focus.join(", "));
    }

    println!();
    println!(
        "   Generated {} ({})",
        payload.timestamp.format("%Y-%m-%d %H:%M UTC"),
        payload.source
    );
}

pub fn cmd_cache_clear(orchestrator: &InsightOrchestrator<Database>) -> Result<()> {
    orchestrator
        .clear_cache()
        .context("Failed to clear insight cache")?;
    println!("🧹 Insight cache cleared");
    Ok(())
}

/// Whether the configured narrative backend answers; `None` when there is none
pub async fn backend_reachable(orchestrator: &InsightOrchestrator<Database>) -> Option<bool> {
    match orchestrator.generator() {
        Some(client) => Some(client.health_check().await),
        None => None,
    }
}

pub async fn cmd_cache_status(orchestrator: &InsightOrchestrator<Database>) -> Result<()> {
    let state = orchestrator.state();
    let stamped = orchestrator.store().get_cache_value(TIMESTAMP_KEY)?;
    let ttl = orchestrator.config().insights.ttl_hours;

    println!();
    println!("🗄️  Insight Cache");
    println!("   ─────────────────────────────");
    let marker = match state {
        InsightState::Fresh => "✅",
        InsightState::Stale => "⏳",
        InsightState::Absent => "∅",
    };
    println!("   State:      {} {}", marker, state);
    if let Some(stamp) = stamped {
        println!("   Generated:  {}", stamp);
    }
    println!("   TTL:        {}h", ttl);

    match (orchestrator.generator(), backend_reachable(orchestrator).await) {
        (Some(client), Some(reachable)) => {
            let health = if reachable { "✅ reachable" } else { "❌ unreachable" };
            println!(
                "   Backend:    {} ({} @ {}) {}",
                client.kind(),
                client.model(),
                client.host(),
                health
            );
            if !reachable {
                println!();
                println!("   💡 Insights will fall back to local guidance until the backend is up");
            }
        }
        _ => println!("   Backend:    none (set OLLAMA_HOST or OPENAI_COMPATIBLE_HOST)"),
    }

    Ok(())
}
