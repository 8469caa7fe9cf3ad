//! Journal command implementations

use anyhow::{bail, Context, Result};
use chrono::Utc;
use somnia_core::dates;
use somnia_core::db::Database;
use somnia_core::models::{DateInput, DreamElements, Emotions, NewDream};

use super::truncate;
use crate::cli::AddArgs;

/// Record a dream, returning its id
pub fn cmd_add(db: &Database, args: AddArgs) -> Result<i64> {
    let dream_date = match args.date {
        Some(raw) => {
            let parsed = dates::normalize_str(&raw);
            if parsed.is_degraded() {
                bail!("Could not read date '{}'. Use YYYY-MM-DD, RFC 3339, or epoch milliseconds.", raw);
            }
            DateInput::Text(raw)
        }
        None => DateInput::Instant(Utc::now()),
    };

    let dream = NewDream {
        dream_date: Some(dream_date),
        title: args.title,
        content: args.content,
        interpretation: None,
        sleep_quality: args.sleep,
        dream_clarity: args.clarity,
        emotions: Emotions {
            during_dream: args.emotions,
            after_dream: args.after,
        },
        elements: DreamElements {
            characters: args.characters,
            places: args.places,
            symbols: args.symbols,
        },
        themes: args.themes,
        tags: args.archetypes,
        personal_notes: None,
        is_recurring: args.recurring,
        is_lucid: args.lucid,
        dream_type: args.dream_type,
    };

    let id = db.save_dream(&dream).context("Failed to save dream")?;
    println!("✅ Saved dream #{}: {}", id, dream.title);
    Ok(id)
}

pub fn cmd_list(db: &Database, limit: usize) -> Result<()> {
    let mut dreams = db.list_dreams()?;

    if dreams.is_empty() {
        println!("No dreams recorded yet. Add one with:");
        println!("  somnia add --title \"Flying over the sea\"");
        return Ok(());
    }

    dreams.sort_by(|a, b| b.dream_instant().cmp(&a.dream_instant()).then(b.id.cmp(&a.id)));

    println!();
    println!("🌙 Recent Dreams");
    println!("   ─────────────────────────────────────────────────────────────");

    for dream in dreams.iter().take(limit) {
        let mut flags = String::new();
        if dream.is_lucid {
            flags.push_str(" ✨");
        }
        if dream.is_recurring {
            flags.push_str(" 🔁");
        }
        println!(
            "   {:>4} │ {} │ {:<10} │ {}{}",
            dream.id,
            dream.dream_day(),
            dream.type_or_default(),
            truncate(&dream.title, 40),
            flags
        );
    }

    if dreams.len() > limit {
        println!("   ... and {} more", dreams.len() - limit);
    }

    Ok(())
}

pub fn cmd_show(db: &Database, id: i64) -> Result<()> {
    let Some(dream) = db.get_dream(id)? else {
        bail!("Dream #{} not found", id);
    };

    println!();
    println!("🌙 #{} {}", dream.id, dream.title);
    println!("   Date: {}", dream.dream_instant().format("%Y-%m-%d %H:%M UTC"));
    println!("   Type: {}", dream.type_or_default());
    if let Some(clarity) = dream.dream_clarity {
        println!("   Clarity: {}/5", clarity);
    }
    if let Some(quality) = dream.sleep_quality {
        println!("   Sleep quality: {}/5", quality);
    }
    if !dream.emotions.during_dream.is_empty() {
        println!("   Emotions: {}", dream.emotions.during_dream.join(", "));
    }
    if let Some(after) = &dream.emotions.after_dream {
        println!("   On waking: {}", after);
    }
    print_list("Themes", &dream.themes);
    print_list("Archetypes", &dream.tags);
    print_list("Characters", &dream.elements.characters);
    print_list("Places", &dream.elements.places);

    let symbols: Vec<String> = dream
        .elements
        .symbols
        .iter()
        .chain(dream.symbols.iter())
        .cloned()
        .collect();
    print_list("Symbols", &symbols);

    if !dream.content.is_empty() {
        println!();
        println!("{}", dream.content);
    }
    if let Some(interpretation) = &dream.interpretation {
        println!();
        println!("   Interpretation: {}", interpretation);
    }
    if let Some(notes) = &dream.personal_notes {
        println!("   Notes: {}", notes);
    }

    Ok(())
}

pub fn cmd_delete(db: &Database, id: i64) -> Result<()> {
    if !db.delete_dream(id)? {
        bail!("Dream #{} not found", id);
    }
    println!("🗑️  Deleted dream #{}", id);
    Ok(())
}

fn print_list(label: &str, values: &[String]) {
    if !values.is_empty() {
        println!("   {}: {}", label, values.join(", "));
    }
}
