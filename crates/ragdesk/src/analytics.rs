//! Question analytics: record asked questions, tag them, and aggregate.
//!
//! Each recorded question is classified into short topic tags by the
//! configured [`QuestionClassifier`]. Classification is advisory: a
//! failing classifier is logged and the question is stored untagged.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::classifier::{create_classifier, QuestionClassifier};
use crate::config::Config;
use crate::db;

/// Username reported for records stored without one.
pub const UNKNOWN_USER: &str = "unknown";

/// A question about to be recorded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewQuestion {
    pub username: String,
    pub question: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub used_tool: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: i64,
    pub username: String,
    pub question: String,
    /// RFC 3339 UTC timestamp, e.g. `2026-01-31T09:15:00Z`.
    pub asked_at: String,
    pub tags: Vec<String>,
    pub answer: String,
    pub used_tool: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuestionStats {
    pub total_questions: u64,
    pub by_user: BTreeMap<String, u64>,
    pub by_tag: BTreeMap<String, u64>,
    pub tool_usage: BTreeMap<String, u64>,
}

pub async fn record_question(
    pool: &SqlitePool,
    classifier: &dyn QuestionClassifier,
    new: NewQuestion,
) -> Result<QuestionRecord> {
    let tags = match classifier.classify(&new.question).await {
        Ok(tags) => tags,
        Err(e) => {
            warn!(error = %e, "question classification failed");
            Vec::new()
        }
    };

    let asked_at = chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string();
    let answer = new.answer.unwrap_or_default();
    let used_tool = new.used_tool.filter(|t| !t.is_empty());

    let result = sqlx::query(
        "INSERT INTO questions (username, question, asked_at, tags_json, answer, used_tool) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&new.username)
    .bind(&new.question)
    .bind(&asked_at)
    .bind(serde_json::to_string(&tags)?)
    .bind(&answer)
    .bind(&used_tool)
    .execute(pool)
    .await?;

    let record = QuestionRecord {
        id: result.last_insert_rowid(),
        username: new.username,
        question: new.question,
        asked_at,
        tags,
        answer,
        used_tool,
    };

    info!(
        id = record.id,
        user = %record.username,
        tags = ?record.tags,
        "recorded question"
    );
    Ok(record)
}

/// Recorded questions in ascending id order, optionally for one user.
///
/// An empty `username` filter is treated as no filter.
pub async fn list_questions(
    pool: &SqlitePool,
    username: Option<&str>,
) -> Result<Vec<QuestionRecord>> {
    let rows = match username.filter(|u| !u.is_empty()) {
        Some(user) => {
            sqlx::query(
                "SELECT id, username, question, asked_at, tags_json, answer, used_tool \
                 FROM questions WHERE username = ? ORDER BY id ASC",
            )
            .bind(user)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT id, username, question, asked_at, tags_json, answer, used_tool \
                 FROM questions ORDER BY id ASC",
            )
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter()
        .map(|row| -> Result<QuestionRecord> {
            let id: i64 = row.get("id");
            let tags_json: String = row.get("tags_json");
            let tags: Vec<String> = serde_json::from_str(&tags_json)
                .with_context(|| format!("invalid tags_json for question {}", id))?;
            Ok(QuestionRecord {
                id,
                username: row.get("username"),
                question: row.get("question"),
                asked_at: row.get("asked_at"),
                tags,
                answer: row.get("answer"),
                used_tool: row.get("used_tool"),
            })
        })
        .collect()
}

pub async fn stats_summary(pool: &SqlitePool) -> Result<QuestionStats> {
    Ok(summarize(&list_questions(pool, None).await?))
}

/// Aggregate counts over `records`.
pub fn summarize(records: &[QuestionRecord]) -> QuestionStats {
    let mut stats = QuestionStats {
        total_questions: records.len() as u64,
        ..QuestionStats::default()
    };

    for q in records {
        let user = if q.username.is_empty() {
            UNKNOWN_USER
        } else {
            q.username.as_str()
        };
        *stats.by_user.entry(user.to_string()).or_default() += 1;
        for tag in &q.tags {
            *stats.by_tag.entry(tag.clone()).or_default() += 1;
        }
        if let Some(tool) = q.used_tool.as_deref().filter(|t| !t.is_empty()) {
            *stats.tool_usage.entry(tool.to_string()).or_default() += 1;
        }
    }

    stats
}

// ============ CLI entry points ============

pub async fn run_record(config: &Config, new: NewQuestion) -> Result<()> {
    let pool = db::connect(config).await?;
    let classifier = create_classifier(&config.classifier)?;
    let record = record_question(&pool, classifier.as_ref(), new).await?;
    pool.close().await;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub async fn run_list(config: &Config, username: Option<&str>) -> Result<()> {
    let pool = db::connect(config).await?;
    let records = list_questions(&pool, username).await?;
    pool.close().await;

    if records.is_empty() {
        println!("No questions recorded.");
        return Ok(());
    }

    for q in &records {
        println!("#{} [{}] {}: {}", q.id, q.asked_at, q.username, q.question);
        if !q.tags.is_empty() {
            println!("    tags: {}", q.tags.join(", "));
        }
        if let Some(ref tool) = q.used_tool {
            println!("    tool: {}", tool);
        }
    }
    Ok(())
}

pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let stats = stats_summary(&pool).await?;
    pool.close().await;

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
