//! Canned walkthroughs, runnable with `mdb-ai --example <name>`.

use colored::*;
use serde_json::json;

use crate::client::{FindOptions, MongoMcpClient};
use crate::error::Result;
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Example {
    /// Natural-language questions about sample_mflix
    Basic,
    /// Direct tool calls without the language model
    Direct,
    /// Dependency analysis over infrastructure_kg
    Infrastructure,
}

const BASIC_QUERIES: &[(&str, &str)] = &[
    (
        "Example 1: Count documents",
        "How many movies are in the sample_mflix database?",
    ),
    (
        "Example 2: Top genres",
        "What are the top 5 most common genres in sample_mflix movies?",
    ),
    (
        "Example 3: Complex analysis",
        "Find the average IMDB rating by decade for movies in sample_mflix. \
         Only include decades with at least 100 movies.",
    ),
];

const INFRASTRUCTURE_QUERIES: &[(&str, &str)] = &[
    (
        "Query 1: What entities exist in the infrastructure?",
        "What types of entities exist in infrastructure_kg and how many of each?",
    ),
    (
        "Query 2: Server dependency analysis",
        "Find all upstream and downstream dependencies for SRV-APP-004 \
         in the infrastructure_kg database. Show the complete dependency chain.",
    ),
    (
        "Query 3: Critical application dependencies",
        "Which applications have the most dependencies in infrastructure_kg? \
         List the top 5 and their dependency counts.",
    ),
    (
        "Query 4: VLAN membership",
        "Show which servers belong to which VLANs in infrastructure_kg.",
    ),
];

/// Schema output can be huge; the demo only shows the start of it.
const SCHEMA_PREVIEW_CHARS: usize = 2000;

impl Example {
    /// Whether the walkthrough prints the client's own progress output.
    pub fn verbose(self) -> bool {
        !matches!(self, Example::Direct)
    }

    /// Run against a connected client.
    pub async fn run(self, client: &mut MongoMcpClient) -> Result<()> {
        match self {
            Example::Basic => run_queries(client, BASIC_QUERIES).await,
            Example::Direct => run_direct(client).await,
            Example::Infrastructure => run_queries(client, INFRASTRUCTURE_QUERIES).await,
        }
    }
}

fn heading(title: &str) {
    let rule = "=".repeat(60);
    println!("\n{}\n{}\n{}", rule, title, rule);
}

async fn run_queries(client: &mut MongoMcpClient, queries: &[(&str, &str)]) -> Result<()> {
    for (title, prompt) in queries {
        heading(title);
        client.query(prompt, None).await?;
    }
    Ok(())
}

async fn run_direct(client: &mut MongoMcpClient) -> Result<()> {
    println!("\n{}\n", "Direct MongoDB Operations Demo".bold().cyan());

    let result = client.list_databases().await?;
    ui::print_result("1. List Databases", &result);

    let result = client.list_collections("sample_mflix").await?;
    ui::print_result("2. Collections in sample_mflix", &result);

    let result = client.count("sample_mflix", "movies", None).await?;
    ui::print_result("3. Movie Count", &result);

    let result = client
        .count(
            "sample_mflix",
            "movies",
            Some(json!({ "year": { "$gte": 2000 } })),
        )
        .await?;
    ui::print_result("4. Movies from 2000+", &result);

    let result = client
        .find(
            "sample_mflix",
            "movies",
            FindOptions {
                filter: Some(json!({ "year": 2020 })),
                projection: Some(json!({ "title": 1, "year": 1, "imdb.rating": 1 })),
                sort: Some(json!({ "imdb.rating": -1 })),
                limit: 5,
            },
        )
        .await?;
    ui::print_result("5. Top 5 Movies from 2020", &result);

    let result = client
        .aggregate(
            "sample_mflix",
            "movies",
            vec![
                json!({ "$match": { "imdb.rating": { "$exists": true } } }),
                json!({ "$group": {
                    "_id": "$year",
                    "avgRating": { "$avg": "$imdb.rating" },
                    "count": { "$sum": 1 }
                }}),
                json!({ "$match": { "count": { "$gte": 50 } } }),
                json!({ "$sort": { "avgRating": -1 } }),
                json!({ "$limit": 10 }),
            ],
        )
        .await?;
    ui::print_result("6. Top 10 Years by Average Rating (min 50 movies)", &result);

    let result = client.get_schema("sample_mflix", "movies").await?;
    ui::print_result(
        "7. Movies Collection Schema",
        &ui::truncate_for_display(&result, SCHEMA_PREVIEW_CHARS),
    );

    Ok(())
}
