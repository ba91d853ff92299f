use std::env;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use product_graph::prelude::*;

/// Loads the product graph from the configured backend and prints a summary.
///
/// With `PRODUCT_GRAPH_DEMO_CONNECT=source,target` the demo also draws that edge and
/// saves the graph back.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GraphClientConfig::from_env();
    println!("graph api: {}", config.base_url);
    let store = HttpGraphStore::new(config)?;
    let editor = GraphEditor::new(store);

    let graph = editor
        .load()
        .await
        .context("failed to load product graph")?;
    println!("{} products, {} relationships", graph.nodes.len(), graph.edges.len());
    for kind in EdgeKind::ALL {
        let count = graph.edges.iter().filter(|edge| edge.kind == kind).count();
        println!("  {kind}: {count}");
    }

    let Ok(pair) = env::var("PRODUCT_GRAPH_DEMO_CONNECT") else {
        return Ok(());
    };
    let (source, target) = pair
        .split_once(',')
        .with_context(|| format!("invalid PRODUCT_GRAPH_DEMO_CONNECT '{}'", pair))?;

    let edge = editor
        .connect_nodes(&NodeId::from(source.trim()), &NodeId::from(target.trim()))?;
    println!("connected {} -> {} as {}", edge.source, edge.target, edge.id);

    let receipt = editor
        .save()
        .await
        .context("failed to save product graph")?;
    println!(
        "saved; {} edge ids assigned by the backend",
        receipt.edge_ids.len()
    );
    Ok(())
}
