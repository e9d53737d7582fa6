use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, bail};
use dialoguer::Confirm;
use gdrag_core::{App, Config};
use gdrag_embed::Embedder;
use gdrag_gateway::GatewayServer;
use gdrag_index::{ChunkerConfig, IndexStats, QueryContext, format_context};
use tokio::sync::watch;

use crate::cli::Command;

const CONTEXT_BEGIN: &str = "--- CONTEXT FOR CLAUDE ---";
const CONTEXT_END: &str = "--- END CONTEXT ---";
const NO_CONTEXT: &str = "No relevant context found.";

pub async fn run(command: Command, mut config: Config) -> anyhow::Result<()> {
    let mut out = std::io::stdout();
    match command {
        Command::Query {
            text,
            limit,
            collections,
            rules,
            update_project,
        } => {
            let app = App::from_config(config)?;
            let request = QueryArgs {
                text,
                limit,
                collections,
                rules,
                update_project,
            };
            query(&app, request, &mut out).await
        }
        Command::IndexProject {
            path,
            chunk_size,
            overlap,
        } => {
            let app = App::from_config(config)?;
            index_project(&app, path, chunk_size, overlap, &mut out).await
        }
        Command::IndexDocs {
            version,
            collection,
        } => {
            let app = App::from_config(config)?;
            index_docs(&app, version, collection, &mut out).await
        }
        Command::CreateCollection { name } => {
            let app = App::from_config(config)?;
            create_collection(&app, name, &mut out).await
        }
        Command::ListCollections => {
            let app = App::from_config(config)?;
            list_collections(&app, &mut out).await
        }
        Command::DeleteCollection { name, yes } => {
            let app = App::from_config(config)?;
            if !yes && !confirm_delete(&name)? {
                writeln!(out, "Deletion cancelled.")?;
                return Ok(());
            }
            delete_collection(&app, &name, &mut out).await
        }
        Command::Serve { bind, port } => {
            if let Some(bind) = bind {
                config.gateway.bind = bind;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            serve(config).await
        }
    }
}

pub struct QueryArgs {
    pub text: String,
    pub limit: Option<u64>,
    pub collections: Vec<String>,
    pub rules: bool,
    pub update_project: bool,
}

pub async fn query(app: &App, args: QueryArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let config = app.config();
    if args.update_project {
        let path = config
            .project
            .path
            .as_deref()
            .context("--update-project needs [project].path (or GDRAG_PROJECT_PATH) to be set")?;
        let stats = app.indexer().index_project(path).await?;
        tracing::info!(
            files = stats.files_processed,
            chunks = stats.chunks_created,
            errors = stats.errors,
            "project re-indexed"
        );
    }

    let limit = args.limit.unwrap_or(config.query.limit);
    if limit == 0 {
        bail!("--limit must be greater than 0");
    }
    let collections = if args.collections.is_empty() {
        config.query.collections.clone()
    } else {
        args.collections
    };

    let ctx = app
        .retriever()
        .retrieve(&args.text, limit, &collections, args.rules)
        .await;
    writeln!(out, "{}", render_query_output(&ctx))?;
    Ok(())
}

fn render_query_output(ctx: &QueryContext) -> String {
    if ctx.is_empty() {
        return NO_CONTEXT.to_owned();
    }
    format!("\n{CONTEXT_BEGIN}\n{}\n\n{CONTEXT_END}", format_context(ctx))
}

pub async fn index_project(
    app: &App,
    path: Option<PathBuf>,
    chunk_size: Option<usize>,
    overlap: Option<usize>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let config = app.config();
    let root = path
        .or_else(|| config.project.path.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let defaults = config.chunker();
    let chunker = ChunkerConfig {
        chunk_size: chunk_size.unwrap_or(defaults.chunk_size),
        chunk_overlap: overlap.unwrap_or(defaults.chunk_overlap),
        min_chunk_size: defaults.min_chunk_size,
    };

    let indexer = app.indexer_with(chunker);
    let stats = indexer
        .index_project(&root)
        .await
        .with_context(|| format!("failed to index {}", root.display()))?;
    print_stats(out, &indexer.config().project_collection, &stats)
}

pub async fn index_docs(
    app: &App,
    version: Option<String>,
    collection: Option<String>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let config = app.config();
    let version = version.unwrap_or_else(|| config.docs.version.clone());
    let collection = collection.unwrap_or_else(|| config.index.docs_collection.clone());

    let dir = app
        .docs_scraper()?
        .scrape(&version)
        .await
        .with_context(|| format!("failed to fetch Godot {version} docs"))?;
    let stats = app.indexer().index_docs(&dir, &collection).await?;
    print_stats(out, &collection, &stats)
}

fn print_stats(out: &mut impl Write, collection: &str, stats: &IndexStats) -> anyhow::Result<()> {
    writeln!(out, "Indexed into '{collection}':")?;
    writeln!(out, "  files processed: {}", stats.files_processed)?;
    writeln!(out, "  chunks created:  {}", stats.chunks_created)?;
    writeln!(out, "  errors:          {}", stats.errors)?;
    writeln!(out, "  duration:        {} ms", stats.duration_ms)?;
    Ok(())
}

pub async fn create_collection(
    app: &App,
    name: Option<String>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let name = name.unwrap_or_else(|| app.config().index.project_collection.clone());
    let dimension = app
        .embedder()
        .probe_dimension()
        .await
        .context("failed to determine embedding dimension")?;
    app.store()
        .create_collection(&name, dimension)
        .await
        .with_context(|| format!("failed to create collection '{name}'"))?;
    writeln!(out, "Collection '{name}' created ({dimension} dimensions).")?;
    Ok(())
}

pub async fn list_collections(app: &App, out: &mut impl Write) -> anyhow::Result<()> {
    let collections = app
        .store()
        .list_collections()
        .await
        .context("failed to list collections")?;
    if collections.is_empty() {
        writeln!(out, "No collections found.")?;
        return Ok(());
    }
    writeln!(out, "Available collections:")?;
    for name in collections {
        writeln!(out, "- {name}")?;
    }
    Ok(())
}

pub async fn delete_collection(app: &App, name: &str, out: &mut impl Write) -> anyhow::Result<()> {
    app.store()
        .delete_collection(name)
        .await
        .with_context(|| format!("failed to delete collection '{name}'"))?;
    writeln!(out, "Collection '{name}' deleted.")?;
    Ok(())
}

fn confirm_delete(name: &str) -> anyhow::Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(format!("Delete collection '{name}' and all of its points?"))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let gateway = config.gateway.clone();
    let app = App::from_config(config)?;

    if gateway.auth_token.is_none() {
        tracing::warn!("GDRAG_GATEWAY_TOKEN not set, collection deletion over HTTP is disabled");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::new(&gateway.bind, gateway.port, app, shutdown_rx)
        .with_auth(gateway.auth_token)
        .with_max_body_size(gateway.max_body_size)
        .serve()
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gdrag_embed::{AnyEmbedder, MockEmbedder};
    use gdrag_store::{InMemoryVectorStore, VectorStore};

    use super::*;

    fn app_with(config: Config) -> (App, Arc<InMemoryVectorStore>) {
        let store = Arc::new(InMemoryVectorStore::new());
        let app = App::with_parts(
            config,
            Arc::clone(&store) as Arc<dyn VectorStore>,
            Arc::new(AnyEmbedder::Mock(MockEmbedder::new(64))),
        );
        (app, store)
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    fn write_project(root: &std::path::Path) {
        std::fs::create_dir_all(root.join("scripts")).unwrap();
        std::fs::write(
            root.join("scripts/enemy.gd"),
            "extends Area2D\n\nsignal defeated\n\nfunc take_damage(amount):\n    health -= amount\n    if health <= 0:\n        defeated.emit()\n",
        )
        .unwrap();
    }

    #[test]
    fn empty_context_prints_fallback_line() {
        assert_eq!(render_query_output(&QueryContext::default()), NO_CONTEXT);
    }

    #[tokio::test]
    async fn index_then_query_prints_wrapped_block() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let mut config = Config::default();
        config.rules.path = dir.path().join("missing_rules.md");
        let (app, store) = app_with(config);

        let mut buf = Vec::new();
        index_project(&app, Some(dir.path().to_path_buf()), None, None, &mut buf)
            .await
            .unwrap();
        let text = output(buf);
        assert!(text.contains("Indexed into 'godot_game'"));
        assert!(text.contains("files processed: 1"));
        assert_eq!(store.point_count("godot_game"), Some(1));

        let mut buf = Vec::new();
        let args = QueryArgs {
            text: "enemy take_damage health".into(),
            limit: None,
            collections: vec!["godot_game".into()],
            rules: false,
            update_project: false,
        };
        query(&app, args, &mut buf).await.unwrap();
        let text = output(buf);
        assert!(text.contains(CONTEXT_BEGIN));
        assert!(text.contains(CONTEXT_END));
        assert!(text.contains("--- From scripts/enemy.gd ---"));
        assert!(text.contains("(Relevance score: "));
    }

    #[tokio::test]
    async fn query_without_results_prints_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.rules.path = dir.path().join("missing_rules.md");
        let (app, _store) = app_with(config);

        let mut buf = Vec::new();
        let args = QueryArgs {
            text: "anything".into(),
            limit: Some(2),
            collections: Vec::new(),
            rules: false,
            update_project: false,
        };
        query(&app, args, &mut buf).await.unwrap();
        assert_eq!(output(buf).trim(), NO_CONTEXT);
    }

    #[tokio::test]
    async fn query_update_project_requires_configured_path() {
        let (app, _store) = app_with(Config::default());
        let args = QueryArgs {
            text: "jump".into(),
            limit: None,
            collections: Vec::new(),
            rules: false,
            update_project: true,
        };
        let err = query(&app, args, &mut Vec::new()).await.unwrap_err();
        assert!(err.to_string().contains("[project].path"));
    }

    #[tokio::test]
    async fn query_update_project_reindexes_first() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let mut config = Config::default();
        config.project.path = Some(dir.path().to_path_buf());
        config.rules.path = dir.path().join("missing_rules.md");
        let (app, store) = app_with(config);

        let args = QueryArgs {
            text: "defeated signal".into(),
            limit: Some(1),
            collections: vec!["godot_game".into()],
            rules: false,
            update_project: true,
        };
        let mut buf = Vec::new();
        query(&app, args, &mut buf).await.unwrap();
        assert_eq!(store.point_count("godot_game"), Some(1));
        assert!(output(buf).contains("scripts/enemy.gd"));
    }

    #[tokio::test]
    async fn index_project_rejects_overlap_not_below_size() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let (app, _store) = app_with(Config::default());
        let result = index_project(
            &app,
            Some(dir.path().to_path_buf()),
            Some(100),
            Some(100),
            &mut Vec::new(),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn collection_lifecycle() {
        let (app, store) = app_with(Config::default());

        let mut buf = Vec::new();
        list_collections(&app, &mut buf).await.unwrap();
        assert_eq!(output(buf).trim(), "No collections found.");

        let mut buf = Vec::new();
        create_collection(&app, None, &mut buf).await.unwrap();
        assert!(output(buf).contains("Collection 'godot_game' created (64 dimensions)"));
        assert_eq!(store.point_count("godot_game"), Some(0));

        assert!(
            create_collection(&app, Some("godot_game".into()), &mut Vec::new())
                .await
                .is_err()
        );

        let mut buf = Vec::new();
        list_collections(&app, &mut buf).await.unwrap();
        assert_eq!(output(buf), "Available collections:\n- godot_game\n");

        let mut buf = Vec::new();
        delete_collection(&app, "godot_game", &mut buf).await.unwrap();
        assert_eq!(output(buf).trim(), "Collection 'godot_game' deleted.");
        assert!(store.point_count("godot_game").is_none());
    }
}
