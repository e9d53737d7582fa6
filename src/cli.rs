use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "gdrag", version)]
#[command(about = "Index Godot projects and docs into Qdrant and retrieve prompt context")]
pub struct Cli {
    /// Config file (default: $GDRAG_CONFIG, then config/default.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Retrieve context for a question and print it as a prompt block
    Query {
        text: String,

        #[arg(short, long, help = "Results per collection")]
        limit: Option<u64>,

        #[arg(short, long, num_args = 1.., help = "Collections to search")]
        collections: Vec<String>,

        #[arg(long, help = "Prepend the project rules")]
        rules: bool,

        #[arg(long, help = "Re-index the configured project before searching")]
        update_project: bool,
    },

    /// Replace the project collection with the contents of a Godot project
    IndexProject {
        #[arg(short, long, help = "Project root (default: [project].path, then .)")]
        path: Option<PathBuf>,

        #[arg(long)]
        chunk_size: Option<usize>,

        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Download the Godot class reference and index it
    IndexDocs {
        #[arg(long, help = "Docs version, e.g. stable or 4.3")]
        version: Option<String>,

        #[arg(long)]
        collection: Option<String>,
    },

    /// Create an empty collection sized for the configured embedder
    CreateCollection {
        #[arg(long)]
        name: Option<String>,
    },

    /// List collections in the vector store
    ListCollections,

    /// Delete a collection and all of its points
    DeleteCollection {
        name: String,

        #[arg(short, long, help = "Skip the confirmation prompt")]
        yes: bool,
    },

    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        bind: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_query_with_options() {
        let cli = Cli::try_parse_from([
            "gdrag",
            "query",
            "how does the player jump",
            "--limit",
            "5",
            "--collections",
            "godot_game",
            "godot_docs",
            "--rules",
        ])
        .unwrap();
        let Command::Query {
            text,
            limit,
            collections,
            rules,
            update_project,
        } = cli.command
        else {
            panic!("expected query");
        };
        assert_eq!(text, "how does the player jump");
        assert_eq!(limit, Some(5));
        assert_eq!(collections, vec!["godot_game", "godot_docs"]);
        assert!(rules);
        assert!(!update_project);
    }

    #[test]
    fn parse_index_docs_version_flag() {
        let cli = Cli::try_parse_from(["gdrag", "index-docs", "--version", "4.3"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::IndexDocs { version: Some(ref v), collection: None } if v == "4.3"
        ));
    }

    #[test]
    fn parse_global_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["gdrag", "list-collections", "--config", "alt.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert!(matches!(cli.command, Command::ListCollections));
    }

    #[test]
    fn delete_requires_name() {
        assert!(Cli::try_parse_from(["gdrag", "delete-collection"]).is_err());
        let cli = Cli::try_parse_from(["gdrag", "delete-collection", "old", "-y"]).unwrap();
        assert!(matches!(cli.command, Command::DeleteCollection { yes: true, .. }));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
