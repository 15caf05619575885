// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Path to the board-game catalog JSON file the retriever indexes.
    pub catalog_path: PathBuf,
    /// Path where the embedding index cache is stored.
    pub index_path: PathBuf,
    /// Number of catalog entries retrieved per concept request.
    pub retriever_top_k: usize,
    /// Chat-completion provider name (openai, anthropic, ollama).
    pub llm_provider: String,
    /// Model used for generation endpoints.
    pub generate_model: String,
    /// Model used for regeneration endpoints.
    pub regenerate_model: String,
    /// API key for the chat and embedding providers.
    pub api_key: String,
    /// Base URL of the embeddings API.
    pub embeddings_api_base: String,
    /// Embedding model name.
    pub embeddings_model: String,
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `PORT` - HTTP server port (default: 8000)
    /// - `CATALOG_PATH` - catalog JSON file (default: `data/boardgame_catalog.json`)
    /// - `INDEX_PATH` - embedding index cache (default: `<catalog dir>/catalog_index.json`)
    /// - `RETRIEVER_TOP_K` - reference games per concept prompt (default: 5)
    /// - `LLM_PROVIDER` - chat backend (default: `openai`)
    /// - `GENERATE_MODEL` / `REGENERATE_MODEL` - chat model names
    /// - `LLM_API_KEY` (falls back to `OPENAI_API_KEY`)
    /// - `EMBEDDINGS_API_BASE` - default `https://api.openai.com/v1`
    /// - `EMBEDDINGS_MODEL` - default `text-embedding-3-small`
    ///
    /// CLI flags:
    /// - `--port <PORT>` - override the port
    /// - `--catalog <PATH>` - override the catalog path
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();

        let port = Self::parse_cli_value(&args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok()))
            .unwrap_or(8000);

        let catalog_path = Self::parse_cli_value(&args, "--catalog")
            .map(PathBuf::from)
            .or_else(|| std::env::var("CATALOG_PATH").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("data/boardgame_catalog.json"));

        let index_path = std::env::var("INDEX_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                catalog_path
                    .parent()
                    .map(|d| d.join("catalog_index.json"))
                    .unwrap_or_else(|| PathBuf::from("catalog_index.json"))
            });

        let retriever_top_k = std::env::var("RETRIEVER_TOP_K")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let llm_provider =
            std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());

        let generate_model =
            std::env::var("GENERATE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let regenerate_model =
            std::env::var("REGENERATE_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let api_key = std::env::var("LLM_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .unwrap_or_default();

        let embeddings_api_base = std::env::var("EMBEDDINGS_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let embeddings_model = std::env::var("EMBEDDINGS_MODEL")
            .unwrap_or_else(|_| "text-embedding-3-small".to_string());

        Config {
            port,
            catalog_path,
            index_path,
            retriever_top_k,
            llm_provider,
            generate_model,
            regenerate_model,
            api_key,
            embeddings_api_base,
            embeddings_model,
        }
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_value() {
        let args: Vec<String> = ["prog", "--port", "9000", "--catalog", "games.json"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            Config::parse_cli_value(&args, "--port"),
            Some("9000".to_string())
        );
        assert_eq!(
            Config::parse_cli_value(&args, "--catalog"),
            Some("games.json".to_string())
        );
        assert_eq!(Config::parse_cli_value(&args, "--missing"), None);
    }

    #[test]
    fn test_parse_cli_value_flag_at_end() {
        let args: Vec<String> = ["prog", "--port"].iter().map(|s| s.to_string()).collect();
        // Flag with no value is ignored
        assert_eq!(Config::parse_cli_value(&args, "--port"), None);
    }
}
