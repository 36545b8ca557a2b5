//! Default values for configuration

/// Default provider backend
pub fn default_backend() -> String {
    "ollama".to_string()
}

/// Default provider request timeout in seconds
pub fn default_provider_timeout() -> u64 {
    120
}

/// Default Ollama URL for local development
pub fn default_ollama_url() -> String {
    std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".to_string())
}

/// Default environment variable name for the OpenAI API key
pub fn default_openai_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// Default environment variable name for the OpenAI base URL
pub fn default_openai_base_url_env() -> String {
    "OPENAI_BASE_URL".to_string()
}

/// Fallback OpenAI API base URL
pub fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Default: raw dot-product scoring, no normalization
pub fn default_embedding_normalize() -> bool {
    false
}

/// Default maximum characters per chunk
pub fn default_chunk_max_chars() -> usize {
    1000
}

/// Default overlap characters between chunks
pub fn default_chunk_overlap() -> usize {
    20
}

/// Default extensions picked up when ingesting a directory
pub fn default_ingest_extensions() -> Vec<String> {
    vec!["txt".to_string()]
}

/// Default directory holding collection artifacts (relative to the working directory)
pub fn default_collections_dir() -> String {
    "collections".to_string()
}

/// Default number of chunks used as context
pub fn default_query_k() -> usize {
    5
}

/// Default chat model
pub fn default_chat_model() -> String {
    "llama3.2:1b".to_string()
}

/// Default system prompt seeded into every conversation
pub fn default_system_prompt() -> String {
    "You are a knowledgeable, efficient, and direct AI assistant. Provide concise answers, \
     focusing on the key information needed. Offer suggestions tactfully when appropriate to \
     improve outcomes. Engage in productive collaboration with the user."
        .to_string()
}
