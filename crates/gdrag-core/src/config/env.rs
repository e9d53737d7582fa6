use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_services();
        self.apply_env_overrides_pipeline();
        self.apply_env_overrides_secrets();
    }

    fn apply_env_overrides_services(&mut self) {
        if let Ok(v) = std::env::var("GDRAG_QDRANT_URL") {
            self.qdrant.url = v;
        }
        if let Ok(v) = std::env::var("GDRAG_EMBEDDING_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.embedding.provider = kind;
            } else {
                tracing::warn!("ignoring invalid GDRAG_EMBEDDING_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("GDRAG_EMBEDDING_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("GDRAG_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("GDRAG_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Ok(v) = std::env::var("GDRAG_GATEWAY_PORT")
            && let Ok(port) = v.parse::<u16>()
        {
            self.gateway.port = port;
        }
        if let Ok(v) = std::env::var("GDRAG_DOCS_CACHE_DIR") {
            self.docs.cache_dir = v.into();
        }
        if let Ok(v) = std::env::var("GDRAG_PROJECT_PATH") {
            self.project.path = Some(v.into());
        }
    }

    fn apply_env_overrides_pipeline(&mut self) {
        if let Ok(v) = std::env::var("GDRAG_INDEX_CHUNK_SIZE")
            && let Ok(n) = v.parse::<usize>()
        {
            self.index.chunk_size = n;
        }
        if let Ok(v) = std::env::var("GDRAG_INDEX_CHUNK_OVERLAP")
            && let Ok(n) = v.parse::<usize>()
        {
            self.index.chunk_overlap = n;
        }
        if let Ok(v) = std::env::var("GDRAG_INDEX_BATCH_SIZE")
            && let Ok(n) = v.parse::<usize>()
        {
            self.index.batch_size = n;
        }
        if let Ok(v) = std::env::var("GDRAG_INDEX_ID_SCHEME") {
            if let Ok(scheme) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.index.id_scheme = scheme;
            } else {
                tracing::warn!("ignoring invalid GDRAG_INDEX_ID_SCHEME value: {v}");
            }
        }
        if let Ok(v) = std::env::var("GDRAG_UPLOAD_MAX_RETRIES")
            && let Ok(n) = v.parse::<u32>()
        {
            self.upload.max_retries = n;
        }
        if let Ok(v) = std::env::var("GDRAG_UPLOAD_DELAY_SECS")
            && let Ok(n) = v.parse::<u64>()
        {
            self.upload.delay_secs = n;
        }
        if let Ok(v) = std::env::var("GDRAG_QUERY_LIMIT")
            && let Ok(n) = v.parse::<u64>()
        {
            self.query.limit = n;
        }
        if let Ok(v) = std::env::var("GDRAG_RULES_PATH") {
            self.rules.path = v.into();
        }
    }

    fn apply_env_overrides_secrets(&mut self) {
        if let Ok(v) = std::env::var("GDRAG_QDRANT_API_KEY") {
            self.qdrant.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("GDRAG_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("GDRAG_GATEWAY_TOKEN") {
            self.gateway.auth_token = Some(v);
        }
    }
}
