//! Retrieval-augmented generation tools
//!
//! A session-scoped configuration names the databases holding user
//! queries, the embedding model, and the chunk vector store. Every other
//! RAG tool requires that configuration and builds on the previous step:
//! store query, tokenize, embed, materialize embeddings, search.

use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::td::client::TdClient;
use crate::td::types::{sql_quote_ident, sql_quote_literal, tool_response};

/// Table for raw user questions
pub const QUERY_TABLE: &str = "user_query";

/// Table for materialized query embeddings
pub const QUERY_EMBEDDING_STORE: &str = "user_query_embeddings";

/// Embedding model identifier
pub const MODEL_ID: &str = "bge-small-en-v1.5";

/// Width of the embedding vectors produced by the model
pub const EMBEDDING_DIMENSIONS: usize = 384;

/// Session RAG configuration, set by `rag_setConfig`
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Database storing user questions and query embeddings
    pub query_db: String,

    /// Database holding the embedding model table
    pub model_db: String,

    /// Database containing the chunk vector store
    pub vector_db: String,

    /// Table containing chunk embeddings
    pub vector_table: String,
}

/// Holder for the per-server RAG configuration
#[derive(Default)]
pub struct RagState {
    config: Mutex<Option<RagConfig>>,
}

impl RagState {
    pub fn new() -> Self {
        Self::default()
    }

    async fn config(&self) -> Option<RagConfig> {
        self.config.lock().await.clone()
    }
}

/// Strip the optional `/rag ` prefix from a user question
pub fn clean_question(question: &str) -> &str {
    question.strip_prefix("/rag ").unwrap_or(question).trim()
}

/// DDL for the user query table
pub fn create_query_table_sql(db_name: &str, table_name: &str) -> String {
    format!(
        "CREATE TABLE {}.{} (id INTEGER GENERATED ALWAYS AS IDENTITY, \
         txt VARCHAR(5000) CHARACTER SET UNICODE, \
         created_ts TIMESTAMP(0) DEFAULT CURRENT_TIMESTAMP) PRIMARY INDEX (id)",
        sql_quote_ident(db_name),
        sql_quote_ident(table_name)
    )
}

/// Insert a cleaned question into the query table
pub fn store_query_sql(db_name: &str, table_name: &str, question: &str) -> String {
    format!(
        "INSERT INTO {}.{} (txt) VALUES ({})",
        sql_quote_ident(db_name),
        sql_quote_ident(table_name),
        sql_quote_literal(question)
    )
}

/// View tokenizing the most recent question
pub fn tokenize_view_sql(config: &RagConfig) -> String {
    let query_db = sql_quote_ident(&config.query_db);
    format!(
        "REPLACE VIEW {query_db}.v_topics_tokenized AS \
         SELECT id, txt, input_ids, attention_mask FROM ivsm.tokenizer_encode ( \
         ON (SELECT TOP 1 id, txt FROM {query_db}.{qt} ORDER BY id DESC) \
         ON (SELECT model AS tokenizer FROM {model_db}.embeddings_tokenizers \
         WHERE model_id = {model}) DIMENSION \
         USING ColumnsToPreserve ('id', 'txt') OutputFields ('input_ids', 'attention_mask') ) AS t",
        query_db = query_db,
        qt = sql_quote_ident(QUERY_TABLE),
        model_db = sql_quote_ident(&config.model_db),
        model = sql_quote_literal(MODEL_ID)
    )
}

/// View scoring the tokenized question through the embedding model
pub fn embedding_view_sql(config: &RagConfig) -> String {
    let query_db = sql_quote_ident(&config.query_db);
    format!(
        "REPLACE VIEW {query_db}.v_topics_embeddings AS \
         SELECT * FROM ivsm.IVSM_score ( \
         ON {query_db}.v_topics_tokenized \
         ON (SELECT * FROM {model_db}.embeddings_models WHERE model_id = {model}) DIMENSION \
         USING ColumnsToPreserve ('id', 'txt') ModelType ('ONNX') \
         BinaryInputFields ('input_ids', 'attention_mask') \
         BinaryOutputFields ('sentence_embedding') Caching ('inquery') ) AS s",
        query_db = query_db,
        model_db = sql_quote_ident(&config.model_db),
        model = sql_quote_literal(MODEL_ID)
    )
}

/// Materialize the latest query embedding into vector columns
pub fn query_embedding_table_sql(config: &RagConfig) -> String {
    let query_db = sql_quote_ident(&config.query_db);
    format!(
        "CREATE TABLE {query_db}.{store} AS ( \
         SELECT * FROM ivsm.vector_to_columns ( \
         ON {query_db}.v_topics_embeddings \
         USING ColumnsToPreserve ('id', 'txt') VectorDataType ('FLOAT32') \
         VectorLength ({dims}) OutputColumnPrefix ('emb_') InputColumnName ('sentence_embedding') \
         ) AS v ) WITH DATA PRIMARY INDEX (id)",
        query_db = query_db,
        store = sql_quote_ident(QUERY_EMBEDDING_STORE),
        dims = EMBEDDING_DIMENSIONS
    )
}

/// Drop statement for the previous query embedding table
pub fn drop_query_embedding_table_sql(config: &RagConfig) -> String {
    format!(
        "DROP TABLE {}.{}",
        sql_quote_ident(&config.query_db),
        sql_quote_ident(QUERY_EMBEDDING_STORE)
    )
}

/// Cosine top-k similarity search over the chunk vector store
pub fn semantic_search_sql(config: &RagConfig, top_k: u32) -> String {
    format!(
        "SELECT TOP {top_k} dt.target_id, dt.reference_id, \
         (1.0 - dt.distance) AS similarity, c.txt AS chunk_text, \
         c.page_no, c.chunk_no, c.doc_name \
         FROM TD_VECTORDISTANCE ( \
         ON (SELECT * FROM {query_db}.{store}) AS TargetTable \
         ON (SELECT * FROM {vector_db}.{vector_table}) AS ReferenceTable DIMENSION \
         USING TargetIDColumn ('id') TargetFeatureColumns ('[emb_0:emb_{last}]') \
         RefIDColumn ('id') RefFeatureColumns ('[emb_0:emb_{last}]') \
         DistanceMeasure ('cosine') topk ({top_k}) ) AS dt \
         JOIN {vector_db}.{vector_table} c ON dt.reference_id = c.id \
         ORDER BY similarity DESC",
        top_k = top_k,
        query_db = sql_quote_ident(&config.query_db),
        store = sql_quote_ident(QUERY_EMBEDDING_STORE),
        vector_db = sql_quote_ident(&config.vector_db),
        vector_table = sql_quote_ident(&config.vector_table),
        last = EMBEDDING_DIMENSIONS - 1
    )
}

fn config_missing() -> Value {
    json!({
        "status": "error",
        "message": "RAG configuration not set. Call rag_setConfig first.",
    })
}

/// Set the session RAG configuration
pub async fn set_config(
    state: &RagState,
    query_db: &str,
    model_db: &str,
    vector_db: &str,
    vector_table: &str,
) -> Result<Value> {
    let config = RagConfig {
        query_db: query_db.to_string(),
        model_db: model_db.to_string(),
        vector_db: vector_db.to_string(),
        vector_table: vector_table.to_string(),
    };
    *state.config.lock().await = Some(config);
    Ok(tool_response(
        json!({
            "query_db": query_db,
            "model_db": model_db,
            "vector_db": vector_db,
            "vector_table": vector_table,
            "query_table": QUERY_TABLE,
            "query_embedding_store": QUERY_EMBEDDING_STORE,
            "model_id": MODEL_ID,
        }),
        Some(json!({"tool_name": "rag_setConfig"})),
    ))
}

/// Store a user question as the first step of the RAG workflow
///
/// Creates the query table on first use; a failed CREATE against an
/// existing table is tolerated.
pub async fn store_user_query(
    client: &TdClient,
    db_name: &str,
    table_name: &str,
    question: &str,
) -> Result<Value> {
    let cleaned = clean_question(question);

    if let Err(e) = client
        .execute(&create_query_table_sql(db_name, table_name))
        .await
    {
        tracing::debug!("Query table create skipped: {}", e);
    }

    client
        .execute(&store_query_sql(db_name, table_name, cleaned))
        .await?;

    let id_sql = format!(
        "SELECT MAX(id) AS id FROM {}.{}",
        sql_quote_ident(db_name),
        sql_quote_ident(table_name)
    );
    let id = client.execute(&id_sql).await?.scalar().cloned();

    Ok(tool_response(
        json!({"id": id, "question": cleaned}),
        Some(json!({"tool_name": "rag_storeUserQuery"})),
    ))
}

/// Tokenize the latest stored question
pub async fn tokenize_query(client: &TdClient, state: &RagState) -> Result<Value> {
    let Some(config) = state.config().await else {
        return Ok(config_missing());
    };
    client.execute(&tokenize_view_sql(&config)).await?;
    Ok(tool_response(
        json!(format!("{}.v_topics_tokenized created", config.query_db)),
        Some(json!({"tool_name": "rag_tokenizeQuery"})),
    ))
}

/// Create the sentence embedding view for the tokenized question
pub async fn create_embedding_view(client: &TdClient, state: &RagState) -> Result<Value> {
    let Some(config) = state.config().await else {
        return Ok(config_missing());
    };
    client.execute(&embedding_view_sql(&config)).await?;
    Ok(tool_response(
        json!(format!("{}.v_topics_embeddings created", config.query_db)),
        Some(json!({"tool_name": "rag_createEmbeddingView"})),
    ))
}

/// Materialize the latest query embedding for similarity search
pub async fn create_query_embedding_table(client: &TdClient, state: &RagState) -> Result<Value> {
    let Some(config) = state.config().await else {
        return Ok(config_missing());
    };

    // Replace the previous run's table; a missing table is fine.
    if let Err(e) = client
        .execute(&drop_query_embedding_table_sql(&config))
        .await
    {
        tracing::debug!("Embedding table drop skipped: {}", e);
    }
    client.execute(&query_embedding_table_sql(&config)).await?;

    Ok(tool_response(
        json!(format!(
            "{}.{} created",
            config.query_db, QUERY_EMBEDDING_STORE
        )),
        Some(json!({"tool_name": "rag_createQueryEmbeddingTable"})),
    ))
}

/// Retrieve the top-k most relevant chunks for the embedded query
pub async fn semantic_search_chunks(
    client: &TdClient,
    state: &RagState,
    top_k: u32,
) -> Result<Value> {
    let Some(config) = state.config().await else {
        return Ok(config_missing());
    };
    let result = client.execute(&semantic_search_sql(&config, top_k)).await?;
    Ok(tool_response(
        result.rows_json(),
        Some(json!({"tool_name": "rag_semanticSearchChunks", "top_k": top_k})),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RagConfig {
        RagConfig {
            query_db: "rag_q".to_string(),
            model_db: "rag_m".to_string(),
            vector_db: "rag_v".to_string(),
            vector_table: "pdf_chunks".to_string(),
        }
    }

    #[test]
    fn test_clean_question_strips_prefix() {
        assert_eq!(clean_question("/rag what is DBQL?"), "what is DBQL?");
        assert_eq!(clean_question("what is DBQL?"), "what is DBQL?");
        assert_eq!(clean_question("/rag   padded  "), "padded");
    }

    #[test]
    fn test_store_query_sql_escapes_question() {
        let sql = store_query_sql("db", "user_query", "what's DBQL?");
        assert!(sql.contains("'what''s DBQL?'"));
    }

    #[test]
    fn test_semantic_search_sql_shape() {
        let sql = semantic_search_sql(&config(), 5);
        assert!(sql.starts_with("SELECT TOP 5"));
        assert!(sql.contains("TD_VECTORDISTANCE"));
        assert!(sql.contains("DistanceMeasure ('cosine')"));
        assert!(sql.contains("[emb_0:emb_383]"));
        assert!(sql.contains("\"rag_v\".\"pdf_chunks\""));
    }

    #[test]
    fn test_views_target_query_db() {
        let c = config();
        assert!(tokenize_view_sql(&c).contains("\"rag_q\".v_topics_tokenized"));
        assert!(embedding_view_sql(&c).contains("\"rag_q\".v_topics_embeddings"));
        assert!(embedding_view_sql(&c).contains("'bge-small-en-v1.5'"));
    }

    #[tokio::test]
    async fn test_tools_require_config() {
        let state = RagState::new();
        assert!(state.config().await.is_none());

        let resp = set_config(&state, "q", "m", "v", "t").await.unwrap();
        assert_eq!(resp["status"], "success");
        assert_eq!(resp["results"]["model_id"], MODEL_ID);
        assert!(state.config().await.is_some());
    }
}
