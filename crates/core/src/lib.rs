pub mod config;
pub mod metrics;
pub mod repack;
pub mod search;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    IndexConfig, ServerConfig,
};
pub use repack::{
    NewRepack, RepackRecord, RepackRow, RepackStore, RepackStoreError, SearchResult,
    SqliteRepackStore,
};
pub use search::{
    create_index_service, format_name, IndexCommand, IndexError, IndexEvent, IndexState,
    IndexStats, IndexStatus, RepackIndexHandle, RepackIndexWorker, SearchResponse, TitleIndex,
};
