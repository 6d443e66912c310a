pub mod config;
pub mod ticket;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, CorsConfig,
    DatabaseConfig, ServerConfig, StorageBackend,
};
pub use ticket::{
    Category, Comment, CommentPayload, DocumentTicketStore, NewComment, Priority,
    SqliteTicketStore, Status, Ticket, TicketDraft, TicketError, TicketPayload, TicketStats,
    TicketStore, ValidationError,
};
