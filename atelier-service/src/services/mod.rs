pub mod analytics;
pub mod billing;
pub mod database;
pub mod export;
pub mod links;
pub mod metrics;
pub mod migration;
pub mod numbering;
pub mod storage;

pub use self::database::AtelierDb;
pub use self::metrics::{get_metrics, init_metrics};
pub use self::storage::ImageHostClient;
