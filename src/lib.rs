pub mod config;
pub mod data;
pub mod error;
pub mod executor;
pub mod history;
pub mod logging;
pub mod saved_queries;
pub mod services;
pub mod storage;
pub mod utils;
pub mod workbench;

pub use config::config::Config;
pub use data::grid_view::{GridView, PageView};
pub use data::result_set::{CellValue, ResultSet, Row};
pub use error::{Result, WorkbenchError};
pub use executor::{MockExecutor, QueryExecutor};
pub use workbench::WorkbenchState;
