pub mod config;
pub mod env_path;
pub mod installer;
pub mod process;
pub mod registry;
pub mod remote;
pub mod service;
pub mod template;

pub use config::Config;
pub use process::{CommandRunner, CommandSpec, SystemRunner};
pub use registry::{Hive, RegistryWriter};
pub use remote::{DownloadRequest, Downloader, HttpDownloader};
pub use service::{NetServiceController, ServiceController};
