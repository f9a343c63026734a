//! Utility modules for wkmp-ai

pub mod audio_decoder;
pub mod db_retry;
pub mod pool_monitor;

pub use audio_decoder::{decode_audio_file, DecodedAudio};
pub use db_retry::retry_on_lock;
pub use pool_monitor::{begin_monitored, MonitoredTransaction};
