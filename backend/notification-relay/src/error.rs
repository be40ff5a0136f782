use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event channel error: {0}")]
    EventChannel(#[from] event_channel::EventChannelError),
}
