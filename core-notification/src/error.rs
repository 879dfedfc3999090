use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification already created; create_notification may only be called once")]
    AlreadyCreated,

    #[error("Notification has not been created yet")]
    NotCreated,

    #[error("Notification manager has been destroyed")]
    Destroyed,

    #[error("Invalid notification config: {0}")]
    InvalidConfig(String),

    #[error("Notification host error: {0}")]
    Host(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, NotificationError>;
