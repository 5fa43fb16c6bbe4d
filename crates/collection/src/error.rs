use crate::remote::RemoteError;
use crate::settings::SettingsError;

#[derive(Debug)]
pub enum CollectionError {
    NotFound(String),
    Conflict(String),
    Configuration(String),
    Remote(RemoteError),
    Settings(SettingsError),
}

impl CollectionError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        CollectionError::Configuration(message.into())
    }
}

impl std::fmt::Display for CollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionError::NotFound(id) => write!(f, "track not found: {}", id),
            CollectionError::Conflict(genre) => write!(f, "genre already exists: {}", genre),
            CollectionError::Configuration(message) => {
                write!(f, "configuration error: {}", message)
            }
            CollectionError::Remote(err) => write!(f, "remote error: {}", err),
            CollectionError::Settings(err) => write!(f, "settings error: {}", err),
        }
    }
}

impl std::error::Error for CollectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectionError::Remote(err) => Some(err),
            CollectionError::Settings(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RemoteError> for CollectionError {
    fn from(err: RemoteError) -> Self {
        CollectionError::Remote(err)
    }
}

impl From<SettingsError> for CollectionError {
    fn from(err: SettingsError) -> Self {
        CollectionError::Settings(err)
    }
}
