/// Result alias that carries the crate [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The hardware sink or the analog input failed to initialize.
    #[error("keyboard hardware is not ready")]
    NotReady,
    /// A choice parameter was declared with a default outside its options.
    #[error("parameter `{parameter}` default `{default}` is not one of its options")]
    InvalidChoiceDefault {
        parameter: &'static str,
        default: &'static str,
    },
    /// Two parameters of one effect share a name.
    #[error("parameter `{0}` is declared twice")]
    DuplicateParameter(&'static str),
    /// Two effects registered under the same name.
    #[error("effect `{0}` is already registered")]
    DuplicateEffect(String),
    #[error("unknown effect `{0}`")]
    UnknownEffect(String),
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
    #[error("no effect is active")]
    NoActiveEffect,
    /// The key layout maps one scan code twice.
    #[error("scan code {0:#06x} appears twice in the key layout")]
    DuplicateScanCode(u16),
    /// The key layout maps two scan codes onto one cell.
    #[error("key position ({row}, {col}) is assigned to more than one scan code")]
    DuplicatePosition { row: u8, col: u8 },
    /// An effect failed while rendering or initializing.
    #[error("effect `{effect}` failed: {message}")]
    Effect { effect: String, message: String },
    /// Audio capture could not be started.
    #[error("audio capture unavailable: {0}")]
    Audio(String),
    #[error("fft failed: {0}")]
    Fft(#[from] realfft::FftError),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Creates an effect failure tagged with the effect name.
    pub fn effect<N: Into<String>, M: Into<String>>(effect: N, message: M) -> Self {
        Self::Effect {
            effect: effect.into(),
            message: message.into(),
        }
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
