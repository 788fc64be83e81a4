use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BacktestError {
    #[error("Unsupported strategy type: {0}")]
    UnsupportedStrategy(String),

    #[error("Invalid parameter '{name}' for {strategy}: {reason}")]
    InvalidParameter {
        strategy: String,
        name: String,
        reason: String,
    },

    #[error("Invalid backtest config: {0}")]
    InvalidConfig(String),
}

pub type EngineResult<T> = Result<T, BacktestError>;
