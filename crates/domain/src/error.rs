use thiserror::Error;

/// Errors raised by the fixed-point math routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("arithmetic overflow")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("tick {0} is outside the global tick bounds")]
    TickOutOfBounds(i32),

    #[error("sqrt price is outside the supported range")]
    SqrtPriceOutOfBounds,

    #[error("price range is empty or inverted")]
    InvalidRange,

    #[error("rate must be within [0, 1)")]
    InvalidRate,
}

pub type MathResult<T> = Result<T, MathError>;
