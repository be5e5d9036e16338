pub mod percentage;
pub mod price;

pub use percentage::Percentage;
pub use price::SqrtPrice;
