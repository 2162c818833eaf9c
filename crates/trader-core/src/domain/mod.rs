//! 마진 트레이딩 운영을 위한 도메인 모델.

mod account;
mod market_data;
mod order;
mod signal;

pub use account::*;
pub use market_data::*;
pub use order::*;
pub use signal::*;
