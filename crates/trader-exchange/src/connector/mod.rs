//! 거래소 커넥터.

pub mod huobi;

pub use huobi::{HuobiClient, HuobiConfig, HUOBI_REST_URL};
