//! CLI 명령어 구현 모듈.

pub mod carry;
pub mod context;
pub mod run;
pub mod signal;
pub mod strategies;
