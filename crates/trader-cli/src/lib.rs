//! 트레이딩 에이전트 CLI.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 설정/자격증명 로드와 거래소 구성
//! - 폴링 루프와 주기적 상태 보고
//! - 시그널, 잔고 조회 명령

pub mod commands;
