//! siRNA 희석(mix) 계산 핵심 로직을 라이브러리로 분리하여 CLI 뿐 아니라 GUI에서도 공유한다.

pub mod app;
pub mod calculation;
pub mod config;
pub mod i18n;
pub mod storage;
pub mod ui_cli;
pub mod units;
