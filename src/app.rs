use crate::calculation::{CalcError, InputError};
use crate::config::Config;
use crate::i18n::{self, Translator};
use crate::storage;
use crate::ui_cli;
use crate::ui_cli::MenuChoice;

/// 애플리케이션 실행 중 발생 가능한 오류를 표현한다.
#[derive(Debug)]
pub enum AppError {
    /// 파일 입출력 오류
    Io(std::io::Error),
    /// 설정 저장/로드 오류
    Config(crate::config::ConfigError),
    /// 파라미터/히스토리 파일 오류
    Storage(storage::StorageError),
    /// 입력 검증 오류
    Input(InputError),
    /// 계산 엔진 오류
    Calc(CalcError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Io(e) => write!(f, "I/O error: {e}"),
            AppError::Config(e) => write!(f, "config error: {e}"),
            AppError::Storage(e) => write!(f, "storage error: {e}"),
            AppError::Input(e) => write!(f, "input error: {e}"),
            AppError::Calc(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(value: crate::config::ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<storage::StorageError> for AppError {
    fn from(value: storage::StorageError) -> Self {
        AppError::Storage(value)
    }
}

impl From<InputError> for AppError {
    fn from(value: InputError) -> Self {
        AppError::Input(value)
    }
}

impl From<CalcError> for AppError {
    fn from(value: CalcError) -> Self {
        AppError::Calc(value)
    }
}

/// CLI 애플리케이션의 메인 루프를 실행한다.
pub fn run(config: &mut Config, tr: &Translator) -> Result<(), AppError> {
    let mut session = ui_cli::Session::default();
    loop {
        match ui_cli::main_menu(tr)? {
            MenuChoice::Calculate => ui_cli::handle_calculate(tr, config, &mut session)?,
            MenuChoice::Explain => ui_cli::handle_explain(tr, config, &mut session)?,
            MenuChoice::History => ui_cli::handle_history(tr, &mut session)?,
            MenuChoice::Settings => {
                ui_cli::handle_settings(tr, config)?;
                config.save()?;
            }
            MenuChoice::Exit => {
                config.save()?;
                println!("{}", tr.t(i18n::keys::APP_EXIT));
                break;
            }
        }
    }
    Ok(())
}
