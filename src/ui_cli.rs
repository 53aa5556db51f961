use std::io::{self, Write};

use crate::app::AppError;
use crate::calculation::{
    calculate_mix, explain_mix, timestamp_now, MixInput, MixOutcome, TracingLog,
};
use crate::config::Config;
use crate::i18n::{fill_template, keys, Translator};
use crate::storage::HistoryEntry;
use crate::units::VolumeUnit;

/// 메인 메뉴 선택지를 표현한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Calculate,
    Explain,
    History,
    Settings,
    Exit,
}

/// 세션 동안 유지되는 상태: 히스토리와 마지막 입력.
#[derive(Debug, Default)]
pub struct Session {
    pub history: Vec<HistoryEntry>,
    pub last_input: Option<MixInput>,
}

/// 메인 메뉴를 표시하고 선택값을 반환한다.
pub fn main_menu(tr: &Translator) -> Result<MenuChoice, AppError> {
    println!("{}", tr.t(keys::MAIN_MENU_TITLE));
    println!("{}", tr.t(keys::MAIN_MENU_CALCULATE));
    println!("{}", tr.t(keys::MAIN_MENU_EXPLAIN));
    println!("{}", tr.t(keys::MAIN_MENU_HISTORY));
    println!("{}", tr.t(keys::MAIN_MENU_SETTINGS));
    println!("{}", tr.t(keys::MAIN_MENU_EXIT));
    loop {
        let sel = read_line(tr.t(keys::PROMPT_MENU_SELECT))?;
        match sel.trim() {
            "1" => return Ok(MenuChoice::Calculate),
            "2" => return Ok(MenuChoice::Explain),
            "3" => return Ok(MenuChoice::History),
            "4" => return Ok(MenuChoice::Settings),
            "0" => return Ok(MenuChoice::Exit),
            _ => println!("{}", tr.t(keys::INVALID_SELECTION_RETRY)),
        }
    }
}

/// 다섯 개 입력값을 수집하고 검증해 MixInput을 만든다.
fn collect_input(tr: &Translator, cfg: &Config) -> Result<MixInput, AppError> {
    println!("{}", tr.t(keys::CALC_HEADING));
    let cf = read_positive_f64(
        tr,
        tr.t(keys::PROMPT_FINAL_CONCENTRATION),
        tr.t(keys::FIELD_FINAL_CONCENTRATION),
    )?;
    let medium_volume = read_positive_f64(
        tr,
        tr.t(keys::PROMPT_MEDIUM_VOLUME),
        tr.t(keys::FIELD_MEDIUM_VOLUME),
    )?;
    let unit = read_volume_unit(tr, cfg.default_volume_unit)?;
    let mix_volume = read_positive_f64(
        tr,
        tr.t(keys::PROMPT_MIX_VOLUME),
        tr.t(keys::FIELD_MIX_VOLUME),
    )?;
    let stock = read_positive_f64(
        tr,
        tr.t(keys::PROMPT_STOCK_CONCENTRATION),
        tr.t(keys::FIELD_STOCK_CONCENTRATION),
    )?;
    let samples = read_sample_count(
        tr,
        tr.t(keys::PROMPT_SAMPLE_COUNT),
        tr.t(keys::FIELD_SAMPLE_COUNT),
    )?;
    let input = MixInput::new(cf, medium_volume, unit, mix_volume, stock, samples)?;
    Ok(input)
}

/// 계산 메뉴를 처리한다.
pub fn handle_calculate(
    tr: &Translator,
    cfg: &Config,
    session: &mut Session,
) -> Result<(), AppError> {
    let input = collect_input(tr, cfg)?;
    session.last_input = Some(input);
    session.history.push(HistoryEntry {
        timestamp: timestamp_now(),
        input,
    });

    match calculate_mix(&input, &TracingLog)? {
        MixOutcome::Feasible(result) => {
            println!(
                "{}",
                fill_template(
                    tr.t(keys::RESULT_MIX_CONCENTRATION),
                    &[("ci", format!("{:.2}", result.mix_concentration_nm))],
                )
            );
            print_result_table(tr, &result);
        }
        MixOutcome::Infeasible {
            required_nm,
            stock_nm,
        } => {
            println!(
                "{}",
                fill_template(
                    tr.t(keys::RESULT_INFEASIBLE),
                    &[
                        ("required", format!("{required_nm:.2}")),
                        ("stock", format!("{stock_nm}")),
                    ],
                )
            );
        }
    }
    Ok(())
}

fn print_result_table(tr: &Translator, result: &crate::calculation::MixResult) {
    let rows = [
        (
            tr.t(keys::TABLE_ROW_SIRNA),
            result.sirna_per_sample_ul,
            result.sirna_total_ul,
        ),
        (
            tr.t(keys::TABLE_ROW_BUFFER),
            result.buffer_per_sample_ul,
            result.buffer_total_ul,
        ),
        (
            tr.t(keys::TABLE_ROW_MIX),
            result.sirna_per_sample_ul + result.buffer_per_sample_ul,
            result.mix_total_ul,
        ),
    ];
    println!(
        "{:<12} {:>24} {:>20}",
        tr.t(keys::TABLE_COMPONENT),
        tr.t(keys::TABLE_PER_SAMPLE),
        tr.t(keys::TABLE_TOTAL)
    );
    for (label, per_sample, total) in rows {
        println!("{label:<12} {per_sample:>24.2} {total:>20.2}");
    }
}

/// 설명 메뉴를 처리한다. 마지막 입력이 있으면 그대로 사용한다.
pub fn handle_explain(
    tr: &Translator,
    cfg: &Config,
    session: &mut Session,
) -> Result<(), AppError> {
    let input = match session.last_input {
        Some(input) => input,
        None => {
            let input = collect_input(tr, cfg)?;
            session.last_input = Some(input);
            input
        }
    };
    println!("{}", tr.t(keys::EXPLAIN_HEADING));
    println!("{}", explain_mix(&input));
    Ok(())
}

/// 히스토리 메뉴를 처리한다. 최근 항목을 먼저 보여준다.
pub fn handle_history(tr: &Translator, session: &mut Session) -> Result<(), AppError> {
    println!("{}", tr.t(keys::HISTORY_HEADING));
    if session.history.is_empty() {
        println!("{}", tr.t(keys::HISTORY_EMPTY));
        return Ok(());
    }
    for (i, entry) in session.history.iter().rev().enumerate() {
        println!("{}) {}", i + 1, entry.describe());
    }
    let sel = read_line(tr.t(keys::HISTORY_PROMPT_LOAD))?;
    let sel = sel.trim();
    if sel.is_empty() {
        return Ok(());
    }
    if let Ok(n) = sel.parse::<usize>() {
        if n >= 1 && n <= session.history.len() {
            let entry = &session.history[session.history.len() - n];
            session.last_input = Some(entry.input);
            println!("{} {}", tr.t(keys::HISTORY_LOADED), entry.describe());
            return Ok(());
        }
    }
    println!("{}", tr.t(keys::INVALID_SELECTION_RETRY));
    Ok(())
}

/// 설정 메뉴를 처리한다.
pub fn handle_settings(tr: &Translator, cfg: &mut Config) -> Result<(), AppError> {
    println!("{}", tr.t(keys::SETTINGS_HEADING));
    println!("{} {}", tr.t(keys::SETTINGS_CURRENT_LANGUAGE), cfg.language);
    let sel = read_line(tr.t(keys::SETTINGS_PROMPT_LANGUAGE))?;
    match sel.trim() {
        "" => {}
        "1" => cfg.language = "en".to_string(),
        "2" => cfg.language = "fr".to_string(),
        _ => println!("{}", tr.t(keys::SETTINGS_INVALID)),
    }
    println!(
        "{} {}",
        tr.t(keys::SETTINGS_CURRENT_UNIT),
        cfg.default_volume_unit.label()
    );
    let sel = read_line(tr.t(keys::SETTINGS_PROMPT_UNIT))?;
    match sel.trim() {
        "" => {}
        "1" => cfg.default_volume_unit = VolumeUnit::Microliter,
        "2" => cfg.default_volume_unit = VolumeUnit::Milliliter,
        _ => println!("{}", tr.t(keys::SETTINGS_INVALID)),
    }
    println!("{}", tr.t(keys::SETTINGS_SAVED));
    Ok(())
}

fn read_line(prompt: &str) -> Result<String, AppError> {
    print!("{prompt}");
    io::stdout().flush().map_err(AppError::Io)?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).map_err(AppError::Io)?;
    Ok(buf)
}

/// 양수 실수를 읽는다. 빈 값/숫자 아님/0 이하는 필드별 메시지와 함께 재시도한다.
fn read_positive_f64(tr: &Translator, prompt: &str, field: &str) -> Result<f64, AppError> {
    loop {
        let s = read_line(prompt)?;
        let s = s.trim();
        if s.is_empty() {
            println!(
                "{}",
                fill_template(tr.t(keys::VALIDATION_EMPTY), &[("field", field.to_string())])
            );
            continue;
        }
        match s.parse::<f64>() {
            Ok(v) if v > 0.0 && v.is_finite() => return Ok(v),
            Ok(_) => println!(
                "{}",
                fill_template(
                    tr.t(keys::VALIDATION_NOT_POSITIVE),
                    &[("field", field.to_string())],
                )
            ),
            Err(_) => println!(
                "{}",
                fill_template(
                    tr.t(keys::VALIDATION_NOT_NUMBER),
                    &[("field", field.to_string())],
                )
            ),
        }
    }
}

/// 샘플 수(1 이상의 정수)를 읽는다.
fn read_sample_count(tr: &Translator, prompt: &str, field: &str) -> Result<u32, AppError> {
    loop {
        let s = read_line(prompt)?;
        let s = s.trim();
        if s.is_empty() {
            println!(
                "{}",
                fill_template(tr.t(keys::VALIDATION_EMPTY), &[("field", field.to_string())])
            );
            continue;
        }
        match s.parse::<u32>() {
            Ok(v) if v >= 1 => return Ok(v),
            Ok(_) => println!(
                "{}",
                fill_template(
                    tr.t(keys::VALIDATION_NOT_POSITIVE),
                    &[("field", field.to_string())],
                )
            ),
            Err(_) => println!(
                "{}",
                fill_template(
                    tr.t(keys::VALIDATION_NOT_INTEGER),
                    &[("field", field.to_string())],
                )
            ),
        }
    }
}

fn read_volume_unit(tr: &Translator, default: VolumeUnit) -> Result<VolumeUnit, AppError> {
    let sel = read_line(tr.t(keys::PROMPT_VOLUME_UNIT))?;
    let unit = match sel.trim() {
        "1" => VolumeUnit::Microliter,
        "2" => VolumeUnit::Milliliter,
        _ => default,
    };
    Ok(unit)
}
