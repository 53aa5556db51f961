use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::calculation::MixInput;

/// 파라미터/히스토리 파일 처리 시 발생 가능한 오류를 표현한다.
#[derive(Debug)]
pub enum StorageError {
    /// 파일 입출력 오류
    Io(std::io::Error),
    /// TOML 역직렬화 오류
    Parse(toml::de::Error),
    /// TOML 직렬화 오류
    Serialize(toml::ser::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "file error: {e}"),
            StorageError::Parse(e) => write!(f, "file parse error: {e}"),
            StorageError::Serialize(e) => write!(f, "file serialize error: {e}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        StorageError::Io(value)
    }
}

impl From<toml::de::Error> for StorageError {
    fn from(value: toml::de::Error) -> Self {
        StorageError::Parse(value)
    }
}

impl From<toml::ser::Error> for StorageError {
    fn from(value: toml::ser::Error) -> Self {
        StorageError::Serialize(value)
    }
}

/// 히스토리 한 건: 계산 시각과 그 입력값.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub input: MixInput,
}

impl HistoryEntry {
    /// 히스토리 목록에 표시할 한 줄 요약.
    pub fn describe(&self) -> String {
        format!(
            "{} - Cf: {} nM, Vol: {} {}",
            self.timestamp,
            self.input.final_concentration_nm,
            self.input.medium_volume,
            self.input.medium_volume_unit.label()
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    entries: Vec<HistoryEntry>,
}

/// 입력 파라미터 한 벌을 TOML 파일로 저장한다.
pub fn save_input_preset(path: &Path, input: &MixInput) -> Result<(), StorageError> {
    let content = toml::to_string_pretty(input)?;
    fs::write(path, content)?;
    Ok(())
}

/// TOML 파일에서 입력 파라미터를 읽어온다.
pub fn load_input_preset(path: &Path) -> Result<MixInput, StorageError> {
    let content = fs::read_to_string(path)?;
    let input: MixInput = toml::from_str(&content)?;
    Ok(input)
}

/// 세션 히스토리를 TOML 파일로 저장한다.
pub fn save_history(path: &Path, entries: &[HistoryEntry]) -> Result<(), StorageError> {
    let file = HistoryFile {
        entries: entries.to_vec(),
    };
    let content = toml::to_string_pretty(&file)?;
    fs::write(path, content)?;
    Ok(())
}

/// TOML 파일에서 히스토리를 읽어온다.
pub fn load_history(path: &Path) -> Result<Vec<HistoryEntry>, StorageError> {
    let content = fs::read_to_string(path)?;
    let file: HistoryFile = toml::from_str(&content)?;
    Ok(file.entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::VolumeUnit;

    fn sample_input() -> MixInput {
        MixInput::new(1.0, 2000.0, VolumeUnit::Microliter, 200.0, 20000.0, 3).unwrap()
    }

    #[test]
    fn preset_roundtrip() {
        let dir = std::env::temp_dir().join("sirna_mix_preset_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("preset.toml");
        let input = sample_input();
        save_input_preset(&path, &input).unwrap();
        let loaded = load_input_preset(&path).unwrap();
        assert_eq!(loaded, input);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn history_roundtrip_preserves_order() {
        let dir = std::env::temp_dir().join("sirna_mix_history_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("history.toml");
        let entries = vec![
            HistoryEntry {
                timestamp: "2026-08-25 09:00:00".into(),
                input: sample_input(),
            },
            HistoryEntry {
                timestamp: "2026-08-25 09:05:00".into(),
                input: MixInput::new(5.0, 1.0, VolumeUnit::Milliliter, 50.0, 50000.0, 6).unwrap(),
            },
        ];
        save_history(&path, &entries).unwrap();
        let loaded = load_history(&path).unwrap();
        assert_eq!(loaded, entries);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn describe_lists_concentration_and_volume() {
        let entry = HistoryEntry {
            timestamp: "2026-08-25 10:30:00".into(),
            input: MixInput::new(2.5, 1.5, VolumeUnit::Milliliter, 100.0, 20000.0, 2).unwrap(),
        };
        assert_eq!(
            entry.describe(),
            "2026-08-25 10:30:00 - Cf: 2.5 nM, Vol: 1.5 mL"
        );
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let path = Path::new("definitely-not-here.toml");
        match load_input_preset(path) {
            Err(StorageError::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
