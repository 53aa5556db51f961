use serde::{Deserialize, Serialize};

/// 체적 단위. 내부 기준은 마이크로리터(µL)이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeUnit {
    Microliter,
    Milliliter,
}

impl VolumeUnit {
    /// 화면/파일에 표시할 단위 기호.
    pub fn label(&self) -> &'static str {
        match self {
            VolumeUnit::Microliter => "µL",
            VolumeUnit::Milliliter => "mL",
        }
    }

    /// 단위 기호 문자열을 파싱한다. "ul"/"uL" 표기도 허용한다.
    pub fn parse(s: &str) -> Option<VolumeUnit> {
        match s.trim() {
            "µL" | "uL" | "ul" | "µl" => Some(VolumeUnit::Microliter),
            "mL" | "ml" => Some(VolumeUnit::Milliliter),
            _ => None,
        }
    }
}

fn to_microliter(value: f64, unit: VolumeUnit) -> f64 {
    match unit {
        VolumeUnit::Microliter => value,
        VolumeUnit::Milliliter => value * 1000.0,
    }
}

fn from_microliter(value: f64, unit: VolumeUnit) -> f64 {
    match unit {
        VolumeUnit::Microliter => value,
        VolumeUnit::Milliliter => value / 1000.0,
    }
}

/// 체적을 변환한다.
pub fn convert_volume(value: f64, from: VolumeUnit, to: VolumeUnit) -> f64 {
    let ul = to_microliter(value, from);
    from_microliter(ul, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milliliter_to_microliter() {
        assert_eq!(
            convert_volume(2.0, VolumeUnit::Milliliter, VolumeUnit::Microliter),
            2000.0
        );
    }

    #[test]
    fn same_unit_is_identity() {
        assert_eq!(
            convert_volume(123.4, VolumeUnit::Microliter, VolumeUnit::Microliter),
            123.4
        );
    }

    #[test]
    fn parse_accepts_ascii_fallbacks() {
        assert_eq!(VolumeUnit::parse("uL"), Some(VolumeUnit::Microliter));
        assert_eq!(VolumeUnit::parse("ml"), Some(VolumeUnit::Milliliter));
        assert_eq!(VolumeUnit::parse("L"), None);
    }
}
