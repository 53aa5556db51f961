use serde::{Deserialize, Serialize};

use crate::units::{convert_volume, VolumeUnit};

/// 계산 엔진이 받아들이는 로그 싱크. 관측 전용이며 결과에는 영향을 주지 않는다.
pub trait CalcLog {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// 로그를 버리는 싱크. 테스트나 로깅이 필요 없는 호출자용.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl CalcLog for NullLog {
    fn info(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

/// tracing 크레이트로 위임하는 싱크. 바이너리에서 구독자를 초기화해 사용한다.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl CalcLog for TracingLog {
    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }
    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }
    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }
}

/// 입력 생성 시 발생 가능한 검증 오류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// 해당 필드가 0 이하이다.
    NonPositive(&'static str),
    /// 해당 필드가 NaN 또는 무한대이다.
    NotFinite(&'static str),
    /// 샘플 수가 0이다.
    ZeroSamples,
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::NonPositive(field) => {
                write!(f, "field '{field}' must be greater than 0")
            }
            InputError::NotFinite(field) => {
                write!(f, "field '{field}' is not a finite number")
            }
            InputError::ZeroSamples => write!(f, "sample count must be at least 1"),
        }
    }
}

impl std::error::Error for InputError {}

/// 계산 중 발생 가능한 오류. 검증을 우회한 입력만 여기에 도달한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    /// 검증을 거치지 않은 0/음수/비유한 값이 들어왔다.
    InvalidInput(&'static str),
    /// 산술 결과가 유한하지 않다.
    NonFiniteResult,
}

impl std::fmt::Display for CalcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalcError::InvalidInput(field) => {
                write!(f, "calculation error: invalid value for '{field}'")
            }
            CalcError::NonFiniteResult => {
                write!(f, "calculation error: arithmetic produced a non-finite value")
            }
        }
    }
}

impl std::error::Error for CalcError {}

/// 한 번의 계산에 필요한 입력값 전체. 생성 시점에 검증되며 이후 불변이다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixInput {
    /// 배양액에서 원하는 최종 siRNA 농도 Cf [nM]
    pub final_concentration_nm: f64,
    /// 배양액 체적 (선언한 단위 기준)
    pub medium_volume: f64,
    /// 배양액 체적의 단위
    pub medium_volume_unit: VolumeUnit,
    /// 배양액에 넣을 mix의 최종 체적 [µL]
    pub mix_volume_ul: f64,
    /// siRNA 스톡 농도 [nM]
    pub stock_concentration_nm: f64,
    /// 샘플 수
    pub sample_count: u32,
}

impl MixInput {
    /// 모든 수치가 양수이고 유한한지 검증해 입력을 생성한다.
    pub fn new(
        final_concentration_nm: f64,
        medium_volume: f64,
        medium_volume_unit: VolumeUnit,
        mix_volume_ul: f64,
        stock_concentration_nm: f64,
        sample_count: u32,
    ) -> Result<Self, InputError> {
        let fields = [
            (final_concentration_nm, "final siRNA concentration"),
            (medium_volume, "medium volume"),
            (mix_volume_ul, "mix volume"),
            (stock_concentration_nm, "stock concentration"),
        ];
        for (value, name) in fields {
            if !value.is_finite() {
                return Err(InputError::NotFinite(name));
            }
            if value <= 0.0 {
                return Err(InputError::NonPositive(name));
            }
        }
        if sample_count == 0 {
            return Err(InputError::ZeroSamples);
        }
        Ok(Self {
            final_concentration_nm,
            medium_volume,
            medium_volume_unit,
            mix_volume_ul,
            stock_concentration_nm,
            sample_count,
        })
    }

    /// 배양액 체적을 µL 기준으로 환산한다.
    pub fn medium_volume_ul(&self) -> f64 {
        convert_volume(
            self.medium_volume,
            self.medium_volume_unit,
            VolumeUnit::Microliter,
        )
    }
}

/// 성공한 계산의 결과 체적들. 내부에서 반올림하지 않는다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixResult {
    /// mix 내부에 필요한 siRNA 농도 Ci [nM]
    pub mix_concentration_nm: f64,
    /// 샘플당 siRNA 스톡 체적 [µL]
    pub sirna_per_sample_ul: f64,
    /// 샘플당 버퍼 체적 [µL]
    pub buffer_per_sample_ul: f64,
    /// 전체 siRNA 스톡 체적 [µL]
    pub sirna_total_ul: f64,
    /// 전체 버퍼 체적 [µL]
    pub buffer_total_ul: f64,
    /// 전체 mix 체적 [µL]
    pub mix_total_ul: f64,
}

/// 계산의 정상 결과. 실현 불가능은 오류가 아니라 1급 결과이다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MixOutcome {
    Feasible(MixResult),
    /// 스톡 농도가 요구 농도에 미치지 못한다.
    Infeasible {
        required_nm: f64,
        stock_nm: f64,
    },
}

fn guard_positive(value: f64, field: &'static str) -> Result<f64, CalcError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CalcError::InvalidInput(field));
    }
    Ok(value)
}

/// siRNA mix의 체적을 계산한다.
///
/// 단계 순서는 고정이다: 단위 정규화 → Ci 산출 → 실현 가능성 검사 →
/// 샘플당 스톡/버퍼 체적 → 전체 체적. 실현 불가능이면 부분 결과 없이
/// 즉시 `Infeasible`을 돌려준다.
pub fn calculate_mix(input: &MixInput, log: &dyn CalcLog) -> Result<MixOutcome, CalcError> {
    let cf = guard_positive(input.final_concentration_nm, "final siRNA concentration")?;
    guard_positive(input.medium_volume, "medium volume")?;
    let v_mix = guard_positive(input.mix_volume_ul, "mix volume")?;
    let c_stock = guard_positive(input.stock_concentration_nm, "stock concentration")?;
    if input.sample_count == 0 {
        return Err(CalcError::InvalidInput("sample count"));
    }

    let v_medium_ul = input.medium_volume_ul();
    let ci = (cf * v_medium_ul) / v_mix;
    if !ci.is_finite() {
        log.error("mix concentration came out non-finite");
        return Err(CalcError::NonFiniteResult);
    }

    log.info(&format!(
        "mix calculation: Cf={cf} nM, Vmedium={v_medium_ul} µL, Vmix={v_mix} µL, \
         Cstock={c_stock} nM, samples={}, Ci={ci}",
        input.sample_count
    ));

    if ci > c_stock {
        log.warn(&format!(
            "infeasible mix: required {ci:.2} nM exceeds stock {c_stock} nM"
        ));
        return Ok(MixOutcome::Infeasible {
            required_nm: ci,
            stock_nm: c_stock,
        });
    }

    let v_sirna = (ci * v_mix) / c_stock;
    let v_buffer = v_mix - v_sirna;
    let n = f64::from(input.sample_count);
    let result = MixResult {
        mix_concentration_nm: ci,
        sirna_per_sample_ul: v_sirna,
        buffer_per_sample_ul: v_buffer,
        sirna_total_ul: v_sirna * n,
        buffer_total_ul: v_buffer * n,
        mix_total_ul: v_mix * n,
    };
    if !result.sirna_per_sample_ul.is_finite() || !result.buffer_per_sample_ul.is_finite() {
        log.error("per-sample volumes came out non-finite");
        return Err(CalcError::NonFiniteResult);
    }
    Ok(MixOutcome::Feasible(result))
}

/// 계산 과정을 단계별로 서술한 텍스트를 생성한다.
///
/// 교육 목적의 출력이므로 실현 가능성 검사를 건너뛰고 항상 전체 산술을
/// 수행한다. 같은 입력이면 바이트 단위로 동일한 문자열을 돌려준다.
pub fn explain_mix(input: &MixInput) -> String {
    let cf = input.final_concentration_nm;
    let v_medium = input.medium_volume;
    let unit = input.medium_volume_unit.label();
    let v_medium_ul = input.medium_volume_ul();
    let v_mix = input.mix_volume_ul;
    let c_stock = input.stock_concentration_nm;
    let n = input.sample_count;

    let ci = (cf * v_medium_ul) / v_mix;
    let v_sirna = (ci * v_mix) / c_stock;
    let v_buffer = v_mix - v_sirna;
    let nf = f64::from(n);
    let v_sirna_total = v_sirna * nf;
    let v_buffer_total = v_buffer * nf;
    let v_mix_total = v_mix * nf;

    format!(
        "Detailed explanation of the siRNA mix calculation:\n\
         \n\
         Input values:\n\
         - Desired final siRNA concentration (Cf) in the culture: {cf} nM\n\
         - Culture medium volume: {v_medium} {unit} ({v_medium_ul} µL)\n\
         - Final mix volume added to the medium: {v_mix} µL\n\
         - siRNA stock concentration: {c_stock} nM\n\
         - Number of samples: {n}\n\
         \n\
         Equations used:\n\
         1) Required initial concentration in the mix (Ci):\n\
         \x20  Ci = (Cf * Vmedium) / Vmix\n\
         \x20  Ci = ({cf} nM * {v_medium_ul} µL) / {v_mix} µL\n\
         \x20  Ci = {ci:.2} nM\n\
         \n\
         2) Volume of siRNA stock required:\n\
         \x20  VsiRNA = (Ci * Vmix) / Cstock\n\
         \x20  VsiRNA = ({ci:.2} nM * {v_mix} µL) / {c_stock} nM\n\
         \x20  VsiRNA = {v_sirna:.2} µL per sample\n\
         \x20  Total siRNA volume for {n} sample(s): {v_sirna_total:.2} µL\n\
         \n\
         3) Volume of buffer required:\n\
         \x20  Vbuffer = Vmix - VsiRNA\n\
         \x20  Vbuffer = {v_mix} µL - {v_sirna:.2} µL\n\
         \x20  Vbuffer = {v_buffer:.2} µL per sample\n\
         \x20  Total buffer volume for {n} sample(s): {v_buffer_total:.2} µL\n\
         \n\
         4) Total mix volume for {n} sample(s):\n\
         \x20  Vmix_total = {v_mix} µL * {n} = {v_mix_total:.2} µL\n\
         \n\
         Preparation steps:\n\
         1. In a tube, combine {v_sirna_total:.2} µL of siRNA stock solution ({c_stock} nM)\n\
         2. Add {v_buffer_total:.2} µL of buffer\n\
         3. Mix gently by pipetting\n\
         4. Add {v_mix} µL of this mix to each culture medium sample\n\
         \n\
         The final siRNA concentration in each sample will be {cf} nM.\n"
    )
}

/// 히스토리 기록용 타임스탬프 (로컬 시각, `YYYY-MM-DD HH:MM:SS`).
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(
        cf: f64,
        v_medium: f64,
        unit: VolumeUnit,
        v_mix: f64,
        c_stock: f64,
        n: u32,
    ) -> MixInput {
        MixInput::new(cf, v_medium, unit, v_mix, c_stock, n).unwrap()
    }

    fn feasible(input: &MixInput) -> MixResult {
        match calculate_mix(input, &NullLog).unwrap() {
            MixOutcome::Feasible(r) => r,
            MixOutcome::Infeasible { required_nm, .. } => {
                panic!("expected feasible outcome, required {required_nm} nM")
            }
        }
    }

    #[test]
    fn documented_scenario() {
        let r = feasible(&input(1.0, 2000.0, VolumeUnit::Microliter, 200.0, 20000.0, 1));
        assert!((r.mix_concentration_nm - 10.0).abs() < 1e-12);
        assert!((r.sirna_per_sample_ul - 0.1).abs() < 1e-12);
        assert!((r.buffer_per_sample_ul - 199.9).abs() < 1e-12);
        assert_eq!(r.sirna_total_ul, r.sirna_per_sample_ul);
        assert_eq!(r.buffer_total_ul, r.buffer_per_sample_ul);
        assert_eq!(r.mix_total_ul, 200.0);
    }

    #[test]
    fn infeasible_scenario_reports_both_concentrations() {
        let inp = input(100.0, 2000.0, VolumeUnit::Microliter, 10.0, 1000.0, 1);
        match calculate_mix(&inp, &NullLog).unwrap() {
            MixOutcome::Infeasible {
                required_nm,
                stock_nm,
            } => {
                assert!((required_nm - 20000.0).abs() < 1e-9);
                assert_eq!(stock_nm, 1000.0);
            }
            MixOutcome::Feasible(_) => panic!("expected infeasible outcome"),
        }
    }

    #[test]
    fn boundary_ci_equal_to_stock_uses_no_buffer() {
        // Ci = (10 * 1000) / 100 = 100 nM == stock
        let r = feasible(&input(10.0, 1000.0, VolumeUnit::Microliter, 100.0, 100.0, 1));
        assert_eq!(r.mix_concentration_nm, 100.0);
        assert_eq!(r.sirna_per_sample_ul, 100.0);
        assert_eq!(r.buffer_per_sample_ul, 0.0);
    }

    #[test]
    fn larger_mix_volume_lowers_required_concentration() {
        let small = feasible(&input(1.0, 2000.0, VolumeUnit::Microliter, 100.0, 20000.0, 1));
        let large = feasible(&input(1.0, 2000.0, VolumeUnit::Microliter, 400.0, 20000.0, 1));
        assert!(large.mix_concentration_nm < small.mix_concentration_nm);
        // 같은 siRNA 양이 더 큰 체적에 퍼지므로 샘플당 스톡 체적은 변하지 않는다:
        // VsiRNA = Cf*Vmedium/Cstock. 버퍼만 늘어난다.
        assert!(large.buffer_per_sample_ul > small.buffer_per_sample_ul);
    }

    #[test]
    fn volumes_conserve_mix_volume() {
        let cases = [
            input(1.0, 2000.0, VolumeUnit::Microliter, 200.0, 20000.0, 3),
            input(5.5, 1.5, VolumeUnit::Milliliter, 80.0, 50000.0, 12),
            input(0.25, 750.0, VolumeUnit::Microliter, 33.0, 10000.0, 96),
        ];
        for inp in cases {
            let r = feasible(&inp);
            let sum = r.sirna_per_sample_ul + r.buffer_per_sample_ul;
            assert!(
                (sum - inp.mix_volume_ul).abs() < 1e-9,
                "sum {sum} != mix volume {}",
                inp.mix_volume_ul
            );
        }
    }

    #[test]
    fn totals_scale_with_sample_count() {
        let inp = input(2.0, 1500.0, VolumeUnit::Microliter, 150.0, 30000.0, 7);
        let r = feasible(&inp);
        assert!((r.sirna_total_ul - r.sirna_per_sample_ul * 7.0).abs() < 1e-12);
        assert!((r.buffer_total_ul - r.buffer_per_sample_ul * 7.0).abs() < 1e-12);
        assert!((r.mix_total_ul - 150.0 * 7.0).abs() < 1e-12);
    }

    #[test]
    fn milliliter_input_matches_microliter_equivalent() {
        let in_ml = input(1.0, 2.0, VolumeUnit::Milliliter, 200.0, 20000.0, 4);
        let in_ul = input(1.0, 2000.0, VolumeUnit::Microliter, 200.0, 20000.0, 4);
        assert_eq!(feasible(&in_ml), feasible(&in_ul));
    }

    #[test]
    fn construction_rejects_bad_values() {
        let err = MixInput::new(0.0, 2000.0, VolumeUnit::Microliter, 200.0, 20000.0, 1)
            .unwrap_err();
        assert_eq!(err, InputError::NonPositive("final siRNA concentration"));
        let err = MixInput::new(1.0, -5.0, VolumeUnit::Microliter, 200.0, 20000.0, 1)
            .unwrap_err();
        assert_eq!(err, InputError::NonPositive("medium volume"));
        let err = MixInput::new(1.0, 2000.0, VolumeUnit::Microliter, f64::NAN, 20000.0, 1)
            .unwrap_err();
        assert_eq!(err, InputError::NotFinite("mix volume"));
        let err = MixInput::new(1.0, 2000.0, VolumeUnit::Microliter, 200.0, 20000.0, 0)
            .unwrap_err();
        assert_eq!(err, InputError::ZeroSamples);
    }

    #[test]
    fn bypassed_validation_yields_calc_error_not_nan() {
        // 생성자를 우회한 입력은 0으로 나누는 대신 오류로 보고되어야 한다.
        let inp = MixInput {
            final_concentration_nm: 1.0,
            medium_volume: 2000.0,
            medium_volume_unit: VolumeUnit::Microliter,
            mix_volume_ul: 0.0,
            stock_concentration_nm: 20000.0,
            sample_count: 1,
        };
        assert_eq!(
            calculate_mix(&inp, &NullLog),
            Err(CalcError::InvalidInput("mix volume"))
        );
    }

    #[test]
    fn explanation_is_deterministic_and_substitutes_values() {
        let inp = input(1.0, 2000.0, VolumeUnit::Microliter, 200.0, 20000.0, 1);
        let a = explain_mix(&inp);
        let b = explain_mix(&inp);
        assert_eq!(a, b);
        assert!(a.contains("Ci = (1 nM * 2000 µL) / 200 µL"));
        assert!(a.contains("Ci = 10.00 nM"));
        assert!(a.contains("VsiRNA = 0.10 µL per sample"));
        assert!(a.contains("Vbuffer = 199.90 µL per sample"));
        assert!(a.contains("The final siRNA concentration in each sample will be 1 nM."));
    }

    #[test]
    fn explanation_runs_even_for_infeasible_inputs() {
        // 실현 불가능한 입력도 설명은 전체 산술을 보여준다.
        let inp = input(100.0, 2000.0, VolumeUnit::Microliter, 10.0, 1000.0, 1);
        let text = explain_mix(&inp);
        assert!(text.contains("Ci = 20000.00 nM"));
        // VsiRNA = (20000 * 10) / 1000 = 200 µL > Vmix, 버퍼는 음수로 표기된다.
        assert!(text.contains("VsiRNA = 200.00 µL per sample"));
        assert!(text.contains("Vbuffer = -190.00 µL per sample"));
    }

    #[test]
    fn explanation_shows_raw_and_normalized_medium_volume() {
        let inp = input(1.0, 2.0, VolumeUnit::Milliliter, 200.0, 20000.0, 1);
        let text = explain_mix(&inp);
        assert!(text.contains("Culture medium volume: 2 mL (2000 µL)"));
    }

    #[test]
    fn timestamp_has_expected_shape() {
        let ts = timestamp_now();
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
        assert_eq!(&ts[13..14], ":");
    }
}
