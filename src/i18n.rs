use std::collections::HashMap;
use std::fs;
use std::path::Path;
use sys_locale::get_locale;

/// 문자열 키를 모아두는 네임스페이스.
pub mod keys {
    pub const ERROR_PREFIX: &str = "general.error_prefix";
    pub const APP_EXIT: &str = "general.app_exit";

    pub const MAIN_MENU_TITLE: &str = "main_menu.title";
    pub const MAIN_MENU_CALCULATE: &str = "main_menu.calculate";
    pub const MAIN_MENU_EXPLAIN: &str = "main_menu.explain";
    pub const MAIN_MENU_HISTORY: &str = "main_menu.history";
    pub const MAIN_MENU_SETTINGS: &str = "main_menu.settings";
    pub const MAIN_MENU_EXIT: &str = "main_menu.exit";
    pub const PROMPT_MENU_SELECT: &str = "prompt.menu_select";
    pub const INVALID_SELECTION_RETRY: &str = "error.invalid_selection_retry";

    pub const CALC_HEADING: &str = "calc.heading";
    pub const PROMPT_FINAL_CONCENTRATION: &str = "prompt.final_concentration";
    pub const PROMPT_MEDIUM_VOLUME: &str = "prompt.medium_volume";
    pub const PROMPT_VOLUME_UNIT: &str = "prompt.volume_unit";
    pub const PROMPT_MIX_VOLUME: &str = "prompt.mix_volume";
    pub const PROMPT_STOCK_CONCENTRATION: &str = "prompt.stock_concentration";
    pub const PROMPT_SAMPLE_COUNT: &str = "prompt.sample_count";

    pub const FIELD_FINAL_CONCENTRATION: &str = "field.final_concentration";
    pub const FIELD_MEDIUM_VOLUME: &str = "field.medium_volume";
    pub const FIELD_MIX_VOLUME: &str = "field.mix_volume";
    pub const FIELD_STOCK_CONCENTRATION: &str = "field.stock_concentration";
    pub const FIELD_SAMPLE_COUNT: &str = "field.sample_count";

    pub const VALIDATION_EMPTY: &str = "validation.empty";
    pub const VALIDATION_NOT_NUMBER: &str = "validation.not_number";
    pub const VALIDATION_NOT_POSITIVE: &str = "validation.not_positive";
    pub const VALIDATION_NOT_INTEGER: &str = "validation.not_integer";

    pub const RESULT_MIX_CONCENTRATION: &str = "result.mix_concentration";
    pub const RESULT_INFEASIBLE: &str = "result.infeasible";
    pub const RESULT_CALC_ERROR_PREFIX: &str = "result.calc_error_prefix";

    pub const TABLE_COMPONENT: &str = "table.component";
    pub const TABLE_PER_SAMPLE: &str = "table.per_sample";
    pub const TABLE_TOTAL: &str = "table.total";
    pub const TABLE_ROW_SIRNA: &str = "table.row_sirna";
    pub const TABLE_ROW_BUFFER: &str = "table.row_buffer";
    pub const TABLE_ROW_MIX: &str = "table.row_mix";

    pub const EXPLAIN_HEADING: &str = "explain.heading";

    pub const HISTORY_HEADING: &str = "history.heading";
    pub const HISTORY_EMPTY: &str = "history.empty";
    pub const HISTORY_PROMPT_LOAD: &str = "history.prompt_load";
    pub const HISTORY_LOADED: &str = "history.loaded";

    pub const SETTINGS_HEADING: &str = "settings.heading";
    pub const SETTINGS_CURRENT_LANGUAGE: &str = "settings.current_language";
    pub const SETTINGS_PROMPT_LANGUAGE: &str = "settings.prompt_language";
    pub const SETTINGS_CURRENT_UNIT: &str = "settings.current_unit";
    pub const SETTINGS_PROMPT_UNIT: &str = "settings.prompt_unit";
    pub const SETTINGS_SAVED: &str = "settings.saved";
    pub const SETTINGS_INVALID: &str = "settings.invalid";

    pub const ERROR_INVALID_NUMBER: &str = "error.invalid_number";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En,
    Fr,
}

impl Language {
    fn from_code(code: &str) -> Self {
        let c = code.to_lowercase();
        if c.starts_with("fr") {
            Language::Fr
        } else {
            Language::En
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
        }
    }
}

/// 런타임 언어 번들을 제공한다.
#[derive(Debug, Clone)]
pub struct Translator {
    lang: Language,
    overrides: Option<HashMap<String, String>>,
}

impl Translator {
    /// 언어 코드(en/fr)에 따라 번역기를 생성한다. 알 수 없는 코드는 en으로 폴백한다.
    pub fn new(lang_code: &str) -> Self {
        Self {
            lang: Language::from_code(lang_code),
            overrides: None,
        }
    }

    /// 언어 코드 + 언어팩 디렉터리(locales/ 등)를 받아서 번역기를 생성한다.
    /// 디렉터리가 없거나 파일이 없으면 내장 문자열만 사용한다.
    pub fn new_with_pack(lang_code: &str, pack_dir: Option<&str>) -> Self {
        let overrides = pack_dir
            .and_then(|dir| load_overrides(dir, lang_code))
            .or_else(|| load_overrides("locales", lang_code))
            .or_else(|| built_in_pack(lang_code));
        Self {
            lang: Language::from_code(lang_code),
            overrides,
        }
    }

    pub fn language(&self) -> Language {
        self.lang
    }

    pub fn language_code(&self) -> &'static str {
        self.lang.as_code()
    }

    /// 키를 조회해 문자열을 반환한다. 언어팩에 없으면 None.
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.overrides.as_ref().and_then(|m| m.get(key).cloned())
    }

    /// 번역을 가져온다. 프랑스어 번역이 없으면 영어 문자열을 폴백하고,
    /// 둘 다 없으면 키 자체를 돌려준다.
    pub fn t(&self, key: &str) -> &'static str {
        if let Some(ref map) = self.overrides {
            if let Some(v) = map.get(key) {
                return Box::leak(v.clone().into_boxed_str());
            }
        }
        let built_in = match self.lang {
            Language::Fr => fr(key).or_else(|| en(key)),
            Language::En => en(key),
        };
        built_in.unwrap_or_else(|| Box::leak(key.to_owned().into_boxed_str()))
    }
}

/// CLI 플래그/설정/시스템 순으로 언어 코드를 결정한다.
pub fn resolve_language(cli_arg: &str, config_lang: Option<&str>) -> String {
    normalize_lang(cli_arg)
        .or_else(|| config_lang.and_then(normalize_lang))
        .or_else(detect_system_language)
        .unwrap_or_else(|| "en".to_string())
}

fn normalize_lang(code: &str) -> Option<String> {
    let c = code.trim().to_lowercase();
    match c.as_str() {
        "en" | "en-us" | "en-uk" => Some("en".into()),
        "fr" | "fr-fr" | "fr-ca" => Some("fr".into()),
        "auto" | "" => None,
        other if other.starts_with("en") => Some("en".into()),
        other if other.starts_with("fr") => Some("fr".into()),
        _ => None,
    }
}

fn normalize_locale_string(loc: &str) -> Option<String> {
    let lang = loc
        .split(['.', '_', '-'])
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match lang.as_str() {
        "en" => Some("en".into()),
        "fr" => Some("fr".into()),
        _ => None,
    }
}

/// 시스템 로케일에서 언어를 추정한다.
pub fn detect_system_language() -> Option<String> {
    if let Some(loc) = get_locale() {
        if let Some(lang) = normalize_locale_string(&loc) {
            return Some(lang);
        }
    }
    if let Ok(lang) = std::env::var("LANG") {
        if let Some(code) = normalize_locale_string(&lang) {
            return Some(code);
        }
    }
    if let Ok(lang) = std::env::var("LC_ALL") {
        if let Some(code) = normalize_locale_string(&lang) {
            return Some(code);
        }
    }
    None
}

/// TOML 기반 언어팩을 로드한다. 형식: key = "value" 로 구성된 중첩 맵.
fn load_overrides(dir: &str, lang: &str) -> Option<HashMap<String, String>> {
    let try_load = |code: &str| -> Option<HashMap<String, String>> {
        let path = Path::new(dir).join(format!("{code}.toml"));
        let content = fs::read_to_string(path).ok()?;
        parse_toml_to_map(&content)
    };

    if let Some(map) = try_load(lang) {
        return Some(map);
    }
    if let Some((base, _)) = lang.split_once(['-', '_']) {
        if let Some(map) = try_load(base) {
            return Some(map);
        }
    }
    None
}

fn parse_toml_to_map(src: &str) -> Option<HashMap<String, String>> {
    let value: toml::Value = toml::from_str(src).ok()?;
    let table = value.as_table()?;
    let mut map = HashMap::new();

    fn walk(prefix: &str, val: &toml::Value, out: &mut HashMap<String, String>) {
        match val {
            toml::Value::String(s) => {
                out.insert(prefix.to_string(), s.to_string());
            }
            toml::Value::Table(t) => {
                for (k, v) in t {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    walk(&key, v, out);
                }
            }
            _ => {}
        }
    }

    for (k, v) in table {
        walk(k, v, &mut map);
    }

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

/// 내장 언어팩(파일이 없어도 동작하도록 빌드 시 포함).
fn built_in_pack(lang: &str) -> Option<HashMap<String, String>> {
    match lang.to_lowercase().as_str() {
        "fr" | "fr-fr" | "fr-ca" => parse_toml_to_map(include_str!("../locales/fr.toml")),
        _ => None,
    }
}

fn en(key: &str) -> Option<&'static str> {
    use keys::*;
    let s = match key {
        ERROR_PREFIX => "Error",
        APP_EXIT => "Exiting.",
        MAIN_MENU_TITLE => "\n=== siRNA Mix Calculator ===",
        MAIN_MENU_CALCULATE => "1) Calculate a mix",
        MAIN_MENU_EXPLAIN => "2) Explain the calculation",
        MAIN_MENU_HISTORY => "3) Calculation history",
        MAIN_MENU_SETTINGS => "4) Settings",
        MAIN_MENU_EXIT => "0) Exit",
        PROMPT_MENU_SELECT => "Select: ",
        INVALID_SELECTION_RETRY => "Invalid selection, try again.",
        CALC_HEADING => "\n-- Dilution parameters --",
        PROMPT_FINAL_CONCENTRATION => "Desired final siRNA concentration Cf [nM]: ",
        PROMPT_MEDIUM_VOLUME => "Culture medium volume: ",
        PROMPT_VOLUME_UNIT => "Volume unit (1=µL, 2=mL): ",
        PROMPT_MIX_VOLUME => "Final mix volume added to the medium [µL]: ",
        PROMPT_STOCK_CONCENTRATION => "siRNA stock concentration [nM]: ",
        PROMPT_SAMPLE_COUNT => "Number of samples: ",
        FIELD_FINAL_CONCENTRATION => "Desired final siRNA concentration (nM)",
        FIELD_MEDIUM_VOLUME => "Culture medium volume",
        FIELD_MIX_VOLUME => "Final mix volume (µL)",
        FIELD_STOCK_CONCENTRATION => "siRNA stock concentration (nM)",
        FIELD_SAMPLE_COUNT => "Number of samples",
        VALIDATION_EMPTY => "Error: field '{field}' is empty.",
        VALIDATION_NOT_NUMBER => "Error: field '{field}' is not a valid number.",
        VALIDATION_NOT_POSITIVE => "Error: field '{field}' must be greater than 0.",
        VALIDATION_NOT_INTEGER => "Error: field '{field}' must be a whole number.",
        RESULT_MIX_CONCENTRATION => "siRNA concentration in the mix: {ci} nM",
        RESULT_INFEASIBLE => {
            "The required mix concentration ({required} nM) exceeds the stock \
             concentration ({stock} nM). Increase the mix volume or decrease \
             the desired final concentration."
        }
        RESULT_CALC_ERROR_PREFIX => "Calculation error",
        TABLE_COMPONENT => "Component",
        TABLE_PER_SAMPLE => "Volume per sample (µL)",
        TABLE_TOTAL => "Total volume (µL)",
        TABLE_ROW_SIRNA => "siRNA",
        TABLE_ROW_BUFFER => "Buffer",
        TABLE_ROW_MIX => "Total mix",
        EXPLAIN_HEADING => "\n-- Calculation explanation --",
        HISTORY_HEADING => "\n-- Calculation history --",
        HISTORY_EMPTY => "No calculations recorded in this session.",
        HISTORY_PROMPT_LOAD => "Entry number to reload (Enter to cancel): ",
        HISTORY_LOADED => "Loaded parameters from history entry:",
        SETTINGS_HEADING => "\n-- Settings --",
        SETTINGS_CURRENT_LANGUAGE => "Current language:",
        SETTINGS_PROMPT_LANGUAGE => "Language (1=English, 2=Français, Enter to keep): ",
        SETTINGS_CURRENT_UNIT => "Default medium volume unit:",
        SETTINGS_PROMPT_UNIT => "Default unit (1=µL, 2=mL, Enter to keep): ",
        SETTINGS_SAVED => "Settings saved.",
        SETTINGS_INVALID => "Invalid input, nothing changed.",
        ERROR_INVALID_NUMBER => "Please enter a number.",
        _ => return None,
    };
    Some(s)
}

fn fr(key: &str) -> Option<&'static str> {
    use keys::*;
    let s = match key {
        ERROR_PREFIX => "Erreur",
        APP_EXIT => "Fermeture de l'application.",
        MAIN_MENU_TITLE => "\n=== Calculateur de mix siRNA ===",
        MAIN_MENU_CALCULATE => "1) Calculer un mix",
        MAIN_MENU_EXPLAIN => "2) Expliquer le calcul",
        MAIN_MENU_HISTORY => "3) Historique des calculs",
        MAIN_MENU_SETTINGS => "4) Paramètres",
        MAIN_MENU_EXIT => "0) Quitter",
        PROMPT_MENU_SELECT => "Choix : ",
        INVALID_SELECTION_RETRY => "Sélection invalide, réessayez.",
        CALC_HEADING => "\n-- Paramètres de dilution --",
        PROMPT_FINAL_CONCENTRATION => "Cf de siRNA désirée [nM] : ",
        PROMPT_MEDIUM_VOLUME => "Volume du milieu de culture : ",
        PROMPT_VOLUME_UNIT => "Unité de volume (1=µL, 2=mL) : ",
        PROMPT_MIX_VOLUME => "Volume final du mix à mettre dans le milieu [µL] : ",
        PROMPT_STOCK_CONCENTRATION => "Concentration du stock de siRNA [nM] : ",
        PROMPT_SAMPLE_COUNT => "Nombre d'échantillon(s) : ",
        FIELD_FINAL_CONCENTRATION => "Cf de siRNA désiré (nM)",
        FIELD_MEDIUM_VOLUME => "Volume du milieu",
        FIELD_MIX_VOLUME => "Volume final du mix (µL)",
        FIELD_STOCK_CONCENTRATION => "Concentration du stock de siRNA (nM)",
        FIELD_SAMPLE_COUNT => "Nombre d'échantillon(s)",
        VALIDATION_EMPTY => "Erreur : le champ '{field}' est vide.",
        VALIDATION_NOT_NUMBER => "Erreur : le champ '{field}' n'est pas un nombre valide.",
        VALIDATION_NOT_POSITIVE => "Erreur : le champ '{field}' doit être supérieur à 0.",
        VALIDATION_NOT_INTEGER => "Erreur : le champ '{field}' doit être un nombre entier.",
        RESULT_MIX_CONCENTRATION => "Concentration en siRNA dans le mix : {ci} nM",
        RESULT_INFEASIBLE => {
            "La concentration requise dans le mix ({required} nM) est supérieure \
             à la concentration stock ({stock} nM). Augmentez le volume du mix ou \
             diminuez la concentration finale désirée."
        }
        RESULT_CALC_ERROR_PREFIX => "Erreur de calcul",
        TABLE_COMPONENT => "Composant",
        TABLE_PER_SAMPLE => "Volume par échantillon (µL)",
        TABLE_TOTAL => "Volume total (µL)",
        TABLE_ROW_SIRNA => "siRNA",
        TABLE_ROW_BUFFER => "Tampon",
        TABLE_ROW_MIX => "Mix total",
        EXPLAIN_HEADING => "\n-- Explication du calcul --",
        HISTORY_HEADING => "\n-- Historique des calculs --",
        HISTORY_EMPTY => "Aucun calcul enregistré dans cette session.",
        HISTORY_PROMPT_LOAD => "Numéro de l'entrée à recharger (Entrée pour annuler) : ",
        HISTORY_LOADED => "Paramètres chargés depuis l'historique :",
        SETTINGS_HEADING => "\n-- Paramètres --",
        SETTINGS_CURRENT_LANGUAGE => "Langue actuelle :",
        SETTINGS_PROMPT_LANGUAGE => "Langue (1=English, 2=Français, Entrée pour garder) : ",
        SETTINGS_CURRENT_UNIT => "Unité par défaut du volume du milieu :",
        SETTINGS_PROMPT_UNIT => "Unité par défaut (1=µL, 2=mL, Entrée pour garder) : ",
        SETTINGS_SAVED => "Paramètres enregistrés.",
        SETTINGS_INVALID => "Entrée invalide, rien n'a été modifié.",
        ERROR_INVALID_NUMBER => "Veuillez entrer un nombre.",
        _ => return None,
    };
    Some(s)
}

/// `{name}` 플레이스홀더를 치환한다.
pub fn fill_template(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (k, v) in vars {
        out = out.replace(&format!("{{{k}}}"), v);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn french_falls_back_to_english_for_missing_keys() {
        let tr = Translator::new("fr");
        assert_eq!(tr.t(keys::TABLE_ROW_BUFFER), "Tampon");
        assert_eq!(tr.t("no.such.key"), "no.such.key");
    }

    #[test]
    fn unknown_language_defaults_to_english() {
        let tr = Translator::new("de");
        assert_eq!(tr.language(), Language::En);
    }

    #[test]
    fn resolve_prefers_cli_then_config() {
        assert_eq!(resolve_language("fr", Some("en")), "fr");
        assert_eq!(resolve_language("auto", Some("fr-FR")), "fr");
    }

    #[test]
    fn infeasible_template_fills_both_values() {
        let tr = Translator::new("en");
        let msg = fill_template(
            tr.t(keys::RESULT_INFEASIBLE),
            &[
                ("required", "20000.00".to_string()),
                ("stock", "1000".to_string()),
            ],
        );
        assert!(msg.contains("(20000.00 nM)"));
        assert!(msg.contains("(1000 nM)"));
    }

    #[test]
    fn built_in_french_pack_parses() {
        let map = built_in_pack("fr").expect("embedded french pack");
        assert!(map.contains_key("gui.app_title"));
    }
}
