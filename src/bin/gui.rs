#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! eframe/egui 기반 데스크톱 GUI 진입점.

use eframe::{egui, App, Frame};
use image::GenericImageView;
use rfd::FileDialog;
use std::{env, fs, path::Path};

use sirna_mix_calculator::{
    calculation::{calculate_mix, explain_mix, timestamp_now, MixInput, MixOutcome, TracingLog},
    config,
    i18n::{self, fill_template},
    storage::{self, HistoryEntry},
    units::{self, VolumeUnit},
};

fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // CLI 언어 옵션 처리: --lang xx 또는 --lang=xx (xx: auto/en/fr)
    let mut cli_lang: Option<String> = None;
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        let a = &args[i];
        if let Some(val) = a.strip_prefix("--lang=") {
            cli_lang = Some(val.to_string());
        } else if a == "--lang" || a == "-L" {
            if i + 1 < args.len() {
                cli_lang = Some(args[i + 1].clone());
                i += 1;
            }
        }
        i += 1;
    }

    let icon_data = load_app_icon();
    let mut viewport = egui::ViewportBuilder::default().with_inner_size(egui::vec2(980.0, 640.0));
    if let Some(icon) = icon_data {
        viewport = viewport.with_icon(icon);
    }
    let native = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    let mut app_cfg = config::load_or_default().unwrap_or_default();
    if let Some(lang_cli) = cli_lang {
        app_cfg.language = i18n::resolve_language(&lang_cli, Some(app_cfg.language.as_str()));
    }
    eframe::run_native(
        "siRNA Mix Calculator",
        native,
        Box::new(move |_cc| Box::new(GuiApp::new(app_cfg.clone()))),
    )
}

fn load_app_icon() -> Option<egui::IconData> {
    let search = ["sirna_mix.png", "icon.png", "assets/icon.png"];
    let path = search.iter().find(|p| Path::new(*p).exists())?;
    let bytes = fs::read(path).ok()?;
    let img = image::load_from_memory(&bytes).ok()?;
    let rgba = img.to_rgba8();
    let (w, h) = img.dimensions();
    Some(egui::IconData {
        rgba: rgba.into_raw(),
        width: w,
        height: h,
    })
}

/// 폼 검증 실패를 표현한다. 어떤 필드가 어떤 이유로 거부됐는지 담는다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormError {
    Empty(FormField),
    NotNumber(FormField),
    NotPositive(FormField),
    NotInteger(FormField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    FinalConcentration,
    MediumVolume,
    MixVolume,
    StockConcentration,
    SampleCount,
}

impl FormField {
    fn key(&self) -> &'static str {
        match self {
            FormField::FinalConcentration => "gui.field.cf",
            FormField::MediumVolume => "gui.field.medium_volume",
            FormField::MixVolume => "gui.field.mix_volume",
            FormField::StockConcentration => "gui.field.stock",
            FormField::SampleCount => "gui.field.samples",
        }
    }

    fn default_label(&self) -> &'static str {
        match self {
            FormField::FinalConcentration => "Desired final siRNA concentration (nM)",
            FormField::MediumVolume => "Culture medium volume",
            FormField::MixVolume => "Final mix volume (µL)",
            FormField::StockConcentration => "siRNA stock concentration (nM)",
            FormField::SampleCount => "Number of samples",
        }
    }
}

fn parse_positive(text: &str, field: FormField) -> Result<f64, FormError> {
    let s = text.trim();
    if s.is_empty() {
        return Err(FormError::Empty(field));
    }
    let v: f64 = s.parse().map_err(|_| FormError::NotNumber(field))?;
    if !v.is_finite() || v <= 0.0 {
        return Err(FormError::NotPositive(field));
    }
    Ok(v)
}

fn parse_sample_count(text: &str) -> Result<u32, FormError> {
    let field = FormField::SampleCount;
    let s = text.trim();
    if s.is_empty() {
        return Err(FormError::Empty(field));
    }
    if s.parse::<f64>().is_ok() && s.parse::<u32>().is_err() {
        return Err(FormError::NotInteger(field));
    }
    let v: u32 = s.parse().map_err(|_| FormError::NotNumber(field))?;
    if v == 0 {
        return Err(FormError::NotPositive(field));
    }
    Ok(v)
}

/// 결과 테이블 한 줄: 구성 요소 이름 키, 샘플당 체적, 전체 체적.
#[derive(Debug, Clone, PartialEq)]
struct ResultRow {
    label_key: &'static str,
    label_default: &'static str,
    per_sample_ul: f64,
    total_ul: f64,
}

struct GuiApp {
    config: config::Config,
    tr: i18n::Translator,
    lang_input: String,
    // 입력 폼
    cf_text: String,
    medium_volume_text: String,
    medium_unit: VolumeUnit,
    last_unit: VolumeUnit,
    mix_volume_text: String,
    stock_text: String,
    samples_text: String,
    // 결과
    ci_label: Option<String>,
    result_rows: Vec<ResultRow>,
    error_text: Option<String>,
    // 설명 창
    explanation: Option<String>,
    show_explanation: bool,
    // 히스토리
    history: Vec<HistoryEntry>,
    // 설정/상태
    show_settings_modal: bool,
    status_line: Option<String>,
}

impl GuiApp {
    fn new(config: config::Config) -> Self {
        let lang = i18n::resolve_language(&config.language, None);
        let tr = i18n::Translator::new_with_pack(&lang, None);
        Self {
            lang_input: config.language.clone(),
            medium_unit: config.default_volume_unit,
            last_unit: config.default_volume_unit,
            config,
            tr,
            cf_text: "1".into(),
            medium_volume_text: "2000".into(),
            mix_volume_text: "200".into(),
            stock_text: "20000".into(),
            samples_text: "1".into(),
            ci_label: None,
            result_rows: Vec::new(),
            error_text: None,
            explanation: None,
            show_explanation: false,
            history: Vec::new(),
            show_settings_modal: false,
            status_line: None,
        }
    }

    fn text(&self, key: &str, default: &str) -> String {
        self.tr
            .lookup(key)
            .unwrap_or_else(|| default.to_string())
    }

    fn form_error_text(&self, err: FormError) -> String {
        let (tpl_key, tpl_default, field) = match err {
            FormError::Empty(f) => (
                "gui.validation.empty",
                "Error: field '{field}' is empty.",
                f,
            ),
            FormError::NotNumber(f) => (
                "gui.validation.not_number",
                "Error: field '{field}' is not a valid number.",
                f,
            ),
            FormError::NotPositive(f) => (
                "gui.validation.not_positive",
                "Error: field '{field}' must be greater than 0.",
                f,
            ),
            FormError::NotInteger(f) => (
                "gui.validation.not_integer",
                "Error: field '{field}' must be a whole number.",
                f,
            ),
        };
        fill_template(
            &self.text(tpl_key, tpl_default),
            &[("field", self.text(field.key(), field.default_label()))],
        )
    }

    /// 폼 텍스트를 검증해 MixInput으로 만든다.
    fn parse_form(&self) -> Result<MixInput, FormError> {
        let cf = parse_positive(&self.cf_text, FormField::FinalConcentration)?;
        let medium = parse_positive(&self.medium_volume_text, FormField::MediumVolume)?;
        let mix = parse_positive(&self.mix_volume_text, FormField::MixVolume)?;
        let stock = parse_positive(&self.stock_text, FormField::StockConcentration)?;
        let samples = parse_sample_count(&self.samples_text)?;
        // parse_* 가 이미 제약을 검사했으므로 생성자는 실패하지 않는다.
        MixInput::new(cf, medium, self.medium_unit, mix, stock, samples)
            .map_err(|_| FormError::NotPositive(FormField::FinalConcentration))
    }

    /// 단위 콤보 변경 시 표시 중인 배양액 체적을 새 단위로 환산한다.
    fn apply_unit_change(&mut self) {
        if self.medium_unit == self.last_unit {
            return;
        }
        if let Ok(value) = self.medium_volume_text.trim().parse::<f64>() {
            let converted = units::convert_volume(value, self.last_unit, self.medium_unit);
            self.medium_volume_text = format!("{converted}");
        }
        self.last_unit = self.medium_unit;
    }

    fn set_form_from_input(&mut self, input: &MixInput) {
        self.cf_text = format!("{}", input.final_concentration_nm);
        self.medium_volume_text = format!("{}", input.medium_volume);
        self.medium_unit = input.medium_volume_unit;
        self.last_unit = input.medium_volume_unit;
        self.mix_volume_text = format!("{}", input.mix_volume_ul);
        self.stock_text = format!("{}", input.stock_concentration_nm);
        self.samples_text = format!("{}", input.sample_count);
    }

    fn push_history(&mut self, input: MixInput) {
        self.history.push(HistoryEntry {
            timestamp: timestamp_now(),
            input,
        });
    }

    fn run_calculation(&mut self) {
        self.ci_label = None;
        self.result_rows.clear();
        self.error_text = None;
        let input = match self.parse_form() {
            Ok(input) => input,
            Err(err) => {
                self.error_text = Some(self.form_error_text(err));
                return;
            }
        };
        self.push_history(input);
        match calculate_mix(&input, &TracingLog) {
            Ok(MixOutcome::Feasible(result)) => {
                self.ci_label = Some(fill_template(
                    &self.text(
                        "gui.result.ci",
                        "siRNA concentration in the mix: {ci} nM",
                    ),
                    &[("ci", format!("{:.2}", result.mix_concentration_nm))],
                ));
                self.result_rows = vec![
                    ResultRow {
                        label_key: "gui.table.row_sirna",
                        label_default: "siRNA",
                        per_sample_ul: result.sirna_per_sample_ul,
                        total_ul: result.sirna_total_ul,
                    },
                    ResultRow {
                        label_key: "gui.table.row_buffer",
                        label_default: "Buffer",
                        per_sample_ul: result.buffer_per_sample_ul,
                        total_ul: result.buffer_total_ul,
                    },
                    ResultRow {
                        label_key: "gui.table.row_mix",
                        label_default: "Total mix",
                        per_sample_ul: input.mix_volume_ul,
                        total_ul: result.mix_total_ul,
                    },
                ];
            }
            Ok(MixOutcome::Infeasible {
                required_nm,
                stock_nm,
            }) => {
                self.error_text = Some(fill_template(
                    &self.text(
                        "gui.result.infeasible",
                        "The required mix concentration ({required} nM) exceeds the stock \
                         concentration ({stock} nM). Increase the mix volume or decrease the \
                         desired final concentration.",
                    ),
                    &[
                        ("required", format!("{required_nm:.2}")),
                        ("stock", format!("{stock_nm}")),
                    ],
                ));
            }
            Err(e) => {
                self.error_text = Some(fill_template(
                    &self.text("gui.result.calc_error", "Calculation error: {message}"),
                    &[("message", e.to_string())],
                ));
            }
        }
    }

    fn run_explanation(&mut self) {
        match self.parse_form() {
            Ok(input) => {
                self.explanation = Some(explain_mix(&input));
                self.show_explanation = true;
                self.error_text = None;
            }
            Err(err) => {
                self.error_text = Some(self.form_error_text(err));
            }
        }
    }

    fn table_as_clipboard_text(&self) -> String {
        let mut lines = vec![format!(
            "{}\t{}\t{}",
            self.text("gui.table.component", "Component"),
            self.text("gui.table.per_sample", "Volume per sample (µL)"),
            self.text("gui.table.total", "Total volume (µL)"),
        )];
        for row in &self.result_rows {
            lines.push(format!(
                "{}\t{:.2}\t{:.2}",
                self.text(row.label_key, row.label_default),
                row.per_sample_ul,
                row.total_ul
            ));
        }
        lines.join("\n")
    }

    fn save_params_dialog(&mut self) {
        let input = match self.parse_form() {
            Ok(input) => input,
            Err(err) => {
                self.error_text = Some(self.form_error_text(err));
                return;
            }
        };
        if let Some(path) = FileDialog::new()
            .add_filter("TOML", &["toml"])
            .set_file_name("sirna_mix_params.toml")
            .save_file()
        {
            self.status_line = Some(match storage::save_input_preset(&path, &input) {
                Ok(()) => fill_template(
                    &self.text("gui.status.saved_file", "File saved: {path}"),
                    &[("path", path.display().to_string())],
                ),
                Err(e) => fill_template(
                    &self.text("gui.status.file_error", "File error: {message}"),
                    &[("message", e.to_string())],
                ),
            });
        }
    }

    fn load_params_dialog(&mut self) {
        if let Some(path) = FileDialog::new().add_filter("TOML", &["toml"]).pick_file() {
            match storage::load_input_preset(&path) {
                Ok(input) => {
                    self.set_form_from_input(&input);
                    self.status_line = Some(fill_template(
                        &self.text("gui.status.loaded_file", "File loaded: {path}"),
                        &[("path", path.display().to_string())],
                    ));
                }
                Err(e) => {
                    self.status_line = Some(fill_template(
                        &self.text("gui.status.file_error", "File error: {message}"),
                        &[("message", e.to_string())],
                    ));
                }
            }
        }
    }

    fn save_history_dialog(&mut self) {
        if let Some(path) = FileDialog::new()
            .add_filter("TOML", &["toml"])
            .set_file_name("sirna_mix_history.toml")
            .save_file()
        {
            self.status_line = Some(match storage::save_history(&path, &self.history) {
                Ok(()) => fill_template(
                    &self.text("gui.status.saved_file", "File saved: {path}"),
                    &[("path", path.display().to_string())],
                ),
                Err(e) => fill_template(
                    &self.text("gui.status.file_error", "File error: {message}"),
                    &[("message", e.to_string())],
                ),
            });
        }
    }

    fn load_history_dialog(&mut self) {
        if let Some(path) = FileDialog::new().add_filter("TOML", &["toml"]).pick_file() {
            match storage::load_history(&path) {
                Ok(entries) => {
                    self.history = entries;
                    self.status_line = Some(fill_template(
                        &self.text("gui.status.loaded_file", "File loaded: {path}"),
                        &[("path", path.display().to_string())],
                    ));
                }
                Err(e) => {
                    self.status_line = Some(fill_template(
                        &self.text("gui.status.file_error", "File error: {message}"),
                        &[("message", e.to_string())],
                    ));
                }
            }
        }
    }

    fn apply_language(&mut self) {
        self.config.language = self.lang_input.clone();
        let lang = i18n::resolve_language(&self.config.language, None);
        self.tr = i18n::Translator::new_with_pack(&lang, None);
        if let Err(e) = self.config.save() {
            self.status_line = Some(format!("{e}"));
        }
    }
}

impl App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // 투명도 적용
        let mut style = (*ctx.style()).clone();
        style.visuals.window_fill = style
            .visuals
            .window_fill
            .linear_multiply(self.config.window_alpha);
        style.visuals.panel_fill = style
            .visuals
            .panel_fill
            .linear_multiply(self.config.window_alpha);
        ctx.set_style(style);

        // 상단 바
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(self.text("gui.app_title", "siRNA Mix Calculator"));
                ui.separator();
                if ui
                    .button(self.text("gui.button.settings", "Settings"))
                    .clicked()
                {
                    self.show_settings_modal = true;
                }
            });
        });

        // 설정 모달
        if self.show_settings_modal {
            let mut open = self.show_settings_modal;
            let mut lang_changed = false;
            let mut unit_default = self.config.default_volume_unit;
            let mut alpha = self.config.window_alpha;
            egui::Window::new(self.text("gui.settings.title", "Program Settings"))
                .collapsible(false)
                .resizable(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.label(self.text("gui.settings.lang", "Language"));
                    egui::ComboBox::from_id_source("lang_choice")
                        .selected_text(self.lang_input.clone())
                        .show_ui(ui, |ui| {
                            for code in ["auto", "en", "fr"] {
                                if ui
                                    .selectable_value(
                                        &mut self.lang_input,
                                        code.to_string(),
                                        code,
                                    )
                                    .changed()
                                {
                                    lang_changed = true;
                                }
                            }
                        });
                    ui.separator();
                    ui.label(self.text("gui.settings.unit", "Default medium volume unit"));
                    ui.horizontal(|ui| {
                        for unit in [VolumeUnit::Microliter, VolumeUnit::Milliliter] {
                            ui.selectable_value(&mut unit_default, unit, unit.label());
                        }
                    });
                    ui.separator();
                    ui.label(self.text("gui.settings.alpha", "Window transparency"));
                    ui.add(egui::Slider::new(&mut alpha, 0.3..=1.0).text("alpha"));
                });
            self.show_settings_modal = open;
            if lang_changed {
                self.apply_language();
            }
            if unit_default != self.config.default_volume_unit
                || (alpha - self.config.window_alpha).abs() > f32::EPSILON
            {
                self.config.default_volume_unit = unit_default;
                self.config.window_alpha = alpha;
                if let Err(e) = self.config.save() {
                    self.status_line = Some(format!("{e}"));
                }
            }
        }

        // 히스토리 패널
        egui::SidePanel::right("history_panel")
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.heading(self.text("gui.history.title", "Calculation history"));
                ui.horizontal(|ui| {
                    if ui
                        .button(self.text("gui.button.save_history", "Save history"))
                        .clicked()
                    {
                        self.save_history_dialog();
                    }
                    if ui
                        .button(self.text("gui.button.load_history", "Load history"))
                        .clicked()
                    {
                        self.load_history_dialog();
                    }
                });
                ui.separator();
                if self.history.is_empty() {
                    ui.label(self.text("gui.history.empty", "No calculations yet."));
                } else {
                    let mut load_request = None;
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        // 최근 항목 먼저
                        for (i, entry) in self.history.iter().enumerate().rev() {
                            if ui
                                .selectable_label(false, entry.describe())
                                .on_hover_text(self.text(
                                    "gui.history.load",
                                    "Load this calculation",
                                ))
                                .clicked()
                            {
                                load_request = Some(i);
                            }
                        }
                    });
                    if let Some(i) = load_request {
                        let input = self.history[i].input;
                        self.set_form_from_input(&input);
                    }
                }
            });

        // 중앙: 입력 폼 + 결과
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(self.text("gui.section.parameters", "Dilution parameters"));
            ui.add_space(4.0);
            ui.label(
                egui::RichText::new(self.text("gui.section.medium", "Culture medium")).strong(),
            );
            egui::Grid::new("medium_grid")
                .num_columns(3)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label(self.text(
                        "gui.input.cf",
                        "Desired final siRNA concentration Cf (nM):",
                    ));
                    ui.text_edit_singleline(&mut self.cf_text);
                    ui.end_row();

                    ui.label(self.text("gui.input.medium_volume", "Medium volume:"));
                    ui.text_edit_singleline(&mut self.medium_volume_text);
                    egui::ComboBox::from_id_source("medium_unit")
                        .selected_text(self.medium_unit.label())
                        .show_ui(ui, |ui| {
                            for unit in [VolumeUnit::Microliter, VolumeUnit::Milliliter] {
                                ui.selectable_value(&mut self.medium_unit, unit, unit.label());
                            }
                        });
                    ui.end_row();
                });
            self.apply_unit_change();

            ui.add_space(4.0);
            ui.label(egui::RichText::new(self.text("gui.section.mix", "siRNA mix")).strong());
            egui::Grid::new("mix_grid")
                .num_columns(2)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label(self.text(
                        "gui.input.mix_volume",
                        "Final mix volume added to the culture medium (µL):",
                    ));
                    ui.text_edit_singleline(&mut self.mix_volume_text);
                    ui.end_row();

                    ui.label(self.text("gui.input.stock", "siRNA stock concentration (nM):"));
                    ui.text_edit_singleline(&mut self.stock_text);
                    ui.end_row();
                });

            ui.horizontal(|ui| {
                ui.label(self.text("gui.input.samples_prefix", "Mix for"));
                ui.add(egui::TextEdit::singleline(&mut self.samples_text).desired_width(48.0));
                ui.label(self.text("gui.input.samples_suffix", "sample(s)"));
            });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui
                    .button(self.text("gui.button.calculate", "Calculate"))
                    .clicked()
                {
                    self.run_calculation();
                }
                if ui
                    .button(self.text("gui.button.explain", "Explain the calculation"))
                    .clicked()
                {
                    self.run_explanation();
                }
                if ui
                    .button(self.text("gui.button.save_params", "Save parameters"))
                    .clicked()
                {
                    self.save_params_dialog();
                }
                if ui
                    .button(self.text("gui.button.load_params", "Load parameters"))
                    .clicked()
                {
                    self.load_params_dialog();
                }
            });

            if let Some(ci) = &self.ci_label {
                ui.add_space(6.0);
                ui.label(ci.clone());
            }
            if let Some(err) = &self.error_text {
                ui.add_space(6.0);
                ui.colored_label(egui::Color32::RED, err.clone());
            }

            if !self.result_rows.is_empty() {
                ui.add_space(10.0);
                ui.label(
                    egui::RichText::new(self.text("gui.table.title", "Mix table")).strong(),
                );
                let mut copy_row: Option<usize> = None;
                egui::Grid::new("result_table")
                    .num_columns(4)
                    .striped(true)
                    .spacing([16.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(self.text("gui.table.component", "Component"))
                                .strong(),
                        );
                        ui.label(
                            egui::RichText::new(
                                self.text("gui.table.per_sample", "Volume per sample (µL)"),
                            )
                            .strong(),
                        );
                        ui.label(
                            egui::RichText::new(self.text("gui.table.total", "Total volume (µL)"))
                                .strong(),
                        );
                        ui.label("");
                        ui.end_row();
                        for (i, row) in self.result_rows.iter().enumerate() {
                            ui.label(self.text(row.label_key, row.label_default));
                            ui.label(format!("{:.2}", row.per_sample_ul));
                            ui.label(format!("{:.2}", row.total_ul));
                            if ui
                                .small_button(self.text("gui.button.copy_row", "Copy row"))
                                .clicked()
                            {
                                copy_row = Some(i);
                            }
                            ui.end_row();
                        }
                    });
                if let Some(i) = copy_row {
                    let row = &self.result_rows[i];
                    let text = format!(
                        "{}\t{:.2}\t{:.2}",
                        self.text(row.label_key, row.label_default),
                        row.per_sample_ul,
                        row.total_ul
                    );
                    ui.output_mut(|o| o.copied_text = text);
                    self.status_line =
                        Some(self.text("gui.status.copied", "Copied to clipboard."));
                }
                if ui
                    .button(self.text("gui.button.copy_table", "Copy table"))
                    .clicked()
                {
                    let text = self.table_as_clipboard_text();
                    ui.output_mut(|o| o.copied_text = text);
                    self.status_line =
                        Some(self.text("gui.status.copied", "Copied to clipboard."));
                }
            }

            if let Some(status) = &self.status_line {
                ui.add_space(8.0);
                ui.weak(status.clone());
            }
        });

        // 설명 창
        if self.show_explanation {
            let mut open = self.show_explanation;
            let mut copy_requested = false;
            let mut save_requested = false;
            egui::Window::new(self.text("gui.explain.title", "Calculation explanation"))
                .default_size(egui::vec2(560.0, 480.0))
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button(self.text("gui.button.copy_text", "Copy")).clicked() {
                            copy_requested = true;
                        }
                        if ui
                            .button(self.text("gui.button.save_text", "Save as..."))
                            .clicked()
                        {
                            save_requested = true;
                        }
                    });
                    ui.separator();
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        if let Some(text) = &self.explanation {
                            ui.monospace(text.clone());
                        }
                    });
                    if copy_requested {
                        if let Some(text) = self.explanation.clone() {
                            ui.output_mut(|o| o.copied_text = text);
                        }
                    }
                });
            self.show_explanation = open;
            if copy_requested {
                self.status_line = Some(self.text("gui.status.copied", "Copied to clipboard."));
            }
            if save_requested {
                if let Some(text) = self.explanation.clone() {
                    if let Some(path) = FileDialog::new()
                        .add_filter("Text", &["txt"])
                        .set_file_name("sirna_mix_explanation.txt")
                        .save_file()
                    {
                        self.status_line = Some(match fs::write(&path, text) {
                            Ok(()) => fill_template(
                                &self.text("gui.status.saved_file", "File saved: {path}"),
                                &[("path", path.display().to_string())],
                            ),
                            Err(e) => fill_template(
                                &self.text("gui.status.file_error", "File error: {message}"),
                                &[("message", e.to_string())],
                            ),
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> GuiApp {
        GuiApp::new(config::Config::default())
    }

    #[test]
    fn default_form_parses_to_documented_example() {
        let input = app().parse_form().unwrap();
        assert_eq!(input.final_concentration_nm, 1.0);
        assert_eq!(input.medium_volume, 2000.0);
        assert_eq!(input.medium_volume_unit, VolumeUnit::Microliter);
        assert_eq!(input.mix_volume_ul, 200.0);
        assert_eq!(input.stock_concentration_nm, 20000.0);
        assert_eq!(input.sample_count, 1);
    }

    #[test]
    fn empty_and_bad_fields_get_specific_errors() {
        let mut a = app();
        a.cf_text = "".into();
        assert_eq!(
            a.parse_form(),
            Err(FormError::Empty(FormField::FinalConcentration))
        );
        a.cf_text = "abc".into();
        assert_eq!(
            a.parse_form(),
            Err(FormError::NotNumber(FormField::FinalConcentration))
        );
        a.cf_text = "-1".into();
        assert_eq!(
            a.parse_form(),
            Err(FormError::NotPositive(FormField::FinalConcentration))
        );
        a.cf_text = "1".into();
        a.samples_text = "2.5".into();
        assert_eq!(
            a.parse_form(),
            Err(FormError::NotInteger(FormField::SampleCount))
        );
        a.samples_text = "0".into();
        assert_eq!(
            a.parse_form(),
            Err(FormError::NotPositive(FormField::SampleCount))
        );
    }

    #[test]
    fn unit_switch_converts_displayed_volume() {
        let mut a = app();
        a.medium_volume_text = "2000".into();
        a.medium_unit = VolumeUnit::Milliliter;
        a.apply_unit_change();
        assert_eq!(a.medium_volume_text, "2");
        assert_eq!(a.last_unit, VolumeUnit::Milliliter);
        a.medium_unit = VolumeUnit::Microliter;
        a.apply_unit_change();
        assert_eq!(a.medium_volume_text, "2000");
    }

    #[test]
    fn calculation_fills_table_and_history() {
        let mut a = app();
        a.samples_text = "3".into();
        a.run_calculation();
        assert!(a.error_text.is_none());
        assert_eq!(a.history.len(), 1);
        assert_eq!(a.result_rows.len(), 3);
        assert!((a.result_rows[0].per_sample_ul - 0.1).abs() < 1e-12);
        assert!((a.result_rows[0].total_ul - 0.3).abs() < 1e-12);
        assert!((a.result_rows[2].total_ul - 600.0).abs() < 1e-12);
        assert!(a.ci_label.as_deref().unwrap().contains("10.00"));
    }

    #[test]
    fn infeasible_input_shows_message_not_table() {
        let mut a = app();
        a.cf_text = "100".into();
        a.mix_volume_text = "10".into();
        a.stock_text = "1000".into();
        a.run_calculation();
        assert!(a.result_rows.is_empty());
        let err = a.error_text.unwrap();
        assert!(err.contains("20000.00"));
        assert!(err.contains("1000"));
    }

    #[test]
    fn explanation_uses_current_form_even_when_infeasible() {
        let mut a = app();
        a.cf_text = "100".into();
        a.mix_volume_text = "10".into();
        a.stock_text = "1000".into();
        a.run_explanation();
        let text = a.explanation.unwrap();
        assert!(text.contains("Ci = 20000.00 nM"));
    }

    #[test]
    fn loading_history_entry_restores_form() {
        let mut a = app();
        let input =
            MixInput::new(5.0, 1.5, VolumeUnit::Milliliter, 80.0, 50000.0, 6).unwrap();
        a.set_form_from_input(&input);
        assert_eq!(a.cf_text, "5");
        assert_eq!(a.medium_volume_text, "1.5");
        assert_eq!(a.medium_unit, VolumeUnit::Milliliter);
        assert_eq!(a.samples_text, "6");
        assert_eq!(a.parse_form().unwrap(), input);
    }

    #[test]
    fn table_clipboard_text_is_tab_separated() {
        let mut a = app();
        a.run_calculation();
        let text = a.table_as_clipboard_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("siRNA\t0.10\t0.10"));
    }
}
