use clap::Parser;

use sirna_mix_calculator::{app, config, i18n};

/// CLI 인자. 언어만 받는다 (auto/en/fr).
#[derive(Debug, Parser)]
#[command(name = "sirna_mix_calculator_cli", version)]
struct Cli {
    /// Display language (auto, en, fr)
    #[arg(short = 'L', long = "lang", default_value = "auto")]
    lang: String,
}

/// 프로그램의 엔트리 포인트. 설정을 로드한 뒤 CLI 애플리케이션을 실행한다.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    if let Err(err) = try_run() {
        eprintln!("Error: {err}");
    }
}

fn try_run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut cfg = config::load_or_default()?;
    let lang = i18n::resolve_language(&cli.lang, Some(cfg.language.as_str()));
    let tr = i18n::Translator::new_with_pack(&lang, None);
    app::run(&mut cfg, &tr)?;
    Ok(())
}
