use clap::Parser;
use pik_upscaler::config::{Command, LogFormat, UpscaleArgs};
use pik_upscaler::core::extract::{fetch_page_image_urls, page_client, PAGE_TIMEOUT};
use pik_upscaler::core::preview::ImagePreviewer;
use pik_upscaler::utils::error::ErrorSeverity;
use pik_upscaler::utils::{logger, validation::Validate};
use pik_upscaler::{
    CliConfig, FreepikPipeline, LocalStorage, Result, TomlConfig, UpscaleEngine, UpscaleError,
    UpscaleSettings,
};
use std::path::Path;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // .env 不存在時忽略
    dotenv::dotenv().ok();

    let config = CliConfig::parse();

    match config.log_format {
        LogFormat::Compact => logger::init_cli_logger(config.verbose),
        LogFormat::Json => logger::init_json_logger(config.verbose),
    }

    tracing::info!("Starting pik-upscaler");

    let outcome = match &config.command {
        Command::Upscale(args) => run_upscale(&config, args).await,
        Command::Preview { url, save } => run_preview(url, save.as_deref()).await,
        Command::Extract { page_url } => run_extract(page_url).await,
    };

    if let Err(e) = outcome {
        tracing::error!(
            "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        // 依錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Medium => 2, // 可重試
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3, // 系統錯誤
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run_upscale(config: &CliConfig, args: &UpscaleArgs) -> Result<()> {
    let file = match &config.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            let file = TomlConfig::from_file(path)?;
            file.validate()?;
            Some(file)
        }
        None => None,
    };

    let settings = UpscaleSettings::resolve(file.as_ref(), config.overrides());
    settings.validate()?;
    tracing::info!("✅ Configuration loaded and validated successfully");

    if args.dry_run {
        display_dry_run(&settings, args);
        return Ok(());
    }

    let storage = LocalStorage::new(settings.output_path.clone());
    let policy = settings.poll_policy();
    let pipeline = FreepikPipeline::new(storage, settings)?;

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }
    let engine = UpscaleEngine::new_with_monitoring(pipeline, policy, config.monitor);

    let report = engine.run(&args.url).await?;
    println!("✅ Upscaled image saved to: {}", report.output_path);

    if let Some(path) = &args.report {
        let json = serde_json::to_vec_pretty(&report)?;
        tokio::fs::write(path, json).await?;
        tracing::info!("📝 Run report written to: {}", path.display());
    }

    Ok(())
}

async fn run_preview(url: &str, save: Option<&Path>) -> Result<()> {
    if url.trim().is_empty() {
        return Err(UpscaleError::ValidationError {
            message: "Please provide an image URL first".to_string(),
        });
    }

    let previewer = ImagePreviewer::new()?;
    let info = previewer.fetch(url).await?;

    let format = info
        .format
        .map(|f| format!("{:?}", f))
        .unwrap_or_else(|| "unknown".to_string());
    println!(
        "🔍 Preview loaded: {}x{} {} ({} bytes)",
        info.width, info.height, format, info.byte_len
    );

    if let Some(path) = save {
        ImagePreviewer::save_thumbnail(&info, path)?;
        println!("🖼️ Thumbnail saved to: {}", path.display());
    }

    Ok(())
}

async fn run_extract(page_url: &str) -> Result<()> {
    let client = page_client(PAGE_TIMEOUT)?;
    let urls = fetch_page_image_urls(&client, page_url).await?;

    if urls.is_empty() {
        eprintln!("No image URL found on that page.");
    }
    for url in urls {
        println!("{}", url);
    }

    Ok(())
}

fn display_dry_run(settings: &UpscaleSettings, args: &UpscaleArgs) {
    println!("📋 Upscale Request Summary:");
    println!("  Endpoint: {}", settings.api_endpoint);
    println!("  Image: {}", args.url);
    println!("  Flavor: {}", settings.params.flavor);
    println!("  Sharpen: {}", settings.params.sharpen);
    println!("  Smart Grain: {}", settings.params.smart_grain);
    println!("  Ultra Detail: {}", settings.params.ultra_detail);
    println!("  Scale Factor: {}x", settings.params.scale_factor);
    println!("  Output: {} ({:?} naming)", settings.output_path, settings.naming);
    println!(
        "  Polling: every {}s, up to {} attempts",
        settings.poll_interval_secs, settings.max_attempts
    );
    println!("  🔍 DRY RUN MODE - no request was sent");
}
