use clap::Parser;
use oedatamodel_api::config::{Command, ExportArgs, ServeArgs};
use oedatamodel_api::server::ApiServer;
use oedatamodel_api::utils::error::{EtlError, ErrorSeverity};
use oedatamodel_api::utils::{logger, validation::Validate};
use oedatamodel_api::{build_engine, AppConfig, CliConfig, LocalStorage, ScenarioRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    match &cli.command {
        Command::Serve(args) => logger::init_server_logger(cli.verbose, args.json_logs),
        _ => logger::init_cli_logger(cli.verbose),
    }

    tracing::info!("Starting oedatamodel-api");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let outcome = match load_config(&cli.config) {
        Ok(config) => run(&cli, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = outcome {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

/// 設定檔不存在時使用預設值（只有內建映射、沒有上游來源）
fn load_config(path: &str) -> Result<AppConfig, EtlError> {
    let config = if std::path::Path::new(path).exists() {
        tracing::info!("📁 Loading configuration from: {}", path);
        AppConfig::from_file(path)?
    } else {
        tracing::warn!("🔶 Config file '{}' not found, using defaults", path);
        AppConfig::default()
    };

    config.validate()?;
    tracing::info!("✅ Configuration loaded and validated successfully");
    Ok(config)
}

async fn run(cli: &CliConfig, config: AppConfig) -> Result<(), EtlError> {
    match &cli.command {
        Command::Serve(args) => serve(config, args).await,
        Command::Export(args) => export(config, args).await,
        Command::Mappings => list_mappings(&config),
    }
}

async fn serve(mut config: AppConfig, args: &ServeArgs) -> Result<(), EtlError> {
    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if config.upstream.sources.is_empty() {
        tracing::warn!("🔶 No upstream sources configured, every scenario request will fail");
    } else {
        tracing::info!("📡 Upstream sources: {}", config.source_names().join(", "));
    }

    let engine = build_engine(&config)?;
    ApiServer::new(&config.server.bind, config.server.port, engine)
        .serve()
        .await
}

async fn export(config: AppConfig, args: &ExportArgs) -> Result<(), EtlError> {
    let identifier = args.identifier().ok_or_else(|| EtlError::MissingConfigError {
        field: "--id or --name".to_string(),
    })?;
    // 來源未設定時，在建立引擎與呼叫上游之前就失敗
    if config.source(&args.source).is_none() {
        return Err(EtlError::UnknownSource {
            name: args.source.clone(),
        });
    }
    let request = ScenarioRequest {
        source: args.source.clone(),
        identifier,
    };

    let engine = build_engine(&config)?;
    let storage = LocalStorage::new(args.output_dir.clone());
    let filename = args.output_filename();

    let written = engine
        .export(&request, &args.mapping, args.output, &storage, &filename)
        .await?;

    let full_path = storage.full_path(&written);
    tracing::info!("✅ Export completed successfully!");
    tracing::info!("📁 Output saved to: {}", full_path.display());
    println!("✅ Export completed successfully!");
    println!("📁 Output saved to: {}", full_path.display());
    Ok(())
}

fn list_mappings(config: &AppConfig) -> Result<(), EtlError> {
    let engine = build_engine(config)?;
    for mapping in engine.registry().iter() {
        let tables: Vec<&str> = mapping.tables.iter().map(|t| t.name.as_str()).collect();
        println!(
            "{}\t{}\t[{}]",
            mapping.name,
            mapping.description.as_deref().unwrap_or(""),
            tables.join(", ")
        );
    }
    Ok(())
}
