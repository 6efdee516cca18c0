// ==========================================
// 资产主数据导入 - 命令行入口
// ==========================================
// 用法:
//   asset-data-import <regions|locations|assets> <file_name> [--user ID] [--errors-out PATH] [--json-logs]
//
// 文件从上传目录读取（ASSET_IMPORT_UPLOAD_DIR），数据库见 ASSET_IMPORT_DB_PATH
// 本地操作员视为特权调用方
// ==========================================

use anyhow::{anyhow, bail, Context};
use asset_data_import::audit::TracingAuditSink;
use asset_data_import::db::get_default_db_path;
use asset_data_import::storage::LocalBlobStore;
use asset_data_import::{logging, Caller, ImportApi, ImportKind};
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

const USAGE: &str = "usage: asset-data-import <regions|locations|assets> <file_name> [--user ID] [--errors-out PATH] [--json-logs]";

struct CliArgs {
    kind: ImportKind,
    file_name: String,
    user_id: String,
    errors_out: Option<String>,
    json_logs: bool,
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut positional = Vec::new();
    let mut user_id = std::env::var("USER").unwrap_or_else(|_| "local-operator".to_string());
    let mut errors_out = None;
    let mut json_logs = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--user" => user_id = args.next().ok_or_else(|| anyhow!("--user 缺少参数\n{}", USAGE))?,
            "--errors-out" => {
                errors_out = Some(args.next().ok_or_else(|| anyhow!("--errors-out 缺少参数\n{}", USAGE))?)
            }
            "--json-logs" => json_logs = true,
            "-h" | "--help" => bail!(USAGE),
            _ => positional.push(arg),
        }
    }

    if positional.len() != 2 {
        bail!(USAGE);
    }
    let file_name = positional.pop().unwrap_or_default();
    let kind = positional
        .pop()
        .unwrap_or_default()
        .parse::<ImportKind>()
        .map_err(|e| anyhow!("{}\n{}", e, USAGE))?;

    Ok(CliArgs {
        kind,
        file_name,
        user_id,
        errors_out,
        json_logs,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;

    if args.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{} v{}", asset_data_import::APP_NAME, asset_data_import::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    let upload_dir = LocalBlobStore::default_root();
    tracing::info!(db_path = %db_path, upload_dir = %upload_dir.display(), "使用存储");

    let api = ImportApi::open(&db_path, Arc::new(LocalBlobStore::new(upload_dir)))
        .await
        .context("导入 API 初始化失败")?
        .with_audit_sink(Arc::new(TracingAuditSink));

    let caller = Caller::new(args.user_id, true);
    let response = api.import_file(Some(caller), args.kind, &args.file_name).await;

    println!("{}", serde_json::to_string_pretty(&response.body)?);

    if let (Some(path), Some(details)) = (&args.errors_out, &response.body.details) {
        let file = File::create(path).with_context(|| format!("无法创建错误报告: {}", path))?;
        let written = api
            .export_error_report(&details.run_id, BufWriter::new(file))
            .await
            .context("错误报告导出失败")?;
        tracing::info!(path = %path, rows = written, "错误报告已导出");
    }

    if !response.is_success() {
        bail!("导入失败 (status={})", response.status_code);
    }
    Ok(())
}
