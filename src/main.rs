// ==========================================
// HPV 疫苗接种追踪系统 - 命令行入口
// ==========================================
// 用法:
//   hpv-tracker <file> <user_id> [db_path]
//   hpv-tracker register-center <name> <state> <lga> [db_path]
//   hpv-tracker summary [db_path]
// 结果以 JSON 输出到 stdout，日志输出到 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use hpv_tracker::app::{get_default_db_path, AppState};
use hpv_tracker::domain::NewCenterRequest;

const USAGE: &str = "usage:
  hpv-tracker <file> <user_id> [db_path]
  hpv-tracker register-center <name> <state> <lga> [db_path]
  hpv-tracker summary [db_path]";

#[tokio::main]
async fn main() -> Result<()> {
    hpv_tracker::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!(USAGE);
    };

    tracing::info!("{} v{}", hpv_tracker::APP_NAME, hpv_tracker::VERSION);

    match command.as_str() {
        "register-center" => {
            if args.len() < 4 {
                bail!(USAGE);
            }
            let state = open_state(args.get(4))?;
            let center = state
                .center_api
                .register_center(NewCenterRequest {
                    name: args[1].clone(),
                    state: args[2].clone(),
                    lga: args[3].clone(),
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&center)?);
        }
        "summary" => {
            let state = open_state(args.get(1))?;
            let summary = state.dashboard_api.get_summary(None, None).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            if args.len() < 2 {
                bail!(USAGE);
            }
            let state = open_state(args.get(2))?;
            let response = state
                .import_api
                .import_reports(&args[0], &args[1])
                .await
                .with_context(|| format!("import of {} failed", args[0]))?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

fn open_state(db_path: Option<&String>) -> Result<AppState> {
    let db_path = db_path.cloned().unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);
    AppState::new(db_path).context("failed to initialise application state")
}
