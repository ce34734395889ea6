//! Registry Mirror Agent
//!
//! Usage:
//! - Normal mode: `registry-mirror-agent`
//! - With custom port: `registry-mirror-agent --port 19877`

use registry_mirror_agent::RuntimeConfig;

/// 解析命令行参数
fn parse_args() -> RuntimeConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = RuntimeConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                config.port_override = args[i + 1].parse().ok();
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    config
}

fn print_help() {
    println!("Registry Mirror Agent - 集群镜像仓库 mirror 端点管理");
    println!();
    println!("USAGE:");
    println!("    registry-mirror-agent [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --port <PORT>    Override the listening port");
    println!("    -h, --help       Print help information");
    println!();
    println!("ENVIRONMENT:");
    println!("    REGISTRY_AGENT_API_KEY     API key for x-api-key header");
    println!("    REGISTRY_AGENT_BASE_DIR    Base directory (inventory, playbooks, ssh key)");
    println!("    REGISTRY_ARTIFACT_ROOT     Query artifact root (default /tmp/registry_config)");
    println!("    REGISTRY_ARTIFACT_SCOPE    shared | cluster");
    println!("    REGISTRY_JOB_TIMEOUT_SECS  Per-job timeout (default 1800)");
}

fn main() {
    let config = parse_args();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    rt.block_on(async {
        if let Err(e) = registry_mirror_agent::init_and_run_agent_with_config(config).await {
            tracing::error!(error = %e, "Agent exited with error");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    });
}
