//! 镜像仓库端点编排
//!
//! 添加/删除：每台主机一次 `ansible-playbook`，严格按列表顺序执行，上一台结束后
//! 才开始下一台。第一台失败即中止，后续主机不再执行，已完成的主机不回滚。
//!
//! 查询：整个集群只执行一次，再汇总留在控制节点上的产物。

use std::path::Path;
use std::sync::Arc;
use tracing::Instrument;

use crate::config::RegistryConfig;
use crate::domain::registry::{
    RegistryConfigEntry, RegistryEndpointRequest, RegistryOperation, ResultEnvelope, TargetHost,
};
use crate::error::RegistryResult;
use crate::infra::artifact_store::ArtifactStore;
use crate::infra::command::{CommandRunner, JobInvocation};
use crate::infra::inventory::InventoryLocator;

use super::aggregator::ConfigAggregator;
use super::credentials::encode_credentials;
use super::invoker::JobInvoker;

pub struct RegistryOrchestrator {
    config: RegistryConfig,
    locator: InventoryLocator,
    invoker: JobInvoker,
    aggregator: ConfigAggregator,
}

impl RegistryOrchestrator {
    pub fn new(
        config: RegistryConfig,
        runner: Arc<dyn CommandRunner>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            locator: InventoryLocator::new(&config.inventory_dir),
            invoker: JobInvoker::new(runner),
            aggregator: ConfigAggregator::new(store),
            config,
        }
    }

    /// 在列出的每台主机上配置 mirror 端点
    pub async fn add_endpoint(&self, request: &RegistryEndpointRequest) -> ResultEnvelope<()> {
        self.mutate(RegistryOperation::Add, request).await
    }

    /// 从列出的每台主机上删除 mirror 端点
    pub async fn remove_endpoint(&self, request: &RegistryEndpointRequest) -> ResultEnvelope<()> {
        self.mutate(RegistryOperation::Remove, request).await
    }

    /// 查询整个集群已配置的端点
    pub async fn query_endpoints(&self, cluster_id: &str) -> ResultEnvelope<Vec<RegistryConfigEntry>> {
        let op = RegistryOperation::Query;
        let span = tracing::info_span!(
            "registry_job",
            request_id = %uuid::Uuid::new_v4(),
            operation = %op,
            cluster_id = %cluster_id,
        );

        let result = self.query(cluster_id).instrument(span.clone()).await;
        span.in_scope(|| match result {
            Ok(entries) => {
                tracing::info!(hosts = entries.len(), "Query finished");
                ResultEnvelope::ok(entries, op.success_message())
            }
            Err(e) => {
                tracing::error!(kind = e.kind(), error = %e, "Query failed");
                ResultEnvelope::error(op.failure_message())
            }
        })
    }

    async fn mutate(&self, op: RegistryOperation, request: &RegistryEndpointRequest) -> ResultEnvelope<()> {
        let span = tracing::info_span!(
            "registry_job",
            request_id = %uuid::Uuid::new_v4(),
            operation = %op,
            cluster_id = %request.cluster_id,
        );

        let result = self.apply(op, request).instrument(span.clone()).await;
        span.in_scope(|| match result {
            Ok(()) => {
                tracing::info!(hosts = request.hosts.len(), "All hosts completed");
                ResultEnvelope::ok((), op.success_message())
            }
            Err(e) => {
                tracing::error!(kind = e.kind(), error = %e, "Aborted");
                ResultEnvelope::error(op.failure_message())
            }
        })
    }

    async fn apply(&self, op: RegistryOperation, request: &RegistryEndpointRequest) -> RegistryResult<()> {
        let token = match op {
            RegistryOperation::Add => {
                encode_credentials(request.username.as_deref(), request.passwd.as_deref())
            }
            _ => None,
        };
        let inventory = self.locator.resolve(&request.cluster_id).await?;

        for (index, host) in request.hosts.iter().enumerate() {
            let invocation = self.host_invocation(op, &inventory, request, token.as_deref(), host);
            tracing::info!(host = %host.host_name, index, "Running {} on host", op.playbook());

            // 快速失败，剩余主机不再处理
            self.invoker.run(&invocation).await.map_err(|e| {
                tracing::warn!(
                    host = %host.host_name,
                    skipped = request.hosts.len() - index - 1,
                    "Host failed, skipping remaining hosts"
                );
                e
            })?;
        }

        Ok(())
    }

    async fn query(&self, cluster_id: &str) -> RegistryResult<Vec<RegistryConfigEntry>> {
        let inventory = self.locator.resolve(cluster_id).await?;

        let invocation = self
            .playbook(RegistryOperation::Query, &inventory)
            .arg("--private-key")
            .arg(self.config.private_key.to_string_lossy());
        self.invoker.run(&invocation).await?;

        let root = self.config.artifact_root_for(cluster_id);
        self.aggregator.aggregate(&root).await
    }

    /// 在 playbook 目录下执行 `ansible-playbook -i <inventory> <playbook>`
    fn playbook(&self, op: RegistryOperation, inventory: &Path) -> JobInvocation {
        JobInvocation::new(&self.config.ansible_bin, &self.config.playbook_dir)
            .arg("-i")
            .arg(inventory.to_string_lossy())
            .arg(op.playbook())
    }

    fn host_invocation(
        &self,
        op: RegistryOperation,
        inventory: &Path,
        request: &RegistryEndpointRequest,
        token: Option<&str>,
        host: &TargetHost,
    ) -> JobInvocation {
        let mut invocation = self
            .playbook(op, inventory)
            .extra_var("server", &request.image_addr);

        if op == RegistryOperation::Add {
            if let Some(token) = token {
                invocation = invocation.extra_var("admin_passwd", token);
            }
            invocation = invocation.extra_var("registry_host_ip", &request.registry_ip);
        }

        invocation
            .arg("--private-key")
            .arg(self.config.private_key.to_string_lossy())
            .arg("--limit")
            .arg(&host.host_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArtifactScope;
    use crate::domain::registry::{CODE_ERROR, CODE_OK};
    use crate::infra::artifact_store::FsArtifactStore;
    use crate::services::registry::testing::{FakeRunner, Outcome};
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        config: RegistryConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let mut config = RegistryConfig::with_base_dir(tmp.path());
            config.artifact_root = tmp.path().join("artifacts");
            Self { tmp, config }
        }

        fn orchestrator(&self, runner: Arc<FakeRunner>) -> RegistryOrchestrator {
            RegistryOrchestrator::new(self.config.clone(), runner, Arc::new(FsArtifactStore))
        }

        fn inventory(&self, cluster_id: &str) -> String {
            self.config
                .inventory_dir
                .join(format!("inventory-{}", cluster_id))
                .join("hosts.yaml")
                .to_string_lossy()
                .into_owned()
        }
    }

    fn request(hosts: &[&str]) -> RegistryEndpointRequest {
        RegistryEndpointRequest {
            cluster_id: "c1".to_string(),
            image_addr: "https://harbor.example.com".to_string(),
            registry_ip: "10.0.0.100".to_string(),
            username: None,
            passwd: None,
            hosts: hosts.iter().map(|h| TargetHost::new(*h)).collect(),
        }
    }

    #[tokio::test]
    async fn test_empty_host_list_is_vacuous_success() {
        let fx = Fixture::new();
        let runner = Arc::new(FakeRunner::new());
        let orch = fx.orchestrator(runner.clone());

        let add = orch.add_endpoint(&request(&[])).await;
        let remove = orch.remove_endpoint(&request(&[])).await;

        assert_eq!(add.code, CODE_OK);
        assert_eq!(remove.code, CODE_OK);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_hosts_run_in_order_one_at_a_time() {
        let fx = Fixture::new();
        let runner = Arc::new(FakeRunner::new());
        let orch = fx.orchestrator(runner.clone());

        let envelope = orch.add_endpoint(&request(&["n1", "n2", "n3", "n4"])).await;

        assert_eq!(envelope.code, CODE_OK);
        assert_eq!(runner.hosts(), vec!["n1", "n2", "n3", "n4"]);
        assert_eq!(runner.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_first_failure_aborts_remaining_hosts() {
        let fx = Fixture::new();
        let runner = Arc::new(FakeRunner::new().with("n2", Outcome::Exit(4, "UNREACHABLE")));
        let orch = fx.orchestrator(runner.clone());

        let envelope = orch.remove_endpoint(&request(&["n1", "n2", "n3"])).await;

        assert_eq!(envelope.code, CODE_ERROR);
        assert_eq!(envelope.msg, "Failed to remove registry endpoint");
        assert_eq!(runner.hosts(), vec!["n1", "n2"]);
    }

    #[tokio::test]
    async fn test_launch_failure_on_first_host() {
        let fx = Fixture::new();
        let runner = Arc::new(FakeRunner::new().with("n1", Outcome::SpawnFailure));
        let orch = fx.orchestrator(runner.clone());

        let envelope = orch.add_endpoint(&request(&["n1", "n2"])).await;

        assert_eq!(envelope.code, CODE_ERROR);
        assert_eq!(runner.hosts(), vec!["n1"]);
    }

    #[tokio::test]
    async fn test_stderr_does_not_fail_the_run() {
        let fx = Fixture::new();
        let runner = Arc::new(FakeRunner::new().with("n1", Outcome::SuccessWithStderr("[WARNING]: noise")));
        let orch = fx.orchestrator(runner.clone());

        let envelope = orch.add_endpoint(&request(&["n1", "n2"])).await;
        assert!(envelope.is_ok());
        assert_eq!(runner.hosts(), vec!["n1", "n2"]);
    }

    #[tokio::test]
    async fn test_add_arguments_with_credentials() {
        let fx = Fixture::new();
        let runner = Arc::new(FakeRunner::new());
        let orch = fx.orchestrator(runner.clone());

        let mut req = request(&["n1"]);
        req.username = Some("u".to_string());
        req.passwd = Some("p".to_string());
        orch.add_endpoint(&req).await;

        let call = &runner.calls()[0];
        let key = fx.config.private_key.to_string_lossy().into_owned();
        assert_eq!(call.program, "ansible-playbook");
        assert_eq!(call.work_dir, fx.config.playbook_dir);
        assert_eq!(
            call.args,
            vec![
                "-i".to_string(),
                fx.inventory("c1"),
                "add.yml".to_string(),
                "-e".to_string(),
                "server=https://harbor.example.com".to_string(),
                "-e".to_string(),
                "admin_passwd=dTpw".to_string(),
                "-e".to_string(),
                "registry_host_ip=10.0.0.100".to_string(),
                "--private-key".to_string(),
                key,
                "--limit".to_string(),
                "n1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_add_without_credentials_omits_token() {
        let fx = Fixture::new();
        let runner = Arc::new(FakeRunner::new());
        let orch = fx.orchestrator(runner.clone());

        let mut req = request(&["n1"]);
        req.username = Some("u".to_string());
        orch.add_endpoint(&req).await;

        let args = &runner.calls()[0].args;
        assert!(!args.iter().any(|a| a.starts_with("admin_passwd=")));
        assert!(args.contains(&"registry_host_ip=10.0.0.100".to_string()));
    }

    #[tokio::test]
    async fn test_remove_arguments() {
        let fx = Fixture::new();
        let runner = Arc::new(FakeRunner::new());
        let orch = fx.orchestrator(runner.clone());

        let mut req = request(&["n1"]);
        req.username = Some("u".to_string());
        req.passwd = Some("p".to_string());
        orch.remove_endpoint(&req).await;

        let key = fx.config.private_key.to_string_lossy().into_owned();
        assert_eq!(
            runner.calls()[0].args,
            vec![
                "-i".to_string(),
                fx.inventory("c1"),
                "delete.yml".to_string(),
                "-e".to_string(),
                "server=https://harbor.example.com".to_string(),
                "--private-key".to_string(),
                key,
                "--limit".to_string(),
                "n1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_inventory_directory_is_created() {
        let fx = Fixture::new();
        let orch = fx.orchestrator(Arc::new(FakeRunner::new()));

        orch.add_endpoint(&request(&["n1"])).await;

        assert!(fx.config.inventory_dir.join("inventory-c1").is_dir());
    }

    #[tokio::test]
    async fn test_inventory_failure_runs_nothing() {
        let mut fx = Fixture::new();
        let blocker = fx.tmp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        fx.config.inventory_dir = blocker;
        let runner = Arc::new(FakeRunner::new());
        let orch = fx.orchestrator(runner.clone());

        let envelope = orch.add_endpoint(&request(&["n1"])).await;

        assert_eq!(envelope.code, CODE_ERROR);
        assert!(runner.calls().is_empty());
    }

    fn write_artifacts(root: &Path) {
        let a = root.join("10.0.0.1");
        let b = root.join("10.0.0.2");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        std::fs::write(a.join("a.com.toml"), "[host.\"a.com\"]\ncapabilities = [\"pull\"]\n").unwrap();
        std::fs::write(
            b.join("b.com.toml"),
            "[host.\"b.com\"]\ncapabilities = [\"pull\"]\n[host.\"b.com\".header]\nauthorization = \"Basic dTpw\"\n",
        )
        .unwrap();
        std::fs::write(b.join("c.com.toml"), "[host.\"c.com\"]\ncapabilities = [\"pull\", \"resolve\"]\n").unwrap();
    }

    #[tokio::test]
    async fn test_query_runs_once_and_aggregates() {
        let fx = Fixture::new();
        let root = fx.config.artifact_root.clone();
        let runner = Arc::new(FakeRunner::new().on_run(move || write_artifacts(&root)));
        let orch = fx.orchestrator(runner.clone());

        let envelope = orch.query_endpoints("c1").await;

        assert_eq!(envelope.code, CODE_OK);
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].args,
            vec![
                "-i".to_string(),
                fx.inventory("c1"),
                "query.yml".to_string(),
                "--private-key".to_string(),
                fx.config.private_key.to_string_lossy().into_owned(),
            ]
        );

        let hosts: Vec<_> = envelope.data.iter().map(|e| e.host_ip.as_str()).collect();
        assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(envelope.data[1].domains.len(), 2);
        let creds: Vec<_> = envelope.data[1]
            .domains
            .iter()
            .filter_map(|d| d.credentials.as_deref())
            .collect();
        assert_eq!(creds, vec!["Basic dTpw"]);
    }

    #[tokio::test]
    async fn test_query_job_failure() {
        let fx = Fixture::new();
        let root = fx.config.artifact_root.clone();
        write_artifacts(&root);
        let runner = Arc::new(FakeRunner::new().with("*", Outcome::Exit(2, "failed")));
        let orch = fx.orchestrator(runner);

        let envelope = orch.query_endpoints("c1").await;

        assert_eq!(envelope.code, CODE_ERROR);
        assert!(envelope.data.is_empty());
    }

    #[tokio::test]
    async fn test_query_malformed_artifact_fails_whole_call() {
        let fx = Fixture::new();
        let root = fx.config.artifact_root.clone();
        write_artifacts(&root);
        std::fs::write(root.join("10.0.0.2").join("bad.toml"), "host = ").unwrap();
        let orch = fx.orchestrator(Arc::new(FakeRunner::new()));

        let envelope = orch.query_endpoints("c1").await;

        assert_eq!(envelope.code, CODE_ERROR);
        assert_eq!(envelope.msg, "Failed to query registry endpoints");
    }

    #[tokio::test]
    async fn test_query_cluster_scoped_root() {
        let mut fx = Fixture::new();
        fx.config.artifact_scope = ArtifactScope::Cluster;
        write_artifacts(&fx.config.artifact_root.join("c2"));
        let orch = fx.orchestrator(Arc::new(FakeRunner::new()));

        let envelope = orch.query_endpoints("c2").await;
        assert_eq!(envelope.code, CODE_OK);
        assert_eq!(envelope.data.len(), 2);

        // c1 没有自己的产物目录
        let missing = orch.query_endpoints("c1").await;
        assert_eq!(missing.code, CODE_ERROR);
    }
}
