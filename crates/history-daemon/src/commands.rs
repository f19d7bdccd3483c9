//! CLI command implementations.
//!
//! `import` drives every entity type's pages through its import service,
//! one page at a time, and waits for each page's completion before
//! handing over the next one.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{info, warn};

use history_import::{
    ActivityInstanceImport, DecisionInstanceImport, DefinitionImport, DefinitionResolver,
    EngineClient, EngineContext, IdentityLinkLogImport, ImportIndexImport, ImportService,
    ImportStrategy, InstanceScope, PageStats, ProcessInstanceImport, SuspensionController,
    TenantImport, UserOperationLogImport, UserTaskImport, VariableFlattener,
    VariableUpdateImport,
};
use history_jobs::{DocumentWriter, ExecutorConfig, ExecutorStats};
use history_plugins::PluginRegistry;
use history_types::{
    DefinitionKind, EngineDateTime, EngineSettings, EntityType, ImportIndexSnapshot, Settings,
};

use crate::fixtures::{FixtureEngineClient, FixtureSet};
use crate::sink::{JsonLinesWriter, LoggingCursor};

/// Outcome of importing one entity type.
#[derive(Debug, Clone, Default)]
pub struct EntityReport {
    pub pages: usize,
    pub stats: PageStats,
    pub last_timestamp: Option<EngineDateTime>,
    pub executor: ExecutorStats,
}

/// Outcome of a whole import run.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub engine: String,
    pub entities: Vec<(EntityType, EntityReport)>,
    pub cursor_resets: usize,
}

impl ImportSummary {
    /// Report for one entity type, if it was imported.
    pub fn entity(&self, entity_type: EntityType) -> Option<&EntityReport> {
        self.entities
            .iter()
            .find(|(e, _)| *e == entity_type)
            .map(|(_, report)| report)
    }

    /// Documents handed to executors across all entity types.
    pub fn total_submitted(&self) -> usize {
        self.entities.iter().map(|(_, r)| r.stats.submitted).sum()
    }
}

/// Handle the `import` command.
pub async fn handle_import(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    input: &Path,
    output: &Path,
    engine: Option<&str>,
    page_size_override: Option<usize>,
) -> Result<()> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(page_size) = page_size_override {
        settings.import.max_page_size = page_size;
    }
    settings.validate().context("Invalid configuration")?;

    init_logging(&settings)?;

    info!("History importer starting...");
    info!("  Input: {}", input.display());
    info!("  Output: {}", output.display());
    info!("  Page size: {}", settings.import.max_page_size);
    info!("  Job queue size: {}", settings.import.job_queue_size);

    let summary = run_import(&settings, input, output, engine).await?;
    print_summary(&summary);
    Ok(())
}

fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Import every fixture in `input` for one engine, writing documents to `output`.
pub async fn run_import(
    settings: &Settings,
    input: &Path,
    output: &Path,
    engine_alias: Option<&str>,
) -> Result<ImportSummary> {
    let engine = select_engine(settings, engine_alias)?;
    let fixtures = FixtureSet::load(input)?;
    info!(engine = %engine.alias, records = fixtures.len(), "Loaded fixtures");

    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let client: Arc<dyn EngineClient> = Arc::new(FixtureEngineClient::from_fixtures(&fixtures));
    let cursor = Arc::new(LoggingCursor::default());
    let pipeline = EnginePipeline::spawn(
        settings,
        engine,
        client,
        cursor.clone(),
        PluginRegistry::empty(),
        output,
    );

    let result = pipeline
        .run(fixtures, settings.import.max_page_size)
        .await;
    pipeline.shutdown().await?;
    let mut entities = result?;

    for (entity_type, report) in entities.iter_mut() {
        report.executor = pipeline.executor_stats(*entity_type);
    }

    Ok(ImportSummary {
        engine: engine.alias.clone(),
        entities,
        cursor_resets: cursor.resets(),
    })
}

fn select_engine<'a>(settings: &'a Settings, alias: Option<&str>) -> Result<&'a EngineSettings> {
    match alias {
        Some(alias) => {
            let engine = settings
                .engine(alias)
                .with_context(|| format!("Unknown engine alias: {alias}"))?;
            if !engine.import_enabled {
                anyhow::bail!("Import is disabled for engine {alias}");
            }
            Ok(engine)
        }
        None => settings
            .enabled_engines()
            .next()
            .context("No engine has import enabled"),
    }
}

fn writer<T>(output: &Path, entity_type: EntityType) -> Arc<dyn DocumentWriter<T>>
where
    T: Serialize + Send + Sync + 'static,
{
    Arc::new(JsonLinesWriter::for_entity(output, entity_type))
}

/// All import services of one engine.
struct EnginePipeline {
    tenants: ImportService<TenantImport>,
    process_definitions: ImportService<DefinitionImport>,
    decision_definitions: ImportService<DefinitionImport>,
    completed_processes: ImportService<ProcessInstanceImport>,
    running_processes: ImportService<ProcessInstanceImport>,
    completed_activities: ImportService<ActivityInstanceImport>,
    running_activities: ImportService<ActivityInstanceImport>,
    completed_user_tasks: ImportService<UserTaskImport>,
    running_user_tasks: ImportService<UserTaskImport>,
    identity_links: ImportService<IdentityLinkLogImport>,
    user_operations: ImportService<UserOperationLogImport>,
    variables: ImportService<VariableUpdateImport>,
    decisions: ImportService<DecisionInstanceImport>,
    import_index: ImportService<ImportIndexImport>,
}

impl EnginePipeline {
    fn spawn(
        settings: &Settings,
        engine: &EngineSettings,
        client: Arc<dyn EngineClient>,
        cursor: Arc<LoggingCursor>,
        plugins: PluginRegistry,
        output: &Path,
    ) -> Self {
        let config = ExecutorConfig::with_capacity(settings.import.job_queue_size);
        let context = EngineContext::from(engine);
        let resolver = Arc::new(DefinitionResolver::new(client.clone(), engine.alias.clone()));

        macro_rules! service {
            ($strategy:expr) => {{
                let strategy = $strategy;
                let entity_type = strategy.entity_type();
                ImportService::spawn(strategy, &config, writer(output, entity_type))
            }};
        }

        Self {
            tenants: service!(TenantImport::new(context.clone())),
            process_definitions: service!(DefinitionImport::new(
                DefinitionKind::Process,
                context.clone(),
                resolver.clone()
            )),
            decision_definitions: service!(DefinitionImport::new(
                DefinitionKind::Decision,
                context.clone(),
                resolver.clone()
            )),
            completed_processes: service!(ProcessInstanceImport::new(
                InstanceScope::Completed,
                context.clone(),
                resolver.clone(),
                plugins.business_keys().clone()
            )),
            running_processes: service!(ProcessInstanceImport::new(
                InstanceScope::Running,
                context.clone(),
                resolver.clone(),
                plugins.business_keys().clone()
            )),
            completed_activities: service!(ActivityInstanceImport::new(
                InstanceScope::Completed,
                context.clone(),
                resolver.clone()
            )),
            running_activities: service!(ActivityInstanceImport::new(
                InstanceScope::Running,
                context.clone(),
                resolver.clone()
            )),
            completed_user_tasks: service!(UserTaskImport::new(
                InstanceScope::Completed,
                context.clone(),
                resolver.clone()
            )),
            running_user_tasks: service!(UserTaskImport::new(
                InstanceScope::Running,
                context.clone(),
                resolver.clone()
            )),
            identity_links: service!(IdentityLinkLogImport::new(
                context.clone(),
                resolver.clone()
            )),
            user_operations: service!(UserOperationLogImport::new(
                context.clone(),
                resolver.clone(),
                client,
                SuspensionController::new(cursor)
            )),
            variables: service!(VariableUpdateImport::new(
                context.clone(),
                resolver.clone(),
                VariableFlattener::from_settings(&settings.import),
                plugins.variables().clone()
            )),
            decisions: service!(DecisionInstanceImport::new(
                context.clone(),
                resolver,
                plugins.clone()
            )),
            import_index: service!(ImportIndexImport::new(context)),
        }
    }

    async fn run(
        &self,
        fixtures: FixtureSet,
        page_size: usize,
    ) -> Result<Vec<(EntityType, EntityReport)>> {
        let FixtureSet {
            tenants,
            process_definitions,
            decision_definitions,
            process_instances,
            activity_instances,
            user_tasks,
            decision_instances,
            identity_link_logs,
            user_operation_logs,
            variable_updates,
        } = fixtures;

        let (completed_processes, running_processes): (Vec<_>, Vec<_>) =
            process_instances.into_iter().partition(|p| p.end_time.is_some());
        let (completed_activities, running_activities): (Vec<_>, Vec<_>) =
            activity_instances.into_iter().partition(|a| a.end_time.is_some());
        let (completed_tasks, running_tasks): (Vec<_>, Vec<_>) =
            user_tasks.into_iter().partition(|t| t.end_time.is_some());

        let mut reports = vec![
            (
                EntityType::Tenant,
                import_entity(&self.tenants, tenants, page_size, |_| None).await?,
            ),
            (
                EntityType::ProcessDefinition,
                import_entity(&self.process_definitions, process_definitions, page_size, |_| None)
                    .await?,
            ),
            (
                EntityType::DecisionDefinition,
                import_entity(&self.decision_definitions, decision_definitions, page_size, |_| None)
                    .await?,
            ),
            (
                EntityType::CompletedProcessInstance,
                import_entity(&self.completed_processes, completed_processes, page_size, |p| {
                    p.end_time
                })
                .await?,
            ),
            (
                EntityType::RunningProcessInstance,
                import_entity(
                    &self.running_processes,
                    running_processes.clone(),
                    page_size,
                    |p| Some(p.start_time),
                )
                .await?,
            ),
            (
                EntityType::CompletedActivityInstance,
                import_entity(
                    &self.completed_activities,
                    completed_activities,
                    page_size,
                    |a| a.end_time,
                )
                .await?,
            ),
            (
                EntityType::RunningActivityInstance,
                import_entity(&self.running_activities, running_activities, page_size, |a| {
                    Some(a.start_time)
                })
                .await?,
            ),
            (
                EntityType::CompletedUserTask,
                import_entity(&self.completed_user_tasks, completed_tasks, page_size, |t| {
                    t.end_time
                })
                .await?,
            ),
            (
                EntityType::RunningUserTask,
                import_entity(&self.running_user_tasks, running_tasks, page_size, |t| {
                    Some(t.start_time)
                })
                .await?,
            ),
            (
                EntityType::IdentityLinkLog,
                import_entity(&self.identity_links, identity_link_logs, page_size, |l| {
                    Some(l.time)
                })
                .await?,
            ),
        ];

        let resets_before = self.user_operations.strategy().controller().reset_count();
        let user_operations = import_entity(
            &self.user_operations,
            user_operation_logs,
            page_size,
            |o| Some(o.timestamp),
        )
        .await?;
        reports.push((EntityType::UserOperationLog, user_operations));

        // A reset cursor means the running instances start over
        let controller = self.user_operations.strategy().controller();
        if controller.reset_count() > resets_before {
            info!(
                instances = running_processes.len(),
                "Reimporting running process instances after cursor reset"
            );
            let reimport = import_entity(&self.running_processes, running_processes, page_size, |p| {
                Some(p.start_time)
            })
            .await?;
            if let Some((_, report)) = reports
                .iter_mut()
                .find(|(e, _)| *e == EntityType::RunningProcessInstance)
            {
                report.pages += reimport.pages;
                report.stats.merge(&reimport.stats);
            }
            controller.mark_normal();
        }

        reports.push((
            EntityType::VariableUpdate,
            import_entity(&self.variables, variable_updates, page_size, |v| Some(v.time)).await?,
        ));
        reports.push((
            EntityType::DecisionInstance,
            import_entity(&self.decisions, decision_instances, page_size, |d| {
                Some(d.evaluation_time)
            })
            .await?,
        ));

        let snapshots: Vec<ImportIndexSnapshot> = reports
            .iter()
            .map(|(entity_type, report)| ImportIndexSnapshot {
                entity_type: *entity_type,
                timestamp_of_last_entity: report.last_timestamp,
                position: report.stats.received as i64,
            })
            .collect();
        reports.push((
            EntityType::ImportIndex,
            import_entity(&self.import_index, snapshots, page_size, |_| None).await?,
        ));

        Ok(reports)
    }

    async fn shutdown(&self) -> Result<()> {
        self.tenants.shutdown().await?;
        self.process_definitions.shutdown().await?;
        self.decision_definitions.shutdown().await?;
        self.completed_processes.shutdown().await?;
        self.running_processes.shutdown().await?;
        self.completed_activities.shutdown().await?;
        self.running_activities.shutdown().await?;
        self.completed_user_tasks.shutdown().await?;
        self.running_user_tasks.shutdown().await?;
        self.identity_links.shutdown().await?;
        self.user_operations.shutdown().await?;
        self.variables.shutdown().await?;
        self.decisions.shutdown().await?;
        self.import_index.shutdown().await?;
        Ok(())
    }

    fn executor_stats(&self, entity_type: EntityType) -> ExecutorStats {
        match entity_type {
            EntityType::Tenant => self.tenants.stats(),
            EntityType::ProcessDefinition => self.process_definitions.stats(),
            EntityType::DecisionDefinition => self.decision_definitions.stats(),
            EntityType::CompletedProcessInstance => self.completed_processes.stats(),
            EntityType::RunningProcessInstance => self.running_processes.stats(),
            EntityType::CompletedActivityInstance => self.completed_activities.stats(),
            EntityType::RunningActivityInstance => self.running_activities.stats(),
            EntityType::CompletedUserTask => self.completed_user_tasks.stats(),
            EntityType::RunningUserTask => self.running_user_tasks.stats(),
            EntityType::IdentityLinkLog => self.identity_links.stats(),
            EntityType::UserOperationLog => self.user_operations.stats(),
            EntityType::VariableUpdate => self.variables.stats(),
            EntityType::DecisionInstance => self.decisions.stats(),
            EntityType::ImportIndex => self.import_index.stats(),
        }
    }
}

/// Split records into pages of at most `page_size`.
pub fn into_pages<T>(records: Vec<T>, page_size: usize) -> Vec<Vec<T>> {
    let page_size = page_size.max(1);
    let mut pages = Vec::with_capacity(records.len().div_ceil(page_size));
    let mut records = records.into_iter().peekable();
    while records.peek().is_some() {
        pages.push(records.by_ref().take(page_size).collect());
    }
    pages
}

/// Feed `records` page by page, waiting for each page to complete.
async fn import_entity<S, F>(
    service: &ImportService<S>,
    records: Vec<S::Record>,
    page_size: usize,
    timestamp: F,
) -> Result<EntityReport>
where
    S: ImportStrategy,
    F: Fn(&S::Record) -> Option<EngineDateTime>,
{
    let mut report = EntityReport {
        last_timestamp: records.iter().filter_map(&timestamp).max(),
        ..EntityReport::default()
    };

    for page in into_pages(records, page_size) {
        let (tx, rx) = oneshot::channel();
        let stats = service
            .execute_import(
                page,
                Box::new(move || {
                    let _ = tx.send(());
                }),
            )
            .await
            .with_context(|| format!("Failed to import {} page", service.entity_type()))?;

        rx.await
            .with_context(|| format!("{} page was never completed", service.entity_type()))?;

        if stats.dropped > 0 {
            warn!(
                entity = %service.entity_type(),
                dropped = stats.dropped,
                "Records dropped from page"
            );
        }
        report.pages += 1;
        report.stats.merge(&stats);
    }

    Ok(report)
}

fn print_summary(summary: &ImportSummary) {
    println!("Import summary for engine {}", summary.engine);
    println!(
        "{:<30} {:>6} {:>9} {:>8} {:>10} {:>7}",
        "ENTITY", "PAGES", "RECEIVED", "DROPPED", "SUBMITTED", "FAILED"
    );
    for (entity_type, report) in &summary.entities {
        println!(
            "{:<30} {:>6} {:>9} {:>8} {:>10} {:>7}",
            entity_type.as_str(),
            report.pages,
            report.stats.received,
            report.stats.dropped,
            report.stats.submitted,
            report.executor.failed
        );
    }
    println!("Documents submitted: {}", summary.total_submitted());
    if summary.cursor_resets > 0 {
        println!("Running instance cursor resets: {}", summary.cursor_resets);
    }
}

/// Handle the `config` command.
pub fn show_config(config_path: Option<&str>) -> Result<()> {
    let settings = Settings::load(config_path).context("Failed to load configuration")?;
    let rendered =
        serde_json::to_string_pretty(&settings).context("Failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn read_lines(dir: &Path, entity_type: EntityType) -> Vec<serde_json::Value> {
        let path = dir.join(format!("{entity_type}.jsonl"));
        match fs::read_to_string(path) {
            Ok(content) => content
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn test_into_pages() {
        let pages = into_pages((1..=5).collect::<Vec<u32>>(), 2);
        assert_eq!(pages, vec![vec![1, 2], vec![3, 4], vec![5]]);
        assert!(into_pages(Vec::<u32>::new(), 3).is_empty());
        assert_eq!(into_pages(vec![1, 2], 0).len(), 2);
    }

    #[test]
    fn test_select_engine() {
        let settings = Settings {
            engines: vec![
                EngineSettings {
                    import_enabled: false,
                    ..EngineSettings::new("off")
                },
                EngineSettings::new("on"),
            ],
            ..Settings::default()
        };
        assert_eq!(select_engine(&settings, None).unwrap().alias, "on");
        assert!(select_engine(&settings, Some("off")).is_err());
        assert!(select_engine(&settings, Some("missing")).is_err());
    }

    #[tokio::test]
    async fn test_run_import_writes_documents() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(
            input.path(),
            "process_definitions.json",
            r#"[{"id":"invoice:1:a","key":"invoice","version":1}]"#,
        );
        write(
            input.path(),
            "process_instances.json",
            r#"[
                {"id":"pi-1","processDefinitionId":"invoice:1:a",
                 "startTime":"2024-01-01T10:00:00.000+0000",
                 "endTime":"2024-01-01T10:00:05.000+0000"},
                {"id":"pi-2","processDefinitionId":"invoice:1:a",
                 "startTime":"2024-01-01T11:00:00.000+0000"},
                {"id":"pi-3","processDefinitionId":"unknown:1:x",
                 "startTime":"2024-01-01T12:00:00.000+0000",
                 "endTime":"2024-01-01T12:00:01.000+0000"}
            ]"#,
        );

        let mut settings = Settings::default();
        settings.import.max_page_size = 1;
        let summary = run_import(&settings, input.path(), output.path(), None)
            .await
            .unwrap();

        let completed = summary.entity(EntityType::CompletedProcessInstance).unwrap();
        assert_eq!(completed.pages, 2);
        assert_eq!(completed.stats.received, 2);
        assert_eq!(completed.stats.dropped, 1);
        assert_eq!(completed.stats.submitted, 1);
        assert_eq!(summary.cursor_resets, 0);

        let documents = read_lines(output.path(), EntityType::CompletedProcessInstance);
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["processDefinitionKey"], "invoice");
        assert_eq!(documents[0]["duration"], 5000);

        let running = read_lines(output.path(), EntityType::RunningProcessInstance);
        assert_eq!(running.len(), 1);
        assert_eq!(running[0]["processInstanceId"], "pi-2");

        let cursors = read_lines(output.path(), EntityType::ImportIndex);
        assert_eq!(cursors.len(), EntityType::ALL.len() - 1);
    }

    #[tokio::test]
    async fn test_batch_suspension_reimports_running_instances() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(
            input.path(),
            "process_definitions.json",
            r#"[{"id":"invoice:1:a","key":"invoice","version":1}]"#,
        );
        write(
            input.path(),
            "process_instances.json",
            r#"[{"id":"pi-1","processDefinitionId":"invoice:1:a",
                 "startTime":"2024-01-01T10:00:00.000+0000"}]"#,
        );
        write(
            input.path(),
            "user_operation_logs.json",
            r#"[{"id":"op-1","operationType":"SuspendProcessDefinition",
                 "entityType":"ProcessDefinition","processDefinitionId":"invoice:1:a",
                 "processDefinitionKey":"invoice",
                 "timestamp":"2024-01-02T00:00:00.000+0000"}]"#,
        );

        let summary = run_import(&Settings::default(), input.path(), output.path(), None)
            .await
            .unwrap();

        assert_eq!(summary.cursor_resets, 1);
        let operations = summary.entity(EntityType::UserOperationLog).unwrap();
        assert_eq!(operations.stats.submitted, 0);
        assert!(read_lines(output.path(), EntityType::UserOperationLog).is_empty());

        let running = summary.entity(EntityType::RunningProcessInstance).unwrap();
        assert_eq!(running.pages, 2);
        assert_eq!(read_lines(output.path(), EntityType::RunningProcessInstance).len(), 2);
    }

    #[tokio::test]
    async fn test_run_import_rejects_missing_input() {
        let output = tempfile::tempdir().unwrap();
        let result = run_import(
            &Settings::default(),
            Path::new("/nonexistent/history"),
            output.path(),
            None,
        )
        .await;
        assert!(result.is_err());
    }
}
