// ==========================================
// 产品数据导入 - 导入流程编排
// ==========================================
// 状态: Start → FileCheck → (Reject | StreamRows) → Done
// 流程: 解析 → 校验 → 比对落库，逐行处理，单行失败不中断
// ==========================================

use crate::config::ImportSettings;
use crate::domain::{ReconcilePolicy, RowOutcome, RunMode};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::existing_index::ExistingIndex;
use crate::importer::importer_trait::ProductImporter;
use crate::importer::reconciler::Reconciler;
use crate::importer::record_parser::{ParsedRow, RecordParser};
use crate::importer::report::{self, ImportSummary, RunStatus};
use crate::importer::validator::{ValidationFailure, ValidationVerdict, Validator};
use crate::repository::ProductStore;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};

// ==========================================
// ImportRunner - 导入流程编排器
// ==========================================
pub struct ImportRunner<'s, S: ProductStore> {
    store: &'s S,
    settings: ImportSettings,
    mode: RunMode,
}

impl<'s, S: ProductStore> ImportRunner<'s, S> {
    /// 创建新的 ImportRunner 实例
    ///
    /// # 参数
    /// - store: 存储协作方
    /// - settings: 导入参数（校验阈值、文件根目录、比对策略）
    /// - mode: 正式 / 预览
    pub fn new(store: &'s S, settings: ImportSettings, mode: RunMode) -> Self {
        Self {
            store,
            settings,
            mode,
        }
    }

    /// 以指定时间戳执行一次导入（addedAt / updatedAt / discontinuedAt 均取该值）
    #[instrument(skip(self, out), fields(policy = %self.settings.policy, mode = ?self.mode))]
    pub fn run_at<W: Write>(
        &self,
        file_name: &str,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> ImportResult<ImportSummary> {
        for line in report::BANNER {
            write_line(out, line)?;
        }
        write_line(out, &format!("File Name: {}", file_name))?;
        write_line(out, "")?;

        if self.mode.is_dry_run() {
            write_line(out, report::PREVIEW_NOTICE)?;
            write_line(out, "")?;
        }

        // === FileCheck ===
        let path = self.settings.resolve_file(file_name);
        if let Err(e) = RecordParser::check_file(&path) {
            warn!(path = %path.display(), error = %e, "文件检查未通过");
            write_line(out, report::FILE_REJECTED)?;
            return Ok(ImportSummary::with_status(RunStatus::FileRejected));
        }

        let summary = self.stream_rows(&path, now, out)?;

        info!(
            status = ?summary.status,
            total = summary.total_rows,
            inserted = summary.inserted,
            updated = summary.updated,
            duplicates = summary.duplicates,
            invalid = summary.invalid,
            malformed = summary.malformed,
            storage_failures = summary.storage_failures,
            previewed = summary.previewed,
            "产品数据导入完成"
        );
        Ok(summary)
    }

    /// StreamRows: 首行丢弃，其余逐行处理直至文件结束
    fn stream_rows<W: Write>(
        &self,
        path: &Path,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> ImportResult<ImportSummary> {
        let rows = match RecordParser::open(path) {
            Ok(rows) => rows,
            // 检查通过后文件被移走或改名，仍按文件检查失败处理
            Err(e) if e.is_file_check() => {
                warn!(path = %path.display(), error = %e, "文件检查未通过");
                write_line(out, report::FILE_REJECTED)?;
                return Ok(ImportSummary::with_status(RunStatus::FileRejected));
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "文件打开失败");
                write_line(out, report::FILE_UNOPENABLE)?;
                return Ok(ImportSummary::with_status(RunStatus::Aborted));
            }
        };

        // 索引只在运行开始时加载一次
        let mut index = match ExistingIndex::build(self.store) {
            Ok(index) => index,
            Err(e) => {
                error!(error = %e, "已存在记录加载失败");
                write_line(out, &e.to_string())?;
                return Ok(ImportSummary::with_status(RunStatus::Aborted));
            }
        };
        info!(path = %path.display(), existing = index.len(), "开始导入产品数据");

        let validator = Validator::new(&self.settings);
        let reconciler = Reconciler::new(self.store, self.settings.policy);
        let mut summary = ImportSummary::default();

        for row in rows {
            match row {
                Ok(ParsedRow::Malformed(malformed)) => {
                    warn!(
                        row_number = malformed.row_number,
                        field_count = malformed.field_count,
                        "字段数不符，跳过"
                    );
                    write_line(out, &report::malformed_line(&malformed))?;
                    summary.record(malformed.row_number, None, RowOutcome::Malformed);
                }
                Ok(ParsedRow::Candidate(candidate)) => {
                    let known_codes = match self.settings.policy {
                        ReconcilePolicy::RejectDuplicates => Some(&index),
                        ReconcilePolicy::Upsert => None,
                    };
                    let verdict = validator.validate(candidate, known_codes);
                    let row_number = verdict.candidate.row_number;
                    let code = verdict.candidate.code.clone();
                    let outcome = self.handle_verdict(verdict, &reconciler, &mut index, now, out)?;
                    summary.record(row_number, Some(&code), outcome);
                }
                Err(e) => {
                    warn!(error = %e, "行读取失败，跳过");
                    write_line(out, &format!("Unable to read the row: {}", e))?;
                    summary.record(0, None, RowOutcome::Malformed);
                }
            }
        }

        write_line(out, "")?;
        write_line(out, &summary.to_string())?;
        Ok(summary)
    }

    /// 单行: 校验结论 → 诊断输出 / 比对落库
    fn handle_verdict<W: Write>(
        &self,
        verdict: ValidationVerdict,
        reconciler: &Reconciler<'_, S>,
        index: &mut ExistingIndex,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> ImportResult<RowOutcome> {
        let candidate = &verdict.candidate;

        if !verdict.is_valid() {
            for failure in &verdict.failures {
                write_line(
                    out,
                    &report::product_failure_line(&candidate.name, &candidate.code, failure),
                )?;
            }
            warn!(
                row_number = candidate.row_number,
                code = %candidate.code,
                failures = verdict.failures.len(),
                "校验未通过，跳过"
            );
            return Ok(if verdict.is_duplicate() {
                RowOutcome::Duplicate
            } else {
                RowOutcome::Invalid
            });
        }

        let (name, code, row_number) = (
            candidate.name.clone(),
            candidate.code.clone(),
            candidate.row_number,
        );
        let Some(product) = verdict.into_product() else {
            return Err(ImportError::InternalError(format!(
                "行 {} 校验通过但缺少产品数据",
                row_number
            )));
        };

        if self.mode.is_dry_run() {
            debug!(row_number, code = %code, "预览模式，跳过落库");
            return Ok(reconciler.preview(&product, index));
        }

        match reconciler.reconcile(&product, index, now) {
            Ok(RowOutcome::Duplicate) => {
                write_line(
                    out,
                    &report::product_failure_line(
                        &name,
                        &code,
                        ValidationFailure::DuplicateCode,
                    ),
                )?;
                Ok(RowOutcome::Duplicate)
            }
            Ok(outcome) => {
                debug!(row_number, code = %code, outcome = %outcome, "行处理完成");
                Ok(outcome)
            }
            Err(e) => {
                // 两种策略统一: 写库失败只影响当前行
                error!(row_number, code = %code, error = %e, "产品记录写入失败");
                write_line(out, &report::product_failure_line(&name, &code, &e))?;
                Ok(RowOutcome::StorageFailed)
            }
        }
    }
}

impl<'s, S: ProductStore> ProductImporter for ImportRunner<'s, S> {
    fn import_file<W: Write>(&self, file_name: &str, out: &mut W) -> ImportResult<ImportSummary> {
        self.run_at(file_name, Utc::now(), out)
    }
}

fn write_line<W: Write>(out: &mut W, line: &str) -> ImportResult<()> {
    writeln!(out, "{}", line).map_err(|e| ImportError::ReportWriteError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewProduct, StoredRecord};
    use crate::repository::{ProductRepositoryImpl, RepositoryError, RepositoryResult};
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn create_test_repo() -> ProductRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        ProductRepositoryImpl::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn write_csv(dir: &TempDir, name: &str, rows: &[&str]) -> String {
        let mut content = String::from("code,name,description,stock,cost,discontinued\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        std::fs::write(dir.path().join(name), content).unwrap();
        name.to_string()
    }

    fn settings_for(dir: &TempDir, policy: ReconcilePolicy) -> ImportSettings {
        ImportSettings {
            file_root: dir.path().to_path_buf(),
            policy,
            ..ImportSettings::default()
        }
    }

    fn run<S: ProductStore>(
        repo: &S,
        settings: ImportSettings,
        mode: RunMode,
        file: &str,
    ) -> (ImportSummary, String) {
        let mut out = Vec::new();
        let summary = ImportRunner::new(repo, settings, mode)
            .import_file(file, &mut out)
            .unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_banner_and_file_name_printed() {
        let dir = TempDir::new().unwrap();
        let repo = create_test_repo();
        let file = write_csv(&dir, "stock.csv", &[]);

        let (summary, output) = run(
            &repo,
            settings_for(&dir, ReconcilePolicy::Upsert),
            RunMode::DryRun,
            &file,
        );

        assert_eq!(summary.status, RunStatus::Completed);
        assert!(output.starts_with("Import Product Data\n====================\nFile Name: stock.csv\n\nRuns in test mode\n"));
    }

    #[test]
    fn test_missing_file_rejected_before_any_row() {
        let dir = TempDir::new().unwrap();
        let repo = create_test_repo();

        let (summary, output) = run(
            &repo,
            settings_for(&dir, ReconcilePolicy::Upsert),
            RunMode::Live,
            "missing.csv",
        );

        assert_eq!(summary.status, RunStatus::FileRejected);
        assert_eq!(summary.total_rows, 0);
        assert!(output.contains(report::FILE_REJECTED));
        assert!(!output.contains("Processed"));
    }

    #[test]
    fn test_wrong_extension_rejected() {
        let dir = TempDir::new().unwrap();
        let repo = create_test_repo();
        std::fs::write(dir.path().join("stock.txt"), "h\nA1,Widget,A fine widget,50,9.99,no\n")
            .unwrap();

        let (summary, _) = run(
            &repo,
            settings_for(&dir, ReconcilePolicy::Upsert),
            RunMode::Live,
            "stock.txt",
        );

        assert_eq!(summary.status, RunStatus::FileRejected);
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_row_failures_do_not_abort_run() {
        let dir = TempDir::new().unwrap();
        let repo = create_test_repo();
        let file = write_csv(
            &dir,
            "mixed.csv",
            &[
                "A1,Widget,A fine widget,50",
                "A2,Gizmo,Small gizmo,4,9.99,no",
                "A3,Gadget,Shiny gadget,20,15.00,no",
            ],
        );

        let (summary, output) = run(
            &repo,
            settings_for(&dir, ReconcilePolicy::Upsert),
            RunMode::Live,
            &file,
        );

        assert_eq!(summary.malformed, 1);
        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.inserted, 1);
        assert_eq!(repo.count().unwrap(), 1);
        assert!(output.contains("Reason: => Product details are missing"));
        assert!(output.contains(
            "Unable to parse the product: Name => Gizmo, Code: A2, Reason: => Stock may be empty, invalid or less than 10"
        ));
    }

    #[test]
    fn test_dry_run_reports_duplicates_within_file() {
        let dir = TempDir::new().unwrap();
        let repo = create_test_repo();
        let file = write_csv(
            &dir,
            "dups.csv",
            &[
                "A1,Widget,A fine widget,50,9.99,no",
                "A1,Widget,Another widget,60,9.99,no",
            ],
        );

        let (summary, output) = run(
            &repo,
            settings_for(&dir, ReconcilePolicy::RejectDuplicates),
            RunMode::DryRun,
            &file,
        );

        assert_eq!(summary.previewed, 1);
        assert_eq!(summary.duplicates, 1);
        assert!(output.contains("Reason: => Duplicate product code"));
        assert_eq!(repo.count().unwrap(), 0);
    }

    /// 对指定 code 的写入始终失败，其余委托给 SQLite 实现
    struct FailingStore {
        inner: ProductRepositoryImpl,
        failing_code: &'static str,
    }

    impl FailingStore {
        fn check(&self, record: &StoredRecord) -> RepositoryResult<()> {
            if record.code == self.failing_code {
                return Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()));
            }
            Ok(())
        }
    }

    impl ProductStore for FailingStore {
        fn find_all(&self) -> RepositoryResult<Vec<StoredRecord>> {
            self.inner.find_all()
        }

        fn find_by_code(&self, code: &str) -> RepositoryResult<Option<StoredRecord>> {
            self.inner.find_by_code(code)
        }

        fn create(&self, record: &StoredRecord) -> RepositoryResult<StoredRecord> {
            self.check(record)?;
            self.inner.create(record)
        }

        fn update(&self, record: &StoredRecord) -> RepositoryResult<()> {
            self.check(record)?;
            self.inner.update(record)
        }

        fn count(&self) -> RepositoryResult<usize> {
            self.inner.count()
        }
    }

    fn assert_failed_row_skipped(summary: &ImportSummary, output: &str, store: &FailingStore) {
        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.storage_failures, 1);
        assert!(output.contains(
            "Unable to parse the product: Name => Widget, Code: A1, Reason: => 数据库查询失败: disk I/O error"
        ));
        assert!(store.inner.find_by_code("B2").unwrap().is_some());
    }

    #[test]
    fn test_storage_failure_on_insert_continues_with_upsert() {
        let dir = TempDir::new().unwrap();
        let store = FailingStore {
            inner: create_test_repo(),
            failing_code: "A1",
        };
        let file = write_csv(
            &dir,
            "stock.csv",
            &[
                "A1,Widget,A fine widget,50,9.99,no",
                "B2,Gadget,Shiny,20,15.00,no",
            ],
        );

        let (summary, output) = run(
            &store,
            settings_for(&dir, ReconcilePolicy::Upsert),
            RunMode::Live,
            &file,
        );

        assert_failed_row_skipped(&summary, &output, &store);
        assert_eq!(summary.inserted, 1);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_storage_failure_on_update_keeps_stored_record() {
        let dir = TempDir::new().unwrap();
        let store = FailingStore {
            inner: create_test_repo(),
            failing_code: "A1",
        };
        let seeded = NewProduct {
            code: "A1".to_string(),
            name: "Widget".to_string(),
            description: "A fine widget".to_string(),
            stock: 50,
            price: Decimal::new(999, 2),
            discontinued: false,
        };
        store
            .inner
            .create(&StoredRecord::from_new(&seeded, Utc::now()))
            .unwrap();
        let file = write_csv(
            &dir,
            "stock.csv",
            &[
                "A1,Widget,A fine widget,80,9.99,no",
                "B2,Gadget,Shiny,20,15.00,no",
            ],
        );

        let (summary, output) = run(
            &store,
            settings_for(&dir, ReconcilePolicy::Upsert),
            RunMode::Live,
            &file,
        );

        assert_failed_row_skipped(&summary, &output, &store);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.inserted, 1);
        assert_eq!(store.inner.find_by_code("A1").unwrap().unwrap().stock, 50);
    }

    #[test]
    fn test_storage_failure_continues_with_reject_duplicates() {
        let dir = TempDir::new().unwrap();
        let store = FailingStore {
            inner: create_test_repo(),
            failing_code: "A1",
        };
        let file = write_csv(
            &dir,
            "stock.csv",
            &[
                "A1,Widget,A fine widget,50,9.99,no",
                "B2,Gadget,Shiny,20,15.00,no",
            ],
        );

        let (summary, output) = run(
            &store,
            settings_for(&dir, ReconcilePolicy::RejectDuplicates),
            RunMode::Live,
            &file,
        );

        assert_failed_row_skipped(&summary, &output, &store);
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.duplicates, 0);
        assert_eq!(store.count().unwrap(), 1);
    }
}
