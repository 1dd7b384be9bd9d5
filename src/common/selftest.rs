//! 自检结果

use crate::common::errors::{Error, Result};

/// 一次成功自检的报告
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelfTestReport {
    /// 算法名称
    pub algorithm: &'static str,
    /// 通过的用例数
    pub cases: usize,
    /// 详细诊断信息，仅在 verbose 模式下填充
    pub log: Vec<String>,
}

/// 自检过程中逐条记录用例结果
pub(crate) struct SelfTest {
    report: SelfTestReport,
    verbose: bool,
}

impl SelfTest {
    pub(crate) fn new(algorithm: &'static str, verbose: bool) -> Self {
        Self {
            report: SelfTestReport {
                algorithm,
                ..Default::default()
            },
            verbose,
        }
    }

    /// 记录一个用例；`passed` 为 false 时立即返回错误
    pub(crate) fn check(&mut self, label: &str, passed: bool) -> Result<()> {
        let case = self.report.cases + 1;
        if !passed {
            log::warn!("{} self test #{} ({}) failed", self.report.algorithm, case, label);
            return Err(Error::SelfTestFailed {
                algorithm: self.report.algorithm,
                case,
            });
        }
        if self.verbose {
            let line = format!("  {} test #{} ({}): passed", self.report.algorithm, case, label);
            log::info!("{}", line.trim_start());
            self.report.log.push(line);
        }
        self.report.cases = case;
        Ok(())
    }

    pub(crate) fn finish(self) -> SelfTestReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_records_lines() {
        let mut st = SelfTest::new("DEMO", true);
        st.check("first", true).unwrap();
        st.check("second", true).unwrap();
        let report = st.finish();

        assert_eq!(report.cases, 2);
        assert_eq!(report.log.len(), 2);
        assert!(report.log[1].contains("DEMO test #2 (second): passed"));
    }

    #[test]
    fn test_quiet_mode_keeps_log_empty() {
        let mut st = SelfTest::new("DEMO", false);
        st.check("only", true).unwrap();
        assert!(st.finish().log.is_empty());
    }

    #[test]
    fn test_failure_reports_case_number() {
        let mut st = SelfTest::new("DEMO", false);
        st.check("ok", true).unwrap();
        let err = st.check("broken", false).unwrap_err();
        assert!(matches!(
            err,
            Error::SelfTestFailed {
                algorithm: "DEMO",
                case: 2
            }
        ));
    }
}
