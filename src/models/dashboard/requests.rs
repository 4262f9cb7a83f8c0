use serde::Deserialize;
use ts_rs::TS;

// 导出参数
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct ExportParams {
    #[serde(rename = "type")]
    pub export_type: ExportType,
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub enum ExportType {
    Students,
    Teachers,
    Classes,
}

impl ExportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportType::Students => "students",
            ExportType::Teachers => "teachers",
            ExportType::Classes => "classes",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}
