//! 列表导出（CSV / XLSX）

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Local;
use rust_xlsxwriter::{Format, Workbook};
use tracing::{error, info};

use super::DashboardService;
use crate::models::ErrorCode;
use crate::models::classes::entities::ClassSummary;
use crate::models::dashboard::requests::{ExportFormat, ExportParams, ExportType};
use crate::models::students::entities::StudentDetail;
use crate::models::users::entities::TeacherWithClasses;
use crate::models::ApiResponse;
use crate::services::error_response;
use crate::try_response;

/// 导出的表格
#[derive(Debug, Default)]
pub(crate) struct ExportTable {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

fn join_codes<'a>(codes: impl Iterator<Item = &'a str>) -> String {
    codes.collect::<Vec<_>>().join(", ")
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

pub(crate) fn students_table(students: &[StudentDetail]) -> ExportTable {
    ExportTable {
        headers: vec![
            "id",
            "student_number",
            "first_name",
            "last_name",
            "email",
            "phone",
            "birth_date",
            "classes",
            "photos",
            "active",
        ],
        rows: students
            .iter()
            .map(|detail| {
                let s = &detail.student;
                vec![
                    s.id.to_string(),
                    s.student_number.clone(),
                    s.first_name.clone(),
                    s.last_name.clone(),
                    s.email.clone().unwrap_or_default(),
                    s.phone.clone().unwrap_or_default(),
                    s.birth_date.clone().unwrap_or_default(),
                    join_codes(detail.classes.iter().map(|c| c.class_code.as_str())),
                    detail.photos.len().to_string(),
                    yes_no(s.is_active),
                ]
            })
            .collect(),
    }
}

pub(crate) fn teachers_table(teachers: &[TeacherWithClasses]) -> ExportTable {
    ExportTable {
        headers: vec![
            "id",
            "username",
            "full_name",
            "email",
            "phone",
            "classes",
            "last_login",
            "active",
        ],
        rows: teachers
            .iter()
            .map(|teacher| {
                let u = &teacher.user;
                vec![
                    u.id.to_string(),
                    u.username.clone(),
                    u.full_name.clone(),
                    u.email.clone(),
                    u.phone.clone().unwrap_or_default(),
                    join_codes(teacher.classes.iter().map(|c| c.class_code.as_str())),
                    u.last_login.map(|t| t.to_rfc3339()).unwrap_or_default(),
                    yes_no(u.is_active),
                ]
            })
            .collect(),
    }
}

pub(crate) fn classes_table(classes: &[ClassSummary]) -> ExportTable {
    ExportTable {
        headers: vec![
            "id",
            "class_name",
            "class_code",
            "description",
            "max_absences",
            "students",
            "teachers",
            "weekly_slots",
        ],
        rows: classes
            .iter()
            .map(|summary| {
                let c = &summary.class;
                vec![
                    c.id.to_string(),
                    c.class_name.clone(),
                    c.class_code.clone(),
                    c.description.clone().unwrap_or_default(),
                    c.max_absences.to_string(),
                    summary.student_count.to_string(),
                    join_codes(summary.teachers.iter().map(|t| t.full_name.as_str())),
                    c.schedule.len().to_string(),
                ]
            })
            .collect(),
    }
}

pub(crate) fn render_csv(table: &ExportTable) -> Result<Vec<u8>, String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(&table.headers)
        .map_err(|e| format!("CSV 写入失败: {e}"))?;
    for row in &table.rows {
        wtr.write_record(row)
            .map_err(|e| format!("CSV 写入失败: {e}"))?;
    }
    wtr.into_inner().map_err(|e| format!("CSV 生成失败: {e}"))
}

pub(crate) fn render_xlsx(table: &ExportTable, sheet: &str) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet)
        .map_err(|e| format!("XLSX 写入失败: {e}"))?;

    let header_format = Format::new().set_bold();
    for (col, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(|e| format!("XLSX 写入失败: {e}"))?;
    }
    for (row, values) in table.rows.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            worksheet
                .write_string((row + 1) as u32, col as u16, value)
                .map_err(|e| format!("XLSX 写入失败: {e}"))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| format!("XLSX 生成失败: {e}"))
}

pub async fn export(
    service: &DashboardService,
    request: &HttpRequest,
    params: ExportParams,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    let table = match params.export_type {
        ExportType::Students => storage.list_all_students().await.map(|s| students_table(&s)),
        ExportType::Teachers => storage.list_all_teachers().await.map(|t| teachers_table(&t)),
        ExportType::Classes => storage.list_all_classes().await.map(|c| classes_table(&c)),
    };
    let table = match table {
        Ok(table) => table,
        Err(e) => return Ok(error_response(e)),
    };

    let rendered = match params.format {
        ExportFormat::Csv => render_csv(&table),
        ExportFormat::Xlsx => render_xlsx(&table, params.export_type.as_str()),
    };
    let body = match rendered {
        Ok(body) => body,
        Err(e) => {
            error!("Export of {} failed: {}", params.export_type.as_str(), e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::ExportFailed,
                    "Export failed",
                )),
            );
        }
    };

    let filename = format!(
        "{}_{}.{}",
        params.export_type.as_str(),
        Local::now().format("%Y%m%d"),
        params.format.extension()
    );
    info!("Exported {} {} rows", table.rows.len(), params.export_type.as_str());

    Ok(HttpResponse::Ok()
        .content_type(params.format.content_type())
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ExportTable {
        ExportTable {
            headers: vec!["id", "name"],
            rows: vec![
                vec!["1".to_string(), "Ayşe, Yılmaz".to_string()],
                vec!["2".to_string(), "Ali".to_string()],
            ],
        }
    }

    #[test]
    fn test_render_csv_quotes_commas() {
        let body = String::from_utf8(render_csv(&table()).unwrap()).unwrap();
        assert_eq!(body, "id,name\n1,\"Ayşe, Yılmaz\"\n2,Ali\n");
    }

    #[test]
    fn test_render_xlsx_is_zip() {
        let body = render_xlsx(&table(), "students").unwrap();
        assert_eq!(&body[..2], b"PK");
    }

    #[test]
    fn test_empty_export_has_headers() {
        let table = classes_table(&[]);
        assert!(table.rows.is_empty());
        let body = String::from_utf8(render_csv(&table).unwrap()).unwrap();
        assert!(body.starts_with("id,class_name,class_code"));
    }
}
