//! 课表查询与修改
//!
//! 所有修改先取得相关班级的写锁，存储层在事务内重新读取课表后再写回。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

use super::ClassService;
use crate::models::classes::{
    entities::MakeupLifetime,
    requests::{AvailabilityQuery, MakeupRequest, SlotCell},
    responses::{AvailabilityResponse, MakeupBookedResponse, OccupiedCell, ScheduleResponse},
    schedule::{CombinedAvailability, Slot, SlotRecord, WeeklySchedule},
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, error_response, not_found, schedule_error_response};
use crate::try_response;

/// 单次补课预约最多涉及的班级数
const MAX_MAKEUP_CLASSES: usize = 20;

/// 把请求中的时段记录转换为课表，拒绝未知类型与重复时段
pub(crate) fn schedule_from_records(
    records: Vec<SlotRecord>,
) -> Result<WeeklySchedule, HttpResponse> {
    let slots = records
        .into_iter()
        .map(Slot::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::ScheduleInvalid, e))
        })?;
    WeeklySchedule::from_slots(slots).map_err(schedule_error_response)
}

/// 去掉尚未被清理的过期补课后生成响应
fn schedule_response(
    class_id: i64,
    schedule: WeeklySchedule,
    now: DateTime<Utc>,
    ttl: TimeDelta,
) -> ScheduleResponse {
    let (schedule, _) = schedule.prune_expired(now, ttl);
    ScheduleResponse {
        class_id,
        makeup_slots: MakeupLifetime::for_schedule(&schedule, now, ttl),
        schedule: schedule.into_slots().into_iter().map(SlotRecord::from).collect(),
    }
}

pub async fn get_schedule(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let options = service.schedule_options();
    let class = match storage.get_class_by_id(class_id).await {
        Ok(Some(class)) => class,
        Ok(None) => return Ok(not_found(ErrorCode::ClassNotFound, "Class not found")),
        Err(e) => return Ok(error_response(e)),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        schedule_response(class.id, class.schedule, Utc::now(), options.makeup_ttl),
        "Class schedule retrieved successfully",
    )))
}

pub async fn availability(
    service: &ClassService,
    request: &HttpRequest,
    query: AvailabilityQuery,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let options = service.schedule_options();
    let class_ids = try_response!(query.parse_ids().map_err(bad_request));

    let schedules = match storage.get_class_schedules(&class_ids, options.strict).await {
        Ok(Ok(schedules)) => schedules,
        Ok(Err(e)) => return Ok(schedule_error_response(e)),
        Err(e) => return Ok(error_response(e)),
    };

    let now = Utc::now();
    let schedules: Vec<(i64, WeeklySchedule)> = schedules
        .into_iter()
        .map(|(id, schedule)| (id, schedule.prune_expired(now, options.makeup_ttl).0))
        .collect();
    let combined = CombinedAvailability::from_schedules(schedules.iter().map(|(id, s)| (*id, s)));

    let response = AvailabilityResponse {
        class_ids,
        free: combined
            .free_cells()
            .into_iter()
            .map(|(day, hour)| SlotCell { day, hour })
            .collect(),
        occupied: combined
            .occupied_cells()
            .map(|((day, hour), class_ids)| OccupiedCell {
                day: *day,
                hour: *hour,
                class_ids: class_ids.clone(),
            })
            .collect(),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Availability retrieved successfully",
    )))
}

pub async fn book_makeup(
    service: &ClassService,
    request: &HttpRequest,
    makeup: MakeupRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let options = service.schedule_options();

    let mut class_ids = makeup.class_ids;
    class_ids.sort_unstable();
    class_ids.dedup();
    if class_ids.is_empty() || class_ids.iter().any(|id| *id <= 0) {
        return Ok(bad_request("class_ids must contain valid class ids"));
    }
    if class_ids.len() > MAX_MAKEUP_CLASSES {
        return Ok(bad_request(format!(
            "At most {MAX_MAKEUP_CLASSES} classes can be booked at once"
        )));
    }
    if makeup.slots.is_empty() {
        return Ok(bad_request("At least one slot is required"));
    }
    let cells: Vec<_> = makeup.slots.iter().map(SlotCell::as_tuple).collect();

    let _guard = service.locks().acquire(&class_ids).await;
    let now = Utc::now();
    match storage
        .book_makeup_slots(&class_ids, &cells, now, options)
        .await
    {
        Ok(Ok(_)) => {
            info!(
                "Booked {} makeup slots for classes {:?}",
                cells.len(),
                class_ids
            );
            let response = MakeupBookedResponse {
                class_ids,
                slots: makeup.slots,
                created_at: now,
                expires_at: now + options.makeup_ttl,
            };
            Ok(HttpResponse::Created().json(ApiResponse::success(
                response,
                "Makeup slots booked successfully",
            )))
        }
        Ok(Err(e)) => Ok(schedule_error_response(e)),
        Err(e) => Ok(error_response(e)),
    }
}

pub async fn add_slot(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
    cell: SlotCell,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let options = service.schedule_options();

    let _guard = service.locks().acquire(&[class_id]).await;
    match storage
        .add_class_slot(class_id, cell.day, cell.hour, options)
        .await
    {
        Ok(Ok(schedule)) => {
            info!("Added slot {} {} to class {}", cell.day, cell.hour, class_id);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                schedule_response(class_id, schedule, Utc::now(), options.makeup_ttl),
                "Slot added successfully",
            )))
        }
        Ok(Err(e)) => Ok(schedule_error_response(e)),
        Err(e) => Ok(error_response(e)),
    }
}

pub async fn remove_slot(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
    cell: SlotCell,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let options = service.schedule_options();

    let _guard = service.locks().acquire(&[class_id]).await;
    match storage
        .remove_class_slot(class_id, cell.day, cell.hour, options)
        .await
    {
        Ok(Ok(schedule)) => {
            info!(
                "Removed slot {} {} from class {}",
                cell.day, cell.hour, class_id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                schedule_response(class_id, schedule, Utc::now(), options.makeup_ttl),
                "Slot removed successfully",
            )))
        }
        Ok(Err(e)) => Ok(schedule_error_response(e)),
        Err(e) => Ok(error_response(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    fn record(day: &str, hour: &str) -> SlotRecord {
        serde_json::from_value(serde_json::json!({ "day": day, "hour": hour })).unwrap()
    }

    #[test]
    fn test_schedule_from_records() {
        let schedule = schedule_from_records(vec![
            record("Monday", "09:00-09:45"),
            record("Salı", "09:00-09:45"),
        ])
        .unwrap();
        assert_eq!(schedule.len(), 2);

        let duplicate = schedule_from_records(vec![
            record("Monday", "09:00-09:45"),
            record("Pazartesi", "09:00-09:45"),
        ])
        .unwrap_err();
        assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unknown_slot_type_is_rejected() {
        let record: SlotRecord = serde_json::from_value(serde_json::json!({
            "day": "Monday",
            "hour": "09:00-09:45",
            "type": "holiday"
        }))
        .unwrap();
        let err = schedule_from_records(vec![record]).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
