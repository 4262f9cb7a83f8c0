//! 班级周课表
//!
//! 课表以 JSON 数组的形式存放在 `classes.weekly_schedule` 列中，
//! 每个元素为 `{ "day", "hour", "type"?, "created_at"? }`。
//! 读取时解析为强类型的 [`WeeklySchedule`]，写回时重新序列化。
//!
//! 补课时段（makeup）带有创建时间，超过保留期（默认 7 天）后由
//! [`WeeklySchedule::prune_expired`] 在下一次清理时移除。

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};
use ts_rs::TS;

/// 星期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// 前端界面使用的土耳其语名称
    pub fn local_name(&self) -> &'static str {
        match self {
            Weekday::Monday => "Pazartesi",
            Weekday::Tuesday => "Salı",
            Weekday::Wednesday => "Çarşamba",
            Weekday::Thursday => "Perşembe",
            Weekday::Friday => "Cuma",
            Weekday::Saturday => "Cumartesi",
            Weekday::Sunday => "Pazar",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let day = match normalized.as_str() {
            "monday" | "pazartesi" => Weekday::Monday,
            "tuesday" | "salı" | "sali" => Weekday::Tuesday,
            "wednesday" | "çarşamba" | "carsamba" => Weekday::Wednesday,
            "thursday" | "perşembe" | "persembe" => Weekday::Thursday,
            "friday" | "cuma" => Weekday::Friday,
            "saturday" | "cumartesi" => Weekday::Saturday,
            "sunday" | "pazar" => Weekday::Sunday,
            _ => return Err(format!("Invalid weekday: {s}")),
        };
        Ok(day)
    }
}

/// 存储与接口中统一写土耳其语名称，读取时英文也接受
impl Serialize for Weekday {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.local_name())
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 固定的 11 个上课时段
pub const HOUR_LABELS: [&str; 11] = [
    "09:00-09:45",
    "09:55-10:40",
    "10:50-11:35",
    "11:45-12:30",
    "12:40-13:25",
    "13:35-14:20",
    "14:30-15:15",
    "15:25-16:10",
    "16:20-17:05",
    "17:15-18:00",
    "18:00-19:00",
];

/// 上课时段，按一天中的先后顺序排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HourSlot(u8);

impl HourSlot {
    pub fn all() -> impl Iterator<Item = HourSlot> {
        (0..HOUR_LABELS.len() as u8).map(HourSlot)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        (index < HOUR_LABELS.len()).then_some(HourSlot(index as u8))
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn label(&self) -> &'static str {
        HOUR_LABELS[self.0 as usize]
    }
}

impl fmt::Display for HourSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for HourSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // 允许 "09:00 - 09:45" 这类带空格的写法
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        HOUR_LABELS
            .iter()
            .position(|label| *label == compact)
            .map(|i| HourSlot(i as u8))
            .ok_or_else(|| format!("Invalid hour slot: {s}"))
    }
}

impl Serialize for HourSlot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for HourSlot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 时段类型：常规课或补课
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Normal,
    Makeup { created_at: DateTime<Utc> },
}

/// 课表中的一个时段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SlotRecord", into = "SlotRecord")]
pub struct Slot {
    pub day: Weekday,
    pub hour: HourSlot,
    pub kind: SlotKind,
}

impl Slot {
    pub fn normal(day: Weekday, hour: HourSlot) -> Self {
        Self {
            day,
            hour,
            kind: SlotKind::Normal,
        }
    }

    pub fn makeup(day: Weekday, hour: HourSlot, created_at: DateTime<Utc>) -> Self {
        Self {
            day,
            hour,
            kind: SlotKind::Makeup { created_at },
        }
    }

    pub fn cell(&self) -> (Weekday, HourSlot) {
        (self.day, self.hour)
    }

    pub fn is_makeup(&self) -> bool {
        matches!(self.kind, SlotKind::Makeup { .. })
    }

    /// 补课时段的过期时间；常规时段返回 None
    pub fn expires_at(&self, ttl: TimeDelta) -> Option<DateTime<Utc>> {
        match self.kind {
            SlotKind::Normal => None,
            SlotKind::Makeup { created_at } => Some(created_at + ttl),
        }
    }

    /// 严格大于保留期才算过期
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        match self.kind {
            SlotKind::Normal => false,
            SlotKind::Makeup { created_at } => now.signed_duration_since(created_at) > ttl,
        }
    }
}

/// 课表时段的存储/传输格式
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct SlotRecord {
    #[ts(type = "string")]
    pub day: Weekday,
    #[ts(type = "string")]
    pub hour: HourSlot,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub slot_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub created_at: Option<String>,
}

const MAKEUP_TYPE: &str = "makeup";
const NORMAL_TYPE: &str = "normal";

/// 解析补课创建时间，兼容 RFC 3339 与 `YYYY-MM-DD HH:MM:SS`
fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

impl TryFrom<SlotRecord> for Slot {
    type Error = String;

    fn try_from(record: SlotRecord) -> Result<Self, Self::Error> {
        let kind = match record.slot_type.as_deref() {
            None | Some(NORMAL_TYPE) | Some("") => SlotKind::Normal,
            Some(MAKEUP_TYPE) => match record.created_at.as_deref().and_then(parse_created_at) {
                Some(created_at) => SlotKind::Makeup { created_at },
                None => {
                    // 没有可用的创建时间，无法计算过期，按常规时段保留
                    warn!(
                        "Makeup slot {} {} has no valid created_at, keeping it as a regular slot",
                        record.day, record.hour
                    );
                    SlotKind::Normal
                }
            },
            Some(other) => return Err(format!("Invalid slot type: {other}")),
        };

        Ok(Slot {
            day: record.day,
            hour: record.hour,
            kind,
        })
    }
}

impl From<Slot> for SlotRecord {
    fn from(slot: Slot) -> Self {
        match slot.kind {
            SlotKind::Normal => SlotRecord {
                day: slot.day,
                hour: slot.hour,
                slot_type: None,
                created_at: None,
            },
            SlotKind::Makeup { created_at } => SlotRecord {
                day: slot.day,
                hour: slot.hour,
                slot_type: Some(MAKEUP_TYPE.to_string()),
                created_at: Some(created_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            },
        }
    }
}

/// 跨班级冲突的具体位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct SlotConflict {
    pub class_id: i64,
    #[ts(type = "string")]
    pub day: Weekday,
    #[ts(type = "string")]
    pub hour: HourSlot,
}

/// 课表操作错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// 该时段已被占用
    Occupied { day: Weekday, hour: HourSlot },
    /// 提交的课表中出现重复时段
    Duplicate { day: Weekday, hour: HourSlot },
    /// 多班级合并课表中存在冲突
    Conflicts(Vec<SlotConflict>),
    /// 存储的课表无法解析
    Corrupted(String),
    /// 要删除的时段不存在
    SlotNotFound { day: Weekday, hour: HourSlot },
    /// 班级不存在或已停用
    UnknownClass(i64),
}

/// 外层为存储错误，内层为课表规则校验结果
pub type ScheduleOutcome<T> = crate::errors::Result<Result<T, ScheduleError>>;

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::Occupied { day, hour } => {
                write!(f, "Slot {day} {hour} is already occupied")
            }
            ScheduleError::Duplicate { day, hour } => {
                write!(f, "Slot {day} {hour} appears more than once")
            }
            ScheduleError::Conflicts(conflicts) => {
                let cells: Vec<String> = conflicts
                    .iter()
                    .map(|c| format!("class {} at {} {}", c.class_id, c.day, c.hour))
                    .collect();
                write!(f, "Slot conflicts: {}", cells.join(", "))
            }
            ScheduleError::Corrupted(msg) => write!(f, "Stored schedule is unreadable: {msg}"),
            ScheduleError::SlotNotFound { day, hour } => {
                write!(f, "Slot {day} {hour} is not in the schedule")
            }
            ScheduleError::UnknownClass(id) => write!(f, "Class {id} not found"),
        }
    }
}

impl std::error::Error for ScheduleError {}

impl From<ScheduleError> for crate::errors::AttendifyError {
    fn from(err: ScheduleError) -> Self {
        use crate::errors::AttendifyError;
        match err {
            ScheduleError::Occupied { .. } | ScheduleError::Conflicts(_) => {
                AttendifyError::conflict(err.to_string())
            }
            ScheduleError::Duplicate { .. } => AttendifyError::validation(err.to_string()),
            ScheduleError::Corrupted(_) => AttendifyError::schedule_corrupted(err.to_string()),
            ScheduleError::SlotNotFound { .. } | ScheduleError::UnknownClass(_) => {
                AttendifyError::not_found(err.to_string())
            }
        }
    }
}

/// 一个班级的周课表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklySchedule {
    slots: Vec<Slot>,
}

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由用户提交的时段构造课表，重复时段直接拒绝
    pub fn from_slots(slots: Vec<Slot>) -> Result<Self, ScheduleError> {
        let mut seen = HashSet::with_capacity(slots.len());
        for slot in &slots {
            if !seen.insert(slot.cell()) {
                return Err(ScheduleError::Duplicate {
                    day: slot.day,
                    hour: slot.hour,
                });
            }
        }
        Ok(Self { slots })
    }

    /// 解析数据库中的课表列；空值视为空课表
    ///
    /// 只有非 JSON 或非数组才算损坏；单个无法识别的时段记录会被跳过，
    /// 重复的时段只保留第一个。
    pub fn parse(raw: Option<&str>) -> Result<Self, ScheduleError> {
        let raw = match raw.map(str::trim) {
            None | Some("") | Some("null") => return Ok(Self::new()),
            Some(raw) => raw,
        };
        let records = serde_json::from_str::<Vec<serde_json::Value>>(raw)
            .map_err(|e| ScheduleError::Corrupted(e.to_string()))?;

        let mut seen = HashSet::with_capacity(records.len());
        let mut slots = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Slot>(record) {
                Ok(slot) => {
                    if seen.insert(slot.cell()) {
                        slots.push(slot);
                    } else {
                        debug!("Skipping duplicate schedule slot {} {}", slot.day, slot.hour);
                    }
                }
                Err(e) => debug!("Skipping unreadable schedule record #{}: {}", index, e),
            }
        }
        Ok(Self { slots })
    }

    /// 按解析策略读取课表
    ///
    /// 非严格模式下，无法解析的课表按空课表处理并记录警告。
    pub fn load(raw: Option<&str>, class_id: i64, strict: bool) -> Result<Self, ScheduleError> {
        match Self::parse(raw) {
            Ok(schedule) => Ok(schedule),
            Err(e) if strict => Err(e),
            Err(e) => {
                warn!(
                    "Class {} has an unreadable weekly schedule, treating it as empty: {}",
                    class_id, e
                );
                Ok(Self::new())
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.slots)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn into_slots(self) -> Vec<Slot> {
        self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_occupied(&self, day: Weekday, hour: HourSlot) -> bool {
        self.slots.iter().any(|s| s.day == day && s.hour == hour)
    }

    pub fn get(&self, day: Weekday, hour: HourSlot) -> Option<&Slot> {
        self.slots.iter().find(|s| s.day == day && s.hour == hour)
    }

    /// 添加时段；已被占用时返回冲突
    pub fn add_slot(
        &mut self,
        day: Weekday,
        hour: HourSlot,
        kind: SlotKind,
    ) -> Result<&Slot, ScheduleError> {
        if self.is_occupied(day, hour) {
            return Err(ScheduleError::Occupied { day, hour });
        }
        self.slots.push(Slot { day, hour, kind });
        Ok(&self.slots[self.slots.len() - 1])
    }

    /// 移除时段
    pub fn remove_slot(&mut self, day: Weekday, hour: HourSlot) -> Option<Slot> {
        let index = self
            .slots
            .iter()
            .position(|s| s.day == day && s.hour == hour)?;
        Some(self.slots.remove(index))
    }

    /// 去掉已过期的补课时段
    ///
    /// 返回过滤后的课表以及是否有变化。同一个 `now` 下重复调用结果不变。
    pub fn prune_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> (WeeklySchedule, bool) {
        let slots: Vec<Slot> = self
            .slots
            .iter()
            .filter(|s| !s.is_expired(now, ttl))
            .cloned()
            .collect();
        let changed = slots.len() != self.slots.len();
        (WeeklySchedule { slots }, changed)
    }

    pub fn makeup_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_makeup()).count()
    }
}

/// 多个班级合并后的占用情况
#[derive(Debug, Clone, Default)]
pub struct CombinedAvailability {
    occupied: BTreeMap<(Weekday, HourSlot), Vec<i64>>,
}

impl CombinedAvailability {
    /// 任一班级占用的时段即视为不可用
    pub fn from_schedules<'a, I>(schedules: I) -> Self
    where
        I: IntoIterator<Item = (i64, &'a WeeklySchedule)>,
    {
        let mut occupied: BTreeMap<(Weekday, HourSlot), Vec<i64>> = BTreeMap::new();
        for (class_id, schedule) in schedules {
            for slot in schedule.slots() {
                let owners = occupied.entry(slot.cell()).or_default();
                if !owners.contains(&class_id) {
                    owners.push(class_id);
                }
            }
        }
        Self { occupied }
    }

    pub fn is_available(&self, day: Weekday, hour: HourSlot) -> bool {
        !self.occupied.contains_key(&(day, hour))
    }

    /// 占用该时段的班级
    pub fn occupants(&self, day: Weekday, hour: HourSlot) -> &[i64] {
        self.occupied
            .get(&(day, hour))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn occupied_cells(&self) -> impl Iterator<Item = (&(Weekday, HourSlot), &Vec<i64>)> {
        self.occupied.iter()
    }

    /// 全部空闲时段，按星期、时段排序
    pub fn free_cells(&self) -> Vec<(Weekday, HourSlot)> {
        Weekday::ALL
            .iter()
            .flat_map(|day| HourSlot::all().map(move |hour| (*day, hour)))
            .filter(|(day, hour)| self.is_available(*day, *hour))
            .collect()
    }

    /// 检查请求的时段与哪些班级冲突
    pub fn conflicts(&self, cells: &[(Weekday, HourSlot)]) -> Vec<SlotConflict> {
        cells
            .iter()
            .flat_map(|(day, hour)| {
                self.occupants(*day, *hour)
                    .iter()
                    .map(move |class_id| SlotConflict {
                        class_id: *class_id,
                        day: *day,
                        hour: *hour,
                    })
            })
            .collect()
    }
}

/// 为多个班级同时预约补课
///
/// 所有请求的时段必须在所有班级的合并课表中空闲，否则整个请求失败且不修改任何课表。
pub fn book_makeup(
    schedules: &mut [(i64, WeeklySchedule)],
    cells: &[(Weekday, HourSlot)],
    now: DateTime<Utc>,
) -> Result<(), ScheduleError> {
    let mut seen = HashSet::with_capacity(cells.len());
    for (day, hour) in cells {
        if !seen.insert((*day, *hour)) {
            return Err(ScheduleError::Duplicate {
                day: *day,
                hour: *hour,
            });
        }
    }

    let availability =
        CombinedAvailability::from_schedules(schedules.iter().map(|(id, s)| (*id, s)));
    let conflicts = availability.conflicts(cells);
    if !conflicts.is_empty() {
        return Err(ScheduleError::Conflicts(conflicts));
    }

    for (_, schedule) in schedules.iter_mut() {
        for (day, hour) in cells {
            schedule.add_slot(*day, *hour, SlotKind::Makeup { created_at: now })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hour(label: &str) -> HourSlot {
        label.parse().unwrap()
    }

    fn week() -> TimeDelta {
        TimeDelta::days(7)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_weekday_parsing_accepts_local_names() {
        assert_eq!("Pazartesi".parse::<Weekday>().unwrap(), Weekday::Monday);
        assert_eq!("Salı".parse::<Weekday>().unwrap(), Weekday::Tuesday);
        assert_eq!("çarşamba".parse::<Weekday>().unwrap(), Weekday::Wednesday);
        assert_eq!("friday".parse::<Weekday>().unwrap(), Weekday::Friday);
        assert!("Funday".parse::<Weekday>().is_err());
    }

    #[test]
    fn test_hour_slot_labels() {
        assert_eq!(HourSlot::all().count(), 11);
        assert_eq!(hour("09:00 - 09:45").index(), 0);
        assert_eq!(hour("18:00-19:00").label(), "18:00-19:00");
        assert!("08:00-08:45".parse::<HourSlot>().is_err());
    }

    #[test]
    fn test_add_slot_conflict() {
        let mut schedule = WeeklySchedule::new();
        let h = hour("10:50-11:35");
        schedule
            .add_slot(Weekday::Monday, h, SlotKind::Normal)
            .unwrap();
        assert!(schedule.is_occupied(Weekday::Monday, h));

        let err = schedule
            .add_slot(
                Weekday::Monday,
                h,
                SlotKind::Makeup {
                    created_at: now(),
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            ScheduleError::Occupied {
                day: Weekday::Monday,
                hour: h
            }
        );
        assert_eq!(schedule.len(), 1);

        schedule
            .add_slot(Weekday::Tuesday, h, SlotKind::Normal)
            .unwrap();
        assert_eq!(schedule.len(), 2);
        assert!(schedule.get(Weekday::Tuesday, h).is_some());
    }

    #[test]
    fn test_remove_slot() {
        let mut schedule = WeeklySchedule::new();
        let h = hour("09:00-09:45");
        schedule
            .add_slot(Weekday::Friday, h, SlotKind::Normal)
            .unwrap();
        assert!(schedule.remove_slot(Weekday::Friday, h).is_some());
        assert!(schedule.remove_slot(Weekday::Friday, h).is_none());
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_prune_expiry_boundary() {
        let h1 = hour("09:00-09:45");
        let h2 = hour("09:55-10:40");
        let h3 = hour("10:50-11:35");
        let h4 = hour("11:45-12:30");
        let schedule = WeeklySchedule::from_slots(vec![
            Slot::normal(Weekday::Monday, h1),
            Slot::makeup(Weekday::Monday, h2, now() - week() - TimeDelta::seconds(1)),
            Slot::makeup(Weekday::Monday, h3, now() - TimeDelta::days(6)),
            Slot::makeup(Weekday::Monday, h4, now() - week()),
        ])
        .unwrap();

        let (pruned, changed) = schedule.prune_expired(now(), week());
        assert!(changed);
        assert_eq!(pruned.len(), 3);
        assert!(pruned.is_occupied(Weekday::Monday, h1));
        assert!(!pruned.is_occupied(Weekday::Monday, h2));
        assert!(pruned.is_occupied(Weekday::Monday, h3));
        // 恰好 7 天不算过期
        assert!(pruned.is_occupied(Weekday::Monday, h4));
    }

    #[test]
    fn test_prune_is_idempotent() {
        let schedule = WeeklySchedule::from_slots(vec![
            Slot::normal(Weekday::Monday, hour("09:00-09:45")),
            Slot::makeup(
                Weekday::Sunday,
                hour("18:00-19:00"),
                now() - TimeDelta::days(30),
            ),
        ])
        .unwrap();

        let (once, changed_once) = schedule.prune_expired(now(), week());
        let (twice, changed_twice) = once.prune_expired(now(), week());
        assert!(changed_once);
        assert!(!changed_twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_parse_legacy_json() {
        let raw = r#"[
            {"day":"Pazartesi","hour":"09:00-09:45"},
            {"day":"Salı","hour":"10:50-11:35","type":"makeup","created_at":"2025-03-08T10:00:00.000Z"},
            {"day":"Cuma","hour":"14:30-15:15","type":"makeup","created_at":"2025-03-01 08:30:00"}
        ]"#;
        let schedule = WeeklySchedule::parse(Some(raw)).unwrap();
        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule.makeup_count(), 2);
        assert!(!schedule.slots()[0].is_makeup());

        let (pruned, changed) = schedule.prune_expired(now(), week());
        assert!(changed);
        assert_eq!(pruned.len(), 2);
    }

    #[test]
    fn test_parse_empty_and_corrupted() {
        assert!(WeeklySchedule::parse(None).unwrap().is_empty());
        assert!(WeeklySchedule::parse(Some("  ")).unwrap().is_empty());
        assert!(WeeklySchedule::parse(Some("null")).unwrap().is_empty());
        assert!(matches!(
            WeeklySchedule::parse(Some("{not json")),
            Err(ScheduleError::Corrupted(_))
        ));

        assert!(WeeklySchedule::load(Some("{not json"), 1, false)
            .unwrap()
            .is_empty());
        assert!(WeeklySchedule::load(Some("{not json"), 1, true).is_err());
    }

    #[test]
    fn test_local_day_names_survive_rewrite() {
        let raw = r#"[{"day":"Pazartesi","hour":"09:00-09:45"},{"day":"friday","hour":"10:50-11:35"}]"#;
        let json = WeeklySchedule::parse(Some(raw)).unwrap().to_json().unwrap();
        assert_eq!(
            json,
            r#"[{"day":"Pazartesi","hour":"09:00-09:45"},{"day":"Cuma","hour":"10:50-11:35"}]"#
        );
        assert_eq!(Weekday::Friday.to_string(), "Friday");
    }

    #[test]
    fn test_unreadable_records_are_skipped() {
        let raw = r#"[
            {"day":"Pazartesi","hour":"09:00-09:45"},
            {"day":"Salı","hour":"08:00-08:45"},
            {"day":"Funday","hour":"09:00-09:45"},
            {"day":"Salı","hour":"09:00-09:45","type":"holiday"},
            {"day":"Monday","hour":"09:00-09:45"},
            42
        ]"#;
        let schedule = WeeklySchedule::parse(Some(raw)).unwrap();
        assert_eq!(schedule.len(), 1);
        assert!(schedule.is_occupied(Weekday::Monday, hour("09:00-09:45")));

        let loaded = WeeklySchedule::load(
            Some(r#"[{"day":"Cuma","hour":"09:00-09:45"},{"hour":"08:00-08:45"}]"#),
            1,
            true,
        )
        .unwrap();
        assert_eq!(loaded.len(), 1);

        assert!(matches!(
            WeeklySchedule::parse(Some(r#"{"day":"Cuma"}"#)),
            Err(ScheduleError::Corrupted(_))
        ));
    }

    #[test]
    fn test_makeup_without_timestamp_is_kept() {
        let raw = r#"[{"day":"Monday","hour":"09:00-09:45","type":"makeup"}]"#;
        let schedule = WeeklySchedule::parse(Some(raw)).unwrap();
        let (pruned, changed) = schedule.prune_expired(now() + TimeDelta::days(365), week());
        assert!(!changed);
        assert_eq!(pruned.len(), 1);
    }

    #[test]
    fn test_serialization_roundtrip_keeps_kind() {
        let schedule = WeeklySchedule::from_slots(vec![
            Slot::normal(Weekday::Monday, hour("09:00-09:45")),
            Slot::makeup(Weekday::Tuesday, hour("09:55-10:40"), now()),
        ])
        .unwrap();
        let json = schedule.to_json().unwrap();
        assert!(json.contains(r#""type":"makeup""#));
        assert!(json.contains(r#""day":"Pazartesi""#));
        assert_eq!(WeeklySchedule::parse(Some(&json)).unwrap(), schedule);
    }

    #[test]
    fn test_from_slots_rejects_duplicates() {
        let h = hour("09:00-09:45");
        let err = WeeklySchedule::from_slots(vec![
            Slot::normal(Weekday::Monday, h),
            Slot::makeup(Weekday::Monday, h, now()),
        ])
        .unwrap_err();
        assert!(matches!(err, ScheduleError::Duplicate { .. }));
    }

    #[test]
    fn test_combined_availability_union() {
        let h1 = hour("09:00-09:45");
        let h2 = hour("09:55-10:40");
        let a = WeeklySchedule::from_slots(vec![Slot::normal(Weekday::Monday, h1)]).unwrap();
        let b = WeeklySchedule::from_slots(vec![
            Slot::normal(Weekday::Monday, h1),
            Slot::makeup(Weekday::Tuesday, h2, now()),
        ])
        .unwrap();

        let availability = CombinedAvailability::from_schedules([(1, &a), (2, &b)]);
        assert!(!availability.is_available(Weekday::Monday, h1));
        assert!(!availability.is_available(Weekday::Tuesday, h2));
        assert!(availability.is_available(Weekday::Wednesday, h1));
        assert_eq!(availability.occupants(Weekday::Monday, h1), &[1, 2]);
        assert_eq!(availability.free_cells().len(), 7 * 11 - 2);
    }

    #[test]
    fn test_book_makeup_across_classes() {
        let h1 = hour("09:00-09:45");
        let h2 = hour("13:35-14:20");
        let mut schedules = vec![
            (
                1,
                WeeklySchedule::from_slots(vec![Slot::normal(Weekday::Monday, h1)]).unwrap(),
            ),
            (2, WeeklySchedule::new()),
        ];

        // 与班级 1 冲突，整个请求失败，班级 2 不受影响
        let err = book_makeup(&mut schedules, &[(Weekday::Monday, h1)], now()).unwrap_err();
        match err {
            ScheduleError::Conflicts(conflicts) => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].class_id, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(schedules[1].1.is_empty());

        book_makeup(&mut schedules, &[(Weekday::Thursday, h2)], now()).unwrap();
        for (_, schedule) in &schedules {
            let slot = schedule.get(Weekday::Thursday, h2).unwrap();
            assert_eq!(slot.kind, SlotKind::Makeup { created_at: now() });
        }
    }

    #[test]
    fn test_book_makeup_rejects_duplicate_cells() {
        let h = hour("09:00-09:45");
        let mut schedules = vec![(1, WeeklySchedule::new())];
        let err = book_makeup(
            &mut schedules,
            &[(Weekday::Monday, h), (Weekday::Monday, h)],
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::Duplicate { .. }));
        assert!(schedules[0].1.is_empty());
    }
}
